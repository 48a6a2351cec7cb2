//! Field declarations: one named, sized slice of a register word plus its documentation payload.

use bitflags::bitflags;

use super::error::{CsrError, CsrResult};

/// Largest register word, in bits, the resolver will lay out.
pub const MAX_WIDTH: usize = 1 << 16;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FieldFlags: u8 {
        /// Written value is visible for one cycle only.
        const PULSE = 0b0001;
        /// Documentation hint: the host may read this field.
        const READABLE = 0b0010;
        /// Documentation hint: the host may write this field.
        const WRITEABLE = 0b0100;
        /// Suppressed from generated documentation.
        const HIDDEN = 0b1000;
    }
}

impl Default for FieldFlags {
    fn default() -> Self {
        FieldFlags::READABLE | FieldFlags::WRITEABLE
    }
}

/// One row of a field's value table, e.g. `("0b01", "slow timer")`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldValue {
    pub literal: String,
    pub meaning: String,
}

impl FieldValue {
    pub fn new(literal: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            literal: literal.into(),
            meaning: meaning.into(),
        }
    }
}

/// Checks the lowercase identifier rule shared by field and register names.
pub(crate) fn check_identifier(name: &str) -> Result<(), &'static str> {
    let mut chars = name.chars();
    match chars.next() {
        None => return Err("name is empty"),
        Some('_') => return Err("name must not start with '_'"),
        Some(ch) if !ch.is_ascii_lowercase() => {
            return Err("name must start with a lowercase ASCII letter");
        }
        Some(_) => {}
    }
    if chars.any(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_')) {
        return Err("name may only contain lowercase letters, digits and '_'");
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: String,
    size: usize,
    offset: Option<usize>,
    flags: FieldFlags,
    description: Option<String>,
    values: Vec<FieldValue>,
}

impl FieldDescriptor {
    /// Declares a plain field that the resolver places after the previous one.
    pub fn new(name: impl Into<String>, size: usize) -> CsrResult<Self> {
        FieldDescriptor::builder(name, size).build()
    }

    pub fn builder(name: impl Into<String>, size: usize) -> FieldBuilder {
        FieldBuilder::new(name.into(), size)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Explicit starting bit, if the declaration pinned one.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn flags(&self) -> FieldFlags {
        self.flags
    }

    pub fn is_pulse(&self) -> bool {
        self.flags.contains(FieldFlags::PULSE)
    }

    pub fn is_hidden(&self) -> bool {
        self.flags.contains(FieldFlags::HIDDEN)
    }

    pub fn is_readable(&self) -> bool {
        self.flags.contains(FieldFlags::READABLE)
    }

    pub fn is_writeable(&self) -> bool {
        self.flags.contains(FieldFlags::WRITEABLE)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn values(&self) -> &[FieldValue] {
        &self.values
    }

    /// The hidden field standing in for a register declared with a width but no fields.
    pub(crate) fn implicit(name: &str, size: usize) -> CsrResult<Self> {
        FieldDescriptor::builder(name, size).offset(0).hidden(true).build()
    }
}

pub struct FieldBuilder {
    name: String,
    size: usize,
    offset: Option<usize>,
    flags: FieldFlags,
    description: Option<String>,
    values: Vec<FieldValue>,
}

impl FieldBuilder {
    fn new(name: String, size: usize) -> Self {
        Self {
            name,
            size,
            offset: None,
            flags: FieldFlags::default(),
            description: None,
            values: Vec::new(),
        }
    }

    /// Pins the field's first bit. Later fields without an offset follow this one.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn pulse(mut self, pulse: bool) -> Self {
        self.flags.set(FieldFlags::PULSE, pulse);
        self
    }

    pub fn readable(mut self, readable: bool) -> Self {
        self.flags.set(FieldFlags::READABLE, readable);
        self
    }

    pub fn writeable(mut self, writeable: bool) -> Self {
        self.flags.set(FieldFlags::WRITEABLE, writeable);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.flags.set(FieldFlags::HIDDEN, hidden);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends one row to the value table; rows keep their declaration order.
    pub fn value(mut self, literal: impl Into<String>, meaning: impl Into<String>) -> Self {
        self.values.push(FieldValue::new(literal, meaning));
        self
    }

    pub fn values<I, L, M>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (L, M)>,
        L: Into<String>,
        M: Into<String>,
    {
        self.values
            .extend(values.into_iter().map(|(literal, meaning)| FieldValue::new(literal, meaning)));
        self
    }

    pub fn build(self) -> CsrResult<FieldDescriptor> {
        let invalid = |reason| CsrError::InvalidField {
            field: self.name.clone(),
            reason,
        };
        check_identifier(&self.name).map_err(invalid)?;
        if self.size < 1 {
            return Err(invalid("size must be >= 1"));
        }
        let end = self
            .offset
            .unwrap_or(0)
            .checked_add(self.size)
            .ok_or_else(|| invalid("offset + size overflows the bit index range"))?;
        if end > MAX_WIDTH {
            return Err(invalid("field ends past the largest supported register width"));
        }
        Ok(FieldDescriptor {
            name: self.name,
            size: self.size,
            offset: self.offset,
            flags: self.flags,
            description: self.description,
            values: self.values,
        })
    }
}
