//! Bit layout resolution: assigns every declared field a non-overlapping range of the register
//! word and records which field owns each bit.

use ahash::AHashSet;
use log::{debug, trace, warn};

use super::error::{CsrError, CsrResult};
use super::field::{FieldDescriptor, MAX_WIDTH};

/// A field together with the offset the resolver assigned to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacedField {
    descriptor: FieldDescriptor,
    offset: usize,
}

impl PlacedField {
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn size(&self) -> usize {
        self.descriptor.size()
    }

    /// One past the last bit owned by this field.
    pub fn end(&self) -> usize {
        self.offset + self.descriptor.size()
    }
}

/// Contiguous run of the register word, in ascending bit order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Field(&'a PlacedField),
    Gap { offset: usize, width: usize },
}

/// Immutable bit-ownership map for one register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    fields: Vec<PlacedField>,
    bits: Vec<Option<usize>>,
}

impl Layout {
    /// Register width in bits.
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Fields in declaration order with their resolved offsets.
    pub fn fields(&self) -> &[PlacedField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&PlacedField> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Field owning `bit`, if any.
    pub fn owner(&self, bit: usize) -> Option<&PlacedField> {
        self.bits
            .get(bit)
            .copied()
            .flatten()
            .map(|index| &self.fields[index])
    }

    pub fn owned_bits(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(bit, owner)| owner.map(|_| bit))
    }

    /// One entry per logical field name; the first declaration of a repeated name wins.
    pub fn distinct_fields(&self) -> Vec<&PlacedField> {
        let mut seen = AHashSet::new();
        self.segments()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Field(field) if seen.insert(field.name()) => Some(field),
                _ => None,
            })
            .collect()
    }

    /// Walks the word from bit 0 upward, yielding each field run and each unowned gap.
    ///
    /// A repeated field name only yields its first run; later runs of the same name are
    /// reported as gaps so nothing outside the winning declaration is driven.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::new();
        let mut seen = AHashSet::new();
        let mut bit = 0;
        let mut gap_start = None;
        while bit < self.bits.len() {
            match self.bits[bit] {
                Some(index) => {
                    let field = &self.fields[index];
                    if seen.insert(field.name()) {
                        if let Some(start) = gap_start.take() {
                            segments.push(Segment::Gap {
                                offset: start,
                                width: bit - start,
                            });
                        }
                        segments.push(Segment::Field(field));
                    } else {
                        gap_start.get_or_insert(bit);
                    }
                    bit = field.end();
                }
                None => {
                    gap_start.get_or_insert(bit);
                    bit += 1;
                }
            }
        }
        if let Some(start) = gap_start {
            segments.push(Segment::Gap {
                offset: start,
                width: self.bits.len() - start,
            });
        }
        segments
    }
}

/// Turns an ordered field list into a [`Layout`].
#[derive(Clone, Debug)]
pub struct LayoutResolver {
    width: Option<usize>,
    default_field: String,
}

impl Default for LayoutResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutResolver {
    pub fn new() -> Self {
        Self {
            width: None,
            default_field: "storage".to_string(),
        }
    }

    /// Minimum register width. The resolved width never truncates placed fields.
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn maybe_width(mut self, width: Option<usize>) -> Self {
        self.width = width;
        self
    }

    /// Name of the hidden field manufactured when no fields are declared.
    pub fn default_field(mut self, name: impl Into<String>) -> Self {
        self.default_field = name.into();
        self
    }

    pub fn resolve<I>(&self, fields: I) -> CsrResult<Layout>
    where
        I: IntoIterator<Item = FieldDescriptor>,
    {
        if let Some(width) = self.width
            && width > MAX_WIDTH
        {
            return Err(CsrError::WidthTooLarge {
                width,
                max: MAX_WIDTH,
            });
        }
        let mut declared: Vec<FieldDescriptor> = fields.into_iter().collect();
        if declared.is_empty() {
            let width = self.width.ok_or_else(|| CsrError::MissingWidth {
                register: String::new(),
            })?;
            debug!(
                "no fields declared, adding implicit field '{}' of {width} bits",
                self.default_field
            );
            declared.push(FieldDescriptor::implicit(&self.default_field, width)?);
        }

        let mut placed = Vec::with_capacity(declared.len());
        let mut bits: Vec<Option<usize>> = Vec::new();
        let mut cursor = 0usize;
        let mut names = AHashSet::new();

        for descriptor in declared {
            let offset = descriptor.offset().unwrap_or(cursor);
            let end = offset.checked_add(descriptor.size()).ok_or_else(|| {
                CsrError::InvalidField {
                    field: descriptor.name().to_string(),
                    reason: "offset + size overflows the bit index range",
                }
            })?;
            if end > MAX_WIDTH {
                return Err(CsrError::WidthTooLarge {
                    width: end,
                    max: MAX_WIDTH,
                });
            }
            if bits.len() < end {
                bits.resize(end, None);
            }
            for (bit, owner) in bits.iter_mut().enumerate().take(end).skip(offset) {
                if let Some(existing) = *owner {
                    let existing: &PlacedField = &placed[existing];
                    return Err(CsrError::Overlap {
                        field: descriptor.name().to_string(),
                        existing: existing.name().to_string(),
                        bit,
                    });
                }
                *owner = Some(placed.len());
            }
            if !names.insert(descriptor.name().to_string()) {
                warn!(
                    "field '{}' is declared more than once; only its first placement gets a view",
                    descriptor.name()
                );
            }
            trace!("placed field '{}' at {offset}..{end}", descriptor.name());
            placed.push(PlacedField { descriptor, offset });
            cursor = end;
        }

        if let Some(width) = self.width
            && width > bits.len()
        {
            bits.resize(width, None);
        }
        debug!("resolved {} field(s) into a {}-bit layout", placed.len(), bits.len());
        Ok(Layout {
            fields: placed,
            bits,
        })
    }
}
