//! Declarative register schemas.
//!
//! A schema is a JSON document listing registers and their fields; compiling it runs every
//! declaration through the same builders as hand-written Rust definitions.
//!
//! ```json
//! { "registers": [
//!     { "name": "ctrl", "writeable": true,
//!       "fields": [ { "name": "enable" }, { "name": "mode", "size": 2 } ] }
//! ] }
//! ```

use std::io::Read;

use serde::Deserialize;

use super::design::Design;
use super::error::CsrResult;
use super::field::FieldDescriptor;
use super::register::{NamingPolicy, RegisterBuilder};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(default)]
    pub registers: Vec<RegisterDecl>,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NamingDecl {
    #[default]
    Plain,
    DirectionPrefixed,
}

impl From<NamingDecl> for NamingPolicy {
    fn from(naming: NamingDecl) -> Self {
        match naming {
            NamingDecl::Plain => NamingPolicy::Plain,
            NamingDecl::DirectionPrefixed => NamingPolicy::DirectionPrefixed,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterDecl {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub width: Option<usize>,
    #[serde(default)]
    pub readable: bool,
    #[serde(default)]
    pub writeable: bool,
    #[serde(default)]
    pub resettable: bool,
    #[serde(default)]
    pub atomic: bool,
    #[serde(default)]
    pub reset: u64,
    #[serde(default)]
    pub naming: NamingDecl,
    #[serde(default)]
    pub bus_width: Option<usize>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

fn default_size() -> usize {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    #[serde(default = "default_size")]
    pub size: usize,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub pulse: bool,
    #[serde(default = "default_true")]
    pub readable: bool,
    #[serde(default = "default_true")]
    pub writeable: bool,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub values: Vec<(String, String)>,
}

impl FieldDecl {
    pub fn to_descriptor(&self) -> CsrResult<FieldDescriptor> {
        let mut builder = FieldDescriptor::builder(self.name.clone(), self.size)
            .pulse(self.pulse)
            .readable(self.readable)
            .writeable(self.writeable)
            .hidden(self.hidden)
            .values(self.values.iter().cloned());
        if let Some(offset) = self.offset {
            builder = builder.offset(offset);
        }
        if let Some(description) = &self.description {
            builder = builder.description(description.clone());
        }
        builder.build()
    }
}

impl RegisterDecl {
    pub fn to_builder(&self) -> CsrResult<RegisterBuilder> {
        let fields = self
            .fields
            .iter()
            .map(|field| field.to_descriptor().map_err(|err| err.in_register(&self.name)))
            .collect::<CsrResult<Vec<_>>>()?;
        let mut builder = RegisterBuilder::new(self.name.clone())
            .readable(self.readable)
            .writeable(self.writeable)
            .resettable(self.resettable)
            .atomic(self.atomic)
            .reset_value(self.reset)
            .naming(self.naming.into())
            .fields(fields);
        if let Some(width) = self.width {
            builder = builder.width(width);
        }
        if let Some(bus_width) = self.bus_width {
            builder = builder.bus_width(bus_width);
        }
        if let Some(description) = &self.description {
            builder = builder.description(description.clone());
        }
        Ok(builder)
    }
}

impl Schema {
    pub fn parse(text: &str) -> CsrResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_reader(reader: impl Read) -> CsrResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Elaborates every register in declaration order, stopping at the first failure.
    pub fn compile(&self) -> CsrResult<Design> {
        let mut design = Design::new();
        for register in &self.registers {
            design.define(register.to_builder()?)?;
        }
        Ok(design)
    }
}

/// Parses and compiles a JSON schema in one step.
pub fn compile(text: &str) -> CsrResult<Design> {
    Schema::parse(text)?.compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csr::error::CsrError;
    use crate::csr::register::RegisterKind;

    #[test]
    fn compiles_registers_with_defaults() {
        let design = compile(
            r#"{ "registers": [
                { "name": "ctrl", "writeable": true, "atomic": true,
                  "fields": [
                    { "name": "enable" },
                    { "name": "mode", "size": 2, "values": [["0b00", "off"]] },
                    { "name": "go", "offset": 8, "pulse": true }
                  ] },
                { "name": "stat", "readable": true, "width": 16 }
            ] }"#,
        )
        .expect("valid schema");
        let ctrl = design.register("ctrl").expect("ctrl");
        assert_eq!(ctrl.kind(), RegisterKind::Storage);
        assert!(ctrl.is_atomic());
        assert_eq!(ctrl.width(), 9);
        assert_eq!(ctrl.layout().field("mode").map(|f| f.offset()), Some(1));
        ctrl.read_view("go_raw").expect("pulse field has a raw view");

        let stat = design.register("stat").expect("stat");
        assert_eq!(stat.layout().fields()[0].name(), "status");
    }

    #[test]
    fn field_errors_carry_register_context() {
        let err = compile(r#"{ "registers": [ { "name": "bad", "writeable": true, "fields": [ { "name": "x", "size": 0 } ] } ] }"#)
            .expect_err("zero-size field");
        assert!(matches!(&err, CsrError::Register { register, .. } if register == "bad"));
    }

    #[test]
    fn oversized_widths_are_errors() {
        let err = compile(r#"{ "registers": [ { "name": "big", "readable": true, "width": 1099511627776 } ] }"#)
            .expect_err("width beyond any register");
        assert!(matches!(err.root(), CsrError::WidthTooLarge { .. }), "got {err}");

        let err = compile(
            r#"{ "registers": [ { "name": "far", "writeable": true,
                 "fields": [ { "name": "x", "offset": 4611686018427387903 } ] } ] }"#,
        )
        .expect_err("offset beyond any register");
        assert!(matches!(err.root(), CsrError::InvalidField { .. }), "got {err}");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = compile(r#"{ "registers": [ { "name": "r", "writable": true } ] }"#)
            .expect_err("typo in key");
        assert!(matches!(err, CsrError::Schema(_)));
    }
}
