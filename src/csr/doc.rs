//! Register metadata handed to the datasheet generator.
//!
//! The generator itself lives elsewhere; this module only flattens an elaborated register into
//! plain serialisable records and writes them out as JSON.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::CsrResult;
use super::layout::PlacedField;
use super::register::{Register, RegisterKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDoc {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl From<RegisterKind> for AccessDoc {
    fn from(kind: RegisterKind) -> Self {
        match kind {
            RegisterKind::Status => AccessDoc::ReadOnly,
            RegisterKind::Storage => AccessDoc::WriteOnly,
            RegisterKind::Bidirectional => AccessDoc::ReadWrite,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDoc {
    pub value: String,
    pub meaning: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDoc {
    pub name: String,
    pub offset: usize,
    pub size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub values: Vec<ValueDoc>,
    pub hidden: bool,
    pub readable: bool,
    pub writeable: bool,
    pub pulse: bool,
}

impl FieldDoc {
    pub fn from_field(field: &PlacedField) -> Self {
        let descriptor = field.descriptor();
        Self {
            name: field.name().to_string(),
            offset: field.offset(),
            size: field.size(),
            description: descriptor.description().map(str::to_string),
            values: descriptor
                .values()
                .iter()
                .map(|row| ValueDoc {
                    value: row.literal.clone(),
                    meaning: row.meaning.clone(),
                })
                .collect(),
            hidden: descriptor.is_hidden(),
            readable: descriptor.is_readable(),
            writeable: descriptor.is_writeable(),
            pulse: descriptor.is_pulse(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDoc {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub width: usize,
    pub access: AccessDoc,
    pub resettable: bool,
    pub atomic: bool,
    pub fields: Vec<FieldDoc>,
}

impl RegisterDoc {
    /// Fields are listed in declaration order, hidden ones included with `hidden: true`.
    pub fn from_register(register: &Register) -> Self {
        Self {
            name: register.name().to_string(),
            description: register.description().map(str::to_string),
            width: register.width(),
            access: register.kind().into(),
            resettable: register.is_resettable(),
            atomic: register.is_atomic(),
            fields: register
                .layout()
                .fields()
                .iter()
                .map(FieldDoc::from_field)
                .collect(),
        }
    }

    /// Fields a datasheet should show.
    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldDoc> {
        self.fields.iter().filter(|field| !field.hidden)
    }
}

pub fn to_json(docs: &[RegisterDoc]) -> CsrResult<String> {
    Ok(serde_json::to_string_pretty(docs)?)
}

pub fn write_json(docs: &[RegisterDoc], path: impl AsRef<Path>) -> CsrResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, docs)?;
    writer.flush()?;
    Ok(())
}
