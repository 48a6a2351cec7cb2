use std::{error::Error, fmt};

pub type CsrResult<T> = Result<T, CsrError>;

/// Elaboration and simulation failures.
///
/// Everything except the simulator misuse variants is raised while a design is being built;
/// there is no recovery path, the caller is expected to abort elaboration.
#[derive(Debug)]
pub enum CsrError {
    InvalidField {
        field: String,
        reason: &'static str,
    },
    InvalidRegisterName {
        name: String,
        reason: &'static str,
    },
    Overlap {
        field: String,
        existing: String,
        bit: usize,
    },
    MissingWidth {
        register: String,
    },
    WidthTooLarge {
        width: usize,
        max: usize,
    },
    ViewCollision {
        view: String,
        field: String,
        existing: String,
    },
    NoAccess {
        register: String,
    },
    MissingName,
    DuplicateRegister {
        name: String,
    },
    Register {
        register: String,
        source: Box<CsrError>,
    },
    UnknownRegister(String),
    UnknownField {
        register: String,
        field: String,
    },
    NotDrivable {
        signal: String,
    },
    ValueTooWide {
        signal: String,
        width: usize,
        bits: usize,
    },
    PartOutOfRange {
        register: String,
        part: usize,
        parts: usize,
    },
    NotHostWriteable {
        register: String,
    },
    Schema(serde_json::Error),
    Io(std::io::Error),
}

impl CsrError {
    /// Attaches the register being elaborated to a field or layout error.
    pub(crate) fn in_register(self, register: &str) -> Self {
        match self {
            CsrError::Register { .. } => self,
            other => CsrError::Register {
                register: register.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// Strips any register context and returns the underlying failure.
    pub fn root(&self) -> &CsrError {
        match self {
            CsrError::Register { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for CsrError {
    fn from(err: serde_json::Error) -> Self {
        CsrError::Schema(err)
    }
}

impl From<std::io::Error> for CsrError {
    fn from(err: std::io::Error) -> Self {
        CsrError::Io(err)
    }
}

impl fmt::Display for CsrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CsrError::InvalidField { field, reason } => {
                write!(f, "invalid field '{field}': {reason}")
            }
            CsrError::InvalidRegisterName { name, reason } => {
                write!(f, "invalid register name '{name}': {reason}")
            }
            CsrError::Overlap {
                field,
                existing,
                bit,
            } => write!(
                f,
                "register has overlapping fields: {field} overlaps with {existing} at bit {bit}"
            ),
            CsrError::MissingWidth { register } => write!(
                f,
                "register '{register}' declares no fields, so a width must be given"
            ),
            CsrError::WidthTooLarge { width, max } => write!(
                f,
                "layout needs {width} bits; registers are limited to {max} bits"
            ),
            CsrError::ViewCollision {
                view,
                field,
                existing,
            } => write!(
                f,
                "view '{view}' of field {field} collides with a view of field {existing}"
            ),
            CsrError::NoAccess { register } => write!(
                f,
                "register '{register}' is neither readable nor writeable"
            ),
            CsrError::MissingName => write!(f, "register name was not provided"),
            CsrError::DuplicateRegister { name } => {
                write!(f, "register '{name}' is already defined")
            }
            CsrError::Register { register, source } => {
                write!(f, "register '{register}': {source}")
            }
            CsrError::UnknownRegister(name) => write!(f, "unknown register '{name}'"),
            CsrError::UnknownField { register, field } => {
                write!(f, "register '{register}' has no field view '{field}'")
            }
            CsrError::NotDrivable { signal } => {
                write!(f, "signal '{signal}' is not an input and cannot be driven")
            }
            CsrError::ValueTooWide {
                signal,
                width,
                bits,
            } => write!(
                f,
                "value needs {bits} bits but signal '{signal}' is {width} bits wide"
            ),
            CsrError::PartOutOfRange {
                register,
                part,
                parts,
            } => write!(
                f,
                "register '{register}' has {parts} bus part(s); part {part} does not exist"
            ),
            CsrError::NotHostWriteable { register } => {
                write!(f, "register '{register}' has no storage word for the host to write")
            }
            CsrError::Schema(err) => write!(f, "schema error: {err}"),
            CsrError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl Error for CsrError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CsrError::Register { source, .. } => Some(source.as_ref()),
            CsrError::Schema(err) => Some(err),
            CsrError::Io(err) => Some(err),
            _ => None,
        }
    }
}
