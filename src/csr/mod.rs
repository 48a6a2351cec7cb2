//! Register schema compiler.
//!
//! Fields are declared with [`FieldDescriptor`], resolved into a conflict-free [`Layout`], and
//! projected into named per-field signals on a [`Netlist`]. A [`Register`] ties those views to
//! the storage and status words and their strobes; a [`Design`] groups registers and a
//! [`Simulator`] clocks them.

pub mod bits;
pub mod design;
pub mod doc;
pub mod error;
pub mod field;
pub mod layout;
pub mod projector;
pub mod register;
pub mod schema;
pub mod signal;
pub mod sim;
pub mod storage;

pub use bits::Bits;
pub use design::Design;
pub use error::{CsrError, CsrResult};
pub use field::{FieldBuilder, FieldDescriptor, FieldFlags, FieldValue};
pub use layout::{Layout, LayoutResolver, PlacedField, Segment};
pub use projector::{FieldViews, SignalProjector, WriteProjection};
pub use register::{NamingPolicy, Register, RegisterBuilder, RegisterKind};
pub use signal::{Netlist, SignalId};
pub use sim::Simulator;
