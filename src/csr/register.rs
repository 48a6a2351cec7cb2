//! Register façade: elaborates a field list into a layout, the wide words behind it, and the
//! per-field views the surrounding logic connects to.

use log::{debug, warn};

use super::bits::Bits;
use super::error::{CsrError, CsrResult};
use super::field::{FieldDescriptor, check_identifier};
use super::layout::{Layout, LayoutResolver};
use super::projector::{FieldViews, SignalProjector};
use super::signal::{Netlist, SignalId};
use super::storage::{DEFAULT_BUS_WIDTH, StoragePrimitive};

/// Which wide words a register carries, from the host's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegisterKind {
    /// Host reads, logic drives: status word only.
    Status,
    /// Host writes, logic reads: storage word only.
    Storage,
    /// Both words, with the `we` strobe copying status into storage.
    Bidirectional,
}

impl RegisterKind {
    pub fn from_access(readable: bool, writeable: bool) -> Option<Self> {
        match (readable, writeable) {
            (true, false) => Some(RegisterKind::Status),
            (false, true) => Some(RegisterKind::Storage),
            (true, true) => Some(RegisterKind::Bidirectional),
            (false, false) => None,
        }
    }

    pub fn is_host_readable(self) -> bool {
        matches!(self, RegisterKind::Status | RegisterKind::Bidirectional)
    }

    pub fn is_host_writeable(self) -> bool {
        matches!(self, RegisterKind::Storage | RegisterKind::Bidirectional)
    }

    /// Name of the hidden field created when no fields are declared.
    pub fn default_field(self) -> &'static str {
        match self {
            RegisterKind::Status => "status",
            RegisterKind::Storage | RegisterKind::Bidirectional => "storage",
        }
    }
}

/// How view names are spelled on bidirectional registers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NamingPolicy {
    /// Read and write views both use the bare field name.
    #[default]
    Plain,
    /// Read views become `i_<field>` and write views `o_<field>`.
    DirectionPrefixed,
}

impl NamingPolicy {
    fn prefixes(self, kind: RegisterKind) -> (&'static str, &'static str) {
        match (self, kind) {
            (NamingPolicy::DirectionPrefixed, RegisterKind::Bidirectional) => ("i_", "o_"),
            _ => ("", ""),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegisterBuilder {
    name: Option<String>,
    description: Option<String>,
    width: Option<usize>,
    fields: Vec<FieldDescriptor>,
    readable: bool,
    writeable: bool,
    resettable: bool,
    atomic: bool,
    reset_value: Bits,
    naming: NamingPolicy,
    bus_width: usize,
}

impl Default for RegisterBuilder {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            width: None,
            fields: Vec::new(),
            readable: false,
            writeable: false,
            resettable: false,
            atomic: false,
            reset_value: Bits::zero(0),
            naming: NamingPolicy::default(),
            bus_width: DEFAULT_BUS_WIDTH,
        }
    }
}

impl RegisterBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self::default().name(name)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn register_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Minimum width; required when no fields are declared.
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// The host can read this register.
    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// The host can write this register.
    pub fn writeable(mut self, writeable: bool) -> Self {
        self.writeable = writeable;
        self
    }

    pub fn resettable(mut self, resettable: bool) -> Self {
        self.resettable = resettable;
        self
    }

    /// Multi-part host writes only become visible once the final part lands.
    pub fn atomic(mut self, atomic: bool) -> Self {
        self.atomic = atomic;
        self
    }

    /// Power-on value of the storage word.
    pub fn reset_value(mut self, value: u64) -> Self {
        self.reset_value = Bits::from_u64(64, value);
        self
    }

    pub fn reset_bits(mut self, value: Bits) -> Self {
        self.reset_value = value;
        self
    }

    pub fn naming(mut self, naming: NamingPolicy) -> Self {
        self.naming = naming;
        self
    }

    /// Width of one host bus transfer.
    pub fn bus_width(mut self, bus_width: usize) -> Self {
        self.bus_width = bus_width;
        self
    }
}

#[derive(Clone, Debug)]
pub struct Register {
    name: String,
    description: Option<String>,
    kind: RegisterKind,
    layout: Layout,
    primitive: Option<StoragePrimitive>,
    status: Option<SignalId>,
    reads: FieldViews,
    writes: FieldViews,
    resettable: bool,
}

impl Register {
    /// Resolves the builder's layout and declares every signal the register needs on `net`.
    ///
    /// Nothing is added to `net` unless the whole declaration is valid.
    pub fn define(net: &mut Netlist, builder: RegisterBuilder) -> CsrResult<Register> {
        let name = builder.name.ok_or(CsrError::MissingName)?;
        check_identifier(&name).map_err(|reason| CsrError::InvalidRegisterName {
            name: name.clone(),
            reason,
        })?;
        let kind = RegisterKind::from_access(builder.readable, builder.writeable).ok_or_else(
            || CsrError::NoAccess {
                register: name.clone(),
            },
        )?;
        if builder.fields.is_empty() && builder.width.is_none() {
            return Err(CsrError::MissingWidth { register: name });
        }

        let layout = LayoutResolver::new()
            .maybe_width(builder.width)
            .default_field(kind.default_field())
            .resolve(builder.fields)
            .map_err(|err| err.in_register(&name))?;

        if kind == RegisterKind::Status {
            if builder.resettable {
                warn!("register '{name}' has no storage word; ignoring resettable");
            }
            if builder.atomic {
                warn!("register '{name}' has no storage word; ignoring atomic");
            }
        }

        let (read_prefix, write_prefix) = builder.naming.prefixes(kind);
        let projector = SignalProjector::new(&layout, &name);
        if kind.is_host_writeable() {
            projector
                .view_prefix(read_prefix)
                .read_view_names()
                .map_err(|err| err.in_register(&name))?;
        }

        let (writes, status) = if kind.is_host_readable() {
            let status_name = match kind {
                RegisterKind::Status => format!("{name}::status"),
                _ => format!("{name}::dat_w"),
            };
            let (views, status) = projector
                .view_prefix(write_prefix)
                .project_write(net)
                .synthesize(net, status_name);
            (views, Some(status))
        } else {
            (FieldViews::default(), None)
        };

        let (reads, primitive) = if kind.is_host_writeable() {
            let primitive = StoragePrimitive::new(
                net,
                &name,
                layout.width(),
                builder.reset_value,
                builder.bus_width,
                builder.atomic,
                status,
                builder.resettable,
            );
            let reads = projector
                .view_prefix(read_prefix)
                .project_read(net, primitive.storage(), primitive.write_enable())
                .map_err(|err| err.in_register(&name))?;
            (reads, Some(primitive))
        } else {
            (FieldViews::default(), None)
        };

        debug!(
            "defined {kind:?} register '{name}': {} bits, {} read view(s), {} write view(s)",
            layout.width(),
            reads.len(),
            writes.len()
        );

        Ok(Register {
            resettable: primitive.is_some() && builder.resettable,
            name,
            description: builder.description,
            kind,
            layout,
            primitive,
            status,
            reads,
            writes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn kind(&self) -> RegisterKind {
        self.kind
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn width(&self) -> usize {
        self.layout.width()
    }

    pub fn is_resettable(&self) -> bool {
        self.resettable
    }

    pub fn is_atomic(&self) -> bool {
        self.primitive
            .as_ref()
            .is_some_and(StoragePrimitive::is_atomic)
    }

    pub fn primitive(&self) -> Option<&StoragePrimitive> {
        self.primitive.as_ref()
    }

    /// Word written by the host and read by logic.
    pub fn storage(&self) -> Option<SignalId> {
        self.primitive.as_ref().map(StoragePrimitive::storage)
    }

    /// Word driven by logic and read by the host.
    pub fn status(&self) -> Option<SignalId> {
        self.status
    }

    /// High for the one cycle after a host write commits.
    pub fn write_enable(&self) -> Option<SignalId> {
        self.primitive.as_ref().map(StoragePrimitive::write_enable)
    }

    /// Driven by logic to copy the status word into storage; bidirectional registers only.
    pub fn read_enable(&self) -> Option<SignalId> {
        self.primitive.as_ref().and_then(StoragePrimitive::copy_strobe)
    }

    pub fn reset(&self) -> Option<SignalId> {
        self.primitive.as_ref().and_then(StoragePrimitive::reset)
    }

    /// Views sliced out of the storage word.
    pub fn read_views(&self) -> &FieldViews {
        &self.reads
    }

    /// Inputs composed into the status word.
    pub fn write_views(&self) -> &FieldViews {
        &self.writes
    }

    pub fn read_view(&self, view: &str) -> CsrResult<SignalId> {
        self.reads.get(view).ok_or_else(|| self.unknown_field(view))
    }

    pub fn write_view(&self, view: &str) -> CsrResult<SignalId> {
        self.writes.get(view).ok_or_else(|| self.unknown_field(view))
    }

    fn unknown_field(&self, view: &str) -> CsrError {
        CsrError::UnknownField {
            register: self.name.clone(),
            field: view.to_string(),
        }
    }
}
