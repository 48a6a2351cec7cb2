//! Cycle-based evaluation of an elaborated design.
//!
//! Registered signals change only in [`Simulator::tick`]; every other read is evaluated
//! against the values held since the last edge, so all views observe one snapshot per cycle.

use log::trace;

use super::bits::Bits;
use super::design::Design;
use super::error::{CsrError, CsrResult};
use super::register::Register;
use super::signal::{Drive, SignalId};
use super::storage::{HostWrite, StoragePrimitive, StorageState};

pub struct Simulator {
    design: Design,
    values: Vec<Bits>,
    states: Vec<Option<StorageState>>,
    cycle: u64,
}

impl Simulator {
    pub fn new(design: Design) -> Self {
        let values = design.netlist().initial_values();
        let states = design
            .registers()
            .iter()
            .map(|register| register.primitive().map(StoragePrimitive::initial_state))
            .collect();
        Self {
            design,
            values,
            states,
            cycle: 0,
        }
    }

    pub fn design(&self) -> &Design {
        &self.design
    }

    pub fn into_design(self) -> Design {
        self.design
    }

    /// Number of clock edges taken so far.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn read(&self, id: SignalId) -> Bits {
        self.design.netlist().eval(&self.values, id)
    }

    pub fn read_u64(&self, id: SignalId) -> u64 {
        self.read(id).to_u64()
    }

    /// Current value of a read view, e.g. `("ctrl", "mode")`.
    pub fn read_field(&self, register: &str, view: &str) -> CsrResult<Bits> {
        let id = self.design.register(register)?.read_view(view)?;
        Ok(self.read(id))
    }

    /// Sets an input signal. The value holds until it is driven again.
    pub fn drive_bits(&mut self, id: SignalId, value: Bits) -> CsrResult<()> {
        let net = self.design.netlist();
        let decl = net.decl(id);
        if !matches!(decl.drive(), Drive::Input) {
            return Err(CsrError::NotDrivable {
                signal: decl.name().to_string(),
            });
        }
        let bits = value.significant_bits();
        if bits > decl.width() {
            return Err(CsrError::ValueTooWide {
                signal: decl.name().to_string(),
                width: decl.width(),
                bits,
            });
        }
        self.values[id.index()] = value.resize(decl.width());
        Ok(())
    }

    pub fn drive(&mut self, id: SignalId, value: u64) -> CsrResult<()> {
        self.drive_bits(id, Bits::from_u64(64, value))
    }

    /// Drives a write view, e.g. `("stat", "busy")`.
    pub fn drive_field(&mut self, register: &str, view: &str, value: u64) -> CsrResult<()> {
        let id = self.design.register(register)?.write_view(view)?;
        self.drive(id, value)
    }

    /// Queues a whole-word host write; it lands on the next edge.
    pub fn host_write_bits(&mut self, register: &str, value: Bits) -> CsrResult<()> {
        let (index, primitive) = self.primitive(register)?;
        let width = self.design.registers()[index].width();
        let bits = value.significant_bits();
        if bits > width {
            return Err(CsrError::ValueTooWide {
                signal: self.design.netlist().name(primitive.storage()).to_string(),
                width,
                bits,
            });
        }
        self.stage(index, HostWrite::Word(value.resize(width)));
        Ok(())
    }

    pub fn host_write(&mut self, register: &str, value: u64) -> CsrResult<()> {
        self.host_write_bits(register, Bits::from_u64(64, value))
    }

    /// Queues one bus part of a host write. Part 0 completes the transaction.
    pub fn host_write_part(&mut self, register: &str, part: usize, value: u64) -> CsrResult<()> {
        let (index, primitive) = self.primitive(register)?;
        let parts = primitive.parts();
        if part >= parts {
            return Err(CsrError::PartOutOfRange {
                register: register.to_string(),
                part,
                parts,
            });
        }
        let part_width = primitive.part_width(part);
        let value = Bits::from_u64(64, value);
        let bits = value.significant_bits();
        if bits > part_width {
            return Err(CsrError::ValueTooWide {
                signal: format!("{register}[{part}]"),
                width: part_width,
                bits,
            });
        }
        self.stage(
            index,
            HostWrite::Part {
                index: part,
                value: value.resize(part_width),
            },
        );
        Ok(())
    }

    /// The word the host sees: storage when the register has one, status otherwise.
    pub fn host_read(&self, register: &str) -> CsrResult<Bits> {
        let register = self.design.register(register)?;
        let id = register
            .storage()
            .or(register.status())
            .ok_or_else(|| CsrError::UnknownRegister(register.name().to_string()))?;
        Ok(self.read(id))
    }

    /// Whether a host write is queued for the next edge.
    pub fn is_write_pending(&self, register: &str) -> CsrResult<bool> {
        let index = self.design.index_of(register)?;
        Ok(self.states[index]
            .as_ref()
            .is_some_and(StorageState::is_pending))
    }

    /// Advances one clock edge.
    pub fn tick(&mut self) {
        let net = self.design.netlist();
        let mut updates = Vec::new();
        for (register, state) in self.design.registers().iter().zip(self.states.iter_mut()) {
            if let (Some(primitive), Some(state)) = (register.primitive(), state.as_mut()) {
                updates.extend(primitive.next_state(net, &self.values, state));
            }
        }
        for (id, value) in updates {
            self.values[id.index()] = value;
        }
        self.cycle += 1;
        trace!("clock edge {}", self.cycle);
    }

    /// Advances `cycles` clock edges.
    pub fn run(&mut self, cycles: u64) {
        for _ in 0..cycles {
            self.tick();
        }
    }

    fn primitive(&self, register: &str) -> CsrResult<(usize, &StoragePrimitive)> {
        let index = self.design.index_of(register)?;
        let register: &Register = &self.design.registers()[index];
        register
            .primitive()
            .map(|primitive| (index, primitive))
            .ok_or_else(|| CsrError::NotHostWriteable {
                register: register.name().to_string(),
            })
    }

    fn stage(&mut self, index: usize, write: HostWrite) {
        if let Some(state) = self.states[index].as_mut() {
            state.stage(write);
        }
    }
}
