//! Behavioural model of the wide storage primitive a register is built on.
//!
//! The host reaches the storage word through bus parts of `bus_width` bits, part 0 being the
//! least significant and the one that completes a transaction. With atomic writes the upper
//! parts collect in a shadow copy and the whole word lands when part 0 is written.

use log::trace;
use smallvec::SmallVec;

use super::bits::Bits;
use super::signal::{Netlist, SignalId};

pub const DEFAULT_BUS_WIDTH: usize = 8;

/// A host transfer waiting for the next clock edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostWrite {
    Part { index: usize, value: Bits },
    Word(Bits),
}

/// Per-register state that lives outside the netlist: the atomic shadow copy and the host
/// writes queued for the next edge.
#[derive(Clone, Debug)]
pub struct StorageState {
    backstore: Bits,
    staged: SmallVec<[HostWrite; 2]>,
}

impl StorageState {
    pub fn is_pending(&self) -> bool {
        !self.staged.is_empty()
    }

    pub(crate) fn stage(&mut self, write: HostWrite) {
        self.staged.push(write);
    }
}

#[derive(Clone, Debug)]
pub struct StoragePrimitive {
    width: usize,
    bus_width: usize,
    atomic: bool,
    reset_value: Bits,
    storage: SignalId,
    write_enable: SignalId,
    copy_strobe: Option<SignalId>,
    dev_data: Option<SignalId>,
    reset: Option<SignalId>,
}

impl StoragePrimitive {
    /// Declares the storage word and its `re` strobe on `net`.
    ///
    /// `dev_data` is the device-side word copied into storage while the `we` strobe is high;
    /// passing it creates that strobe. `resettable` adds a `reset` input.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        net: &mut Netlist,
        scope: &str,
        width: usize,
        reset_value: Bits,
        bus_width: usize,
        atomic: bool,
        dev_data: Option<SignalId>,
        resettable: bool,
    ) -> Self {
        let reset_value = reset_value.resize(width);
        let storage = net.add_registered(format!("{scope}::storage"), width, reset_value.clone());
        let write_enable = net.add_registered(format!("{scope}::re"), 1, Bits::zero(1));
        let copy_strobe = dev_data.map(|_| net.add_input(format!("{scope}::we"), 1));
        let reset = resettable.then(|| net.add_input(format!("{scope}::reset"), 1));
        Self {
            width,
            bus_width: bus_width.max(1),
            atomic,
            reset_value,
            storage,
            write_enable,
            copy_strobe,
            dev_data,
            reset,
        }
    }

    pub fn storage(&self) -> SignalId {
        self.storage
    }

    pub fn write_enable(&self) -> SignalId {
        self.write_enable
    }

    pub fn copy_strobe(&self) -> Option<SignalId> {
        self.copy_strobe
    }

    pub fn reset(&self) -> Option<SignalId> {
        self.reset
    }

    pub fn is_atomic(&self) -> bool {
        self.atomic
    }

    pub fn bus_width(&self) -> usize {
        self.bus_width
    }

    /// Number of bus parts the storage word spans.
    pub fn parts(&self) -> usize {
        self.width.div_ceil(self.bus_width).max(1)
    }

    /// Width of bus part `index`; the top part may be narrower than the bus.
    pub fn part_width(&self, index: usize) -> usize {
        self.width
            .saturating_sub(index * self.bus_width)
            .min(self.bus_width)
    }

    pub fn initial_state(&self) -> StorageState {
        StorageState {
            backstore: self.reset_value.clone(),
            staged: SmallVec::new(),
        }
    }

    /// Next values of the storage word and `re` strobe, computed from one snapshot.
    pub(crate) fn next_state(
        &self,
        net: &Netlist,
        values: &[Bits],
        state: &mut StorageState,
    ) -> [(SignalId, Bits); 2] {
        let asserted = |id: Option<SignalId>| id.is_some_and(|id| net.eval(values, id).bit(0));

        if asserted(self.reset) {
            state.backstore = Bits::zero(self.width);
            state.staged.clear();
            return [
                (self.storage, Bits::zero(self.width)),
                (self.write_enable, Bits::zero(1)),
            ];
        }

        let mut next = values[self.storage.index()].clone();
        let mut committed = false;
        for write in state.staged.drain(..) {
            match write {
                HostWrite::Word(value) => {
                    state.backstore = value.clone();
                    next = value;
                    committed = true;
                }
                HostWrite::Part { index, value } => {
                    let offset = index * self.bus_width;
                    let value = value.resize(self.part_width(index));
                    if self.atomic {
                        state.backstore.insert(offset, &value);
                        if index == 0 {
                            next = state.backstore.clone();
                        }
                    } else {
                        next.insert(offset, &value);
                    }
                    committed |= index == 0;
                }
            }
        }
        if committed {
            trace!("host write committed {next:#x}");
        }

        if asserted(self.copy_strobe)
            && let Some(dev_data) = self.dev_data
        {
            next = net.eval(values, dev_data);
        }

        [
            (self.storage, next),
            (self.write_enable, Bits::from_u64(1, committed as u64)),
        ]
    }
}
