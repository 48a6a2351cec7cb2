//! Per-field signal views derived from a register layout.
//!
//! The read direction slices each field out of a wide word. The write direction allocates one
//! drivable input per field and concatenates them, gaps zero-filled, back into a wide word.

use ahash::AHashMap;
use log::trace;
use smallvec::SmallVec;

use super::error::{CsrError, CsrResult};
use super::layout::{Layout, Segment};
use super::signal::{Expr, Netlist, Operand, SignalId};

/// Ordered name → signal mapping handed to the surrounding design.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldViews {
    entries: Vec<(String, SignalId)>,
    index: AHashMap<String, usize>,
}

impl FieldViews {
    pub fn get(&self, name: &str) -> Option<SignalId> {
        self.index.get(name).map(|&slot| self.entries[slot].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SignalId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), *id))
    }

    fn insert(&mut self, name: String, id: SignalId) {
        if self.index.contains_key(&name) {
            return;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, id));
    }
}

/// Result of [`SignalProjector::project_write`]: the drivable views and the concatenation that
/// rebuilds the wide word from them.
#[derive(Clone, Debug)]
pub struct WriteProjection {
    views: FieldViews,
    composition: SmallVec<[Operand; 4]>,
    width: usize,
}

impl WriteProjection {
    pub fn views(&self) -> &FieldViews {
        &self.views
    }

    /// Concatenation operands from bit 0 upward.
    pub fn composition(&self) -> &[Operand] {
        &self.composition
    }

    /// Declares the composed wide word as a combinational signal named `name`.
    pub fn synthesize(self, net: &mut Netlist, name: impl Into<String>) -> (FieldViews, SignalId) {
        let word = net.add_comb(name, self.width, Expr::Concat(self.composition));
        (self.views, word)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SignalProjector<'a> {
    layout: &'a Layout,
    scope: &'a str,
    prefix: &'a str,
}

impl<'a> SignalProjector<'a> {
    /// `scope` namespaces the netlist signals, normally the register name.
    pub fn new(layout: &'a Layout, scope: &'a str) -> Self {
        Self {
            layout,
            scope,
            prefix: "",
        }
    }

    /// Prefix prepended to every view name handed back to the caller.
    pub fn view_prefix(mut self, prefix: &'a str) -> Self {
        self.prefix = prefix;
        self
    }

    /// Every view name [`project_read`](Self::project_read) hands out, in order.
    ///
    /// Fails if two fields claim the same view, e.g. a pulse field `go` next to a field named
    /// `go_raw`.
    pub fn read_view_names(&self) -> CsrResult<Vec<String>> {
        let mut owners: AHashMap<String, &str> = AHashMap::new();
        let mut names = Vec::new();
        for field in self.layout.distinct_fields() {
            let view = format!("{}{}", self.prefix, field.name());
            let claimed = if field.descriptor().is_pulse() {
                vec![format!("{view}_raw"), view]
            } else {
                vec![view]
            };
            for view in claimed {
                if let Some(existing) = owners.insert(view.clone(), field.name()) {
                    return Err(CsrError::ViewCollision {
                        view,
                        field: field.name().to_string(),
                        existing: existing.to_string(),
                    });
                }
                names.push(view);
            }
        }
        Ok(names)
    }

    /// Slices every distinct field out of `word`.
    ///
    /// Pulse fields get an undelayed `<name>_raw` view and a primary view gated by
    /// `write_enable`, so the primary view is zero outside the cycle the strobe is high.
    /// Nothing is added to `net` when two fields claim the same view.
    pub fn project_read(
        &self,
        net: &mut Netlist,
        word: SignalId,
        write_enable: SignalId,
    ) -> CsrResult<FieldViews> {
        self.read_view_names()?;
        let mut views = FieldViews::default();
        for field in self.layout.distinct_fields() {
            let view = format!("{}{}", self.prefix, field.name());
            let slice = Expr::Slice {
                source: word,
                offset: field.offset(),
                width: field.size(),
            };
            if field.descriptor().is_pulse() {
                let raw_view = format!("{view}_raw");
                let raw = net.add_comb(self.signal_name("r", &raw_view), field.size(), slice);
                let gated = net.add_comb(
                    self.signal_name("r", &view),
                    field.size(),
                    Expr::Gate {
                        value: raw,
                        strobe: write_enable,
                    },
                );
                views.insert(raw_view, raw);
                views.insert(view, gated);
            } else {
                let id = net.add_comb(self.signal_name("r", &view), field.size(), slice);
                views.insert(view, id);
            }
            trace!("{}: read view '{}' at bit {}", self.scope, field.name(), field.offset());
        }
        Ok(views)
    }

    /// Allocates one drivable input per distinct field and the concatenation covering the
    /// whole layout width.
    pub fn project_write(&self, net: &mut Netlist) -> WriteProjection {
        let mut views = FieldViews::default();
        let mut composition = SmallVec::new();
        for segment in self.layout.segments() {
            match segment {
                Segment::Field(field) => {
                    let view = format!("{}{}", self.prefix, field.name());
                    let id = net.add_input(self.signal_name("w", &view), field.size());
                    views.insert(view, id);
                    composition.push(Operand::Signal(id));
                }
                Segment::Gap { offset, width } => {
                    trace!("{}: zero-filling bits {offset}..{}", self.scope, offset + width);
                    composition.push(Operand::Zero(width));
                }
            }
        }
        WriteProjection {
            views,
            composition,
            width: self.layout.width(),
        }
    }

    fn signal_name(&self, direction: &str, view: &str) -> String {
        format!("{}::{direction}::{view}", self.scope)
    }
}
