//! Signal graph for elaborated registers.
//!
//! Every wire is declared once in a [`Netlist`] and is one of three kinds: a registered value
//! that changes only on a clock edge, an input held at whatever the surrounding logic last
//! drove, or a combinational expression recomputed from the current snapshot on every read.

use ahash::AHashMap;
use smallvec::SmallVec;

use super::bits::Bits;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(usize);

impl SignalId {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

/// One input of a concatenation, listed from bit 0 upward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Signal(SignalId),
    Zero(usize),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// `(source >> offset)` truncated to `width` bits.
    Slice {
        source: SignalId,
        offset: usize,
        width: usize,
    },
    /// `value & replicate(strobe[0])`.
    Gate { value: SignalId, strobe: SignalId },
    Concat(SmallVec<[Operand; 4]>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Drive {
    Registered { reset: Bits },
    Input,
    Comb(Expr),
}

#[derive(Clone, Debug)]
pub struct SignalDecl {
    name: String,
    width: usize,
    drive: Drive,
}

impl SignalDecl {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn drive(&self) -> &Drive {
        &self.drive
    }
}

#[derive(Debug, Default)]
pub struct Netlist {
    signals: Vec<SignalDecl>,
    by_name: AHashMap<String, SignalId>,
}

impl Netlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn decl(&self, id: SignalId) -> &SignalDecl {
        &self.signals[id.index()]
    }

    pub fn name(&self, id: SignalId) -> &str {
        &self.signals[id.index()].name
    }

    pub fn width(&self, id: SignalId) -> usize {
        self.signals[id.index()].width
    }

    pub fn lookup(&self, name: &str) -> Option<SignalId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalId, &SignalDecl)> {
        self.signals
            .iter()
            .enumerate()
            .map(|(index, decl)| (SignalId::from_index(index), decl))
    }

    pub fn add_registered(&mut self, name: impl Into<String>, width: usize, reset: Bits) -> SignalId {
        let reset = reset.resize(width);
        self.push(name.into(), width, Drive::Registered { reset })
    }

    pub fn add_input(&mut self, name: impl Into<String>, width: usize) -> SignalId {
        self.push(name.into(), width, Drive::Input)
    }

    pub fn add_comb(&mut self, name: impl Into<String>, width: usize, expr: Expr) -> SignalId {
        self.push(name.into(), width, Drive::Comb(expr))
    }

    /// Initial value of every signal: reset values for registered state, zero elsewhere.
    pub fn initial_values(&self) -> Vec<Bits> {
        self.signals
            .iter()
            .map(|decl| match &decl.drive {
                Drive::Registered { reset } => reset.clone(),
                _ => Bits::zero(decl.width),
            })
            .collect()
    }

    /// Value of `id` given the stored values of registered and input signals.
    ///
    /// Combinational signals are evaluated on demand, so the result always reflects `values`
    /// as it is right now.
    pub fn eval(&self, values: &[Bits], id: SignalId) -> Bits {
        let decl = &self.signals[id.index()];
        match &decl.drive {
            Drive::Registered { .. } | Drive::Input => values[id.index()].clone(),
            Drive::Comb(expr) => self.eval_expr(values, expr).resize(decl.width),
        }
    }

    fn eval_expr(&self, values: &[Bits], expr: &Expr) -> Bits {
        match expr {
            Expr::Slice {
                source,
                offset,
                width,
            } => self.eval(values, *source).slice(*offset, *width),
            Expr::Gate { value, strobe } => {
                let value = self.eval(values, *value);
                let strobe = self.eval(values, *strobe).bit(0);
                value.and(&Bits::replicate(strobe, value.width()))
            }
            Expr::Concat(operands) => {
                let widths: Vec<usize> = operands
                    .iter()
                    .map(|operand| match operand {
                        Operand::Signal(id) => self.width(*id),
                        Operand::Zero(width) => *width,
                    })
                    .collect();
                let mut out = Bits::zero(widths.iter().sum());
                let mut offset = 0;
                for (operand, width) in operands.iter().zip(widths) {
                    if let Operand::Signal(id) = operand {
                        out.insert(offset, &self.eval(values, *id));
                    }
                    offset += width;
                }
                out
            }
        }
    }

    fn push(&mut self, name: String, width: usize, drive: Drive) -> SignalId {
        let id = SignalId::from_index(self.signals.len());
        self.by_name.insert(name.clone(), id);
        self.signals.push(SignalDecl { name, width, drive });
        id
    }
}
