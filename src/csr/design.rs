//! A design is the set of registers elaborated together, sharing one netlist.

use ahash::AHashMap;
use log::debug;

use super::doc::RegisterDoc;
use super::error::{CsrError, CsrResult};
use super::register::{Register, RegisterBuilder};
use super::signal::Netlist;

#[derive(Debug, Default)]
pub struct Design {
    netlist: Netlist,
    registers: Vec<Register>,
    by_name: AHashMap<String, usize>,
}

impl Design {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elaborates one register. Register names must be unique within the design.
    pub fn define(&mut self, builder: RegisterBuilder) -> CsrResult<&Register> {
        if let Some(name) = builder.register_name()
            && self.by_name.contains_key(name)
        {
            return Err(CsrError::DuplicateRegister {
                name: name.to_string(),
            });
        }
        let register = Register::define(&mut self.netlist, builder)?;
        let index = self.registers.len();
        self.by_name.insert(register.name().to_string(), index);
        self.registers.push(register);
        debug!("design now holds {} register(s)", self.registers.len());
        Ok(&self.registers[index])
    }

    pub fn netlist(&self) -> &Netlist {
        &self.netlist
    }

    pub fn register(&self, name: &str) -> CsrResult<&Register> {
        self.by_name
            .get(name)
            .map(|&index| &self.registers[index])
            .ok_or_else(|| CsrError::UnknownRegister(name.to_string()))
    }

    /// Registers in definition order.
    pub fn registers(&self) -> &[Register] {
        &self.registers
    }

    pub(crate) fn index_of(&self, name: &str) -> CsrResult<usize> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| CsrError::UnknownRegister(name.to_string()))
    }

    /// Structural metadata for the documentation generator.
    pub fn documentation(&self) -> Vec<RegisterDoc> {
        self.registers.iter().map(RegisterDoc::from_register).collect()
    }
}
