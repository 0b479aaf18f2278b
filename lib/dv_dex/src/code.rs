//! Method code items and their try/catch descriptions.

use crate::addr::Addr;
use crate::errors::{DexError, DexResult};
use crate::instrs::{Instr, Instruction, LabeledInstr};
use crate::types::Type;

/// The code of a concrete method: register frame size, addressed
/// instructions and try/catch descriptions.
#[derive(Debug, Clone)]
pub struct CodeItem {
    registers_size: usize,
    insns: Vec<LabeledInstr>,
    tries: Vec<TryItem>,
}

impl CodeItem {
    /// Builds a code item from a plain instruction list, assigning each
    /// instruction its code address by accumulating instruction sizes from
    /// address 0.
    #[must_use]
    pub fn new(registers_size: usize, instrs: Vec<Instr>, tries: Vec<TryItem>) -> Self {
        let mut addr = Addr::entry();
        let insns = instrs
            .into_iter()
            .map(|instr| {
                let linstr = LabeledInstr { addr, instr };
                addr = Addr(addr.0 + linstr.size());
                linstr
            })
            .collect();
        Self {
            registers_size,
            insns,
            tries,
        }
    }

    #[inline]
    #[must_use]
    pub const fn registers_size(&self) -> usize {
        self.registers_size
    }

    #[inline]
    #[must_use]
    pub fn instructions_count(&self) -> usize {
        self.insns.len()
    }

    #[inline]
    pub fn iter_instructions(&self) -> impl Iterator<Item = &LabeledInstr> {
        self.insns.iter()
    }

    #[inline]
    pub fn instruction_at(&self, addr: Addr) -> DexResult<&LabeledInstr> {
        let index = self
            .insns
            .binary_search_by(|probe| probe.addr().cmp(&addr))
            .map_err(|_| DexError::InstructionNotFound(addr))?;
        Ok(&self.insns[index])
    }

    #[inline]
    pub fn iter_tries(&self) -> impl Iterator<Item = &TryItem> {
        self.tries.iter()
    }
}

/// A protected code range with its catch handlers.
#[derive(Debug, Clone)]
pub struct TryItem {
    start_addr: usize,
    insn_count: usize,
    handlers: Vec<CatchHandler>,
    catch_all_addr: Option<usize>,
}

impl TryItem {
    #[must_use]
    pub fn new(
        start_addr: usize,
        insn_count: usize,
        handlers: Vec<CatchHandler>,
        catch_all_addr: Option<usize>,
    ) -> Self {
        Self {
            start_addr,
            insn_count,
            handlers,
            catch_all_addr,
        }
    }

    #[inline]
    #[must_use]
    pub const fn start_addr(&self) -> Addr {
        Addr(self.start_addr)
    }

    #[inline]
    #[must_use]
    pub const fn insn_count(&self) -> usize {
        self.insn_count
    }

    #[inline]
    #[must_use]
    pub const fn end_addr(&self) -> Addr {
        Addr(self.start_addr + self.insn_count)
    }

    /// Checks whether the given address lies inside the protected range.
    #[inline]
    #[must_use]
    pub const fn covers(&self, addr: Addr) -> bool {
        self.start_addr <= addr.0 && addr.0 < self.start_addr + self.insn_count
    }

    #[inline]
    pub fn iter_handlers(&self) -> impl Iterator<Item = &CatchHandler> {
        self.handlers.iter()
    }

    #[inline]
    #[must_use]
    pub const fn catch_all_addr(&self) -> Option<Addr> {
        match self.catch_all_addr {
            Some(a) => Some(Addr(a)),
            None => None,
        }
    }
}

/// A typed catch clause: caught exception type and handler address.
#[derive(Debug, Clone)]
pub struct CatchHandler {
    exception: Type,
    addr: usize,
}

impl CatchHandler {
    #[must_use]
    pub fn new(exception: Type, addr: usize) -> Self {
        Self { exception, addr }
    }

    #[inline]
    #[must_use]
    pub const fn catch_type(&self) -> &Type {
        &self.exception
    }

    #[inline]
    #[must_use]
    pub const fn catch_addr(&self) -> Addr {
        Addr(self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::Reg;

    #[test]
    fn addressing_walk() {
        let code = CodeItem::new(
            2,
            vec![
                Instr::Const4(Reg::new(0), 1),       // addr 0, 1 unit
                Instr::Const16(Reg::new(1), 300),    // addr 1, 2 units
                Instr::ConstWide(Reg::new(0), 1),    // addr 3, 5 units
                Instr::ReturnVoid,                      // addr 8
            ],
            vec![],
        );
        let addrs: Vec<usize> = code.iter_instructions().map(|l| l.addr().0).collect();
        assert_eq!(addrs, vec![0, 1, 3, 8]);

        assert!(code.instruction_at(Addr(3)).is_ok());
        assert!(code.instruction_at(Addr(2)).is_err());
    }

    #[test]
    fn try_coverage() {
        let try_ = TryItem::new(2, 3, vec![], Some(9));
        assert!(!try_.covers(Addr(1)));
        assert!(try_.covers(Addr(2)));
        assert!(try_.covers(Addr(4)));
        assert!(!try_.covers(Addr(5)));
        assert_eq!(try_.end_addr(), Addr(5));
        assert_eq!(try_.catch_all_addr(), Some(Addr(9)));
    }
}
