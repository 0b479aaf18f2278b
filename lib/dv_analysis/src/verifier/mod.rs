//! Dalvik bytecode method verifier.
//!
//! Given a decoded method and a [`ClassPath`], the verifier computes, for
//! every instruction and every virtual register, the abstract register types
//! that may hold just before and just after that instruction executes, and
//! validates every instruction's operands against the Dalvik type system.
//!
//! The analysis is a forward worklist fixed point over per-instruction
//! nodes: the control flow graph is built first (fallthrough, branches,
//! switch tables, exception edges), then register types are seeded from the
//! method signature into a synthetic start-of-method node and propagated
//! until quiescence, re-verifying every instruction whose input types grew.

mod checks;
pub mod insn;

#[cfg(test)]
mod tests;

use crate::classpath::ClassPath;
use crate::errors::{AnalysisError, AnalysisResult};
use crate::regtype::{Category, RegisterType};
use dv_dex::code::CodeItem;
use dv_dex::instrs::{Instr, Instruction, LabeledInstr};
use dv_dex::methods::EncodedMethod;
use dv_dex::registers::Reg;
use dv_dex::Addr;
use insn::{AnalyzedInstruction, NodeId};
use std::collections::{BTreeMap, BTreeSet};

macro_rules! invalid {
    ( $addr:expr, $($arg:tt)* ) => {
        return Err(crate::errors::VerifyError::new($addr, format!($($arg)*)).into())
    };
}
pub(crate) use invalid;

/// Allocation site recorded for the uninitialized `this` of a constructor.
/// No `new-instance` can sit at this address, so the constructor's own
/// instance never compares equal to one it allocates.
const ENTRY_UNINIT_SITE: Addr = Addr(usize::MAX);

/// The result of a successful analysis: one node per instruction, in code
/// order, exposing its pre/post register type vectors.
#[derive(Debug)]
pub struct Verification {
    instructions: Vec<AnalyzedInstruction>,
}

impl Verification {
    #[must_use]
    pub fn instructions_count(&self) -> usize {
        self.instructions.len()
    }

    #[must_use]
    pub fn instruction(&self, index: usize) -> &AnalyzedInstruction {
        &self.instructions[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalyzedInstruction> {
        self.instructions.iter()
    }
}

/// Whole-method verifier state.
pub struct MethodAnalyzer<'a> {
    method: &'a EncodedMethod,
    code: &'a CodeItem,
    classpath: &'a ClassPath,
    entry: AnalyzedInstruction,
    insns: Vec<AnalyzedInstruction>,
    addresses: BTreeMap<Addr, usize>,
    to_verify: BTreeSet<usize>,
}

impl<'a> MethodAnalyzer<'a> {
    /// Builds the node arena and the control flow graph for the given
    /// method.
    ///
    /// # Errors
    ///
    /// Fails with a validation error if the instruction stream is malformed
    /// (fallthrough past the last instruction, branch to a non-instruction
    /// address, missing switch payload, stray edge into `move-exception`).
    pub fn new(method: &'a EncodedMethod, classpath: &'a ClassPath) -> AnalysisResult<Self> {
        let code = method.code().ok_or(AnalysisError::NoCode)?;
        if code.instructions_count() == 0 {
            return Err(AnalysisError::NoCode);
        }

        let register_count = code.registers_size();
        let mut insns = Vec::with_capacity(code.instructions_count());
        let mut addresses = BTreeMap::new();
        for (i, linstr) in code.iter_instructions().enumerate() {
            addresses.insert(linstr.addr(), i);
            insns.push(AnalyzedInstruction::new(linstr.clone(), register_count));
        }

        let mut analyzer = Self {
            method,
            code,
            classpath,
            entry: AnalyzedInstruction::entry(register_count),
            insns,
            addresses,
            to_verify: BTreeSet::new(),
        };

        let handlers = analyzer.exception_handlers()?;
        analyzer.build_edges(&handlers)?;
        Ok(analyzer)
    }

    /// Runs the fixed-point analysis.
    ///
    /// # Errors
    ///
    /// Fails with a validation error on semantically invalid bytecode, and
    /// with a resolution error when a referenced descriptor is unknown to
    /// the classpath.
    pub fn analyze(mut self) -> AnalysisResult<Verification> {
        self.seed_entry_state()?;

        self.to_verify = self.entry.successors().collect();
        let mut analyzed: BTreeSet<usize> = BTreeSet::new();

        while let Some(i) = self.to_verify.pop_first() {
            log::trace!(
                "verifying {} at {:#06x}",
                self.insns[i].instr().map_or("?", Instruction::mnemonic),
                self.addr_of(i).0
            );
            self.verify_instruction(i)?;
            analyzed.insert(i);
            // first visits drive the analysis forward even when no register
            // changed; later visits are change-driven only
            let successors: Vec<usize> = self.insns[i].successors().collect();
            for s in successors {
                if !analyzed.contains(&s) {
                    self.to_verify.insert(s);
                }
            }
        }

        let register_count = self.code.registers_size();
        let mut pre_maps = Vec::with_capacity(self.insns.len());
        for i in 0..self.insns.len() {
            let mut pre = Vec::with_capacity(register_count);
            for r in 0..register_count {
                pre.push(self.merged_pre_type(i, Reg::from(r as u16))?);
            }
            pre_maps.push(pre);
        }
        for (node, pre) in self.insns.iter_mut().zip(pre_maps) {
            node.set_pre_register_types(pre);
        }

        Ok(Verification {
            instructions: self.insns,
        })
    }

    /// Writes the method entry state: the `this` register for non-static
    /// methods and the declared parameter types, wide parameters occupying
    /// two consecutive registers.
    fn seed_entry_state(&mut self) -> AnalysisResult<()> {
        let total_registers = self.code.registers_size();
        let param_registers = self.method.proto.parameter_register_count();
        let is_static = self.method.flags().is_static();
        let this_registers = usize::from(!is_static);

        if !is_static && total_registers == 0 {
            invalid!(
                Addr::entry(),
                "A non-static method must have at least 1 register"
            );
        }
        if total_registers < param_registers + this_registers {
            invalid!(
                Addr::entry(),
                "The method declares {} registers but its parameters require {}",
                total_registers,
                param_registers + this_registers
            );
        }

        if !is_static {
            let this_register = Reg::from((total_registers - param_registers - 1) as u16);
            if self.method.flags().is_constructor() {
                if self.method.name != "<init>" {
                    invalid!(
                        Addr::entry(),
                        "The constructor flag can only be used with an <init> method."
                    );
                }
                let this_type =
                    RegisterType::uninitialized(self.method.definer.clone(), ENTRY_UNINIT_SITE);
                self.set_register_and_propagate(NodeId::Entry, this_register, this_type)?;
            } else {
                if self.method.name == "<init>" {
                    invalid!(
                        Addr::entry(),
                        "An <init> method must have the \"constructor\" access flag"
                    );
                }
                let this_type = RegisterType::reference(self.method.definer.clone());
                self.set_register_and_propagate(NodeId::Entry, this_register, this_type)?;
            }
        }

        let parameters = self.method.proto.parameters.clone();
        let mut reg = total_registers - param_registers;
        for parameter in &parameters {
            let t = RegisterType::for_type(parameter)?;
            if parameter.is_wide() {
                let hi = t.wide_high();
                self.set_register_and_propagate(NodeId::Entry, Reg::from(reg as u16), t)?;
                self.set_register_and_propagate(NodeId::Entry, Reg::from((reg + 1) as u16), hi)?;
                reg += 2;
            } else {
                self.set_register_and_propagate(NodeId::Entry, Reg::from(reg as u16), t)?;
                reg += 1;
            }
        }
        Ok(())
    }

    // ---- control flow graph -------------------------------------------------

    fn index_at(&self, addr: Addr) -> AnalysisResult<usize> {
        self.addresses.get(&addr).copied().ok_or_else(|| {
            crate::errors::VerifyError::new(addr, format!("No instruction at code address {addr:#x}"))
                .into()
        })
    }

    fn addr_of(&self, idx: usize) -> Addr {
        self.insns[idx].addr().unwrap_or_else(Addr::entry)
    }

    /// For each instruction, the handler entry points covering it. Only
    /// instructions whose opcode can throw are exception sources.
    fn exception_handlers(&self) -> AnalysisResult<Vec<Vec<usize>>> {
        let mut table = vec![Vec::new(); self.insns.len()];
        for (i, node) in self.insns.iter().enumerate() {
            let Some(linstr) = node.instr() else { continue };
            if !linstr.can_throw() {
                continue;
            }
            for try_ in self.code.iter_tries() {
                if !try_.covers(linstr.addr()) {
                    continue;
                }
                let mut handlers = Vec::new();
                for handler in try_.iter_handlers() {
                    handlers.push(self.index_at(handler.catch_addr())?);
                }
                if let Some(addr) = try_.catch_all_addr() {
                    handlers.push(self.index_at(addr)?);
                }
                table[i] = handlers;
                break;
            }
        }
        Ok(table)
    }

    fn build_edges(&mut self, handlers: &[Vec<usize>]) -> AnalysisResult<()> {
        self.add_predecessor_successor(NodeId::Entry, 0, handlers, false)?;

        for i in 0..self.insns.len() {
            let Some(linstr) = self.insns[i].instr().cloned() else {
                continue;
            };
            let addr = linstr.addr();

            if linstr.can_continue() {
                if i == self.insns.len() - 1 {
                    invalid!(addr, "Execution can continue past the last instruction");
                }
                self.add_predecessor_successor(NodeId::Insn(i), i + 1, handlers, false)?;
            }

            match linstr.instr() {
                Instr::Goto(offset) => {
                    let target = self.index_at(addr.offset(i32::from(*offset)))?;
                    self.add_predecessor_successor(NodeId::Insn(i), target, handlers, false)?;
                }
                Instr::Goto16(offset) => {
                    let target = self.index_at(addr.offset(i32::from(*offset)))?;
                    self.add_predecessor_successor(NodeId::Insn(i), target, handlers, false)?;
                }
                Instr::Goto32(offset) => {
                    let target = self.index_at(addr.offset(*offset))?;
                    self.add_predecessor_successor(NodeId::Insn(i), target, handlers, false)?;
                }

                Instr::IfEq(_, _, offset)
                | Instr::IfNe(_, _, offset)
                | Instr::IfLt(_, _, offset)
                | Instr::IfGe(_, _, offset)
                | Instr::IfGt(_, _, offset)
                | Instr::IfLe(_, _, offset)
                | Instr::IfEqz(_, offset)
                | Instr::IfNez(_, offset)
                | Instr::IfLtz(_, offset)
                | Instr::IfGez(_, offset)
                | Instr::IfGtz(_, offset)
                | Instr::IfLez(_, offset) => {
                    let target = self.index_at(addr.offset(i32::from(*offset)))?;
                    self.add_predecessor_successor(NodeId::Insn(i), target, handlers, false)?;
                }

                Instr::PackedSwitch(_, offset) => {
                    let payload_addr = addr.offset(*offset);
                    let payload_idx = self.index_at(payload_addr)?;
                    let Some(Instr::PackedSwitchPayload(_, targets)) =
                        self.insns[payload_idx].instr().map(LabeledInstr::instr)
                    else {
                        invalid!(
                            addr,
                            "There is no packed-switch-payload structure at code address {payload_addr:#x}"
                        );
                    };
                    for target_offset in targets.clone() {
                        let target = self.index_at(addr.offset(target_offset))?;
                        self.add_predecessor_successor(NodeId::Insn(i), target, handlers, false)?;
                    }
                }
                Instr::SparseSwitch(_, offset) => {
                    let payload_addr = addr.offset(*offset);
                    let payload_idx = self.index_at(payload_addr)?;
                    let Some(Instr::SparseSwitchPayload(_, targets)) =
                        self.insns[payload_idx].instr().map(LabeledInstr::instr)
                    else {
                        invalid!(
                            addr,
                            "There is no sparse-switch-payload structure at code address {payload_addr:#x}"
                        );
                    };
                    for target_offset in targets.clone() {
                        let target = self.index_at(addr.offset(target_offset))?;
                        self.add_predecessor_successor(NodeId::Insn(i), target, handlers, false)?;
                    }
                }

                _ => {}
            }
        }
        Ok(())
    }

    /// Links `pred -> succ`, and since `succ` may throw before executing,
    /// also links `pred` to every handler covering `succ`. Handler edges are
    /// transitive only along try coverage, not through the handlers' own
    /// successors.
    ///
    /// `monitor-exit` throws *after* it executes; its handler edges are
    /// nevertheless built like every other throwing instruction's, which is
    /// conservative.
    fn add_predecessor_successor(
        &mut self,
        pred: NodeId,
        succ: usize,
        handlers: &[Vec<usize>],
        allow_move_exception: bool,
    ) -> AnalysisResult<()> {
        let succ_addr = self.addr_of(succ);
        if !allow_move_exception
            && matches!(
                self.insns[succ].instr().map(LabeledInstr::instr),
                Some(Instr::MoveException(_))
            )
        {
            match pred {
                NodeId::Insn(p) => {
                    invalid!(
                        succ_addr,
                        "Execution can pass from the {} instruction at code address {:#x} to the move-exception instruction at address {:#x}",
                        self.insns[p].instr().map_or("?", Instruction::mnemonic),
                        self.addr_of(p).0,
                        succ_addr.0
                    );
                }
                NodeId::Entry => {
                    invalid!(
                        succ_addr,
                        "move-exception must be the first instruction in an exception handler block"
                    );
                }
            }
        }

        let inserted = match pred {
            NodeId::Entry => self.entry.add_successor(succ),
            NodeId::Insn(p) => self.insns[p].add_successor(succ),
        };
        if !inserted {
            return Ok(());
        }
        self.insns[succ].add_predecessor(pred);

        for handler in handlers[succ].clone() {
            self.add_predecessor_successor(pred, handler, handlers, true)?;
        }
        Ok(())
    }

    // ---- propagation engine -------------------------------------------------

    fn node(&self, id: NodeId) -> &AnalyzedInstruction {
        match id {
            NodeId::Entry => &self.entry,
            NodeId::Insn(i) => &self.insns[i],
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut AnalyzedInstruction {
        match id {
            NodeId::Entry => &mut self.entry,
            NodeId::Insn(i) => &mut self.insns[i],
        }
    }

    /// The join of the post type of `r` across all predecessors of node
    /// `idx`.
    pub(crate) fn merged_pre_type(&self, idx: usize, r: Reg) -> AnalysisResult<RegisterType> {
        let mut merged = RegisterType::UNKNOWN;
        for pred in self.insns[idx].predecessors() {
            let t = self.node(pred).post_register_type(r).ok_or_else(|| {
                AnalysisError::Internal(format!("register {r} out of post map bounds"))
            })?;
            merged = merged.merge(t, self.classpath)?;
        }
        Ok(merged)
    }

    /// Writes `t` as the post type of `r` at the given node and pushes the
    /// change through the graph: every successor that does not itself write
    /// `r` recomputes its merged pre type, republishes it, and is queued for
    /// re-verification if it changed.
    pub(crate) fn set_register_and_propagate(
        &mut self,
        id: NodeId,
        r: Reg,
        t: RegisterType,
    ) -> AnalysisResult<()> {
        let changed = self
            .node_mut(id)
            .set_post_register_type(r, &t)
            .ok_or_else(|| {
                AnalysisError::Internal(format!("register {r} out of post map bounds"))
            })?;
        if !changed {
            return Ok(());
        }

        let mut changed_nodes = BTreeSet::new();
        self.propagate_to_successors(id, r, &mut changed_nodes)?;
        while let Some(i) = changed_nodes.pop_first() {
            self.propagate_to_successors(NodeId::Insn(i), r, &mut changed_nodes)?;
        }
        Ok(())
    }

    fn propagate_to_successors(
        &mut self,
        from: NodeId,
        r: Reg,
        changed_nodes: &mut BTreeSet<usize>,
    ) -> AnalysisResult<()> {
        let from_is_init = self.node(from).is_invoke_init();
        let successors: Vec<usize> = self.node(from).successors().collect();
        for succ in successors {
            if self.insns[succ].sets_register(r) {
                // the destination write shadows whatever the predecessors
                // hold
                continue;
            }
            let merged = self.merged_pre_type(succ, r)?;
            if merged.category == Category::UninitRef && from_is_init {
                // the <init> call consumes the uninitialized instance; its
                // own verification pushes the initialized value instead
                continue;
            }
            let changed = self.insns[succ]
                .set_post_register_type(r, &merged)
                .ok_or_else(|| {
                    AnalysisError::Internal(format!("register {r} out of post map bounds"))
                })?;
            if changed {
                changed_nodes.insert(succ);
                self.to_verify.insert(succ);
            }
        }
        Ok(())
    }
}
