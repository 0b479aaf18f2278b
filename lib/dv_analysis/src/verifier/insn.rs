//! Per-instruction analysis nodes.

use crate::regtype::RegisterType;
use dv_dex::instrs::{Instr, LabeledInstr};
use dv_dex::registers::Reg;
use dv_dex::Addr;
use std::collections::BTreeSet;

/// Identifies a node of the analyzed method: either a real instruction, or
/// the synthetic node that precedes the first instruction and carries the
/// method entry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeId {
    Entry,
    Insn(usize),
}

/// An instruction together with its control-flow neighbours and the register
/// types holding after it executes.
///
/// The pre-instruction register types are defined as the lattice join of the
/// post types of all predecessors; they are materialized once the analysis
/// reaches its fixed point.
#[derive(Debug)]
pub struct AnalyzedInstruction {
    instr: Option<LabeledInstr>,
    predecessors: BTreeSet<NodeId>,
    successors: BTreeSet<usize>,
    pre_regs: Vec<RegisterType>,
    post_regs: Vec<RegisterType>,
}

impl AnalyzedInstruction {
    pub(crate) fn new(instr: LabeledInstr, register_count: usize) -> Self {
        Self {
            instr: Some(instr),
            predecessors: BTreeSet::new(),
            successors: BTreeSet::new(),
            pre_regs: vec![RegisterType::UNKNOWN; register_count],
            post_regs: vec![RegisterType::UNKNOWN; register_count],
        }
    }

    /// The synthetic start-of-method node: no instruction, writes no
    /// register, and its post map is the method entry state.
    pub(crate) fn entry(register_count: usize) -> Self {
        Self {
            instr: None,
            predecessors: BTreeSet::new(),
            successors: BTreeSet::new(),
            pre_regs: vec![RegisterType::UNKNOWN; register_count],
            post_regs: vec![RegisterType::UNKNOWN; register_count],
        }
    }

    #[inline]
    #[must_use]
    pub fn instr(&self) -> Option<&LabeledInstr> {
        self.instr.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn addr(&self) -> Option<Addr> {
        self.instr.as_ref().map(LabeledInstr::addr)
    }

    pub fn predecessors(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.predecessors.iter().copied()
    }

    pub fn successors(&self) -> impl Iterator<Item = usize> + '_ {
        self.successors.iter().copied()
    }

    pub(crate) fn add_successor(&mut self, idx: usize) -> bool {
        self.successors.insert(idx)
    }

    pub(crate) fn add_predecessor(&mut self, id: NodeId) -> bool {
        self.predecessors.insert(id)
    }

    /// Whether this node writes the given register (counting the high half
    /// of wide destinations). Always false for the entry node.
    #[must_use]
    pub fn sets_register(&self, r: Reg) -> bool {
        self.instr
            .as_ref()
            .map_or(false, |linstr| linstr.instr().sets_register(r))
    }

    /// The register written by this node, if any.
    #[must_use]
    pub fn destination(&self) -> Option<Reg> {
        self.instr
            .as_ref()
            .and_then(|linstr| linstr.instr().destination())
    }

    /// Whether this node is an `invoke-direct` of an `<init>` method.
    #[must_use]
    pub fn is_invoke_init(&self) -> bool {
        match self.instr.as_ref().map(LabeledInstr::instr) {
            Some(Instr::InvokeDirect(_, method) | Instr::InvokeDirectRange(_, method)) => {
                method.is_init()
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn post_register_type(&self, r: Reg) -> Option<&RegisterType> {
        self.post_regs.get(usize::from(r.value()))
    }

    /// Records the register type holding for `r` after this node. The values
    /// written here are joins computed by the caller (the verifier for
    /// destinations, the propagation engine for everything else), so the
    /// update is a plain replacement with change detection.
    pub(crate) fn set_post_register_type(&mut self, r: Reg, t: &RegisterType) -> Option<bool> {
        let slot = self.post_regs.get_mut(usize::from(r.value()))?;
        if slot == t {
            Some(false)
        } else {
            *slot = t.clone();
            Some(true)
        }
    }

    /// The register types holding just before this instruction, after the
    /// analysis reached its fixed point.
    #[must_use]
    pub fn pre_register_types(&self) -> &[RegisterType] {
        &self.pre_regs
    }

    /// The register types holding just after this instruction, after the
    /// analysis reached its fixed point.
    #[must_use]
    pub fn post_register_types(&self) -> &[RegisterType] {
        &self.post_regs
    }

    pub(crate) fn set_pre_register_types(&mut self, types: Vec<RegisterType>) {
        self.pre_regs = types;
    }
}
