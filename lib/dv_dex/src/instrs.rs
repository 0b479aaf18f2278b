//! The Dalvik instruction set.
//!
//! Each instruction carries its operands directly: registers, literals, and
//! resolved type/field/method references. The static opcode attributes the
//! analyses rely on (`size`, `can_throw`, `can_continue`, `sets_result`,
//! `sets_wide_register`, destination register) are exposed as methods.

use crate::addr::Addr;
use crate::methods::{FieldRef, MethodRef};
use crate::registers::{Reg, RegList, RegRange};
use crate::types::Type;

/// Static attributes shared by addressed and bare instructions.
pub trait Instruction {
    /// The Dalvik mnemonic, e.g. `move-wide/from16`.
    fn mnemonic(&self) -> &'static str;
    /// Instruction size in 16-bit code units.
    fn size(&self) -> usize;
    /// Whether executing the instruction can raise an exception.
    fn can_throw(&self) -> bool;
    /// Whether execution can fall through to the next instruction.
    fn can_continue(&self) -> bool;
    /// Whether the instruction leaves a result readable by `move-result*`.
    fn sets_result(&self) -> bool;
    /// Whether the instruction writes a register pair.
    fn sets_wide_register(&self) -> bool;
}

/// An instruction labeled with its code address.
#[derive(Debug, Clone)]
pub struct LabeledInstr {
    pub(crate) addr: Addr,
    pub(crate) instr: Instr,
}

impl Instruction for LabeledInstr {
    #[inline]
    fn mnemonic(&self) -> &'static str {
        self.instr.mnemonic()
    }

    #[inline]
    fn size(&self) -> usize {
        self.instr.size()
    }

    #[inline]
    fn can_throw(&self) -> bool {
        self.instr.can_throw()
    }

    #[inline]
    fn can_continue(&self) -> bool {
        self.instr.can_continue()
    }

    #[inline]
    fn sets_result(&self) -> bool {
        self.instr.sets_result()
    }

    #[inline]
    fn sets_wide_register(&self) -> bool {
        self.instr.sets_wide_register()
    }
}

impl LabeledInstr {
    #[inline]
    #[must_use]
    pub const fn addr(&self) -> Addr {
        self.addr
    }

    #[inline]
    #[must_use]
    pub const fn instr(&self) -> &Instr {
        &self.instr
    }

    #[inline]
    #[must_use]
    pub fn next_addr(&self) -> Addr {
        self.addr().offset(self.instr().size() as i32)
    }
}

#[derive(Debug, Clone)]
pub enum Instr {
    /// Does nothing; also serves as filler in front of aligned payloads.
    Nop,

    /// Copy a 32-bit non-reference value between registers. The `/from16`
    /// and `/16` forms only widen the operand encoding.
    Move(Reg, Reg),
    Move16(Reg, Reg),
    MoveFrom16(Reg, Reg),

    /// Copy a 64-bit value held in a register pair.
    MoveWide(Reg, Reg),
    MoveWide16(Reg, Reg),
    MoveWideFrom16(Reg, Reg),

    /// Copy an object reference.
    MoveObject(Reg, Reg),
    MoveObject16(Reg, Reg),
    MoveObjectFrom16(Reg, Reg),

    /// Pick up the value left by the directly preceding `invoke-*` or
    /// `filled-new-array`.
    MoveResult(Reg),
    MoveResultWide(Reg),
    MoveResultObject(Reg),

    /// Pick up the exception that was just caught; legal only as the entry
    /// instruction of a handler.
    MoveException(Reg),

    /// Leave the method, handing back nothing, a 32-bit value, a register
    /// pair, or a reference.
    ReturnVoid,
    Return(Reg),
    ReturnWide(Reg),
    ReturnObject(Reg),

    /// Load a sign-extended integer literal.
    Const4(Reg, i8),
    Const16(Reg, i16),
    Const(Reg, i32),
    /// Load a literal into the upper 16 bits of a register, zeroing the
    /// rest.
    ConstHigh16(Reg, i16),
    /// Load a 64-bit literal into a register pair.
    ConstWide16(Reg, i16),
    ConstWide32(Reg, i32),
    ConstWide(Reg, i64),
    ConstWideHigh16(Reg, i16),
    /// Load a reference to an interned string.
    ConstString(Reg, String),
    ConstStringJumbo(Reg, String),
    /// Load the `java/lang/Class` instance describing the named type.
    ConstClass(Reg, Type),

    /// Take, respectively release, an object's monitor.
    MonitorEnter(Reg),
    MonitorExit(Reg),

    /// Fail at runtime unless the reference conforms to the named type;
    /// afterwards the register is known to hold that type.
    CheckCast(Reg, Type),
    /// Test a reference against the named type, producing 0 or 1.
    InstanceOf(Reg, Reg, Type),
    /// Read the element count of an array.
    ArrayLength(Reg, Reg),

    /// Allocate a raw object of the named class; it stays unusable until an
    /// `<init>` has run on it.
    NewInstance(Reg, Type),
    /// Allocate an array whose length comes from a register.
    NewArray(Reg, Reg, Type),
    /// Allocate an array populated from the given registers; the reference
    /// is retrieved with a following `move-result-object`.
    FilledNewArray(RegList, Type),
    FilledNewArrayRange(RegRange, Type),
    /// Copy the element data embedded at the given payload offset into a
    /// primitive array.
    FillArrayData(Reg, i32),

    Throw(Reg),

    /// Unconditional jump; the three forms differ in branch reach.
    Goto(i8),
    Goto16(i16),
    Goto32(i32),

    /// Multi-way branch driven by the table at the given payload offset:
    /// consecutive keys (packed) or explicit key/target pairs (sparse).
    PackedSwitch(Reg, i32),
    SparseSwitch(Reg, i32),

    /// Three-way comparison producing -1, 0 or 1; the `l`/`g` variants
    /// choose how NaN operands order.
    CmplFloat(Reg, Reg, Reg),
    CmpgFloat(Reg, Reg, Reg),
    CmplDouble(Reg, Reg, Reg),
    CmpgDouble(Reg, Reg, Reg),
    CmpLong(Reg, Reg, Reg),

    /// Branch when the comparison of the two registers holds.
    IfEq(Reg, Reg, i16),
    IfNe(Reg, Reg, i16),
    IfLt(Reg, Reg, i16),
    IfGe(Reg, Reg, i16),
    IfGt(Reg, Reg, i16),
    IfLe(Reg, Reg, i16),
    /// Branch when the register compares against zero (or null).
    IfEqz(Reg, i16),
    IfNez(Reg, i16),
    IfLtz(Reg, i16),
    IfGez(Reg, i16),
    IfGtz(Reg, i16),
    IfLez(Reg, i16),

    /// Load an array element (`dst, array, index`); one opcode per element
    /// kind.
    Aget(Reg, Reg, Reg),
    AgetWide(Reg, Reg, Reg),
    AgetObject(Reg, Reg, Reg),
    AgetBoolean(Reg, Reg, Reg),
    AgetByte(Reg, Reg, Reg),
    AgetChar(Reg, Reg, Reg),
    AgetShort(Reg, Reg, Reg),
    /// Store an array element (`src, array, index`).
    Aput(Reg, Reg, Reg),
    AputWide(Reg, Reg, Reg),
    AputObject(Reg, Reg, Reg),
    AputBoolean(Reg, Reg, Reg),
    AputByte(Reg, Reg, Reg),
    AputChar(Reg, Reg, Reg),
    AputShort(Reg, Reg, Reg),

    /// Load an instance field (`dst, object, field`).
    Iget(Reg, Reg, FieldRef),
    IgetWide(Reg, Reg, FieldRef),
    IgetObject(Reg, Reg, FieldRef),
    IgetBoolean(Reg, Reg, FieldRef),
    IgetByte(Reg, Reg, FieldRef),
    IgetChar(Reg, Reg, FieldRef),
    IgetShort(Reg, Reg, FieldRef),
    /// Store an instance field (`src, object, field`).
    Iput(Reg, Reg, FieldRef),
    IputWide(Reg, Reg, FieldRef),
    IputObject(Reg, Reg, FieldRef),
    IputBoolean(Reg, Reg, FieldRef),
    IputByte(Reg, Reg, FieldRef),
    IputChar(Reg, Reg, FieldRef),
    IputShort(Reg, Reg, FieldRef),

    /// Load a static field (`dst, field`).
    Sget(Reg, FieldRef),
    SgetWide(Reg, FieldRef),
    SgetObject(Reg, FieldRef),
    SgetBoolean(Reg, FieldRef),
    SgetByte(Reg, FieldRef),
    SgetChar(Reg, FieldRef),
    SgetShort(Reg, FieldRef),
    /// Store a static field (`src, field`).
    Sput(Reg, FieldRef),
    SputWide(Reg, FieldRef),
    SputObject(Reg, FieldRef),
    SputBoolean(Reg, FieldRef),
    SputByte(Reg, FieldRef),
    SputChar(Reg, FieldRef),
    SputShort(Reg, FieldRef),

    /// Call the referenced method; the receiver (if any) comes first in
    /// the argument registers. `direct` serves constructors and private
    /// methods, `super` dispatches through the superclass, `interface`
    /// through an interface.
    InvokeVirtual(RegList, MethodRef),
    InvokeSuper(RegList, MethodRef),
    InvokeDirect(RegList, MethodRef),
    InvokeStatic(RegList, MethodRef),
    InvokeInterface(RegList, MethodRef),
    /// `/range` call forms: the arguments occupy one consecutive register
    /// range instead of an explicit list.
    InvokeVirtualRange(RegRange, MethodRef),
    InvokeSuperRange(RegRange, MethodRef),
    InvokeDirectRange(RegRange, MethodRef),
    InvokeStaticRange(RegRange, MethodRef),
    InvokeInterfaceRange(RegRange, MethodRef),

    /// Unary arithmetic and the primitive conversions; operand widths
    /// follow the named types.
    NegInt(Reg, Reg),
    NotInt(Reg, Reg),
    NegLong(Reg, Reg),
    NotLong(Reg, Reg),
    NegFloat(Reg, Reg),
    NegDouble(Reg, Reg),

    IntToLong(Reg, Reg),
    IntToFloat(Reg, Reg),
    IntToDouble(Reg, Reg),
    LongToInt(Reg, Reg),
    LongToFloat(Reg, Reg),
    LongToDouble(Reg, Reg),
    FloatToInt(Reg, Reg),
    FloatToLong(Reg, Reg),
    FloatToDouble(Reg, Reg),
    DoubleToInt(Reg, Reg),
    DoubleToLong(Reg, Reg),
    DoubleToFloat(Reg, Reg),
    IntToByte(Reg, Reg),
    IntToChar(Reg, Reg),
    IntToShort(Reg, Reg),

    /// Binary arithmetic over two source registers.
    AddInt(Reg, Reg, Reg),
    SubInt(Reg, Reg, Reg),
    MulInt(Reg, Reg, Reg),
    DivInt(Reg, Reg, Reg),
    RemInt(Reg, Reg, Reg),
    AndInt(Reg, Reg, Reg),
    OrInt(Reg, Reg, Reg),
    XorInt(Reg, Reg, Reg),
    ShlInt(Reg, Reg, Reg),
    ShrInt(Reg, Reg, Reg),
    UshrInt(Reg, Reg, Reg),

    AddLong(Reg, Reg, Reg),
    SubLong(Reg, Reg, Reg),
    MulLong(Reg, Reg, Reg),
    DivLong(Reg, Reg, Reg),
    RemLong(Reg, Reg, Reg),
    AndLong(Reg, Reg, Reg),
    OrLong(Reg, Reg, Reg),
    XorLong(Reg, Reg, Reg),
    ShlLong(Reg, Reg, Reg),
    ShrLong(Reg, Reg, Reg),
    UshrLong(Reg, Reg, Reg),

    AddFloat(Reg, Reg, Reg),
    SubFloat(Reg, Reg, Reg),
    MulFloat(Reg, Reg, Reg),
    DivFloat(Reg, Reg, Reg),
    RemFloat(Reg, Reg, Reg),

    AddDouble(Reg, Reg, Reg),
    SubDouble(Reg, Reg, Reg),
    MulDouble(Reg, Reg, Reg),
    DivDouble(Reg, Reg, Reg),
    RemDouble(Reg, Reg, Reg),

    /// In-place binary arithmetic: the first operand is read and rewritten.
    AddInt2addr(Reg, Reg),
    SubInt2addr(Reg, Reg),
    MulInt2addr(Reg, Reg),
    DivInt2addr(Reg, Reg),
    RemInt2addr(Reg, Reg),
    AndInt2addr(Reg, Reg),
    OrInt2addr(Reg, Reg),
    XorInt2addr(Reg, Reg),
    ShlInt2addr(Reg, Reg),
    ShrInt2addr(Reg, Reg),
    UshrInt2addr(Reg, Reg),

    AddLong2addr(Reg, Reg),
    SubLong2addr(Reg, Reg),
    MulLong2addr(Reg, Reg),
    DivLong2addr(Reg, Reg),
    RemLong2addr(Reg, Reg),
    AndLong2addr(Reg, Reg),
    OrLong2addr(Reg, Reg),
    XorLong2addr(Reg, Reg),
    ShlLong2addr(Reg, Reg),
    ShrLong2addr(Reg, Reg),
    UshrLong2addr(Reg, Reg),

    AddFloat2addr(Reg, Reg),
    SubFloat2addr(Reg, Reg),
    MulFloat2addr(Reg, Reg),
    DivFloat2addr(Reg, Reg),
    RemFloat2addr(Reg, Reg),

    AddDouble2addr(Reg, Reg),
    SubDouble2addr(Reg, Reg),
    MulDouble2addr(Reg, Reg),
    DivDouble2addr(Reg, Reg),
    RemDouble2addr(Reg, Reg),

    /// Int arithmetic against an inline literal; `rsub` subtracts the
    /// register from the literal.
    AddIntLit16(Reg, Reg, i16),
    RsubInt(Reg, Reg, i16),
    MulIntLit16(Reg, Reg, i16),
    DivIntLit16(Reg, Reg, i16),
    RemIntLit16(Reg, Reg, i16),
    AndIntLit16(Reg, Reg, i16),
    OrIntLit16(Reg, Reg, i16),
    XorIntLit16(Reg, Reg, i16),

    AddIntLit8(Reg, Reg, i8),
    RsubIntLit8(Reg, Reg, i8),
    MulIntLit8(Reg, Reg, i8),
    DivIntLit8(Reg, Reg, i8),
    RemIntLit8(Reg, Reg, i8),
    AndIntLit8(Reg, Reg, i8),
    OrIntLit8(Reg, Reg, i8),
    XorIntLit8(Reg, Reg, i8),
    ShlIntLit8(Reg, Reg, i8),
    ShrIntLit8(Reg, Reg, i8),
    UshrIntLit8(Reg, Reg, i8),

    /// Branch table for `packed-switch`: the first key, then one target
    /// per consecutive key.
    PackedSwitchPayload(i32, Vec<i32>),
    /// Branch table for `sparse-switch`: explicit keys and their targets.
    SparseSwitchPayload(Vec<i32>, Vec<i32>),
    /// Element data for `fill-array-data`: the element width in bytes and
    /// the packed bytes.
    FillArrayDataPayload(usize, Vec<u8>),
}

impl Instruction for Instr {
    fn mnemonic(&self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::Move(_, _) => "move",
            Self::Move16(_, _) => "move/16",
            Self::MoveFrom16(_, _) => "move/from16",
            Self::MoveWide(_, _) => "move-wide",
            Self::MoveWide16(_, _) => "move-wide/16",
            Self::MoveWideFrom16(_, _) => "move-wide/from16",
            Self::MoveObject(_, _) => "move-object",
            Self::MoveObject16(_, _) => "move-object/16",
            Self::MoveObjectFrom16(_, _) => "move-object/from16",
            Self::MoveResult(_) => "move-result",
            Self::MoveResultWide(_) => "move-result-wide",
            Self::MoveResultObject(_) => "move-result-object",
            Self::MoveException(_) => "move-exception",
            Self::ReturnVoid => "return-void",
            Self::Return(_) => "return",
            Self::ReturnWide(_) => "return-wide",
            Self::ReturnObject(_) => "return-object",
            Self::Const4(_, _) => "const/4",
            Self::Const16(_, _) => "const/16",
            Self::Const(_, _) => "const",
            Self::ConstHigh16(_, _) => "const/high16",
            Self::ConstWide16(_, _) => "const-wide/16",
            Self::ConstWide32(_, _) => "const-wide/32",
            Self::ConstWide(_, _) => "const-wide",
            Self::ConstWideHigh16(_, _) => "const-wide/high16",
            Self::ConstString(_, _) => "const-string",
            Self::ConstStringJumbo(_, _) => "const-string/jumbo",
            Self::ConstClass(_, _) => "const-class",
            Self::MonitorEnter(_) => "monitor-enter",
            Self::MonitorExit(_) => "monitor-exit",
            Self::CheckCast(_, _) => "check-cast",
            Self::InstanceOf(_, _, _) => "instance-of",
            Self::ArrayLength(_, _) => "array-length",
            Self::NewInstance(_, _) => "new-instance",
            Self::NewArray(_, _, _) => "new-array",
            Self::FilledNewArray(_, _) => "filled-new-array",
            Self::FilledNewArrayRange(_, _) => "filled-new-array/range",
            Self::FillArrayData(_, _) => "fill-array-data",
            Self::Throw(_) => "throw",
            Self::Goto(_) => "goto",
            Self::Goto16(_) => "goto/16",
            Self::Goto32(_) => "goto/32",
            Self::PackedSwitch(_, _) => "packed-switch",
            Self::SparseSwitch(_, _) => "sparse-switch",
            Self::CmplFloat(_, _, _) => "cmpl-float",
            Self::CmpgFloat(_, _, _) => "cmpg-float",
            Self::CmplDouble(_, _, _) => "cmpl-double",
            Self::CmpgDouble(_, _, _) => "cmpg-double",
            Self::CmpLong(_, _, _) => "cmp-long",
            Self::IfEq(_, _, _) => "if-eq",
            Self::IfNe(_, _, _) => "if-ne",
            Self::IfLt(_, _, _) => "if-lt",
            Self::IfGe(_, _, _) => "if-ge",
            Self::IfGt(_, _, _) => "if-gt",
            Self::IfLe(_, _, _) => "if-le",
            Self::IfEqz(_, _) => "if-eqz",
            Self::IfNez(_, _) => "if-nez",
            Self::IfLtz(_, _) => "if-ltz",
            Self::IfGez(_, _) => "if-gez",
            Self::IfGtz(_, _) => "if-gtz",
            Self::IfLez(_, _) => "if-lez",
            Self::Aget(_, _, _) => "aget",
            Self::AgetWide(_, _, _) => "aget-wide",
            Self::AgetObject(_, _, _) => "aget-object",
            Self::AgetBoolean(_, _, _) => "aget-boolean",
            Self::AgetByte(_, _, _) => "aget-byte",
            Self::AgetChar(_, _, _) => "aget-char",
            Self::AgetShort(_, _, _) => "aget-short",
            Self::Aput(_, _, _) => "aput",
            Self::AputWide(_, _, _) => "aput-wide",
            Self::AputObject(_, _, _) => "aput-object",
            Self::AputBoolean(_, _, _) => "aput-boolean",
            Self::AputByte(_, _, _) => "aput-byte",
            Self::AputChar(_, _, _) => "aput-char",
            Self::AputShort(_, _, _) => "aput-short",
            Self::Iget(_, _, _) => "iget",
            Self::IgetWide(_, _, _) => "iget-wide",
            Self::IgetObject(_, _, _) => "iget-object",
            Self::IgetBoolean(_, _, _) => "iget-boolean",
            Self::IgetByte(_, _, _) => "iget-byte",
            Self::IgetChar(_, _, _) => "iget-char",
            Self::IgetShort(_, _, _) => "iget-short",
            Self::Iput(_, _, _) => "iput",
            Self::IputWide(_, _, _) => "iput-wide",
            Self::IputObject(_, _, _) => "iput-object",
            Self::IputBoolean(_, _, _) => "iput-boolean",
            Self::IputByte(_, _, _) => "iput-byte",
            Self::IputChar(_, _, _) => "iput-char",
            Self::IputShort(_, _, _) => "iput-short",
            Self::Sget(_, _) => "sget",
            Self::SgetWide(_, _) => "sget-wide",
            Self::SgetObject(_, _) => "sget-object",
            Self::SgetBoolean(_, _) => "sget-boolean",
            Self::SgetByte(_, _) => "sget-byte",
            Self::SgetChar(_, _) => "sget-char",
            Self::SgetShort(_, _) => "sget-short",
            Self::Sput(_, _) => "sput",
            Self::SputWide(_, _) => "sput-wide",
            Self::SputObject(_, _) => "sput-object",
            Self::SputBoolean(_, _) => "sput-boolean",
            Self::SputByte(_, _) => "sput-byte",
            Self::SputChar(_, _) => "sput-char",
            Self::SputShort(_, _) => "sput-short",
            Self::InvokeVirtual(_, _) => "invoke-virtual",
            Self::InvokeSuper(_, _) => "invoke-super",
            Self::InvokeDirect(_, _) => "invoke-direct",
            Self::InvokeStatic(_, _) => "invoke-static",
            Self::InvokeInterface(_, _) => "invoke-interface",
            Self::InvokeVirtualRange(_, _) => "invoke-virtual/range",
            Self::InvokeSuperRange(_, _) => "invoke-super/range",
            Self::InvokeDirectRange(_, _) => "invoke-direct/range",
            Self::InvokeStaticRange(_, _) => "invoke-static/range",
            Self::InvokeInterfaceRange(_, _) => "invoke-interface/range",
            Self::NegInt(_, _) => "neg-int",
            Self::NotInt(_, _) => "not-int",
            Self::NegLong(_, _) => "neg-long",
            Self::NotLong(_, _) => "not-long",
            Self::NegFloat(_, _) => "neg-float",
            Self::NegDouble(_, _) => "neg-double",
            Self::IntToLong(_, _) => "int-to-long",
            Self::IntToFloat(_, _) => "int-to-float",
            Self::IntToDouble(_, _) => "int-to-double",
            Self::LongToInt(_, _) => "long-to-int",
            Self::LongToFloat(_, _) => "long-to-float",
            Self::LongToDouble(_, _) => "long-to-double",
            Self::FloatToInt(_, _) => "float-to-int",
            Self::FloatToLong(_, _) => "float-to-long",
            Self::FloatToDouble(_, _) => "float-to-double",
            Self::DoubleToInt(_, _) => "double-to-int",
            Self::DoubleToLong(_, _) => "double-to-long",
            Self::DoubleToFloat(_, _) => "double-to-float",
            Self::IntToByte(_, _) => "int-to-byte",
            Self::IntToChar(_, _) => "int-to-char",
            Self::IntToShort(_, _) => "int-to-short",
            Self::AddInt(_, _, _) => "add-int",
            Self::SubInt(_, _, _) => "sub-int",
            Self::MulInt(_, _, _) => "mul-int",
            Self::DivInt(_, _, _) => "div-int",
            Self::RemInt(_, _, _) => "rem-int",
            Self::AndInt(_, _, _) => "and-int",
            Self::OrInt(_, _, _) => "or-int",
            Self::XorInt(_, _, _) => "xor-int",
            Self::ShlInt(_, _, _) => "shl-int",
            Self::ShrInt(_, _, _) => "shr-int",
            Self::UshrInt(_, _, _) => "ushr-int",
            Self::AddLong(_, _, _) => "add-long",
            Self::SubLong(_, _, _) => "sub-long",
            Self::MulLong(_, _, _) => "mul-long",
            Self::DivLong(_, _, _) => "div-long",
            Self::RemLong(_, _, _) => "rem-long",
            Self::AndLong(_, _, _) => "and-long",
            Self::OrLong(_, _, _) => "or-long",
            Self::XorLong(_, _, _) => "xor-long",
            Self::ShlLong(_, _, _) => "shl-long",
            Self::ShrLong(_, _, _) => "shr-long",
            Self::UshrLong(_, _, _) => "ushr-long",
            Self::AddFloat(_, _, _) => "add-float",
            Self::SubFloat(_, _, _) => "sub-float",
            Self::MulFloat(_, _, _) => "mul-float",
            Self::DivFloat(_, _, _) => "div-float",
            Self::RemFloat(_, _, _) => "rem-float",
            Self::AddDouble(_, _, _) => "add-double",
            Self::SubDouble(_, _, _) => "sub-double",
            Self::MulDouble(_, _, _) => "mul-double",
            Self::DivDouble(_, _, _) => "div-double",
            Self::RemDouble(_, _, _) => "rem-double",
            Self::AddInt2addr(_, _) => "add-int/2addr",
            Self::SubInt2addr(_, _) => "sub-int/2addr",
            Self::MulInt2addr(_, _) => "mul-int/2addr",
            Self::DivInt2addr(_, _) => "div-int/2addr",
            Self::RemInt2addr(_, _) => "rem-int/2addr",
            Self::AndInt2addr(_, _) => "and-int/2addr",
            Self::OrInt2addr(_, _) => "or-int/2addr",
            Self::XorInt2addr(_, _) => "xor-int/2addr",
            Self::ShlInt2addr(_, _) => "shl-int/2addr",
            Self::ShrInt2addr(_, _) => "shr-int/2addr",
            Self::UshrInt2addr(_, _) => "ushr-int/2addr",
            Self::AddLong2addr(_, _) => "add-long/2addr",
            Self::SubLong2addr(_, _) => "sub-long/2addr",
            Self::MulLong2addr(_, _) => "mul-long/2addr",
            Self::DivLong2addr(_, _) => "div-long/2addr",
            Self::RemLong2addr(_, _) => "rem-long/2addr",
            Self::AndLong2addr(_, _) => "and-long/2addr",
            Self::OrLong2addr(_, _) => "or-long/2addr",
            Self::XorLong2addr(_, _) => "xor-long/2addr",
            Self::ShlLong2addr(_, _) => "shl-long/2addr",
            Self::ShrLong2addr(_, _) => "shr-long/2addr",
            Self::UshrLong2addr(_, _) => "ushr-long/2addr",
            Self::AddFloat2addr(_, _) => "add-float/2addr",
            Self::SubFloat2addr(_, _) => "sub-float/2addr",
            Self::MulFloat2addr(_, _) => "mul-float/2addr",
            Self::DivFloat2addr(_, _) => "div-float/2addr",
            Self::RemFloat2addr(_, _) => "rem-float/2addr",
            Self::AddDouble2addr(_, _) => "add-double/2addr",
            Self::SubDouble2addr(_, _) => "sub-double/2addr",
            Self::MulDouble2addr(_, _) => "mul-double/2addr",
            Self::DivDouble2addr(_, _) => "div-double/2addr",
            Self::RemDouble2addr(_, _) => "rem-double/2addr",
            Self::AddIntLit16(_, _, _) => "add-int/lit16",
            Self::RsubInt(_, _, _) => "rsub-int",
            Self::MulIntLit16(_, _, _) => "mul-int/lit16",
            Self::DivIntLit16(_, _, _) => "div-int/lit16",
            Self::RemIntLit16(_, _, _) => "rem-int/lit16",
            Self::AndIntLit16(_, _, _) => "and-int/lit16",
            Self::OrIntLit16(_, _, _) => "or-int/lit16",
            Self::XorIntLit16(_, _, _) => "xor-int/lit16",
            Self::AddIntLit8(_, _, _) => "add-int/lit8",
            Self::RsubIntLit8(_, _, _) => "rsub-int/lit8",
            Self::MulIntLit8(_, _, _) => "mul-int/lit8",
            Self::DivIntLit8(_, _, _) => "div-int/lit8",
            Self::RemIntLit8(_, _, _) => "rem-int/lit8",
            Self::AndIntLit8(_, _, _) => "and-int/lit8",
            Self::OrIntLit8(_, _, _) => "or-int/lit8",
            Self::XorIntLit8(_, _, _) => "xor-int/lit8",
            Self::ShlIntLit8(_, _, _) => "shl-int/lit8",
            Self::ShrIntLit8(_, _, _) => "shr-int/lit8",
            Self::UshrIntLit8(_, _, _) => "ushr-int/lit8",
            Self::PackedSwitchPayload(_, _) => "packed-switch-payload",
            Self::SparseSwitchPayload(_, _) => "sparse-switch-payload",
            Self::FillArrayDataPayload(_, _) => "array-data-payload",
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Nop
            | Self::Move(_, _)
            | Self::MoveWide(_, _)
            | Self::MoveObject(_, _)
            | Self::MoveResult(_)
            | Self::MoveResultWide(_)
            | Self::MoveResultObject(_)
            | Self::MoveException(_)
            | Self::ReturnVoid
            | Self::Return(_)
            | Self::ReturnWide(_)
            | Self::ReturnObject(_)
            | Self::Const4(_, _)
            | Self::MonitorEnter(_)
            | Self::MonitorExit(_)
            | Self::ArrayLength(_, _)
            | Self::Throw(_)
            | Self::Goto(_)
            | Self::NegInt(_, _)
            | Self::NotInt(_, _)
            | Self::NegLong(_, _)
            | Self::NotLong(_, _)
            | Self::NegFloat(_, _)
            | Self::NegDouble(_, _)
            | Self::IntToLong(_, _)
            | Self::IntToFloat(_, _)
            | Self::IntToDouble(_, _)
            | Self::LongToInt(_, _)
            | Self::LongToFloat(_, _)
            | Self::LongToDouble(_, _)
            | Self::FloatToInt(_, _)
            | Self::FloatToLong(_, _)
            | Self::FloatToDouble(_, _)
            | Self::DoubleToInt(_, _)
            | Self::DoubleToLong(_, _)
            | Self::DoubleToFloat(_, _)
            | Self::IntToByte(_, _)
            | Self::IntToChar(_, _)
            | Self::IntToShort(_, _)
            | Self::AddInt2addr(_, _)
            | Self::SubInt2addr(_, _)
            | Self::MulInt2addr(_, _)
            | Self::DivInt2addr(_, _)
            | Self::RemInt2addr(_, _)
            | Self::AndInt2addr(_, _)
            | Self::OrInt2addr(_, _)
            | Self::XorInt2addr(_, _)
            | Self::ShlInt2addr(_, _)
            | Self::ShrInt2addr(_, _)
            | Self::UshrInt2addr(_, _)
            | Self::AddLong2addr(_, _)
            | Self::SubLong2addr(_, _)
            | Self::MulLong2addr(_, _)
            | Self::DivLong2addr(_, _)
            | Self::RemLong2addr(_, _)
            | Self::AndLong2addr(_, _)
            | Self::OrLong2addr(_, _)
            | Self::XorLong2addr(_, _)
            | Self::ShlLong2addr(_, _)
            | Self::ShrLong2addr(_, _)
            | Self::UshrLong2addr(_, _)
            | Self::AddFloat2addr(_, _)
            | Self::SubFloat2addr(_, _)
            | Self::MulFloat2addr(_, _)
            | Self::DivFloat2addr(_, _)
            | Self::RemFloat2addr(_, _)
            | Self::AddDouble2addr(_, _)
            | Self::SubDouble2addr(_, _)
            | Self::MulDouble2addr(_, _)
            | Self::DivDouble2addr(_, _)
            | Self::RemDouble2addr(_, _) => 1,

            Self::Move16(_, _)
            | Self::MoveWide16(_, _)
            | Self::MoveObject16(_, _)
            | Self::Goto32(_)
            | Self::Const(_, _)
            | Self::ConstWide32(_, _)
            | Self::ConstStringJumbo(_, _)
            | Self::FillArrayData(_, _)
            | Self::PackedSwitch(_, _)
            | Self::SparseSwitch(_, _)
            | Self::FilledNewArray(_, _)
            | Self::FilledNewArrayRange(_, _)
            | Self::InvokeVirtual(_, _)
            | Self::InvokeSuper(_, _)
            | Self::InvokeDirect(_, _)
            | Self::InvokeStatic(_, _)
            | Self::InvokeInterface(_, _)
            | Self::InvokeVirtualRange(_, _)
            | Self::InvokeSuperRange(_, _)
            | Self::InvokeDirectRange(_, _)
            | Self::InvokeStaticRange(_, _)
            | Self::InvokeInterfaceRange(_, _) => 3,

            Self::ConstWide(_, _) => 5,

            Self::PackedSwitchPayload(_, targets) => targets.len() * 2 + 4,
            Self::SparseSwitchPayload(keys, _) => keys.len() * 4 + 2,
            Self::FillArrayDataPayload(_, data) => (data.len() + 1) / 2 + 4,

            _ => 2,
        }
    }

    fn can_throw(&self) -> bool {
        matches!(
            self,
            Self::ConstString(_, _)
                | Self::ConstStringJumbo(_, _)
                | Self::ConstClass(_, _)
                | Self::MonitorEnter(_)
                | Self::MonitorExit(_)
                | Self::CheckCast(_, _)
                | Self::InstanceOf(_, _, _)
                | Self::ArrayLength(_, _)
                | Self::NewInstance(_, _)
                | Self::NewArray(_, _, _)
                | Self::FilledNewArray(_, _)
                | Self::FilledNewArrayRange(_, _)
                | Self::FillArrayData(_, _)
                | Self::Throw(_)
                | Self::Aget(_, _, _)
                | Self::AgetWide(_, _, _)
                | Self::AgetObject(_, _, _)
                | Self::AgetBoolean(_, _, _)
                | Self::AgetByte(_, _, _)
                | Self::AgetChar(_, _, _)
                | Self::AgetShort(_, _, _)
                | Self::Aput(_, _, _)
                | Self::AputWide(_, _, _)
                | Self::AputObject(_, _, _)
                | Self::AputBoolean(_, _, _)
                | Self::AputByte(_, _, _)
                | Self::AputChar(_, _, _)
                | Self::AputShort(_, _, _)
                | Self::Iget(_, _, _)
                | Self::IgetWide(_, _, _)
                | Self::IgetObject(_, _, _)
                | Self::IgetBoolean(_, _, _)
                | Self::IgetByte(_, _, _)
                | Self::IgetChar(_, _, _)
                | Self::IgetShort(_, _, _)
                | Self::Iput(_, _, _)
                | Self::IputWide(_, _, _)
                | Self::IputObject(_, _, _)
                | Self::IputBoolean(_, _, _)
                | Self::IputByte(_, _, _)
                | Self::IputChar(_, _, _)
                | Self::IputShort(_, _, _)
                | Self::Sget(_, _)
                | Self::SgetWide(_, _)
                | Self::SgetObject(_, _)
                | Self::SgetBoolean(_, _)
                | Self::SgetByte(_, _)
                | Self::SgetChar(_, _)
                | Self::SgetShort(_, _)
                | Self::Sput(_, _)
                | Self::SputWide(_, _)
                | Self::SputObject(_, _)
                | Self::SputBoolean(_, _)
                | Self::SputByte(_, _)
                | Self::SputChar(_, _)
                | Self::SputShort(_, _)
                | Self::InvokeVirtual(_, _)
                | Self::InvokeSuper(_, _)
                | Self::InvokeDirect(_, _)
                | Self::InvokeStatic(_, _)
                | Self::InvokeInterface(_, _)
                | Self::InvokeVirtualRange(_, _)
                | Self::InvokeSuperRange(_, _)
                | Self::InvokeDirectRange(_, _)
                | Self::InvokeStaticRange(_, _)
                | Self::InvokeInterfaceRange(_, _)
                | Self::DivInt(_, _, _)
                | Self::RemInt(_, _, _)
                | Self::DivLong(_, _, _)
                | Self::RemLong(_, _, _)
                | Self::DivInt2addr(_, _)
                | Self::RemInt2addr(_, _)
                | Self::DivLong2addr(_, _)
                | Self::RemLong2addr(_, _)
                | Self::DivIntLit16(_, _, _)
                | Self::RemIntLit16(_, _, _)
                | Self::DivIntLit8(_, _, _)
                | Self::RemIntLit8(_, _, _)
        )
    }

    fn can_continue(&self) -> bool {
        !matches!(
            self,
            Self::ReturnVoid
                | Self::Return(_)
                | Self::ReturnWide(_)
                | Self::ReturnObject(_)
                | Self::Throw(_)
                | Self::Goto(_)
                | Self::Goto16(_)
                | Self::Goto32(_)
                | Self::PackedSwitchPayload(_, _)
                | Self::SparseSwitchPayload(_, _)
                | Self::FillArrayDataPayload(_, _)
        )
    }

    fn sets_result(&self) -> bool {
        matches!(
            self,
            Self::FilledNewArray(_, _)
                | Self::FilledNewArrayRange(_, _)
                | Self::InvokeVirtual(_, _)
                | Self::InvokeSuper(_, _)
                | Self::InvokeDirect(_, _)
                | Self::InvokeStatic(_, _)
                | Self::InvokeInterface(_, _)
                | Self::InvokeVirtualRange(_, _)
                | Self::InvokeSuperRange(_, _)
                | Self::InvokeDirectRange(_, _)
                | Self::InvokeStaticRange(_, _)
                | Self::InvokeInterfaceRange(_, _)
        )
    }

    fn sets_wide_register(&self) -> bool {
        matches!(
            self,
            Self::MoveWide(_, _)
                | Self::MoveWide16(_, _)
                | Self::MoveWideFrom16(_, _)
                | Self::MoveResultWide(_)
                | Self::ConstWide16(_, _)
                | Self::ConstWide32(_, _)
                | Self::ConstWide(_, _)
                | Self::ConstWideHigh16(_, _)
                | Self::AgetWide(_, _, _)
                | Self::IgetWide(_, _, _)
                | Self::SgetWide(_, _)
                | Self::NegLong(_, _)
                | Self::NotLong(_, _)
                | Self::NegDouble(_, _)
                | Self::IntToLong(_, _)
                | Self::IntToDouble(_, _)
                | Self::LongToDouble(_, _)
                | Self::FloatToLong(_, _)
                | Self::FloatToDouble(_, _)
                | Self::DoubleToLong(_, _)
                | Self::AddLong(_, _, _)
                | Self::SubLong(_, _, _)
                | Self::MulLong(_, _, _)
                | Self::DivLong(_, _, _)
                | Self::RemLong(_, _, _)
                | Self::AndLong(_, _, _)
                | Self::OrLong(_, _, _)
                | Self::XorLong(_, _, _)
                | Self::ShlLong(_, _, _)
                | Self::ShrLong(_, _, _)
                | Self::UshrLong(_, _, _)
                | Self::AddDouble(_, _, _)
                | Self::SubDouble(_, _, _)
                | Self::MulDouble(_, _, _)
                | Self::DivDouble(_, _, _)
                | Self::RemDouble(_, _, _)
                | Self::AddLong2addr(_, _)
                | Self::SubLong2addr(_, _)
                | Self::MulLong2addr(_, _)
                | Self::DivLong2addr(_, _)
                | Self::RemLong2addr(_, _)
                | Self::AndLong2addr(_, _)
                | Self::OrLong2addr(_, _)
                | Self::XorLong2addr(_, _)
                | Self::ShlLong2addr(_, _)
                | Self::ShrLong2addr(_, _)
                | Self::UshrLong2addr(_, _)
                | Self::AddDouble2addr(_, _)
                | Self::SubDouble2addr(_, _)
                | Self::MulDouble2addr(_, _)
                | Self::DivDouble2addr(_, _)
                | Self::RemDouble2addr(_, _)
        )
    }
}

impl Instr {
    /// Returns the register written by the instruction, if any.
    ///
    /// Invokes and `filled-new-array` leave a result but write no register
    /// (the following `move-result*` does); they report `None` here.
    #[must_use]
    pub fn destination(&self) -> Option<Reg> {
        match self {
            Self::Move(dst, _)
            | Self::Move16(dst, _)
            | Self::MoveFrom16(dst, _)
            | Self::MoveWide(dst, _)
            | Self::MoveWide16(dst, _)
            | Self::MoveWideFrom16(dst, _)
            | Self::MoveObject(dst, _)
            | Self::MoveObject16(dst, _)
            | Self::MoveObjectFrom16(dst, _)
            | Self::MoveResult(dst)
            | Self::MoveResultWide(dst)
            | Self::MoveResultObject(dst)
            | Self::MoveException(dst)
            | Self::Const4(dst, _)
            | Self::Const16(dst, _)
            | Self::Const(dst, _)
            | Self::ConstHigh16(dst, _)
            | Self::ConstWide16(dst, _)
            | Self::ConstWide32(dst, _)
            | Self::ConstWide(dst, _)
            | Self::ConstWideHigh16(dst, _)
            | Self::ConstString(dst, _)
            | Self::ConstStringJumbo(dst, _)
            | Self::ConstClass(dst, _)
            | Self::CheckCast(dst, _)
            | Self::InstanceOf(dst, _, _)
            | Self::ArrayLength(dst, _)
            | Self::NewInstance(dst, _)
            | Self::NewArray(dst, _, _)
            | Self::CmplFloat(dst, _, _)
            | Self::CmpgFloat(dst, _, _)
            | Self::CmplDouble(dst, _, _)
            | Self::CmpgDouble(dst, _, _)
            | Self::CmpLong(dst, _, _)
            | Self::Aget(dst, _, _)
            | Self::AgetWide(dst, _, _)
            | Self::AgetObject(dst, _, _)
            | Self::AgetBoolean(dst, _, _)
            | Self::AgetByte(dst, _, _)
            | Self::AgetChar(dst, _, _)
            | Self::AgetShort(dst, _, _)
            | Self::Iget(dst, _, _)
            | Self::IgetWide(dst, _, _)
            | Self::IgetObject(dst, _, _)
            | Self::IgetBoolean(dst, _, _)
            | Self::IgetByte(dst, _, _)
            | Self::IgetChar(dst, _, _)
            | Self::IgetShort(dst, _, _)
            | Self::Sget(dst, _)
            | Self::SgetWide(dst, _)
            | Self::SgetObject(dst, _)
            | Self::SgetBoolean(dst, _)
            | Self::SgetByte(dst, _)
            | Self::SgetChar(dst, _)
            | Self::SgetShort(dst, _)
            | Self::NegInt(dst, _)
            | Self::NotInt(dst, _)
            | Self::NegLong(dst, _)
            | Self::NotLong(dst, _)
            | Self::NegFloat(dst, _)
            | Self::NegDouble(dst, _)
            | Self::IntToLong(dst, _)
            | Self::IntToFloat(dst, _)
            | Self::IntToDouble(dst, _)
            | Self::LongToInt(dst, _)
            | Self::LongToFloat(dst, _)
            | Self::LongToDouble(dst, _)
            | Self::FloatToInt(dst, _)
            | Self::FloatToLong(dst, _)
            | Self::FloatToDouble(dst, _)
            | Self::DoubleToInt(dst, _)
            | Self::DoubleToLong(dst, _)
            | Self::DoubleToFloat(dst, _)
            | Self::IntToByte(dst, _)
            | Self::IntToChar(dst, _)
            | Self::IntToShort(dst, _)
            | Self::AddInt(dst, _, _)
            | Self::SubInt(dst, _, _)
            | Self::MulInt(dst, _, _)
            | Self::DivInt(dst, _, _)
            | Self::RemInt(dst, _, _)
            | Self::AndInt(dst, _, _)
            | Self::OrInt(dst, _, _)
            | Self::XorInt(dst, _, _)
            | Self::ShlInt(dst, _, _)
            | Self::ShrInt(dst, _, _)
            | Self::UshrInt(dst, _, _)
            | Self::AddLong(dst, _, _)
            | Self::SubLong(dst, _, _)
            | Self::MulLong(dst, _, _)
            | Self::DivLong(dst, _, _)
            | Self::RemLong(dst, _, _)
            | Self::AndLong(dst, _, _)
            | Self::OrLong(dst, _, _)
            | Self::XorLong(dst, _, _)
            | Self::ShlLong(dst, _, _)
            | Self::ShrLong(dst, _, _)
            | Self::UshrLong(dst, _, _)
            | Self::AddFloat(dst, _, _)
            | Self::SubFloat(dst, _, _)
            | Self::MulFloat(dst, _, _)
            | Self::DivFloat(dst, _, _)
            | Self::RemFloat(dst, _, _)
            | Self::AddDouble(dst, _, _)
            | Self::SubDouble(dst, _, _)
            | Self::MulDouble(dst, _, _)
            | Self::DivDouble(dst, _, _)
            | Self::RemDouble(dst, _, _)
            | Self::AddInt2addr(dst, _)
            | Self::SubInt2addr(dst, _)
            | Self::MulInt2addr(dst, _)
            | Self::DivInt2addr(dst, _)
            | Self::RemInt2addr(dst, _)
            | Self::AndInt2addr(dst, _)
            | Self::OrInt2addr(dst, _)
            | Self::XorInt2addr(dst, _)
            | Self::ShlInt2addr(dst, _)
            | Self::ShrInt2addr(dst, _)
            | Self::UshrInt2addr(dst, _)
            | Self::AddLong2addr(dst, _)
            | Self::SubLong2addr(dst, _)
            | Self::MulLong2addr(dst, _)
            | Self::DivLong2addr(dst, _)
            | Self::RemLong2addr(dst, _)
            | Self::AndLong2addr(dst, _)
            | Self::OrLong2addr(dst, _)
            | Self::XorLong2addr(dst, _)
            | Self::ShlLong2addr(dst, _)
            | Self::ShrLong2addr(dst, _)
            | Self::UshrLong2addr(dst, _)
            | Self::AddFloat2addr(dst, _)
            | Self::SubFloat2addr(dst, _)
            | Self::MulFloat2addr(dst, _)
            | Self::DivFloat2addr(dst, _)
            | Self::RemFloat2addr(dst, _)
            | Self::AddDouble2addr(dst, _)
            | Self::SubDouble2addr(dst, _)
            | Self::MulDouble2addr(dst, _)
            | Self::DivDouble2addr(dst, _)
            | Self::RemDouble2addr(dst, _)
            | Self::AddIntLit16(dst, _, _)
            | Self::RsubInt(dst, _, _)
            | Self::MulIntLit16(dst, _, _)
            | Self::DivIntLit16(dst, _, _)
            | Self::RemIntLit16(dst, _, _)
            | Self::AndIntLit16(dst, _, _)
            | Self::OrIntLit16(dst, _, _)
            | Self::XorIntLit16(dst, _, _)
            | Self::AddIntLit8(dst, _, _)
            | Self::RsubIntLit8(dst, _, _)
            | Self::MulIntLit8(dst, _, _)
            | Self::DivIntLit8(dst, _, _)
            | Self::RemIntLit8(dst, _, _)
            | Self::AndIntLit8(dst, _, _)
            | Self::OrIntLit8(dst, _, _)
            | Self::XorIntLit8(dst, _, _)
            | Self::ShlIntLit8(dst, _, _)
            | Self::ShrIntLit8(dst, _, _)
            | Self::UshrIntLit8(dst, _, _) => Some(*dst),
            _ => None,
        }
    }

    /// Checks whether the instruction writes the given register, counting the
    /// high half of a wide destination pair.
    #[must_use]
    pub fn sets_register(&self, r: Reg) -> bool {
        match self.destination() {
            Some(dst) if dst == r => true,
            Some(dst) if self.sets_wide_register() => dst.next() == r,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_sizes() {
        assert_eq!(Instr::Nop.size(), 1);
        assert_eq!(Instr::Const4(Reg::new(0), 0).size(), 1);
        assert_eq!(Instr::Const16(Reg::new(0), 0).size(), 2);
        assert_eq!(Instr::Const(Reg::new(0), 0).size(), 3);
        assert_eq!(Instr::ConstWide(Reg::new(0), 0).size(), 5);
        assert_eq!(Instr::PackedSwitchPayload(0, vec![0, 0]).size(), 8);
        assert_eq!(Instr::SparseSwitchPayload(vec![1], vec![2]).size(), 6);
        assert_eq!(Instr::FillArrayDataPayload(4, vec![0; 8]).size(), 8);
    }

    #[test]
    fn instruction_attributes() {
        let nop = Instr::Nop;
        assert!(nop.can_continue());
        assert!(!nop.can_throw());

        let ret = Instr::ReturnVoid;
        assert!(!ret.can_continue());

        let div = Instr::DivInt(Reg::new(0), Reg::new(1), Reg::new(2));
        assert!(div.can_throw());
        assert!(div.can_continue());

        let wide = Instr::ConstWide(Reg::new(2), 0);
        assert!(wide.sets_wide_register());
        assert!(wide.sets_register(Reg::new(2)));
        assert!(wide.sets_register(Reg::new(3)));
        assert!(!wide.sets_register(Reg::new(4)));
    }
}
