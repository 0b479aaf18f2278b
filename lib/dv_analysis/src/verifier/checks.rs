//! Per-opcode verification rules.
//!
//! Each routine reads its operand types from the merged predecessor state,
//! checks them against the categories the opcode allows, and publishes the
//! destination type into the node's post map (propagating it through the
//! graph). Violations surface as validation errors naming the instruction
//! address and the offending register or type.

use super::insn::NodeId;
use super::{invalid, MethodAnalyzer};
use crate::errors::{AnalysisError, AnalysisResult};
use crate::regtype::{
    reference_assignable, Category, CategorySet, RegisterType, FLOATABLE, INTEGRAL,
    JAVA_LANG_CLASS, JAVA_LANG_STRING, JAVA_LANG_THROWABLE, PRIMITIVE_32BIT, REFERENCE, WIDE_HIGH,
    WIDE_LOW,
};
use dv_dex::instrs::{Instr, Instruction};
use dv_dex::methods::{FieldRef, MethodRef};
use dv_dex::registers::Reg;
use dv_dex::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InvokeKind {
    Virtual,
    Super,
    Direct,
    Static,
    Interface,
}

/// `int` and `float` array elements and fields are interchangeable for the
/// untyped 32-bit access opcodes.
fn check_array_field_assignment(stored: Category, instruction: Category) -> bool {
    stored == instruction
        || (stored == Category::Integer && instruction == Category::Float)
        || (stored == Category::Float && instruction == Category::Integer)
}

impl MethodAnalyzer<'_> {
    #[allow(clippy::too_many_lines)]
    pub(super) fn verify_instruction(&mut self, idx: usize) -> AnalysisResult<()> {
        let Some(linstr) = self.insns[idx].instr().cloned() else {
            return Err(AnalysisError::Internal(
                "cannot verify the synthetic start-of-method node".to_string(),
            ));
        };
        let addr = linstr.addr();

        match linstr.instr() {
            Instr::Nop | Instr::Goto(_) | Instr::Goto16(_) | Instr::Goto32(_) => Ok(()),

            Instr::PackedSwitchPayload(_, _)
            | Instr::SparseSwitchPayload(_, _)
            | Instr::FillArrayDataPayload(_, _) => {
                invalid!(
                    addr,
                    "Cannot execute the {} pseudo-instruction",
                    linstr.mnemonic()
                )
            }

            Instr::Move(_, src) | Instr::MoveFrom16(_, src) | Instr::Move16(_, src) => {
                self.handle_move(idx, *src, PRIMITIVE_32BIT)
            }
            Instr::MoveObject(_, src)
            | Instr::MoveObjectFrom16(_, src)
            | Instr::MoveObject16(_, src) => self.handle_move(idx, *src, REFERENCE),
            Instr::MoveWide(_, src) | Instr::MoveWideFrom16(_, src) | Instr::MoveWide16(_, src) => {
                let src_type = self.get_and_check_wide_source_pair(idx, *src)?;
                self.set_wide_destination(idx, src_type)
            }

            Instr::MoveResult(_) => self.handle_move_result(idx, PRIMITIVE_32BIT, false),
            Instr::MoveResultWide(_) => self.handle_move_result(idx, WIDE_LOW, true),
            Instr::MoveResultObject(_) => self.handle_move_result(idx, REFERENCE, false),
            Instr::MoveException(_) => self.handle_move_exception(idx),

            Instr::ReturnVoid => {
                self.handle_constructor_return(idx)?;
                if self.method.proto.return_type != Type::Void {
                    invalid!(
                        addr,
                        "Cannot use return-void with a non-void return type ({})",
                        self.method.proto.return_type
                    );
                }
                Ok(())
            }
            Instr::Return(r) => {
                self.handle_constructor_return(idx)?;
                let ret_type = self.pre_type(idx, *r)?;
                self.check_register(idx, &ret_type, PRIMITIVE_32BIT)?;
                let declared = self.method.proto.return_type.clone();
                if declared == Type::Void {
                    invalid!(
                        addr,
                        "Cannot use return with a void return type. Use return-void instead"
                    );
                }
                let declared_type = RegisterType::for_type(&declared)?;
                if !PRIMITIVE_32BIT.contains(declared_type.category) {
                    invalid!(addr, "Cannot use return with return type {declared}");
                }
                Ok(())
            }
            Instr::ReturnWide(r) => {
                self.handle_constructor_return(idx)?;
                self.get_and_check_wide_source_pair(idx, *r)?;
                let declared = self.method.proto.return_type.clone();
                if declared == Type::Void {
                    invalid!(
                        addr,
                        "Cannot use return-wide with a void return type. Use return-void instead"
                    );
                }
                let declared_type = RegisterType::for_type(&declared)?;
                if !WIDE_LOW.contains(declared_type.category) {
                    invalid!(addr, "Cannot use return-wide with return type {declared}");
                }
                Ok(())
            }
            Instr::ReturnObject(r) => {
                self.handle_constructor_return(idx)?;
                let ret_type = self.pre_type(idx, *r)?;
                self.check_register(idx, &ret_type, REFERENCE)?;
                let declared = self.method.proto.return_type.clone();
                if declared == Type::Void {
                    invalid!(
                        addr,
                        "Cannot use return-object with a void return type. Use return-void instead"
                    );
                }
                if !declared.is_reference() {
                    invalid!(addr, "Cannot use return-object with return type {declared}");
                }
                if ret_type.category == Category::Reference {
                    let ret_class = ret_type.class().ok_or_else(|| {
                        AnalysisError::Internal("reference register without a class".to_string())
                    })?;
                    let interface_return = match &declared {
                        Type::Class(name) => self.classpath.is_interface(name)?,
                        _ => false,
                    };
                    if !reference_assignable(ret_class, &declared, self.classpath)? {
                        if interface_return {
                            log::warn!(
                                "return value of type {ret_class} is not provably compatible with the interface return type {declared}"
                            );
                        } else {
                            invalid!(
                                addr,
                                "The return value in register {r}({ret_class}) is not compatible with the method's return type ({declared})"
                            );
                        }
                    }
                }
                Ok(())
            }

            Instr::Const4(_, value) => {
                self.set_destination(idx, RegisterType::for_literal(i64::from(*value)))
            }
            Instr::Const16(_, value) => {
                self.set_destination(idx, RegisterType::for_literal(i64::from(*value)))
            }
            Instr::Const(_, value) => {
                self.set_destination(idx, RegisterType::for_literal(i64::from(*value)))
            }
            Instr::ConstHigh16(_, value) => {
                self.set_destination(idx, RegisterType::for_literal(i64::from(*value) << 16))
            }
            Instr::ConstWide16(_, _)
            | Instr::ConstWide32(_, _)
            | Instr::ConstWide(_, _)
            | Instr::ConstWideHigh16(_, _) => self.set_wide_destination(idx, RegisterType::LONG_LO),
            Instr::ConstString(_, _) | Instr::ConstStringJumbo(_, _) => {
                self.set_destination(idx, JAVA_LANG_STRING.clone())
            }
            Instr::ConstClass(_, class) => {
                self.classpath.resolve(class)?;
                self.set_destination(idx, JAVA_LANG_CLASS.clone())
            }

            Instr::MonitorEnter(r) | Instr::MonitorExit(r) => {
                let t = self.pre_type(idx, *r)?;
                self.check_register(idx, &t, REFERENCE)
            }

            Instr::CheckCast(r, class) => {
                self.classpath.resolve(class)?;
                let cast = RegisterType::for_type(class)?;
                if !REFERENCE.contains(cast.category) {
                    // dalvik tolerates this at verification time and throws
                    // at runtime
                    log::warn!("check-cast to non-reference type {class} at {:#x}", addr.0);
                }
                let src = self.pre_type(idx, *r)?;
                self.check_register(idx, &src, REFERENCE)?;
                self.set_destination(idx, cast)
            }
            Instr::InstanceOf(_, src, class) => {
                let src_type = self.pre_type(idx, *src)?;
                self.check_register(idx, &src_type, REFERENCE)?;
                self.classpath.resolve(class)?;
                if !class.is_reference() {
                    invalid!(addr, "Cannot use instance-of with non-reference type {class}");
                }
                self.set_destination(idx, RegisterType::BOOLEAN)
            }
            Instr::ArrayLength(_, array) => {
                let array_type = self.pre_type(idx, *array)?;
                self.check_register(idx, &array_type, REFERENCE)?;
                if let Some(class) = array_type.class() {
                    if class.array_dimensions() == 0 {
                        invalid!(addr, "Cannot use array-length with non-array type {class}");
                    }
                }
                self.set_destination(idx, RegisterType::INTEGER)
            }

            Instr::NewInstance(dst, class) => {
                let dst_post = self.insns[idx]
                    .post_register_type(*dst)
                    .cloned()
                    .ok_or_else(|| {
                        AnalysisError::Internal("destination register out of bounds".to_string())
                    })?;
                if dst_post.category == Category::UninitRef {
                    // re-iteration: no other register may still hold the
                    // instance allocated here without an intervening <init>
                    for r in 0..self.code.registers_size() {
                        let reg = Reg::from(r as u16);
                        if reg == *dst {
                            continue;
                        }
                        if self.merged_pre_type(idx, reg)? == dst_post {
                            invalid!(
                                addr,
                                "Register {reg} contains an uninitialized reference that was created by this new-instance instruction."
                            );
                        }
                    }
                }
                self.classpath.resolve(class)?;
                if class.array_dimensions() > 0 {
                    invalid!(
                        addr,
                        "Cannot use array type \"{class}\" with new-instance. Use new-array instead."
                    );
                }
                if !class.is_reference() {
                    invalid!(addr, "Cannot use non-reference type \"{class}\" with new-instance");
                }
                self.set_destination(idx, RegisterType::uninitialized(class.clone(), addr))
            }
            Instr::NewArray(_, size, class) => {
                let size_type = self.pre_type(idx, *size)?;
                self.check_register(idx, &size_type, PRIMITIVE_32BIT)?;
                self.classpath.resolve(class)?;
                if class.array_dimensions() == 0 {
                    invalid!(
                        addr,
                        "Cannot use non-array type \"{class}\" with new-array. Use new-instance instead."
                    );
                }
                self.set_destination(idx, RegisterType::reference(class.clone()))
            }
            Instr::FilledNewArray(args, class) => {
                let regs: Vec<Reg> = args.iter().collect();
                self.handle_filled_new_array(idx, &regs, class)
            }
            Instr::FilledNewArrayRange(range, class) => {
                let regs: Vec<Reg> = range.iter().collect();
                self.handle_filled_new_array(idx, &regs, class)
            }
            Instr::FillArrayData(array, offset) => self.handle_fill_array_data(idx, *array, *offset),

            Instr::Throw(r) => {
                let t = self.pre_type(idx, *r)?;
                if t.category == Category::Null {
                    return Ok(());
                }
                if t.category != Category::Reference {
                    invalid!(addr, "Cannot use throw with non-reference type {t} in register {r}");
                }
                let class = t.class().ok_or_else(|| {
                    AnalysisError::Internal("reference register without a class".to_string())
                })?;
                let throwable = match class {
                    Type::Class(name) => self.classpath.extends_class(name, "java/lang/Throwable")?,
                    _ => false,
                };
                if !throwable {
                    invalid!(addr, "Cannot use throw with non-throwable type {class} in register {r}");
                }
                Ok(())
            }

            Instr::PackedSwitch(r, offset) => {
                let t = self.pre_type(idx, *r)?;
                self.check_register(idx, &t, PRIMITIVE_32BIT)?;
                let payload_addr = addr.offset(*offset);
                match self.code.instruction_at(payload_addr) {
                    Ok(payload) if matches!(payload.instr(), Instr::PackedSwitchPayload(_, _)) => {
                        Ok(())
                    }
                    _ => invalid!(
                        addr,
                        "There is no packed-switch-payload structure at code address {payload_addr:#x}"
                    ),
                }
            }
            Instr::SparseSwitch(r, offset) => {
                let t = self.pre_type(idx, *r)?;
                self.check_register(idx, &t, PRIMITIVE_32BIT)?;
                let payload_addr = addr.offset(*offset);
                match self.code.instruction_at(payload_addr) {
                    Ok(payload) if matches!(payload.instr(), Instr::SparseSwitchPayload(_, _)) => {
                        Ok(())
                    }
                    _ => invalid!(
                        addr,
                        "There is no sparse-switch-payload structure at code address {payload_addr:#x}"
                    ),
                }
            }

            Instr::CmplFloat(_, a, b) | Instr::CmpgFloat(_, a, b) => {
                let ta = self.pre_type(idx, *a)?;
                self.check_register(idx, &ta, PRIMITIVE_32BIT)?;
                let tb = self.pre_type(idx, *b)?;
                self.check_register(idx, &tb, PRIMITIVE_32BIT)?;
                self.set_destination(idx, RegisterType::BYTE)
            }
            Instr::CmplDouble(_, a, b) | Instr::CmpgDouble(_, a, b) | Instr::CmpLong(_, a, b) => {
                self.get_and_check_wide_source_pair(idx, *a)?;
                self.get_and_check_wide_source_pair(idx, *b)?;
                self.set_destination(idx, RegisterType::BYTE)
            }

            Instr::IfEq(a, b, _) | Instr::IfNe(a, b, _) => {
                let ta = self.pre_type(idx, *a)?;
                let tb = self.pre_type(idx, *b)?;
                let both_references =
                    REFERENCE.contains(ta.category) && REFERENCE.contains(tb.category);
                let both_primitives =
                    PRIMITIVE_32BIT.contains(ta.category) && PRIMITIVE_32BIT.contains(tb.category);
                if !(both_references || both_primitives) {
                    invalid!(
                        addr,
                        "{} cannot be used on registers of dissimilar types {ta} and {tb}. They must both be a reference type or a primitive 32 bit type.",
                        linstr.mnemonic()
                    );
                }
                Ok(())
            }
            Instr::IfLt(a, b, _) | Instr::IfGe(a, b, _) | Instr::IfGt(a, b, _) | Instr::IfLe(a, b, _) => {
                let ta = self.pre_type(idx, *a)?;
                self.check_register(idx, &ta, PRIMITIVE_32BIT)?;
                let tb = self.pre_type(idx, *b)?;
                self.check_register(idx, &tb, PRIMITIVE_32BIT)
            }
            Instr::IfEqz(r, _) | Instr::IfNez(r, _) => {
                let t = self.pre_type(idx, *r)?;
                if !REFERENCE.contains(t.category) && !PRIMITIVE_32BIT.contains(t.category) {
                    invalid!(
                        addr,
                        "{} cannot be used with register type {t}. Expecting 32-bit primitive type or reference type.",
                        linstr.mnemonic()
                    );
                }
                Ok(())
            }
            Instr::IfLtz(r, _) | Instr::IfGez(r, _) | Instr::IfGtz(r, _) | Instr::IfLez(r, _) => {
                let t = self.pre_type(idx, *r)?;
                self.check_register(idx, &t, PRIMITIVE_32BIT)
            }

            Instr::Aget(_, array, index) => {
                self.handle_primitive_aget(idx, *array, *index, Category::Integer)
            }
            Instr::AgetBoolean(_, array, index) => {
                self.handle_primitive_aget(idx, *array, *index, Category::Boolean)
            }
            Instr::AgetByte(_, array, index) => {
                self.handle_primitive_aget(idx, *array, *index, Category::Byte)
            }
            Instr::AgetChar(_, array, index) => {
                self.handle_primitive_aget(idx, *array, *index, Category::Char)
            }
            Instr::AgetShort(_, array, index) => {
                self.handle_primitive_aget(idx, *array, *index, Category::Short)
            }
            Instr::AgetWide(_, array, index) => self.handle_aget_wide(idx, *array, *index),
            Instr::AgetObject(_, array, index) => self.handle_aget_object(idx, *array, *index),

            Instr::Aput(src, array, index) => {
                self.handle_primitive_aput(idx, *src, *array, *index, Category::Integer)
            }
            Instr::AputBoolean(src, array, index) => {
                self.handle_primitive_aput(idx, *src, *array, *index, Category::Boolean)
            }
            Instr::AputByte(src, array, index) => {
                self.handle_primitive_aput(idx, *src, *array, *index, Category::Byte)
            }
            Instr::AputChar(src, array, index) => {
                self.handle_primitive_aput(idx, *src, *array, *index, Category::Char)
            }
            Instr::AputShort(src, array, index) => {
                self.handle_primitive_aput(idx, *src, *array, *index, Category::Short)
            }
            Instr::AputWide(src, array, index) => self.handle_aput_wide(idx, *src, *array, *index),
            Instr::AputObject(src, array, index) => {
                self.handle_aput_object(idx, *src, *array, *index)
            }

            Instr::Iget(_, obj, field) => {
                self.handle_primitive_iget(idx, *obj, field, Category::Integer)
            }
            Instr::IgetBoolean(_, obj, field) => {
                self.handle_primitive_iget(idx, *obj, field, Category::Boolean)
            }
            Instr::IgetByte(_, obj, field) => {
                self.handle_primitive_iget(idx, *obj, field, Category::Byte)
            }
            Instr::IgetChar(_, obj, field) => {
                self.handle_primitive_iget(idx, *obj, field, Category::Char)
            }
            Instr::IgetShort(_, obj, field) => {
                self.handle_primitive_iget(idx, *obj, field, Category::Short)
            }
            Instr::IgetWide(_, obj, field) => self.handle_iget_wide(idx, *obj, field),
            Instr::IgetObject(_, obj, field) => self.handle_iget_object(idx, *obj, field),

            Instr::Iput(src, obj, field) => {
                self.handle_primitive_iput(idx, *src, *obj, field, Category::Integer)
            }
            Instr::IputBoolean(src, obj, field) => {
                self.handle_primitive_iput(idx, *src, *obj, field, Category::Boolean)
            }
            Instr::IputByte(src, obj, field) => {
                self.handle_primitive_iput(idx, *src, *obj, field, Category::Byte)
            }
            Instr::IputChar(src, obj, field) => {
                self.handle_primitive_iput(idx, *src, *obj, field, Category::Char)
            }
            Instr::IputShort(src, obj, field) => {
                self.handle_primitive_iput(idx, *src, *obj, field, Category::Short)
            }
            Instr::IputWide(src, obj, field) => {
                self.handle_iput_wide(idx, *src, *obj, field)
            }
            Instr::IputObject(src, obj, field) => {
                self.handle_iput_object(idx, *src, *obj, field)
            }

            Instr::Sget(_, field) => {
                self.handle_primitive_sget(idx, field, Category::Integer)
            }
            Instr::SgetBoolean(_, field) => {
                self.handle_primitive_sget(idx, field, Category::Boolean)
            }
            Instr::SgetByte(_, field) => {
                self.handle_primitive_sget(idx, field, Category::Byte)
            }
            Instr::SgetChar(_, field) => {
                self.handle_primitive_sget(idx, field, Category::Char)
            }
            Instr::SgetShort(_, field) => {
                self.handle_primitive_sget(idx, field, Category::Short)
            }
            Instr::SgetWide(_, field) => self.handle_sget_wide(idx, field),
            Instr::SgetObject(_, field) => self.handle_sget_object(idx, field),

            Instr::Sput(src, field) => {
                self.handle_primitive_sput(idx, *src, field, Category::Integer)
            }
            Instr::SputBoolean(src, field) => {
                self.handle_primitive_sput(idx, *src, field, Category::Boolean)
            }
            Instr::SputByte(src, field) => {
                self.handle_primitive_sput(idx, *src, field, Category::Byte)
            }
            Instr::SputChar(src, field) => {
                self.handle_primitive_sput(idx, *src, field, Category::Char)
            }
            Instr::SputShort(src, field) => {
                self.handle_primitive_sput(idx, *src, field, Category::Short)
            }
            Instr::SputWide(src, field) => self.handle_sput_wide(idx, *src, field),
            Instr::SputObject(src, field) => self.handle_sput_object(idx, *src, field),

            Instr::InvokeVirtual(args, method) => {
                let regs: Vec<Reg> = args.iter().collect();
                self.handle_invoke(idx, InvokeKind::Virtual, &regs, method)
            }
            Instr::InvokeSuper(args, method) => {
                let regs: Vec<Reg> = args.iter().collect();
                self.handle_invoke(idx, InvokeKind::Super, &regs, method)
            }
            Instr::InvokeDirect(args, method) => {
                let regs: Vec<Reg> = args.iter().collect();
                self.handle_invoke(idx, InvokeKind::Direct, &regs, method)
            }
            Instr::InvokeStatic(args, method) => {
                let regs: Vec<Reg> = args.iter().collect();
                self.handle_invoke(idx, InvokeKind::Static, &regs, method)
            }
            Instr::InvokeInterface(args, method) => {
                let regs: Vec<Reg> = args.iter().collect();
                self.handle_invoke(idx, InvokeKind::Interface, &regs, method)
            }
            Instr::InvokeVirtualRange(range, method) => {
                let regs: Vec<Reg> = range.iter().collect();
                self.handle_invoke(idx, InvokeKind::Virtual, &regs, method)
            }
            Instr::InvokeSuperRange(range, method) => {
                let regs: Vec<Reg> = range.iter().collect();
                self.handle_invoke(idx, InvokeKind::Super, &regs, method)
            }
            Instr::InvokeDirectRange(range, method) => {
                let regs: Vec<Reg> = range.iter().collect();
                self.handle_invoke(idx, InvokeKind::Direct, &regs, method)
            }
            Instr::InvokeStaticRange(range, method) => {
                let regs: Vec<Reg> = range.iter().collect();
                self.handle_invoke(idx, InvokeKind::Static, &regs, method)
            }
            Instr::InvokeInterfaceRange(range, method) => {
                let regs: Vec<Reg> = range.iter().collect();
                self.handle_invoke(idx, InvokeKind::Interface, &regs, method)
            }

            Instr::NegInt(_, src) | Instr::NotInt(_, src) => {
                self.handle_unop(idx, *src, INTEGRAL, RegisterType::INTEGER)
            }
            Instr::IntToByte(_, src) => self.handle_unop(idx, *src, INTEGRAL, RegisterType::BYTE),
            Instr::IntToChar(_, src) => self.handle_unop(idx, *src, INTEGRAL, RegisterType::CHAR),
            Instr::IntToShort(_, src) => self.handle_unop(idx, *src, INTEGRAL, RegisterType::SHORT),
            Instr::IntToFloat(_, src) => self.handle_unop(idx, *src, INTEGRAL, RegisterType::FLOAT),
            Instr::IntToLong(_, src) => {
                self.handle_widening_unop(idx, *src, INTEGRAL, RegisterType::LONG_LO)
            }
            Instr::IntToDouble(_, src) => {
                self.handle_widening_unop(idx, *src, INTEGRAL, RegisterType::DOUBLE_LO)
            }
            Instr::NegFloat(_, src) => self.handle_unop(idx, *src, FLOATABLE, RegisterType::FLOAT),
            Instr::FloatToInt(_, src) => {
                self.handle_unop(idx, *src, FLOATABLE, RegisterType::INTEGER)
            }
            Instr::FloatToLong(_, src) => {
                self.handle_widening_unop(idx, *src, FLOATABLE, RegisterType::LONG_LO)
            }
            Instr::FloatToDouble(_, src) => {
                self.handle_widening_unop(idx, *src, FLOATABLE, RegisterType::DOUBLE_LO)
            }
            Instr::NegLong(_, src) | Instr::NotLong(_, src) => {
                self.check_typed_wide_pair(idx, *src, Category::LongLo)?;
                self.set_wide_destination(idx, RegisterType::LONG_LO)
            }
            Instr::LongToInt(_, src) => {
                self.check_typed_wide_pair(idx, *src, Category::LongLo)?;
                self.set_destination(idx, RegisterType::INTEGER)
            }
            Instr::LongToFloat(_, src) => {
                self.check_typed_wide_pair(idx, *src, Category::LongLo)?;
                self.set_destination(idx, RegisterType::FLOAT)
            }
            Instr::LongToDouble(_, src) => {
                self.check_typed_wide_pair(idx, *src, Category::LongLo)?;
                self.set_wide_destination(idx, RegisterType::DOUBLE_LO)
            }
            Instr::NegDouble(_, src) => {
                self.check_typed_wide_pair(idx, *src, Category::DoubleLo)?;
                self.set_wide_destination(idx, RegisterType::DOUBLE_LO)
            }
            Instr::DoubleToInt(_, src) => {
                self.check_typed_wide_pair(idx, *src, Category::DoubleLo)?;
                self.set_destination(idx, RegisterType::INTEGER)
            }
            Instr::DoubleToFloat(_, src) => {
                self.check_typed_wide_pair(idx, *src, Category::DoubleLo)?;
                self.set_destination(idx, RegisterType::FLOAT)
            }
            Instr::DoubleToLong(_, src) => {
                self.check_typed_wide_pair(idx, *src, Category::DoubleLo)?;
                self.set_wide_destination(idx, RegisterType::LONG_LO)
            }

            Instr::AddInt(_, a, b)
            | Instr::SubInt(_, a, b)
            | Instr::MulInt(_, a, b)
            | Instr::DivInt(_, a, b)
            | Instr::RemInt(_, a, b)
            | Instr::AndInt(_, a, b)
            | Instr::OrInt(_, a, b)
            | Instr::XorInt(_, a, b)
            | Instr::ShlInt(_, a, b)
            | Instr::ShrInt(_, a, b)
            | Instr::UshrInt(_, a, b) => self.handle_int_binop(idx, *a, *b),
            Instr::AddInt2addr(a, b)
            | Instr::SubInt2addr(a, b)
            | Instr::MulInt2addr(a, b)
            | Instr::DivInt2addr(a, b)
            | Instr::RemInt2addr(a, b)
            | Instr::AndInt2addr(a, b)
            | Instr::OrInt2addr(a, b)
            | Instr::XorInt2addr(a, b)
            | Instr::ShlInt2addr(a, b)
            | Instr::ShrInt2addr(a, b)
            | Instr::UshrInt2addr(a, b) => self.handle_int_binop(idx, *a, *b),
            Instr::AddIntLit16(_, src, _)
            | Instr::RsubInt(_, src, _)
            | Instr::MulIntLit16(_, src, _)
            | Instr::DivIntLit16(_, src, _)
            | Instr::RemIntLit16(_, src, _)
            | Instr::AndIntLit16(_, src, _)
            | Instr::OrIntLit16(_, src, _)
            | Instr::XorIntLit16(_, src, _)
            | Instr::AddIntLit8(_, src, _)
            | Instr::RsubIntLit8(_, src, _)
            | Instr::MulIntLit8(_, src, _)
            | Instr::DivIntLit8(_, src, _)
            | Instr::RemIntLit8(_, src, _)
            | Instr::AndIntLit8(_, src, _)
            | Instr::OrIntLit8(_, src, _)
            | Instr::XorIntLit8(_, src, _)
            | Instr::ShlIntLit8(_, src, _)
            | Instr::ShrIntLit8(_, src, _)
            | Instr::UshrIntLit8(_, src, _) => {
                self.handle_unop(idx, *src, INTEGRAL, RegisterType::INTEGER)
            }

            Instr::AddLong(_, a, b)
            | Instr::SubLong(_, a, b)
            | Instr::MulLong(_, a, b)
            | Instr::DivLong(_, a, b)
            | Instr::RemLong(_, a, b)
            | Instr::AndLong(_, a, b)
            | Instr::OrLong(_, a, b)
            | Instr::XorLong(_, a, b) => self.handle_long_binop(idx, *a, *b),
            Instr::AddLong2addr(a, b)
            | Instr::SubLong2addr(a, b)
            | Instr::MulLong2addr(a, b)
            | Instr::DivLong2addr(a, b)
            | Instr::RemLong2addr(a, b)
            | Instr::AndLong2addr(a, b)
            | Instr::OrLong2addr(a, b)
            | Instr::XorLong2addr(a, b) => self.handle_long_binop(idx, *a, *b),
            Instr::ShlLong(_, a, b) | Instr::ShrLong(_, a, b) | Instr::UshrLong(_, a, b) => {
                self.handle_long_shift(idx, *a, *b)
            }
            Instr::ShlLong2addr(a, b)
            | Instr::ShrLong2addr(a, b)
            | Instr::UshrLong2addr(a, b) => self.handle_long_shift(idx, *a, *b),

            Instr::AddFloat(_, a, b)
            | Instr::SubFloat(_, a, b)
            | Instr::MulFloat(_, a, b)
            | Instr::DivFloat(_, a, b)
            | Instr::RemFloat(_, a, b) => self.handle_float_binop(idx, *a, *b),
            Instr::AddFloat2addr(a, b)
            | Instr::SubFloat2addr(a, b)
            | Instr::MulFloat2addr(a, b)
            | Instr::DivFloat2addr(a, b)
            | Instr::RemFloat2addr(a, b) => self.handle_float_binop(idx, *a, *b),

            Instr::AddDouble(_, a, b)
            | Instr::SubDouble(_, a, b)
            | Instr::MulDouble(_, a, b)
            | Instr::DivDouble(_, a, b)
            | Instr::RemDouble(_, a, b) => self.handle_double_binop(idx, *a, *b),
            Instr::AddDouble2addr(a, b)
            | Instr::SubDouble2addr(a, b)
            | Instr::MulDouble2addr(a, b)
            | Instr::DivDouble2addr(a, b)
            | Instr::RemDouble2addr(a, b) => self.handle_double_binop(idx, *a, *b),
        }
    }

    // ---- common helpers -----------------------------------------------------

    fn mnemonic_of(&self, idx: usize) -> &'static str {
        self.insns[idx].instr().map_or("?", Instruction::mnemonic)
    }

    fn pre_type(&self, idx: usize, r: Reg) -> AnalysisResult<RegisterType> {
        if usize::from(r.value()) >= self.code.registers_size() {
            invalid!(
                self.addr_of(idx),
                "Register {r} is out of bounds (the method declares {} registers)",
                self.code.registers_size()
            );
        }
        self.merged_pre_type(idx, r)
    }

    fn check_register(
        &self,
        idx: usize,
        t: &RegisterType,
        allowed: CategorySet,
    ) -> AnalysisResult<()> {
        if !allowed.contains(t.category) {
            invalid!(
                self.addr_of(idx),
                "Invalid register type. Expecting one of: {{{allowed}}} but got \"{t}\""
            );
        }
        Ok(())
    }

    fn destination_register(&self, idx: usize) -> AnalysisResult<Reg> {
        self.insns[idx].destination().ok_or_else(|| {
            AnalysisError::Internal(format!(
                "instruction at {:#x} has no destination register",
                self.addr_of(idx).0
            ))
        })
    }

    fn set_destination(&mut self, idx: usize, t: RegisterType) -> AnalysisResult<()> {
        let dst = self.destination_register(idx)?;
        if usize::from(dst.value()) >= self.code.registers_size() {
            invalid!(
                self.addr_of(idx),
                "Register {dst} is out of bounds (the method declares {} registers)",
                self.code.registers_size()
            );
        }
        self.set_register_and_propagate(NodeId::Insn(idx), dst, t)
    }

    fn set_wide_destination(&mut self, idx: usize, t: RegisterType) -> AnalysisResult<()> {
        let dst = self.destination_register(idx)?;
        if usize::from(dst.value()) + 1 >= self.code.registers_size() {
            invalid!(
                self.addr_of(idx),
                "{dst} is the last register and not a valid wide register pair."
            );
        }
        let hi = t.wide_high();
        self.set_register_and_propagate(NodeId::Insn(idx), dst, t)?;
        self.set_register_and_propagate(NodeId::Insn(idx), dst.next(), hi)
    }

    /// Reads and validates a wide source pair: low half at `r`, matching
    /// high half at `r+1`. A still-`Unknown` low half passes through (the
    /// pair has not been reached on this path yet).
    fn get_and_check_wide_source_pair(&self, idx: usize, r: Reg) -> AnalysisResult<RegisterType> {
        let addr = self.addr_of(idx);
        if usize::from(r.value()) + 1 >= self.code.registers_size() {
            invalid!(addr, "{r} is the last register and not a valid wide register pair.");
        }
        let lo = self.pre_type(idx, r)?;
        if lo.category == Category::Unknown {
            return Ok(lo);
        }
        if !WIDE_LOW.contains(lo.category) {
            invalid!(addr, "{r} is not a valid wide register pair: the low half holds {lo}");
        }
        let hi = self.pre_type(idx, r.next())?;
        if !WIDE_HIGH.contains(hi.category) {
            invalid!(addr, "{r} is not a valid wide register pair: the high half holds {hi}");
        }
        if (lo.category == Category::LongLo) != (hi.category == Category::LongHi) {
            invalid!(
                addr,
                "The first register in the wide register pair isn't the same type (long vs. double) as the second register in the pair"
            );
        }
        Ok(lo)
    }

    fn check_typed_wide_pair(
        &self,
        idx: usize,
        r: Reg,
        expected: Category,
    ) -> AnalysisResult<()> {
        let t = self.get_and_check_wide_source_pair(idx, r)?;
        if t.category != Category::Unknown && t.category != expected {
            invalid!(
                self.addr_of(idx),
                "Cannot use {} with source register type {t}",
                self.mnemonic_of(idx)
            );
        }
        Ok(())
    }

    /// In an instance constructor, the superclass `<init>` must have run
    /// before any return: the `this` register may no longer be an
    /// uninitialized reference.
    fn handle_constructor_return(&self, idx: usize) -> AnalysisResult<()> {
        if self.method.flags().is_static() || !self.method.flags().is_constructor() {
            return Ok(());
        }
        let total = self.code.registers_size();
        let params = self.method.proto.parameter_register_count();
        let this_register = Reg::from((total - params - 1) as u16);
        let this_type = self.merged_pre_type(idx, this_register)?;
        if this_type.category == Category::UninitRef {
            invalid!(
                self.addr_of(idx),
                "Returning from constructor without calling the superclass' <init>"
            );
        }
        Ok(())
    }

    // ---- moves --------------------------------------------------------------

    fn handle_move(&mut self, idx: usize, src: Reg, allowed: CategorySet) -> AnalysisResult<()> {
        let src_type = self.pre_type(idx, src)?;
        self.check_register(idx, &src_type, allowed)?;
        self.set_destination(idx, src_type)
    }

    fn handle_move_result(
        &mut self,
        idx: usize,
        allowed: CategorySet,
        wide: bool,
    ) -> AnalysisResult<()> {
        let mnemonic = self.mnemonic_of(idx);
        let addr = self.addr_of(idx);
        if idx == 0 {
            invalid!(
                addr,
                "{mnemonic} cannot be the first instruction in a method. It must occur after an invoke-*/filled-new-array instruction"
            );
        }
        let Some(previous) = self.insns[idx - 1].instr() else {
            return Err(AnalysisError::Internal("missing previous instruction".to_string()));
        };
        if !previous.sets_result() {
            invalid!(addr, "{mnemonic} must occur after an invoke-*/filled-new-array instruction");
        }
        let result_type = match previous.instr() {
            Instr::InvokeVirtual(_, method)
            | Instr::InvokeSuper(_, method)
            | Instr::InvokeDirect(_, method)
            | Instr::InvokeStatic(_, method)
            | Instr::InvokeInterface(_, method)
            | Instr::InvokeVirtualRange(_, method)
            | Instr::InvokeSuperRange(_, method)
            | Instr::InvokeDirectRange(_, method)
            | Instr::InvokeStaticRange(_, method)
            | Instr::InvokeInterfaceRange(_, method) => {
                if method.proto.return_type == Type::Void {
                    invalid!(addr, "Cannot use {mnemonic} after an invocation of the void method {method}");
                }
                RegisterType::for_type(&method.proto.return_type)?
            }
            Instr::FilledNewArray(_, class) | Instr::FilledNewArrayRange(_, class) => {
                RegisterType::reference(class.clone())
            }
            _ => {
                return Err(AnalysisError::Internal(
                    "sets_result instruction without a result type".to_string(),
                ))
            }
        };
        self.check_register(idx, &result_type, allowed)?;
        if wide {
            self.set_wide_destination(idx, result_type)
        } else {
            self.set_destination(idx, result_type)
        }
    }

    fn handle_move_exception(&mut self, idx: usize) -> AnalysisResult<()> {
        let addr = self.addr_of(idx);
        let mut exception: Option<RegisterType> = None;
        for try_ in self.code.iter_tries() {
            if try_.catch_all_addr() == Some(addr) {
                let t = JAVA_LANG_THROWABLE.clone();
                exception = Some(match exception {
                    Some(previous) => previous.merge(&t, self.classpath)?,
                    None => t,
                });
            }
            for handler in try_.iter_handlers() {
                if handler.catch_addr() == addr {
                    let t = RegisterType::for_type(handler.catch_type())?;
                    exception = Some(match exception {
                        Some(previous) => previous.merge(&t, self.classpath)?,
                        None => t,
                    });
                }
            }
        }
        let Some(exception) = exception else {
            invalid!(
                addr,
                "move-exception must be the first instruction in an exception handler block"
            );
        };
        self.check_register(idx, &exception, REFERENCE)?;
        self.set_destination(idx, exception)
    }

    // ---- arrays -------------------------------------------------------------

    /// Extracts the array type of an array operand, rejecting non-reference
    /// and non-array values. `Null` operands are handled by the callers.
    fn array_operand(&self, idx: usize, t: &RegisterType) -> AnalysisResult<Type> {
        let mnemonic = self.mnemonic_of(idx);
        let addr = self.addr_of(idx);
        if t.category != Category::Reference {
            invalid!(addr, "Cannot use {mnemonic} with non-array type {t}");
        }
        let class = t.class().ok_or_else(|| {
            AnalysisError::Internal("reference register without a class".to_string())
        })?;
        if class.array_dimensions() == 0 {
            invalid!(addr, "Cannot use {mnemonic} with non-array type {class}");
        }
        Ok(class.clone())
    }

    fn handle_primitive_aget(
        &mut self,
        idx: usize,
        array: Reg,
        index: Reg,
        category: Category,
    ) -> AnalysisResult<()> {
        let index_type = self.pre_type(idx, index)?;
        self.check_register(idx, &index_type, PRIMITIVE_32BIT)?;
        let array_type = self.pre_type(idx, array)?;
        let mut dest = category;
        if array_type.category != Category::Null {
            let class = self.array_operand(idx, &array_type)?;
            let mnemonic = self.mnemonic_of(idx);
            let addr = self.addr_of(idx);
            if class.array_dimensions() != 1 {
                invalid!(addr, "Cannot use {mnemonic} with multi-dimensional array type {class}");
            }
            let base = RegisterType::for_type(class.base_element_type()?)?.category;
            if !check_array_field_assignment(base, category) {
                invalid!(
                    addr,
                    "Cannot use {mnemonic} with array type {class}. Incorrect array type for the instruction."
                );
            }
            dest = base;
        }
        self.set_destination(idx, RegisterType::primitive(dest))
    }

    fn handle_aget_wide(&mut self, idx: usize, array: Reg, index: Reg) -> AnalysisResult<()> {
        let index_type = self.pre_type(idx, index)?;
        self.check_register(idx, &index_type, PRIMITIVE_32BIT)?;
        let array_type = self.pre_type(idx, array)?;
        if array_type.category == Category::Null {
            return self.set_wide_destination(idx, RegisterType::LONG_LO);
        }
        let class = self.array_operand(idx, &array_type)?;
        let addr = self.addr_of(idx);
        if class.array_dimensions() != 1 {
            invalid!(addr, "Cannot use aget-wide with multi-dimensional array type {class}");
        }
        match class.base_element_type()? {
            Type::Long => self.set_wide_destination(idx, RegisterType::LONG_LO),
            Type::Double => self.set_wide_destination(idx, RegisterType::DOUBLE_LO),
            _ => invalid!(
                addr,
                "Cannot use aget-wide with array type {class}. Incorrect array type for the instruction."
            ),
        }
    }

    fn handle_aget_object(&mut self, idx: usize, array: Reg, index: Reg) -> AnalysisResult<()> {
        let index_type = self.pre_type(idx, index)?;
        self.check_register(idx, &index_type, PRIMITIVE_32BIT)?;
        let array_type = self.pre_type(idx, array)?;
        if array_type.category == Category::Null {
            return self.set_destination(idx, RegisterType::NULL);
        }
        let class = self.array_operand(idx, &array_type)?;
        let element = class.immediate_element_type()?;
        if !element.is_reference() {
            invalid!(
                self.addr_of(idx),
                "Cannot use aget-object with array type {class}. Incorrect array type for the instruction."
            );
        }
        self.set_destination(idx, RegisterType::reference(element))
    }

    fn handle_primitive_aput(
        &mut self,
        idx: usize,
        src: Reg,
        array: Reg,
        index: Reg,
        category: Category,
    ) -> AnalysisResult<()> {
        let index_type = self.pre_type(idx, index)?;
        self.check_register(idx, &index_type, PRIMITIVE_32BIT)?;
        let src_type = self.pre_type(idx, src)?;
        let assignable = src_type
            .can_be_assigned_to(&RegisterType::primitive(category), self.classpath)?
            || check_array_field_assignment(src_type.category, category);
        if !assignable {
            invalid!(
                self.addr_of(idx),
                "Cannot use {} with source register type {src_type}.",
                self.mnemonic_of(idx)
            );
        }
        let array_type = self.pre_type(idx, array)?;
        if array_type.category != Category::Null {
            let class = self.array_operand(idx, &array_type)?;
            let mnemonic = self.mnemonic_of(idx);
            let addr = self.addr_of(idx);
            if class.array_dimensions() != 1 {
                invalid!(addr, "Cannot use {mnemonic} with multi-dimensional array type {class}");
            }
            let base = RegisterType::for_type(class.base_element_type()?)?.category;
            if !check_array_field_assignment(base, category) {
                invalid!(
                    addr,
                    "Cannot use {mnemonic} with array type {class}. Incorrect array type for the instruction."
                );
            }
        }
        Ok(())
    }

    fn handle_aput_wide(
        &mut self,
        idx: usize,
        src: Reg,
        array: Reg,
        index: Reg,
    ) -> AnalysisResult<()> {
        let index_type = self.pre_type(idx, index)?;
        self.check_register(idx, &index_type, PRIMITIVE_32BIT)?;
        self.get_and_check_wide_source_pair(idx, src)?;
        let array_type = self.pre_type(idx, array)?;
        if array_type.category == Category::Null {
            return Ok(());
        }
        let class = self.array_operand(idx, &array_type)?;
        let addr = self.addr_of(idx);
        if class.array_dimensions() != 1 {
            invalid!(addr, "Cannot use aput-wide with multi-dimensional array type {class}");
        }
        if !matches!(class.base_element_type()?, Type::Long | Type::Double) {
            invalid!(
                addr,
                "Cannot use aput-wide with array type {class}. Incorrect array type for the instruction."
            );
        }
        Ok(())
    }

    fn handle_aput_object(
        &mut self,
        idx: usize,
        src: Reg,
        array: Reg,
        index: Reg,
    ) -> AnalysisResult<()> {
        let index_type = self.pre_type(idx, index)?;
        self.check_register(idx, &index_type, PRIMITIVE_32BIT)?;
        let src_type = self.pre_type(idx, src)?;
        self.check_register(idx, &src_type, REFERENCE)?;
        let array_type = self.pre_type(idx, array)?;
        if array_type.category == Category::Null {
            return Ok(());
        }
        let class = self.array_operand(idx, &array_type)?;
        let element = class.immediate_element_type()?;
        if !element.is_reference() {
            invalid!(
                self.addr_of(idx),
                "Cannot use aput-object with array type {class}. Incorrect array type for the instruction."
            );
        }
        Ok(())
    }

    fn handle_filled_new_array(
        &mut self,
        idx: usize,
        regs: &[Reg],
        array_type: &Type,
    ) -> AnalysisResult<()> {
        let mnemonic = self.mnemonic_of(idx);
        let addr = self.addr_of(idx);
        self.classpath.resolve(array_type)?;
        if array_type.array_dimensions() == 0 {
            invalid!(addr, "Cannot use non-array type \"{array_type}\" with {mnemonic}");
        }
        if array_type.base_element_type()?.is_wide() {
            invalid!(
                addr,
                "Cannot use filled-new-array to create an array of wide values (long or double)"
            );
        }
        let element_type = RegisterType::for_type(&array_type.immediate_element_type()?)?;
        for &reg in regs {
            let t = self.pre_type(idx, reg)?;
            if t.category == Category::Unknown {
                continue;
            }
            if !t.can_be_assigned_to(&element_type, self.classpath)? {
                invalid!(
                    addr,
                    "Register {reg} is of type {t} and is incompatible with the array type {array_type}"
                );
            }
        }
        Ok(())
    }

    fn handle_fill_array_data(&mut self, idx: usize, array: Reg, offset: i32) -> AnalysisResult<()> {
        let addr = self.addr_of(idx);
        let array_type = self.pre_type(idx, array)?;
        if array_type.category == Category::Null {
            return Ok(());
        }
        if array_type.category != Category::Reference {
            invalid!(
                addr,
                "Cannot use fill-array-data with non-array register {array} of type {array_type}"
            );
        }
        let class = self.array_operand(idx, &array_type)?;
        if class.array_dimensions() != 1 {
            invalid!(
                addr,
                "Cannot use fill-array-data with array type {class}. It can only be used with a one-dimensional array of primitives."
            );
        }
        let element_width = match class.base_element_type()? {
            Type::Boolean | Type::Byte => 1,
            Type::Char | Type::Short => 2,
            Type::Int | Type::Float => 4,
            Type::Long | Type::Double => 8,
            _ => invalid!(
                addr,
                "Cannot use fill-array-data with array type {class}. It can only be used with a one-dimensional array of primitives."
            ),
        };
        let payload_addr = addr.offset(offset);
        let payload_width = match self.code.instruction_at(payload_addr) {
            Ok(payload) => match payload.instr() {
                Instr::FillArrayDataPayload(width, _) => *width,
                _ => invalid!(
                    addr,
                    "Could not find an array data structure at code address {payload_addr:#x}"
                ),
            },
            Err(_) => invalid!(
                addr,
                "Could not find an array data structure at code address {payload_addr:#x}"
            ),
        };
        if payload_width != element_width {
            invalid!(
                addr,
                "The array data at code address {payload_addr:#x} does not have the correct element width for array type {class}. Expecting element width {element_width}, got element width {payload_width}."
            );
        }
        Ok(())
    }

    // ---- fields -------------------------------------------------------------

    /// Receiver check shared by the instance field accesses: the object must
    /// be a reference whose type is typeable as the field's defining class.
    fn check_field_receiver(
        &self,
        idx: usize,
        obj: Reg,
        field: &FieldRef,
    ) -> AnalysisResult<()> {
        let obj_type = self.pre_type(idx, obj)?;
        self.check_register(idx, &obj_type, REFERENCE)?;
        if obj_type.category != Category::Null {
            if let Some(obj_class) = obj_type.class() {
                if !reference_assignable(obj_class, &field.definer, self.classpath)? {
                    invalid!(
                        self.addr_of(idx),
                        "Cannot access field {field} through type {obj_class}"
                    );
                }
            }
        }
        Ok(())
    }

    fn check_field_category(
        &self,
        idx: usize,
        field: &FieldRef,
        category: Category,
    ) -> AnalysisResult<()> {
        let field_category = RegisterType::for_type(&field.ftype)?.category;
        if !check_array_field_assignment(field_category, category) {
            invalid!(
                self.addr_of(idx),
                "Cannot use {} with field {field}. Incorrect field type for the instruction.",
                self.mnemonic_of(idx)
            );
        }
        Ok(())
    }

    fn handle_primitive_iget(
        &mut self,
        idx: usize,
        obj: Reg,
        field: &FieldRef,
        category: Category,
    ) -> AnalysisResult<()> {
        self.check_field_receiver(idx, obj, field)?;
        self.check_field_category(idx, field, category)?;
        let dest = RegisterType::for_type(&field.ftype)?;
        self.set_destination(idx, dest)
    }

    fn handle_iget_wide(
        &mut self,
        idx: usize,
        obj: Reg,
        field: &FieldRef,
    ) -> AnalysisResult<()> {
        self.check_field_receiver(idx, obj, field)?;
        let field_type = RegisterType::for_type(&field.ftype)?;
        if !WIDE_LOW.contains(field_type.category) {
            invalid!(
                self.addr_of(idx),
                "Cannot use iget-wide with field {field}. Incorrect field type for the instruction."
            );
        }
        self.set_wide_destination(idx, field_type)
    }

    fn handle_iget_object(
        &mut self,
        idx: usize,
        obj: Reg,
        field: &FieldRef,
    ) -> AnalysisResult<()> {
        self.check_field_receiver(idx, obj, field)?;
        if !field.ftype.is_reference() {
            invalid!(
                self.addr_of(idx),
                "Cannot use iget-object with field {field}. Incorrect field type for the instruction."
            );
        }
        self.set_destination(idx, RegisterType::reference(field.ftype.clone()))
    }

    fn handle_primitive_iput(
        &mut self,
        idx: usize,
        src: Reg,
        obj: Reg,
        field: &FieldRef,
        category: Category,
    ) -> AnalysisResult<()> {
        self.check_field_receiver(idx, obj, field)?;
        let mut src_type = self.pre_type(idx, src)?;
        // per CodeVerify.c in dalvik: java generates synthetic functions
        // that write byte values into boolean fields
        if src_type.category == Category::Byte && category == Category::Boolean {
            src_type = RegisterType::BOOLEAN;
        }
        let assignable = src_type
            .can_be_assigned_to(&RegisterType::primitive(category), self.classpath)?
            || check_array_field_assignment(src_type.category, category);
        if !assignable {
            invalid!(
                self.addr_of(idx),
                "Cannot use {} with source register type {src_type}.",
                self.mnemonic_of(idx)
            );
        }
        self.check_field_category(idx, field, category)
    }

    fn handle_iput_wide(
        &mut self,
        idx: usize,
        src: Reg,
        obj: Reg,
        field: &FieldRef,
    ) -> AnalysisResult<()> {
        self.check_field_receiver(idx, obj, field)?;
        self.get_and_check_wide_source_pair(idx, src)?;
        let field_type = RegisterType::for_type(&field.ftype)?;
        if !WIDE_LOW.contains(field_type.category) {
            invalid!(
                self.addr_of(idx),
                "Cannot use iput-wide with field {field}. Incorrect field type for the instruction."
            );
        }
        Ok(())
    }

    fn handle_iput_object(
        &mut self,
        idx: usize,
        src: Reg,
        obj: Reg,
        field: &FieldRef,
    ) -> AnalysisResult<()> {
        self.check_field_receiver(idx, obj, field)?;
        let src_type = self.pre_type(idx, src)?;
        self.check_register(idx, &src_type, REFERENCE)?;
        if !field.ftype.is_reference() {
            invalid!(
                self.addr_of(idx),
                "Cannot use iput-object with field {field}. Incorrect field type for the instruction."
            );
        }
        self.check_reference_store(idx, &src_type, &field.ftype)
    }

    /// Store compatibility for `iput-object`/`sput-object`. Stores into an
    /// interface-typed field are only warned about, as the runtime does.
    fn check_reference_store(
        &self,
        idx: usize,
        src_type: &RegisterType,
        field_type: &Type,
    ) -> AnalysisResult<()> {
        if src_type.category != Category::Reference {
            return Ok(());
        }
        let Some(src_class) = src_type.class() else {
            return Err(AnalysisError::Internal(
                "reference register without a class".to_string(),
            ));
        };
        let interface_field = match field_type {
            Type::Class(name) => self.classpath.is_interface(name)?,
            _ => false,
        };
        if !reference_assignable(src_class, field_type, self.classpath)? {
            if interface_field {
                log::warn!(
                    "value of type {src_class} is not provably compatible with the interface field type {field_type}"
                );
            } else {
                invalid!(
                    self.addr_of(idx),
                    "Cannot store a value of type {src_class} into a field of type {field_type}"
                );
            }
        }
        Ok(())
    }

    fn handle_primitive_sget(
        &mut self,
        idx: usize,
        field: &FieldRef,
        category: Category,
    ) -> AnalysisResult<()> {
        self.check_field_category(idx, field, category)?;
        let dest = RegisterType::for_type(&field.ftype)?;
        self.set_destination(idx, dest)
    }

    fn handle_sget_wide(&mut self, idx: usize, field: &FieldRef) -> AnalysisResult<()> {
        let field_type = RegisterType::for_type(&field.ftype)?;
        if !WIDE_LOW.contains(field_type.category) {
            invalid!(
                self.addr_of(idx),
                "Cannot use sget-wide with field {field}. Incorrect field type for the instruction."
            );
        }
        self.set_wide_destination(idx, field_type)
    }

    fn handle_sget_object(
        &mut self,
        idx: usize,
        field: &FieldRef,
    ) -> AnalysisResult<()> {
        if !field.ftype.is_reference() {
            invalid!(
                self.addr_of(idx),
                "Cannot use sget-object with field {field}. Incorrect field type for the instruction."
            );
        }
        self.set_destination(idx, RegisterType::reference(field.ftype.clone()))
    }

    fn handle_primitive_sput(
        &mut self,
        idx: usize,
        src: Reg,
        field: &FieldRef,
        category: Category,
    ) -> AnalysisResult<()> {
        let mut src_type = self.pre_type(idx, src)?;
        if src_type.category == Category::Byte && category == Category::Boolean {
            src_type = RegisterType::BOOLEAN;
        }
        let assignable = src_type
            .can_be_assigned_to(&RegisterType::primitive(category), self.classpath)?
            || check_array_field_assignment(src_type.category, category);
        if !assignable {
            invalid!(
                self.addr_of(idx),
                "Cannot use {} with source register type {src_type}.",
                self.mnemonic_of(idx)
            );
        }
        self.check_field_category(idx, field, category)
    }

    fn handle_sput_wide(
        &mut self,
        idx: usize,
        src: Reg,
        field: &FieldRef,
    ) -> AnalysisResult<()> {
        self.get_and_check_wide_source_pair(idx, src)?;
        let field_type = RegisterType::for_type(&field.ftype)?;
        if !WIDE_LOW.contains(field_type.category) {
            invalid!(
                self.addr_of(idx),
                "Cannot use sput-wide with field {field}. Incorrect field type for the instruction."
            );
        }
        Ok(())
    }

    fn handle_sput_object(
        &mut self,
        idx: usize,
        src: Reg,
        field: &FieldRef,
    ) -> AnalysisResult<()> {
        let src_type = self.pre_type(idx, src)?;
        self.check_register(idx, &src_type, REFERENCE)?;
        if !field.ftype.is_reference() {
            invalid!(
                self.addr_of(idx),
                "Cannot use sput-object with field {field}. Incorrect field type for the instruction."
            );
        }
        self.check_reference_store(idx, &src_type, &field.ftype)
    }

    // ---- invokes ------------------------------------------------------------

    fn handle_invoke(
        &mut self,
        idx: usize,
        kind: InvokeKind,
        regs: &[Reg],
        method: &MethodRef,
    ) -> AnalysisResult<()> {
        let mnemonic = self.mnemonic_of(idx);
        let addr = self.addr_of(idx);

        let mut is_init = false;
        if method.is_init() {
            if kind == InvokeKind::Direct {
                is_init = true;
            } else {
                invalid!(addr, "Cannot call constructor {method} with {mnemonic}");
            }
        }

        let definer_is_interface = match &method.definer {
            Type::Class(name) => self.classpath.is_interface(name)?,
            _ => false,
        };
        if kind == InvokeKind::Interface {
            if !definer_is_interface {
                invalid!(
                    addr,
                    "Cannot call method {method} with {mnemonic}. {} is not an interface class.",
                    method.definer
                );
            }
        } else if definer_is_interface {
            invalid!(
                addr,
                "Cannot call method {method} with {mnemonic}. {} is an interface class. Use invoke-interface or invoke-interface/range instead.",
                method.definer
            );
        }

        if kind == InvokeKind::Super {
            let definer_name = method.definer.as_class_name().map_err(AnalysisError::Dex)?;
            let Some(superclass) = self.classpath.superclass(definer_name)?.map(str::to_string)
            else {
                invalid!(
                    addr,
                    "Cannot call method {method} with {mnemonic}. {} has no superclass",
                    method.definer
                );
            };
            if !self.classpath.has_virtual_method(&superclass, &method.signature())? {
                invalid!(
                    addr,
                    "Cannot call method {method} with {mnemonic}. The superclass {superclass} has no such method"
                );
            }
        }

        let expected = method.proto.parameter_register_count()
            + usize::from(kind != InvokeKind::Static);
        if regs.len() != expected {
            invalid!(
                addr,
                "The number of registers does not match the number of parameters for method {method}. Expecting {expected} registers, got {}.",
                regs.len()
            );
        }

        let mut next = 0usize;
        let mut receiver: Option<(Reg, RegisterType)> = None;
        if kind != InvokeKind::Static {
            let obj_reg = regs[0];
            next = 1;
            let obj_type = self.pre_type(idx, obj_reg)?;
            match obj_type.category {
                Category::UninitRef => {
                    if !is_init {
                        invalid!(
                            addr,
                            "Cannot invoke non-<init> method {method} on uninitialized reference type {obj_type}"
                        );
                    }
                }
                Category::Reference => {
                    if is_init {
                        invalid!(addr, "Cannot invoke {method} on initialized reference type {obj_type}");
                    }
                }
                Category::Null => {
                    if is_init {
                        invalid!(addr, "Cannot invoke {method} on a null reference");
                    }
                }
                Category::Unknown => {}
                _ => invalid!(addr, "Cannot invoke {method} on non-reference type {obj_type}"),
            }

            if let Some(obj_class) = obj_type.class() {
                if is_init {
                    let obj_name = obj_class.as_class_name().map_err(AnalysisError::Dex)?;
                    let called_name = method.definer.as_class_name().map_err(AnalysisError::Dex)?;
                    // chaining to the superclass constructor is only legal
                    // inside an <init> method
                    if called_name != obj_name
                        && self.classpath.superclass(obj_name)? == Some(called_name)
                        && self.method.name != "<init>"
                    {
                        invalid!(
                            addr,
                            "Cannot call {method} on type {obj_class}. The object type must match the method type exactly"
                        );
                    }
                }
                if kind != InvokeKind::Interface
                    && !reference_assignable(obj_class, &method.definer, self.classpath)?
                {
                    invalid!(
                        addr,
                        "Cannot call method {method} on an object of type {obj_class}, which does not extend {}.",
                        method.definer
                    );
                }
            }
            receiver = Some((obj_reg, obj_type));
        }

        for (p_index, parameter) in method.proto.parameters.iter().enumerate() {
            let Some(&reg) = regs.get(next) else {
                return Err(AnalysisError::Internal(
                    "argument register count mismatch".to_string(),
                ));
            };
            let arg_type = if parameter.is_wide() {
                let t = self.get_and_check_wide_source_pair(idx, reg)?;
                let Some(&second) = regs.get(next + 1) else {
                    invalid!(addr, "No 2nd register specified for wide register pair starting at {reg}");
                };
                if second != reg.next() {
                    invalid!(
                        addr,
                        "Invalid wide register pair ({reg}, {second}). Registers must be consecutive."
                    );
                }
                next += 2;
                t
            } else {
                next += 1;
                self.pre_type(idx, reg)?
            };
            if arg_type.category == Category::Unknown {
                continue;
            }
            let declared = RegisterType::for_type(parameter)?;
            if !arg_type.can_be_assigned_to(&declared, self.classpath)? {
                invalid!(
                    addr,
                    "Invalid register type {arg_type} for parameter {} {parameter}.",
                    p_index + 1
                );
            }
        }

        // a legal <init> call initializes the receiver: this register, and
        // every register still holding that exact uninitialized instance,
        // is promoted to an initialized reference
        if is_init {
            if let Some((obj_reg, obj_type)) = receiver {
                if obj_type.category == Category::UninitRef {
                    let obj_class = obj_type.class().cloned().ok_or_else(|| {
                        AnalysisError::Internal("uninitialized register without a class".to_string())
                    })?;
                    let initialized = RegisterType::reference(obj_class);
                    self.set_register_and_propagate(
                        NodeId::Insn(idx),
                        obj_reg,
                        initialized.clone(),
                    )?;
                    for r in 0..self.code.registers_size() {
                        let reg = Reg::from(r as u16);
                        if reg == obj_reg {
                            continue;
                        }
                        let post = self.insns[idx].post_register_type(reg).cloned().ok_or_else(
                            || AnalysisError::Internal("register out of post map bounds".to_string()),
                        )?;
                        if post.category != Category::Unknown {
                            continue;
                        }
                        let pre = self.merged_pre_type(idx, reg)?;
                        if pre.category == Category::UninitRef {
                            let t = if pre == obj_type { initialized.clone() } else { pre };
                            self.set_register_and_propagate(NodeId::Insn(idx), reg, t)?;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    // ---- arithmetic ---------------------------------------------------------

    fn handle_unop(
        &mut self,
        idx: usize,
        src: Reg,
        allowed: CategorySet,
        dest: RegisterType,
    ) -> AnalysisResult<()> {
        let src_type = self.pre_type(idx, src)?;
        self.check_register(idx, &src_type, allowed)?;
        self.set_destination(idx, dest)
    }

    fn handle_widening_unop(
        &mut self,
        idx: usize,
        src: Reg,
        allowed: CategorySet,
        dest: RegisterType,
    ) -> AnalysisResult<()> {
        let src_type = self.pre_type(idx, src)?;
        self.check_register(idx, &src_type, allowed)?;
        self.set_wide_destination(idx, dest)
    }

    fn handle_int_binop(&mut self, idx: usize, a: Reg, b: Reg) -> AnalysisResult<()> {
        let ta = self.pre_type(idx, a)?;
        self.check_register(idx, &ta, INTEGRAL)?;
        let tb = self.pre_type(idx, b)?;
        self.check_register(idx, &tb, INTEGRAL)?;
        self.set_destination(idx, RegisterType::INTEGER)
    }

    fn handle_long_binop(&mut self, idx: usize, a: Reg, b: Reg) -> AnalysisResult<()> {
        self.check_typed_wide_pair(idx, a, Category::LongLo)?;
        self.check_typed_wide_pair(idx, b, Category::LongLo)?;
        self.set_wide_destination(idx, RegisterType::LONG_LO)
    }

    fn handle_long_shift(&mut self, idx: usize, a: Reg, b: Reg) -> AnalysisResult<()> {
        self.check_typed_wide_pair(idx, a, Category::LongLo)?;
        let shift = self.pre_type(idx, b)?;
        self.check_register(idx, &shift, INTEGRAL)?;
        self.set_wide_destination(idx, RegisterType::LONG_LO)
    }

    fn handle_float_binop(&mut self, idx: usize, a: Reg, b: Reg) -> AnalysisResult<()> {
        let ta = self.pre_type(idx, a)?;
        self.check_register(idx, &ta, FLOATABLE)?;
        let tb = self.pre_type(idx, b)?;
        self.check_register(idx, &tb, FLOATABLE)?;
        self.set_destination(idx, RegisterType::FLOAT)
    }

    fn handle_double_binop(&mut self, idx: usize, a: Reg, b: Reg) -> AnalysisResult<()> {
        self.check_typed_wide_pair(idx, a, Category::DoubleLo)?;
        self.check_typed_wide_pair(idx, b, Category::DoubleLo)?;
        self.set_wide_destination(idx, RegisterType::DOUBLE_LO)
    }
}
