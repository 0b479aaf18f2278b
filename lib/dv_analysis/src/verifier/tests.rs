use crate::classpath::{ClassDef, ClassPath};
use crate::errors::AnalysisResult;
use crate::regtype::{Category, RegisterType};
use crate::verifier::Verification;
use crate::verify_method;
use dv_dex::code::{CatchHandler, CodeItem, TryItem};
use dv_dex::flags::MethodFlags;
use dv_dex::instrs::Instr;
use dv_dex::methods::{EncodedMethod, FieldRef, MethodRef, Prototype};
use dv_dex::registers::Reg;
use dv_dex::types::Type;

fn classpath() -> ClassPath {
    let mut cp = ClassPath::new();
    cp.insert_class(ClassDef::new("java/lang/Object")).unwrap();
    cp.insert_class(ClassDef::new("java/lang/String")).unwrap();
    cp.insert_class(ClassDef::new("java/lang/Class")).unwrap();
    cp.insert_class(ClassDef::new("java/lang/Throwable")).unwrap();
    cp.insert_class(ClassDef::new("java/lang/Exception")).unwrap();
    cp.insert_extends("java/lang/Exception", "java/lang/Throwable")
        .unwrap();
    cp.insert_class(ClassDef::new("java/util/AbstractList"))
        .unwrap();
    cp.insert_class(ClassDef::new("java/util/ArrayList")).unwrap();
    cp.insert_class(ClassDef::new("java/util/LinkedList")).unwrap();
    cp.insert_extends("java/util/ArrayList", "java/util/AbstractList")
        .unwrap();
    cp.insert_extends("java/util/LinkedList", "java/util/AbstractList")
        .unwrap();
    cp.insert_class(ClassDef::interface("com/example/Iface")).unwrap();
    cp.insert_class(ClassDef::new("com/example/Base").with_virtual_method("frob()V"))
        .unwrap();
    cp.insert_class(ClassDef::new("com/example/Derived")).unwrap();
    cp.insert_extends("com/example/Derived", "com/example/Base")
        .unwrap();
    cp.insert_class(ClassDef::new("com/example/Util")).unwrap();
    cp.insert_class(ClassDef::new("com/example/Holder")).unwrap();
    cp.insert_class(ClassDef::new("com/example/Test")).unwrap();
    cp.close();
    cp
}

fn v(n: u16) -> Reg {
    Reg::from(n)
}

fn static_method(
    proto: Prototype,
    registers: usize,
    instrs: Vec<Instr>,
    tries: Vec<TryItem>,
) -> EncodedMethod {
    EncodedMethod::new(
        MethodFlags::ACC_PUBLIC | MethodFlags::ACC_STATIC,
        Type::class("com/example/Test"),
        "run",
        proto,
        Some(CodeItem::new(registers, instrs, tries)),
    )
}

fn constructor(definer: &str, registers: usize, instrs: Vec<Instr>) -> EncodedMethod {
    EncodedMethod::new(
        MethodFlags::ACC_PUBLIC | MethodFlags::ACC_CONSTRUCTOR,
        Type::class(definer),
        "<init>",
        Prototype::new(Type::Void, vec![]),
        Some(CodeItem::new(registers, instrs, vec![])),
    )
}

fn object_init() -> MethodRef {
    MethodRef::new(
        Type::class("java/lang/Object"),
        "<init>",
        Prototype::new(Type::Void, vec![]),
    )
}

fn err_message(result: AnalysisResult<Verification>) -> String {
    match result {
        Err(err) => format!("{err}"),
        Ok(_) => panic!("expected the verification to fail"),
    }
}

#[test]
fn trivial_identity() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Int, vec![Type::Int]),
        1,
        vec![Instr::Return(v(0))],
        vec![],
    );
    let verification = verify_method(&method, &cp).unwrap();
    assert_eq!(verification.instructions_count(), 1);
    assert_eq!(
        verification.instruction(0).pre_register_types()[0],
        RegisterType::INTEGER
    );
}

#[test]
fn object_construction() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::NewInstance(v(0), Type::class("java/lang/Object")),
            Instr::InvokeDirect(vec![0u16].into(), object_init()),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let verification = verify_method(&method, &cp).unwrap();
    assert_eq!(
        verification.instruction(0).post_register_types()[0].category,
        Category::UninitRef
    );
    assert_eq!(
        verification.instruction(1).post_register_types()[0],
        RegisterType::reference(Type::class("java/lang/Object"))
    );
    assert_eq!(
        verification.instruction(2).pre_register_types()[0],
        RegisterType::reference(Type::class("java/lang/Object"))
    );
}

#[test]
fn missing_superclass_init() {
    let cp = classpath();
    let method = constructor("com/example/Derived", 1, vec![Instr::ReturnVoid]);
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("Returning from constructor without calling the superclass' <init>"),
        "unexpected message: {message}"
    );
}

#[test]
fn constructor_chains_to_superclass() {
    let cp = classpath();
    let method = constructor(
        "com/example/Derived",
        1,
        vec![
            Instr::InvokeDirect(
                vec![0u16].into(),
                MethodRef::new(
                    Type::class("com/example/Base"),
                    "<init>",
                    Prototype::new(Type::Void, vec![]),
                ),
            ),
            Instr::ReturnVoid,
        ],
    );
    let verification = verify_method(&method, &cp).unwrap();
    assert_eq!(
        verification.instruction(0).post_register_types()[0],
        RegisterType::reference(Type::class("com/example/Derived"))
    );
}

#[test]
fn invalid_wide_array_access() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![Type::array(1, Type::Int), Type::Int]),
        4,
        vec![
            Instr::AgetWide(v(0), v(2), v(3)),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("Cannot use aget-wide with array type [I"),
        "unexpected message: {message}"
    );
}

#[test]
fn join_creates_common_supertype() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(
            Type::Void,
            vec![
                Type::class("java/util/ArrayList"),
                Type::class("java/util/LinkedList"),
                Type::Boolean,
            ],
        ),
        4,
        vec![
            Instr::IfEqz(v(3), 4),       // 0: size 2
            Instr::MoveObject(v(0), v(1)), // 2
            Instr::Goto(2),              // 3
            Instr::MoveObject(v(0), v(2)), // 4
            Instr::ReturnVoid,           // 5
        ],
        vec![],
    );
    let verification = verify_method(&method, &cp).unwrap();
    assert_eq!(
        verification.instruction(4).pre_register_types()[0],
        RegisterType::reference(Type::class("java/util/AbstractList"))
    );
}

#[test]
fn wide_pair_split_is_rejected() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Long, vec![Type::Long]),
        4,
        vec![
            Instr::MoveWide(v(0), v(2)),
            Instr::Const4(v(1), 0),
            Instr::ReturnWide(v(0)),
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("not a valid wide register pair"),
        "unexpected message: {message}"
    );
}

#[test]
fn exception_handler_flow() {
    let cp = classpath();
    let may_fail = MethodRef::new(
        Type::class("com/example/Util"),
        "mayFail",
        Prototype::new(Type::Void, vec![]),
    );
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::InvokeStatic(vec![0u16; 0].into(), may_fail), // 0: size 3
            Instr::ReturnVoid,                                   // 3
            Instr::MoveException(v(0)),                          // 4
            Instr::ReturnVoid,                                   // 5
        ],
        vec![TryItem::new(
            0,
            3,
            vec![CatchHandler::new(Type::class("java/lang/Exception"), 4)],
            None,
        )],
    );
    let verification = verify_method(&method, &cp).unwrap();
    assert_eq!(
        verification.instruction(2).post_register_types()[0],
        RegisterType::reference(Type::class("java/lang/Exception"))
    );
}

#[test]
fn stray_edge_into_move_exception() {
    let cp = classpath();
    // fallthrough from return is impossible, so use an explicit goto into
    // the handler prologue
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::Goto(1),             // 0: branches to 1
            Instr::MoveException(v(0)), // 1
            Instr::ReturnVoid,          // 2
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("move-exception"),
        "unexpected message: {message}"
    );
}

#[test]
fn fallthrough_past_last_instruction() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![Instr::Const4(v(0), 0)],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("Execution can continue past the last instruction"),
        "unexpected message: {message}"
    );
}

#[test]
fn dissimilar_if_operands() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![Type::Int, Type::class("java/lang/String")]),
        2,
        vec![Instr::IfEq(v(0), v(1), 2), Instr::ReturnVoid],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("dissimilar types"),
        "unexpected message: {message}"
    );
}

#[test]
fn invoke_arity_mismatch() {
    let cp = classpath();
    let take_int = MethodRef::new(
        Type::class("com/example/Util"),
        "take",
        Prototype::new(Type::Void, vec![Type::Int]),
    );
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::InvokeStatic(vec![0u16; 0].into(), take_int),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("The number of registers does not match"),
        "unexpected message: {message}"
    );
}

#[test]
fn invoke_virtual_on_interface() {
    let cp = classpath();
    let target = MethodRef::new(
        Type::class("com/example/Iface"),
        "frob",
        Prototype::new(Type::Void, vec![]),
    );
    let method = static_method(
        Prototype::new(Type::Void, vec![Type::class("com/example/Iface")]),
        1,
        vec![
            Instr::InvokeVirtual(vec![0u16].into(), target),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("is an interface class"),
        "unexpected message: {message}"
    );
}

#[test]
fn invoke_super_resolves_in_superclass() {
    let cp = classpath();
    let frob = MethodRef::new(
        Type::class("com/example/Derived"),
        "frob",
        Prototype::new(Type::Void, vec![]),
    );
    let method = EncodedMethod::new(
        MethodFlags::ACC_PUBLIC,
        Type::class("com/example/Derived"),
        "run",
        Prototype::new(Type::Void, vec![]),
        Some(CodeItem::new(
            1,
            vec![
                Instr::InvokeSuper(vec![0u16].into(), frob),
                Instr::ReturnVoid,
            ],
            vec![],
        )),
    );
    assert!(verify_method(&method, &cp).is_ok());
}

#[test]
fn invoke_super_without_method() {
    let cp = classpath();
    let missing = MethodRef::new(
        Type::class("com/example/Derived"),
        "missing",
        Prototype::new(Type::Void, vec![]),
    );
    let method = EncodedMethod::new(
        MethodFlags::ACC_PUBLIC,
        Type::class("com/example/Derived"),
        "run",
        Prototype::new(Type::Void, vec![]),
        Some(CodeItem::new(
            1,
            vec![
                Instr::InvokeSuper(vec![0u16].into(), missing),
                Instr::ReturnVoid,
            ],
            vec![],
        )),
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("has no such method"),
        "unexpected message: {message}"
    );
}

#[test]
fn wide_parameter_passing() {
    let cp = classpath();
    let take_long = MethodRef::new(
        Type::class("com/example/Util"),
        "take",
        Prototype::new(Type::Void, vec![Type::Long]),
    );
    let ok = static_method(
        Prototype::new(Type::Void, vec![Type::Long]),
        2,
        vec![
            Instr::InvokeStatic(vec![0u16, 1].into(), take_long.clone()),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    assert!(verify_method(&ok, &cp).is_ok());

    let split = static_method(
        Prototype::new(Type::Void, vec![Type::Long]),
        3,
        vec![
            Instr::InvokeStatic(vec![0u16, 2].into(), take_long),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&split, &cp));
    assert!(
        message.contains("Registers must be consecutive"),
        "unexpected message: {message}"
    );
}

#[test]
fn init_on_initialized_reference() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::NewInstance(v(0), Type::class("java/lang/Object")),
            Instr::InvokeDirect(vec![0u16].into(), object_init()),
            Instr::InvokeDirect(vec![0u16].into(), object_init()),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("on initialized reference type"),
        "unexpected message: {message}"
    );
}

#[test]
fn uninitialized_receiver_cannot_escape() {
    let cp = classpath();
    let use_obj = MethodRef::new(
        Type::class("com/example/Util"),
        "use",
        Prototype::new(Type::Void, vec![Type::class("java/lang/Object")]),
    );
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::NewInstance(v(0), Type::class("java/lang/Object")),
            Instr::InvokeStatic(vec![0u16].into(), use_obj),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("Invalid register type"),
        "unexpected message: {message}"
    );
}

#[test]
fn loop_reaches_fixpoint() {
    let cp = classpath();
    let proto = Prototype::new(Type::Int, vec![Type::Int]);
    let instrs = vec![
        Instr::Const4(v(0), 0),          // 0: size 1
        Instr::AddIntLit8(v(1), v(1), -1), // 1: size 2
        Instr::IfNez(v(1), -2),          // 3: size 2, back to 1
        Instr::Return(v(0)),             // 5
    ];
    let method = static_method(proto.clone(), 2, instrs.clone(), vec![]);
    let first = verify_method(&method, &cp).unwrap();
    let again = verify_method(&static_method(proto, 2, instrs, vec![]), &cp).unwrap();
    assert_eq!(first.instructions_count(), again.instructions_count());
    for i in 0..first.instructions_count() {
        assert_eq!(
            first.instruction(i).pre_register_types(),
            again.instruction(i).pre_register_types()
        );
        assert_eq!(
            first.instruction(i).post_register_types(),
            again.instruction(i).post_register_types()
        );
    }
    assert_eq!(
        first.instruction(3).pre_register_types()[1],
        RegisterType::INTEGER
    );
}

#[test]
fn packed_switch_flow() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Int, vec![Type::Int]),
        1,
        vec![
            Instr::PackedSwitch(v(0), 5),            // 0: size 3
            Instr::Const4(v(0), 1),                  // 3
            Instr::Return(v(0)),                     // 4
            Instr::PackedSwitchPayload(0, vec![3, 4]), // 5
        ],
        vec![],
    );
    assert!(verify_method(&method, &cp).is_ok());
}

#[test]
fn packed_switch_without_payload() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Int, vec![Type::Int]),
        1,
        vec![
            Instr::PackedSwitch(v(0), 3),              // 0: points at the const
            Instr::Const4(v(0), 1),                    // 3
            Instr::Return(v(0)),                       // 4
            Instr::PackedSwitchPayload(0, vec![3, 4]), // 5
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("There is no packed-switch-payload structure"),
        "unexpected message: {message}"
    );
}

#[test]
fn fill_array_data_width() {
    let cp = classpath();
    let ok = static_method(
        Prototype::new(Type::Void, vec![Type::array(1, Type::Int)]),
        1,
        vec![
            Instr::FillArrayData(v(0), 4),                // 0: size 3
            Instr::ReturnVoid,                            // 3
            Instr::FillArrayDataPayload(4, vec![0; 8]),   // 4
        ],
        vec![],
    );
    assert!(verify_method(&ok, &cp).is_ok());

    let bad = static_method(
        Prototype::new(Type::Void, vec![Type::array(1, Type::Short)]),
        1,
        vec![
            Instr::FillArrayData(v(0), 4),
            Instr::ReturnVoid,
            Instr::FillArrayDataPayload(4, vec![0; 8]),
        ],
        vec![],
    );
    let message = err_message(verify_method(&bad, &cp));
    assert!(
        message.contains("does not have the correct element width"),
        "unexpected message: {message}"
    );
}

#[test]
fn throw_requires_throwable() {
    let cp = classpath();
    let ok = static_method(
        Prototype::new(Type::Void, vec![Type::class("java/lang/Exception")]),
        1,
        vec![Instr::Throw(v(0))],
        vec![],
    );
    assert!(verify_method(&ok, &cp).is_ok());

    let bad = static_method(
        Prototype::new(Type::Void, vec![Type::class("java/lang/String")]),
        1,
        vec![Instr::Throw(v(0))],
        vec![],
    );
    let message = err_message(verify_method(&bad, &cp));
    assert!(
        message.contains("non-throwable type"),
        "unexpected message: {message}"
    );
}

#[test]
fn filled_new_array() {
    let cp = classpath();
    let ok = static_method(
        Prototype::new(Type::Void, vec![]),
        2,
        vec![
            Instr::Const4(v(0), 1),                                  // 0
            Instr::Const4(v(1), 2),                                  // 1
            Instr::FilledNewArray(vec![0u16, 1].into(), Type::array(1, Type::Int)), // 2: size 3
            Instr::MoveResultObject(v(0)),                           // 5
            Instr::ReturnVoid,                                       // 6
        ],
        vec![],
    );
    let verification = verify_method(&ok, &cp).unwrap();
    assert_eq!(
        verification.instruction(3).post_register_types()[0],
        RegisterType::reference(Type::array(1, Type::Int))
    );

    let wide = static_method(
        Prototype::new(Type::Void, vec![Type::Long]),
        2,
        vec![
            Instr::FilledNewArray(vec![0u16, 1].into(), Type::array(1, Type::Long)),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&wide, &cp));
    assert!(
        message.contains("array of wide values"),
        "unexpected message: {message}"
    );
}

#[test]
fn move_result_requires_invoke() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::Const4(v(0), 0),
            Instr::MoveResult(v(0)),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("must occur after an invoke-*/filled-new-array instruction"),
        "unexpected message: {message}"
    );
}

#[test]
fn monitor_requires_reference() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![Type::Int]),
        1,
        vec![Instr::MonitorEnter(v(0)), Instr::ReturnVoid],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("Invalid register type"),
        "unexpected message: {message}"
    );
}

#[test]
fn instance_field_access() {
    let cp = classpath();
    let field = FieldRef::new(Type::class("com/example/Holder"), "value", Type::Int);
    let ok = static_method(
        Prototype::new(Type::Int, vec![Type::class("com/example/Holder")]),
        2,
        vec![
            Instr::Iget(v(0), v(1), field.clone()),
            Instr::Return(v(0)),
        ],
        vec![],
    );
    assert!(verify_method(&ok, &cp).is_ok());

    let wrong_receiver = static_method(
        Prototype::new(Type::Int, vec![Type::class("java/lang/String")]),
        2,
        vec![Instr::Iget(v(0), v(1), field), Instr::Return(v(0))],
        vec![],
    );
    let message = err_message(verify_method(&wrong_receiver, &cp));
    assert!(
        message.contains("Cannot access field"),
        "unexpected message: {message}"
    );
}

#[test]
fn byte_into_boolean_field() {
    let cp = classpath();
    let flag = FieldRef::new(Type::class("com/example/Holder"), "flag", Type::Boolean);
    let method = static_method(
        Prototype::new(Type::Void, vec![Type::class("com/example/Holder"), Type::Byte]),
        2,
        vec![
            Instr::IputBoolean(v(1), v(0), flag),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    assert!(verify_method(&method, &cp).is_ok());
}

#[test]
fn aget_object_on_null_array() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![Type::Int]),
        2,
        vec![
            Instr::Const4(v(0), 0),
            Instr::AgetObject(v(0), v(0), v(1)),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let verification = verify_method(&method, &cp).unwrap();
    assert_eq!(
        verification.instruction(1).post_register_types()[0],
        RegisterType::NULL
    );
}

#[test]
fn int_float_array_interchange() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![Type::array(1, Type::Float), Type::Int]),
        3,
        vec![
            Instr::Aget(v(0), v(1), v(2)),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let verification = verify_method(&method, &cp).unwrap();
    assert_eq!(
        verification.instruction(0).post_register_types()[0],
        RegisterType::FLOAT
    );
}

#[test]
fn new_instance_rejects_arrays() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::NewInstance(v(0), Type::array(1, Type::Int)),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("with new-instance. Use new-array instead."),
        "unexpected message: {message}"
    );
}

#[test]
fn unresolved_class_is_reported() {
    let cp = classpath();
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::NewInstance(v(0), Type::class("com/example/Missing")),
            Instr::ReturnVoid,
        ],
        vec![],
    );
    let message = err_message(verify_method(&method, &cp));
    assert!(
        message.contains("class not found: com/example/Missing"),
        "unexpected message: {message}"
    );
}

#[test]
fn arithmetic_types() {
    let cp = classpath();
    let ok = static_method(
        Prototype::new(Type::Long, vec![Type::Long, Type::Long]),
        4,
        vec![
            Instr::AddLong(v(0), v(0), v(2)),
            Instr::ReturnWide(v(0)),
        ],
        vec![],
    );
    assert!(verify_method(&ok, &cp).is_ok());

    let mixed = static_method(
        Prototype::new(Type::Long, vec![Type::Long, Type::Double]),
        4,
        vec![
            Instr::AddLong(v(0), v(0), v(2)),
            Instr::ReturnWide(v(0)),
        ],
        vec![],
    );
    let message = err_message(verify_method(&mixed, &cp));
    assert!(
        message.contains("Cannot use add-long with source register type"),
        "unexpected message: {message}"
    );
}

#[test]
fn exception_edges_are_total() {
    let cp = classpath();
    let may_fail = MethodRef::new(
        Type::class("com/example/Util"),
        "mayFail",
        Prototype::new(Type::Void, vec![]),
    );
    let method = static_method(
        Prototype::new(Type::Void, vec![]),
        1,
        vec![
            Instr::InvokeStatic(vec![0u16; 0].into(), may_fail), // 0: size 3
            Instr::ReturnVoid,                                   // 3
            Instr::MoveException(v(0)),                          // 4
            Instr::ReturnVoid,                                   // 5
            Instr::MoveException(v(0)),                          // 6
            Instr::ReturnVoid,                                   // 7
        ],
        vec![TryItem::new(
            0,
            3,
            vec![CatchHandler::new(Type::class("java/lang/Exception"), 4)],
            Some(6),
        )],
    );
    let verification = verify_method(&method, &cp).unwrap();
    // every handler covering the throwing instruction is reachable, and the
    // catch-all handler catches Throwable
    assert_eq!(
        verification.instruction(4).post_register_types()[0],
        RegisterType::reference(Type::class("java/lang/Throwable"))
    );
    let handler_preds: Vec<_> = verification.instruction(2).predecessors().collect();
    assert!(!handler_preds.is_empty());
}
