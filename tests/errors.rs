//! The runtime error taxonomy, exercised through complete programs.

mod common;

use common::try_run;

use rill_lang::interpreter::RuntimeError;

#[test]
fn undefined_variable() {
    assert!(matches!(
        try_run("print ghost"),
        Err(RuntimeError::UndefinedVariable { .. })
    ));
}

#[test]
fn assignment_to_undefined_variable() {
    assert!(matches!(
        try_run("x = 1"),
        Err(RuntimeError::UndefinedVariable { .. })
    ));
}

#[test]
fn duplicate_variable_in_same_scope() {
    assert!(matches!(
        try_run("var x = 1\nvar x = 2"),
        Err(RuntimeError::DuplicateDefinition { .. })
    ));
}

#[test]
fn duplicate_struct_declaration() {
    assert!(matches!(
        try_run("struct P { x: int }\nstruct P { y: int }"),
        Err(RuntimeError::DuplicateDefinition { .. })
    ));
}

#[test]
fn shadowing_in_inner_scope_is_allowed() {
    assert!(try_run("var x = 1\n{\n var x = 2\n print x\n}").is_ok());
}

#[test]
fn unknown_type_in_annotation() {
    assert!(matches!(
        try_run("var x: Ghost = 1"),
        Err(RuntimeError::UndefinedType { .. })
    ));
}

#[test]
fn unknown_parameter_type() {
    assert!(matches!(
        try_run("func f(x: Ghost) { }"),
        Err(RuntimeError::UndefinedType { .. })
    ));
}

#[test]
fn call_arity_mismatch_names_the_function() {
    let err = try_run("func f(x: int) { }\nf(1, 2)").unwrap_err();
    match err {
        RuntimeError::ArityMismatch {
            name,
            expected,
            found,
            ..
        } => {
            assert_eq!(name, "f");
            assert_eq!(expected, 1);
            assert_eq!(found, 2);
        }
        other => panic!("expected arity mismatch, got {other:?}"),
    }
}

#[test]
fn tuple_unpack_arity_mismatch() {
    let source = "\
func pair() -> (int, int) { return 1, 2 }
var a, b, c = pair()
";
    assert!(matches!(
        try_run(source),
        Err(RuntimeError::UnpackMismatch {
            expected: 3,
            found: 2,
            ..
        })
    ));
}

#[test]
fn unpacking_a_non_tuple() {
    assert!(matches!(
        try_run("var a, b = 1"),
        Err(RuntimeError::UnpackMismatch { .. })
    ));
}

#[test]
fn unknown_struct_field_in_literal() {
    assert!(matches!(
        try_run("struct P { x: int }\nvar p = P{ nope: 1 }"),
        Err(RuntimeError::UnknownField { .. })
    ));
}

#[test]
fn unknown_field_on_access() {
    assert!(matches!(
        try_run("struct P { x: int }\nvar p = P{ x: 1 }\nprint p.nope"),
        Err(RuntimeError::UnknownField { .. })
    ));
}

#[test]
fn property_access_on_non_struct() {
    assert!(matches!(
        try_run("var x = 1\nprint x.field"),
        Err(RuntimeError::TypeError { .. })
    ));
}

#[test]
fn non_boolean_condition() {
    assert!(matches!(
        try_run("if 1 { }"),
        Err(RuntimeError::TypeError { .. })
    ));
    assert!(matches!(
        try_run("while \"yes\" { }"),
        Err(RuntimeError::TypeError { .. })
    ));
}

#[test]
fn break_outside_a_loop() {
    assert!(matches!(
        try_run("break"),
        Err(RuntimeError::BreakOutsideLoop { .. })
    ));
}

#[test]
fn continue_outside_a_loop() {
    assert!(matches!(
        try_run("continue"),
        Err(RuntimeError::ContinueOutsideLoop { .. })
    ));
}

#[test]
fn break_in_a_function_without_a_loop() {
    assert!(matches!(
        try_run("func f() { break }\nf()"),
        Err(RuntimeError::BreakOutsideLoop { .. })
    ));
}

#[test]
fn return_at_top_level() {
    assert!(matches!(
        try_run("return 1"),
        Err(RuntimeError::ReturnOutsideFunction { .. })
    ));
}

#[test]
fn division_by_zero_carries_a_position() {
    let err = try_run("var x = 10 / 0").unwrap_err();
    assert!(matches!(err, RuntimeError::DivisionByZero { .. }));
    assert!(err.span().is_some());
}

#[test]
fn errors_stop_the_enclosing_block() {
    // the statement after the failing one must not run
    let source = "\
var trace = 0
{
  trace = 1 / 0
  trace = 99
}
";
    assert!(matches!(
        try_run(source),
        Err(RuntimeError::DivisionByZero { .. })
    ));
}
