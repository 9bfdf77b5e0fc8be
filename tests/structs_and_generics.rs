//! Struct declarations, methods and generic instantiation behaviour.

mod common;

use common::{interpreter_with_output, run, try_run};

use rill_lang::interpreter::RuntimeError;
use rill_lang::parser::parse;
use rill_lang::value::Value;

#[test]
fn nested_struct_values() {
    let source = "\
struct Inner { n: int }
struct Outer { inner: Inner }
var o = Outer{ inner: Inner{ n: 9 } }
print o.inner.n
";
    assert_eq!(run(source), "9\n");
}

#[test]
fn methods_receive_the_instance_as_self() {
    let source = "\
struct Point {
  x: int
  y: int

  func sum() -> int {
    return self.x + self.y
  }
}
var p = Point{ x: 3, y: 4 }
print p.sum()
";
    assert_eq!(run(source), "7\n");
}

#[test]
fn method_with_arguments() {
    let source = "\
struct Counter {
  n: int

  func add(by: int) -> int {
    return self.n + by
  }
}
var c = Counter{ n: 10 }
print c.add(5)
";
    assert_eq!(run(source), "15\n");
}

#[test]
fn fields_shadow_methods() {
    let source = "\
struct Odd {
  value: int

  func value() -> int { return -1 }
}
";
    // a field and method may share a name; lookup prefers the field
    let statements = parse(source).expect("parse failed");
    let (mut interp, _) = interpreter_with_output();
    for statement in &statements {
        interp.execute(statement).expect("execution failed");
    }
}

#[test]
fn methods_work_on_generic_instantiations() {
    let source = "\
struct Box[T] {
  v: T

  func get() -> T {
    return self.v
  }
}
var a = Box[int]{ v: 41 }
var b = Box[string]{ v: \"hi\" }
print a.get() + 1
print b.get()
";
    assert_eq!(run(source), "42\nhi\n");
}

#[test]
fn generic_fields_are_substituted() {
    let source = "\
struct Pair[A, B] { first: A  second: B }
var p = Pair[int, string]{ first: 1, second: \"two\" }
print p.first
print p.second
";
    let statements = parse(source).expect("parse failed");
    let (mut interp, output) = interpreter_with_output();
    for statement in &statements {
        interp.execute(statement).expect("execution failed");
    }
    assert_eq!(output.contents(), "1\ntwo\n");

    let Value::Struct(instance) = interp.env().get_var("p").expect("p missing") else {
        panic!("expected struct");
    };
    assert_eq!(instance.ty.name, "Pair[int,string]");
    assert_eq!(instance.ty.field("first").unwrap().name, "int");
    assert_eq!(instance.ty.field("second").unwrap().name, "string");
}

#[test]
fn nested_generic_instantiation() {
    let source = "\
struct Box[T] { v: T }
var inner = Box[int]{ v: 1 }
var outer = Box[Box[int]]{ v: inner }
print outer.v.v
";
    assert_eq!(run(source), "1\n");
}

#[test]
fn struct_identity_survives_separate_programs_in_one_process() {
    // the instantiation cache is process-wide; two interpreter instances
    // agree on the canonical symbol
    let source = "\
struct Box[T] { v: T }
var a = Box[int]{ v: 1 }
";
    let instance = |source: &str| {
        let statements = parse(source).expect("parse failed");
        let (mut interp, _) = interpreter_with_output();
        for statement in &statements {
            interp.execute(statement).expect("execution failed");
        }
        match interp.env().get_var("a").expect("a missing") {
            Value::Struct(instance) => instance,
            other => panic!("expected struct, got {other:?}"),
        }
    };

    let first = instance(source);
    let second = instance(source);
    assert_eq!(first.ty.name, second.ty.name);
}

#[test]
fn missing_type_arguments_is_an_error() {
    let source = "\
struct Box[T] { v: T }
var a = Box{ v: 1 }
";
    assert!(matches!(
        try_run(source),
        Err(RuntimeError::MissingTypeArguments { .. })
    ));
}

#[test]
fn wrong_type_argument_count_is_an_error() {
    let source = "\
struct Box[T] { v: T }
var a = Box[int, string]{ v: 1 }
";
    assert!(matches!(
        try_run(source),
        Err(RuntimeError::TypeArgumentMismatch { .. })
    ));
}

#[test]
fn type_arguments_on_a_plain_struct_are_an_error() {
    let source = "\
struct Point { x: int }
var p = Point[int]{ x: 1 }
";
    assert!(matches!(try_run(source), Err(RuntimeError::NotGeneric { .. })));
}

#[test]
fn generic_function_call_with_type_arguments() {
    let source = "\
func first[T](items: list) -> T {
  return items[0]
}
print first[int]([10, 20])
";
    assert_eq!(run(source), "10\n");
}

#[test]
fn struct_equality_is_structural() {
    let source = "\
struct Point { x: int  y: int }
print Point{ x: 1, y: 2 } == Point{ x: 1, y: 2 }
print Point{ x: 1, y: 2 } == Point{ x: 1, y: 3 }
";
    assert_eq!(run(source), "true\nfalse\n");
}
