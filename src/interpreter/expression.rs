//! Expression evaluation rules.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::environment::Environment;
use crate::lexer::{Literal, Span, TokenKind};
use crate::parser::ast::{
    BinaryExpr, CallExpr, DictExpr, Expression, FuncExpr, GetExpr, IndexExpr, StructLiteralExpr,
    UnaryExpr,
};
use crate::symtable::{TypeKind, VarSymbol};
use crate::value::{Dict, StructInstance, Value};

use super::function::UserFunction;
use super::{Function, Interpreter, RuntimeError};

impl Interpreter {
    pub fn eval(&mut self, expression: &Expression) -> Result<Value, RuntimeError> {
        match expression {
            Expression::Literal(literal) => literal_value(&literal.value),
            Expression::Variable(variable) => {
                self.env()
                    .get_var(&variable.name)
                    .ok_or_else(|| RuntimeError::UndefinedVariable {
                        name: variable.name.clone(),
                        span: variable.span,
                    })
            }
            Expression::Unary(unary) => self.eval_unary(unary),
            Expression::Binary(binary) => self.eval_binary(binary),
            Expression::Call(call) => self.eval_call(call),
            Expression::Index(index) => self.eval_index(index),
            Expression::Get(get) => self.eval_get(get),
            Expression::List(list) => {
                let elements = list
                    .elements
                    .iter()
                    .map(|element| self.eval(element))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::list(elements))
            }
            Expression::Dict(dict) => self.eval_dict(dict),
            Expression::StructLiteral(literal) => self.eval_struct_literal(literal),
            Expression::Func(func) => self.eval_func_expression(func),
        }
    }

    fn eval_unary(&mut self, unary: &UnaryExpr) -> Result<Value, RuntimeError> {
        let right = self.eval(&unary.right)?;
        let span = unary.operator.span;
        match unary.operator.kind {
            TokenKind::Minus => match right {
                Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
                Value::Float(x) => Ok(Value::Float(-x)),
                other => Err(RuntimeError::type_error(
                    format!("unary '-' requires a number, got '{}'", other.type_name()),
                    span,
                )),
            },
            TokenKind::Bang => match right {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(RuntimeError::type_error(
                    format!("unary '!' requires a boolean, got '{}'", other.type_name()),
                    span,
                )),
            },
            other => Err(RuntimeError::type_error(
                format!("unsupported unary operator '{other}'"),
                span,
            )),
        }
    }

    fn eval_binary(&mut self, binary: &BinaryExpr) -> Result<Value, RuntimeError> {
        let operator = binary.operator.kind;
        let span = binary.operator.span;

        // logical operators short-circuit and never see the right operand
        // unless they must
        if matches!(operator, TokenKind::And | TokenKind::Or) {
            let left = self.eval(&binary.left)?;
            let Some(left) = left.is_truthy_bool() else {
                return Err(logical_operand_error(operator, &left, span));
            };
            if (operator == TokenKind::And && !left) || (operator == TokenKind::Or && left) {
                return Ok(Value::Bool(left));
            }
            let right = self.eval(&binary.right)?;
            let Some(right) = right.is_truthy_bool() else {
                return Err(logical_operand_error(operator, &right, span));
            };
            return Ok(Value::Bool(right));
        }

        let left = self.eval(&binary.left)?;
        let right = self.eval(&binary.right)?;

        match operator {
            TokenKind::Plus => match (&left, &right) {
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
                _ => match numbers(&left, &right) {
                    Some(Numbers::Ints(a, b)) => Ok(Value::Int(a.wrapping_add(b))),
                    Some(Numbers::Floats(a, b)) => Ok(Value::Float(a + b)),
                    None => Err(binary_operand_error(operator, &left, &right, span)),
                },
            },
            TokenKind::Minus => match numbers(&left, &right) {
                Some(Numbers::Ints(a, b)) => Ok(Value::Int(a.wrapping_sub(b))),
                Some(Numbers::Floats(a, b)) => Ok(Value::Float(a - b)),
                None => Err(binary_operand_error(operator, &left, &right, span)),
            },
            TokenKind::Star => match numbers(&left, &right) {
                Some(Numbers::Ints(a, b)) => Ok(Value::Int(a.wrapping_mul(b))),
                Some(Numbers::Floats(a, b)) => Ok(Value::Float(a * b)),
                None => Err(binary_operand_error(operator, &left, &right, span)),
            },
            TokenKind::Slash => match numbers(&left, &right) {
                Some(Numbers::Ints(_, 0)) => Err(RuntimeError::DivisionByZero { span }),
                Some(Numbers::Ints(a, b)) => Ok(Value::Int(a.wrapping_div(b))),
                Some(Numbers::Floats(_, b)) if b == 0.0 => {
                    Err(RuntimeError::DivisionByZero { span })
                }
                Some(Numbers::Floats(a, b)) => Ok(Value::Float(a / b)),
                None => Err(binary_operand_error(operator, &left, &right, span)),
            },
            TokenKind::Percent => match numbers(&left, &right) {
                Some(Numbers::Ints(_, 0)) => Err(RuntimeError::DivisionByZero { span }),
                Some(Numbers::Ints(a, b)) => Ok(Value::Int(a.wrapping_rem(b))),
                Some(Numbers::Floats(_, b)) if b == 0.0 => {
                    Err(RuntimeError::DivisionByZero { span })
                }
                Some(Numbers::Floats(a, b)) => Ok(Value::Float(a % b)),
                None => Err(binary_operand_error(operator, &left, &right, span)),
            },
            TokenKind::Equal => Ok(Value::Bool(left.equals(&right))),
            TokenKind::NotEqual => Ok(Value::Bool(!left.equals(&right))),
            TokenKind::Less
            | TokenKind::LessEqual
            | TokenKind::Greater
            | TokenKind::GreaterEqual => match numbers(&left, &right) {
                Some(Numbers::Ints(a, b)) => Ok(Value::Bool(compare(operator, &a, &b))),
                Some(Numbers::Floats(a, b)) => Ok(Value::Bool(compare(operator, &a, &b))),
                None => Err(binary_operand_error(operator, &left, &right, span)),
            },
            other => Err(RuntimeError::type_error(
                format!("unsupported binary operator '{other}'"),
                span,
            )),
        }
    }

    fn eval_call(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        let callee = self.eval(&call.callee)?;
        let function = match callee {
            Value::Func(function) => function,
            other => {
                return Err(RuntimeError::NotCallable {
                    type_name: other.type_name(),
                    span: call.span,
                })
            }
        };

        // type arguments are resolved (so unknown names are reported) but
        // only feed type-parameter resolution inside the body
        if !call.type_args.is_empty() {
            for type_arg in &call.type_args {
                self.resolve_type_expr(type_arg)?;
            }
            if let Function::User(user) = function.as_ref() {
                if !user.type_params.is_empty() && user.type_params.len() != call.type_args.len()
                {
                    return Err(RuntimeError::TypeArgumentMismatch {
                        name: function.name().to_string(),
                        expected: user.type_params.len(),
                        found: call.type_args.len(),
                        span: call.span,
                    });
                }
            }
        }

        let arguments = call
            .arguments
            .iter()
            .map(|argument| self.eval(argument))
            .collect::<Result<Vec<_>, _>>()?;

        function.call(arguments, call.span, self)
    }

    fn eval_index(&mut self, index: &IndexExpr) -> Result<Value, RuntimeError> {
        let collection = self.eval(&index.collection)?;
        let key = self.eval(&index.index)?;

        match collection {
            Value::List(list) => {
                let i = match key {
                    Value::Int(i) => i,
                    other => {
                        return Err(RuntimeError::type_error(
                            format!("list index must be an integer, got '{}'", other.type_name()),
                            index.span,
                        ))
                    }
                };
                let list = list.borrow();
                if i < 0 || i as usize >= list.len() {
                    return Err(RuntimeError::IndexOutOfRange {
                        index: i,
                        len: list.len(),
                        span: index.span,
                    });
                }
                Ok(list[i as usize].clone())
            }
            Value::Dict(dict) => {
                if key.hash_key().is_none() {
                    return Err(RuntimeError::UnhashableKey {
                        type_name: key.type_name(),
                        span: index.span,
                    });
                }
                let (value, present) = dict.borrow().get(&key);
                if !present {
                    return Err(RuntimeError::KeyNotFound {
                        key: key.to_string(),
                        span: index.span,
                    });
                }
                Ok(value)
            }
            other => Err(RuntimeError::type_error(
                format!("cannot index into a value of type '{}'", other.type_name()),
                index.span,
            )),
        }
    }

    /// Member access on struct instances: fields win, then the type's
    /// methods, bound to the receiver.
    fn eval_get(&mut self, get: &GetExpr) -> Result<Value, RuntimeError> {
        let object = self.eval(&get.object)?;
        let instance = match object {
            Value::Struct(instance) => instance,
            other => {
                return Err(RuntimeError::type_error(
                    format!(
                        "property access on non-struct value of type '{}'",
                        other.type_name()
                    ),
                    get.span,
                ))
            }
        };

        if let Some(value) = instance.fields.borrow().get(&get.name) {
            return Ok(value.clone());
        }

        if let Some(method) = self.method(instance.ty.method_key(), &get.name) {
            return self.bind_method(&instance, &method, get.span);
        }

        Err(RuntimeError::UnknownField {
            type_name: instance.ty.name.clone(),
            field: get.name.clone(),
            span: get.span,
        })
    }

    /// A method value is the method function closed over an extra frame
    /// binding the receiver as `self`.
    fn bind_method(
        &mut self,
        instance: &Rc<StructInstance>,
        method: &Rc<Function>,
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let Function::User(user) = method.as_ref() else {
            return Ok(Value::Func(method.clone()));
        };

        let bound_env = Environment::with_parent(user.env.clone());
        bound_env
            .define_var(VarSymbol::new("self", false, Some(instance.ty.clone())))
            .map_err(|err| RuntimeError::duplicate(err, span))?;
        bound_env.bind("self", Value::Struct(instance.clone()));

        Ok(Value::Func(Rc::new(Function::User(UserFunction {
            name: user.name.clone(),
            params: user.params.clone(),
            type_params: user.type_params.clone(),
            body: user.body.clone(),
            env: bound_env,
        }))))
    }

    fn eval_dict(&mut self, expr: &DictExpr) -> Result<Value, RuntimeError> {
        let mut dict = Dict::new();
        for (key_expr, value_expr) in &expr.pairs {
            let key = self.eval(key_expr)?;
            if key.hash_key().is_none() {
                return Err(RuntimeError::UnhashableKey {
                    type_name: key.type_name(),
                    span: key_expr.position(),
                });
            }
            let value = self.eval(value_expr)?;
            dict.set(key, value);
        }
        Ok(Value::dict(dict))
    }

    fn eval_struct_literal(&mut self, literal: &StructLiteralExpr) -> Result<Value, RuntimeError> {
        let ty = self.resolve_type_expr(&literal.type_expr)?;
        if ty.kind != TypeKind::Struct {
            return Err(RuntimeError::type_error(
                format!("'{}' is not a struct type", ty.name),
                literal.span,
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for (name, _) in &literal.fields {
            if ty.field(name).is_none() {
                return Err(RuntimeError::UnknownField {
                    type_name: ty.name.clone(),
                    field: name.clone(),
                    span: literal.span,
                });
            }
            if !seen.insert(name.clone()) {
                return Err(RuntimeError::type_error(
                    format!("duplicate field '{name}' in struct literal"),
                    literal.span,
                ));
            }
        }

        // fields evaluate in the type's declared order; omitted ones
        // default to null
        let mut fields = IndexMap::new();
        for field_name in ty.fields.keys() {
            let value = match literal
                .fields
                .iter()
                .find(|(name, _)| name == field_name)
            {
                Some((_, expr)) => self.eval(expr)?,
                None => Value::Null,
            };
            fields.insert(field_name.clone(), value);
        }

        Ok(Value::Struct(Rc::new(StructInstance {
            ty,
            fields: RefCell::new(fields),
        })))
    }

    fn eval_func_expression(&mut self, func: &FuncExpr) -> Result<Value, RuntimeError> {
        let (function, _) =
            self.build_function(None, &[], &func.params, &[], &func.body, func.span)?;
        Ok(Value::Func(function))
    }
}

fn literal_value(token: &crate::lexer::Token) -> Result<Value, RuntimeError> {
    let value = match (token.kind, &token.literal) {
        (TokenKind::True, _) => Value::Bool(true),
        (TokenKind::False, _) => Value::Bool(false),
        (TokenKind::Nil, _) => Value::Null,
        (TokenKind::Integer, Some(Literal::Int(i))) => Value::Int(*i),
        (TokenKind::Float, Some(Literal::Float(x))) => Value::Float(*x),
        (TokenKind::Str, Some(Literal::Str(s))) => Value::Str(s.clone()),
        _ => {
            return Err(RuntimeError::type_error(
                format!("malformed literal token {token}"),
                token.span,
            ))
        }
    };
    Ok(value)
}

enum Numbers {
    Ints(i64, i64),
    Floats(f64, f64),
}

/// Pair up numeric operands, promoting to float when the tags differ.
fn numbers(left: &Value, right: &Value) -> Option<Numbers> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(Numbers::Ints(*a, *b)),
        (Value::Float(a), Value::Float(b)) => Some(Numbers::Floats(*a, *b)),
        (Value::Int(a), Value::Float(b)) => Some(Numbers::Floats(*a as f64, *b)),
        (Value::Float(a), Value::Int(b)) => Some(Numbers::Floats(*a, *b as f64)),
        _ => None,
    }
}

fn compare<T: PartialOrd>(operator: TokenKind, a: &T, b: &T) -> bool {
    match operator {
        TokenKind::Less => a < b,
        TokenKind::LessEqual => a <= b,
        TokenKind::Greater => a > b,
        TokenKind::GreaterEqual => a >= b,
        _ => false,
    }
}

fn binary_operand_error(
    operator: TokenKind,
    left: &Value,
    right: &Value,
    span: Span,
) -> RuntimeError {
    RuntimeError::type_error(
        format!(
            "operator '{operator}' cannot be applied to '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ),
        span,
    )
}

fn logical_operand_error(operator: TokenKind, value: &Value, span: Span) -> RuntimeError {
    RuntimeError::type_error(
        format!(
            "operator '{operator}' requires boolean operands, got '{}'",
            value.type_name()
        ),
        span,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_source(source: &str) -> Result<Value, RuntimeError> {
        let statements = crate::parser::parse(source).expect("parse failed");
        let mut interp = Interpreter::with_output(Box::new(std::io::sink()));
        let mut last = Value::Null;
        for statement in &statements {
            last = interp.execute(statement)?;
        }
        Ok(last)
    }

    fn eval_ok(source: &str) -> Value {
        eval_source(source).expect("evaluation failed")
    }

    #[test]
    fn test_arithmetic() {
        assert!(eval_ok("1 + 2 * 3").equals(&Value::Int(7)));
        assert!(eval_ok("(1 + 2) * 3").equals(&Value::Int(9)));
        assert!(eval_ok("7 / 2").equals(&Value::Int(3)));
        assert!(eval_ok("7 % 2").equals(&Value::Int(1)));
        assert!(eval_ok("-3 + 1").equals(&Value::Int(-2)));
    }

    #[test]
    fn test_mixed_arithmetic_promotes() {
        assert!(eval_ok("1 + 0.5").equals(&Value::Float(1.5)));
        assert!(eval_ok("7.0 / 2").equals(&Value::Float(3.5)));
    }

    #[test]
    fn test_string_concatenation() {
        assert!(eval_ok("\"foo\" + \"bar\"").equals(&Value::Str("foobar".into())));
    }

    #[test]
    fn test_plus_type_mismatch() {
        let err = eval_source("1 + \"one\"").unwrap_err();
        assert!(matches!(err, RuntimeError::TypeError { .. }));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(
            eval_source("1 / 0"),
            Err(RuntimeError::DivisionByZero { .. })
        ));
        assert!(matches!(
            eval_source("1.0 % 0.0"),
            Err(RuntimeError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_comparisons() {
        assert!(eval_ok("1 < 2").equals(&Value::Bool(true)));
        assert!(eval_ok("2 <= 1").equals(&Value::Bool(false)));
        assert!(eval_ok("1.5 > 1").equals(&Value::Bool(true)));
    }

    #[test]
    fn test_equality() {
        assert!(eval_ok("1 == 1.0").equals(&Value::Bool(true)));
        assert!(eval_ok("\"a\" == \"a\"").equals(&Value::Bool(true)));
        assert!(eval_ok("1 == \"1\"").equals(&Value::Bool(false)));
        assert!(eval_ok("nil == nil").equals(&Value::Bool(true)));
        assert!(eval_ok("[1, 2] == [1, 2]").equals(&Value::Bool(true)));
    }

    #[test]
    fn test_short_circuit() {
        // the right operand would blow up if evaluated
        assert!(eval_ok("false && (1 / 0 == 0)").equals(&Value::Bool(false)));
        assert!(eval_ok("true || (1 / 0 == 0)").equals(&Value::Bool(true)));
    }

    #[test]
    fn test_logical_requires_booleans() {
        assert!(matches!(
            eval_source("1 && true"),
            Err(RuntimeError::TypeError { .. })
        ));
    }

    #[test]
    fn test_unary() {
        assert!(eval_ok("!true").equals(&Value::Bool(false)));
        assert!(eval_ok("-2.5").equals(&Value::Float(-2.5)));
        assert!(matches!(
            eval_source("-\"x\""),
            Err(RuntimeError::TypeError { .. })
        ));
    }

    #[test]
    fn test_undefined_variable() {
        assert!(matches!(
            eval_source("ghost"),
            Err(RuntimeError::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_list_indexing() {
        assert!(eval_ok("[10, 20, 30][1]").equals(&Value::Int(20)));
        assert!(matches!(
            eval_source("[1][5]"),
            Err(RuntimeError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            eval_source("[1][-1]"),
            Err(RuntimeError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_dict_lookup() {
        assert!(eval_ok("{\"a\": 1}[\"a\"]").equals(&Value::Int(1)));
        assert!(matches!(
            eval_source("{\"a\": 1}[\"b\"]"),
            Err(RuntimeError::KeyNotFound { .. })
        ));
    }

    #[test]
    fn test_composite_dict_key_is_an_error() {
        assert!(matches!(
            eval_source("{[1]: 1}"),
            Err(RuntimeError::UnhashableKey { .. })
        ));
    }

    #[test]
    fn test_indexing_non_indexable() {
        assert!(matches!(
            eval_source("5[0]"),
            Err(RuntimeError::TypeError { .. })
        ));
    }

    #[test]
    fn test_call_non_callable() {
        assert!(matches!(
            eval_source("x := 3 x()"),
            Err(RuntimeError::NotCallable { .. })
        ));
    }

    #[test]
    fn test_struct_literal_defaults_and_unknown_field() {
        let value = eval_ok("struct P { x: int  y: int }\nP{x: 1}");
        let Value::Struct(instance) = value else {
            panic!("expected struct instance");
        };
        assert!(instance.fields.borrow()["y"].equals(&Value::Null));

        assert!(matches!(
            eval_source("struct P { x: int }\nP{z: 1}"),
            Err(RuntimeError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_anonymous_function_value() {
        let value = eval_ok("func (x: int) { return x }");
        assert!(matches!(value, Value::Func(_)));
    }
}
