//! Callable values: user functions carrying their defining environment,
//! and native functions backed by a host closure. Both share one call
//! contract: exact arity, fresh child environment, structured control
//! flow out.

use std::fmt::Display;
use std::rc::Rc;

use crate::environment::{EnvRef, Environment};
use crate::lexer::Span;
use crate::parser::ast::BlockStmt;
use crate::symtable::{ParamSymbol, TypeParamSymbol, VarSymbol};
use crate::value::Value;

use super::control_flow::Exec;
use super::error::RuntimeError;
use super::Interpreter;

pub type NativeFn = Box<dyn Fn(Vec<Value>, &mut Interpreter) -> Result<Value, RuntimeError>>;

pub enum Function {
    User(UserFunction),
    Native(NativeFunction),
}

pub struct UserFunction {
    /// Declared name; anonymous function expressions have none.
    pub name: Option<String>,
    pub params: Vec<ParamSymbol>,
    pub type_params: Vec<String>,
    pub body: Rc<BlockStmt>,
    /// The environment current at the defining site.
    pub env: EnvRef,
}

pub struct NativeFunction {
    pub name: String,
    pub func: NativeFn,
}

impl Function {
    pub fn name(&self) -> &str {
        match self {
            Function::User(user) => user.name.as_deref().unwrap_or("<anonymous>"),
            Function::Native(native) => &native.name,
        }
    }

    pub fn arity(&self) -> Option<usize> {
        match self {
            Function::User(user) => Some(user.params.len()),
            Function::Native(_) => None,
        }
    }

    /// Invoke with already-evaluated arguments. Type arguments supplied
    /// at the call site only introduce type-parameter symbols into the
    /// body's scope; they never change runtime behaviour.
    pub fn call(
        &self,
        arguments: Vec<Value>,
        span: Span,
        interp: &mut Interpreter,
    ) -> Result<Value, RuntimeError> {
        match self {
            Function::Native(native) => (native.func)(arguments, interp),
            Function::User(user) => user.call(arguments, span, interp),
        }
    }
}

impl UserFunction {
    fn call(
        &self,
        arguments: Vec<Value>,
        span: Span,
        interp: &mut Interpreter,
    ) -> Result<Value, RuntimeError> {
        if arguments.len() != self.params.len() {
            return Err(RuntimeError::ArityMismatch {
                name: self.name.clone().unwrap_or_else(|| "<anonymous>".into()),
                expected: self.params.len(),
                found: arguments.len(),
                span,
            });
        }

        let call_env = Environment::with_parent(self.env.clone());
        for type_param in &self.type_params {
            call_env
                .define_type_param(TypeParamSymbol {
                    name: type_param.clone(),
                })
                .map_err(|err| RuntimeError::duplicate(err, span))?;
        }
        for (param, argument) in self.params.iter().zip(arguments) {
            call_env
                .define_var(VarSymbol::new(&param.name, true, Some(param.ty.clone())))
                .map_err(|err| RuntimeError::duplicate(err, span))?;
            call_env.bind(&param.name, argument);
        }

        interp.push_env(call_env);
        let result = interp.execute_statements(&self.body.statements);
        interp.pop_env();

        match result? {
            Exec::Return(value) => Ok(value),
            Exec::Normal(_) => Ok(Value::Null),
            Exec::Break => Err(RuntimeError::BreakOutsideLoop { span }),
            Exec::Continue => Err(RuntimeError::ContinueOutsideLoop { span }),
        }
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::User(user) => f
                .debug_struct("UserFunction")
                .field("name", &user.name)
                .field("params", &user.params)
                .finish(),
            Function::Native(native) => f
                .debug_struct("NativeFunction")
                .field("name", &native.name)
                .finish(),
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Function::User(_) => write!(f, "<func {}>", self.name()),
            Function::Native(_) => write!(f, "<native func {}>", self.name()),
        }
    }
}
