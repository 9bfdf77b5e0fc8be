use std::{error::Error, fmt::Display};

use crate::lexer::Span;
use crate::symtable::{DefineError, SymbolKind};

/// Everything that can go wrong while executing statements: name
/// resolution, duplicate definitions, arity and shape mismatches,
/// operator type errors and runtime domain errors. None of these are
/// recovered inside the evaluator; they stop the enclosing block and
/// flow upward to the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    UndefinedVariable {
        name: String,
        span: Span,
    },
    UndefinedType {
        name: String,
        span: Span,
    },
    DuplicateDefinition {
        kind: SymbolKind,
        name: String,
        span: Span,
    },
    NotCallable {
        type_name: String,
        span: Span,
    },
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    TypeArgumentMismatch {
        name: String,
        expected: usize,
        found: usize,
        span: Span,
    },
    NotGeneric {
        name: String,
        span: Span,
    },
    MissingTypeArguments {
        name: String,
        span: Span,
    },
    UnpackMismatch {
        expected: usize,
        found: usize,
        span: Span,
    },
    UnknownField {
        type_name: String,
        field: String,
        span: Span,
    },
    TypeError {
        message: String,
        span: Span,
    },
    DivisionByZero {
        span: Span,
    },
    IndexOutOfRange {
        index: i64,
        len: usize,
        span: Span,
    },
    KeyNotFound {
        key: String,
        span: Span,
    },
    UnhashableKey {
        type_name: String,
        span: Span,
    },
    BreakOutsideLoop {
        span: Span,
    },
    ContinueOutsideLoop {
        span: Span,
    },
    ReturnOutsideFunction {
        span: Span,
    },
    Io {
        message: String,
    },
}

impl RuntimeError {
    pub fn span(&self) -> Option<Span> {
        match self {
            RuntimeError::UndefinedVariable { span, .. }
            | RuntimeError::UndefinedType { span, .. }
            | RuntimeError::DuplicateDefinition { span, .. }
            | RuntimeError::NotCallable { span, .. }
            | RuntimeError::ArityMismatch { span, .. }
            | RuntimeError::TypeArgumentMismatch { span, .. }
            | RuntimeError::NotGeneric { span, .. }
            | RuntimeError::MissingTypeArguments { span, .. }
            | RuntimeError::UnpackMismatch { span, .. }
            | RuntimeError::UnknownField { span, .. }
            | RuntimeError::TypeError { span, .. }
            | RuntimeError::DivisionByZero { span }
            | RuntimeError::IndexOutOfRange { span, .. }
            | RuntimeError::KeyNotFound { span, .. }
            | RuntimeError::UnhashableKey { span, .. }
            | RuntimeError::BreakOutsideLoop { span }
            | RuntimeError::ContinueOutsideLoop { span }
            | RuntimeError::ReturnOutsideFunction { span } => Some(*span),
            RuntimeError::Io { .. } => None,
        }
    }

    pub fn duplicate(err: DefineError, span: Span) -> Self {
        RuntimeError::DuplicateDefinition {
            kind: err.kind,
            name: err.name,
            span,
        }
    }

    pub fn type_error(message: impl ToString, span: Span) -> Self {
        RuntimeError::TypeError {
            message: message.to_string(),
            span,
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::UndefinedVariable { name, .. } => {
                write!(f, "undefined variable '{name}'")
            }
            RuntimeError::UndefinedType { name, .. } => write!(f, "unknown type '{name}'"),
            RuntimeError::DuplicateDefinition { kind, name, .. } => {
                write!(f, "{kind} '{name}' already defined in this scope")
            }
            RuntimeError::NotCallable { type_name, .. } => {
                write!(f, "value of type '{type_name}' is not callable")
            }
            RuntimeError::ArityMismatch {
                name,
                expected,
                found,
                ..
            } => write!(
                f,
                "function '{name}': expected {expected} arguments, got {found}"
            ),
            RuntimeError::TypeArgumentMismatch {
                name,
                expected,
                found,
                ..
            } => write!(
                f,
                "'{name}': expected {expected} type arguments, got {found}"
            ),
            RuntimeError::NotGeneric { name, .. } => {
                write!(f, "type '{name}' takes no type arguments")
            }
            RuntimeError::MissingTypeArguments { name, .. } => {
                write!(f, "generic type '{name}' requires type arguments")
            }
            RuntimeError::UnpackMismatch {
                expected, found, ..
            } => write!(f, "cannot unpack {found} values into {expected} variables"),
            RuntimeError::UnknownField {
                type_name, field, ..
            } => write!(f, "type '{type_name}' has no field '{field}'"),
            RuntimeError::TypeError { message, .. } => f.write_str(message),
            RuntimeError::DivisionByZero { .. } => f.write_str("division by zero"),
            RuntimeError::IndexOutOfRange { index, len, .. } => {
                write!(f, "index {index} out of range for list of length {len}")
            }
            RuntimeError::KeyNotFound { key, .. } => write!(f, "key '{key}' not found"),
            RuntimeError::UnhashableKey { type_name, .. } => {
                write!(f, "value of type '{type_name}' cannot be used as a dict key")
            }
            RuntimeError::BreakOutsideLoop { .. } => f.write_str("'break' outside of a loop"),
            RuntimeError::ContinueOutsideLoop { .. } => {
                f.write_str("'continue' outside of a loop")
            }
            RuntimeError::ReturnOutsideFunction { .. } => {
                f.write_str("'return' outside of a function")
            }
            RuntimeError::Io { message } => write!(f, "io error: {message}"),
        }
    }
}

impl Error for RuntimeError {}
