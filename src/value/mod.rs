//! Runtime values: a dynamically-tagged union with structural equality,
//! key hashing and the printable renderings the `print` statement uses.

mod dict;

pub use dict::*;

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::interpreter::Function;
use crate::symtable::{registry, TypeSymbol};

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Rc<RefCell<Vec<Value>>>),
    Dict(Rc<RefCell<Dict>>),
    Tuple(Rc<TupleValue>),
    Struct(Rc<StructInstance>),
    Func(Rc<Function>),
}

#[derive(Debug)]
pub struct TupleValue {
    pub ty: Arc<TypeSymbol>,
    pub elements: Vec<Value>,
}

#[derive(Debug)]
pub struct StructInstance {
    pub ty: Arc<TypeSymbol>,
    pub fields: RefCell<IndexMap<String, Value>>,
}

impl Value {
    pub fn list(elements: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(elements)))
    }

    pub fn dict(dict: Dict) -> Self {
        Value::Dict(Rc::new(RefCell::new(dict)))
    }

    /// The name of this value's runtime type, as used in diagnostics and
    /// in canonical tuple-type names.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::Bool(_) => "bool".into(),
            Value::Str(_) => "string".into(),
            Value::List(_) => "list".into(),
            Value::Dict(_) => "dict".into(),
            Value::Tuple(tuple) => tuple.ty.name.clone(),
            Value::Struct(instance) => instance.ty.name.clone(),
            Value::Func(_) => "func".into(),
        }
    }

    /// The type symbol describing this value, used when a tuple type is
    /// assembled from runtime values.
    pub fn type_symbol(&self) -> Arc<TypeSymbol> {
        match self {
            Value::Tuple(tuple) => tuple.ty.clone(),
            Value::Struct(instance) => instance.ty.clone(),
            other => registry::builtin(&other.type_name())
                .unwrap_or_else(|| Arc::new(TypeSymbol::builtin(other.type_name()))),
        }
    }

    pub fn is_truthy_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Structural equality as used by the `==` operator. Numbers compare
    /// numerically across the int/float split; any other tag mismatch is
    /// plain `false`.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                a.borrow().equals(&b.borrow())
            }
            (Value::Tuple(a), Value::Tuple(b)) => {
                a.elements.len() == b.elements.len()
                    && a.elements
                        .iter()
                        .zip(b.elements.iter())
                        .all(|(x, y)| x.equals(y))
            }
            (Value::Struct(a), Value::Struct(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                if !Arc::ptr_eq(&a.ty, &b.ty) {
                    return false;
                }
                let (a, b) = (a.fields.borrow(), b.fields.borrow());
                a.len() == b.len()
                    && a.iter()
                        .all(|(name, x)| b.get(name).is_some_and(|y| x.equals(y)))
            }
            (Value::Func(a), Value::Func(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Hash for use as a dict key. Composite values are not hashable and
    /// yield `None`; the evaluator turns that into a runtime error.
    pub fn hash_key(&self) -> Option<u64> {
        match self {
            Value::Null => Some(0),
            Value::Int(i) => Some(*i as u64),
            Value::Float(f) => Some(f.to_bits()),
            Value::Bool(b) => Some(*b as u64),
            Value::Str(s) => Some(fnv1a(s.as_bytes())),
            _ => None,
        }
    }

    /// Key identity for dict probing. Stricter than `equals`: tags must
    /// match, and floats compare by bit pattern so hashing and equality
    /// stay coherent.
    pub fn key_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

/// FNV-1a over a byte string; the hash the dict uses for string keys.
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => f.write_str(s),
            Value::List(elements) => {
                let rendered = elements
                    .borrow()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "[{rendered}]")
            }
            Value::Dict(dict) => write!(f, "{}", dict.borrow()),
            Value::Tuple(tuple) => {
                let rendered = tuple
                    .elements
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "({rendered})")
            }
            Value::Struct(instance) => {
                let fields = instance.fields.borrow();
                let rendered = fields
                    .iter()
                    .map(|(name, value)| format!("{name}: {value}"))
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "{}{{{rendered}}}", instance.ty.name)
            }
            Value::Func(function) => write!(f, "{function}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_equality_across_tags() {
        assert!(Value::Int(1).equals(&Value::Float(1.0)));
        assert!(!Value::Int(1).equals(&Value::Float(1.5)));
        assert!(Value::Float(2.0).equals(&Value::Int(2)));
    }

    #[test]
    fn test_mismatched_tags_are_not_equal() {
        assert!(!Value::Int(0).equals(&Value::Null));
        assert!(!Value::Str("true".into()).equals(&Value::Bool(true)));
    }

    #[test]
    fn test_list_equality_is_structural() {
        let a = Value::list(vec![Value::Int(1), Value::Str("x".into())]);
        let b = Value::list(vec![Value::Int(1), Value::Str("x".into())]);
        let c = Value::list(vec![Value::Int(2)]);
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
    }

    #[test]
    fn test_hash_rules() {
        assert_eq!(Value::Null.hash_key(), Some(0));
        assert_eq!(Value::Bool(true).hash_key(), Some(1));
        assert_eq!(Value::Int(7).hash_key(), Some(7));
        assert_eq!(Value::Float(1.5).hash_key(), Some(1.5f64.to_bits()));
        // FNV-1a of the empty string is the offset basis
        assert_eq!(
            Value::Str(String::new()).hash_key(),
            Some(0xcbf2_9ce4_8422_2325)
        );
    }

    #[test]
    fn test_composites_are_unhashable() {
        assert_eq!(Value::list(vec![]).hash_key(), None);
        assert_eq!(Value::dict(Dict::new()).hash_key(), None);
    }

    #[test]
    fn test_rendering() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Str("hi".into()).to_string(), "hi");
        assert_eq!(
            Value::list(vec![Value::Int(1), Value::Int(2)]).to_string(),
            "[1, 2]"
        );
    }

    #[test]
    fn test_tuple_rendering() {
        let int = registry::builtin("int").unwrap();
        let ty = registry::tuple_type(&[int.clone(), int]);
        let tuple = Value::Tuple(Rc::new(TupleValue {
            ty,
            elements: vec![Value::Int(1), Value::Int(2)],
        }));
        assert_eq!(tuple.to_string(), "(1, 2)");
    }
}
