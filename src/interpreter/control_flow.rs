use crate::value::Value;

/// Outcome of executing a statement: control flow as data instead of
/// unwinding. Loops intercept `Break`/`Continue`, function calls
/// intercept `Return`; everything else passes packets through unchanged.
#[derive(Debug)]
pub enum Exec {
    Normal(Value),
    Return(Value),
    Break,
    Continue,
}

impl Exec {
    pub fn is_normal(&self) -> bool {
        matches!(self, Exec::Normal(_))
    }

    /// The carried value, if the packet carries one.
    pub fn into_value(self) -> Value {
        match self {
            Exec::Normal(value) | Exec::Return(value) => value,
            Exec::Break | Exec::Continue => Value::Null,
        }
    }
}
