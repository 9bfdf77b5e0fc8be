use std::collections::HashMap;
use std::fmt::Display;

use super::Value;

/// Open-hashed key/value container over runtime values. Buckets are
/// indexed by [`Value::hash_key`]; entries within a bucket are probed
/// with [`Value::key_eq`]. Only hashable (non-composite) values may be
/// used as keys; the evaluator enforces that before calling in here.
#[derive(Debug, Default)]
pub struct Dict {
    buckets: HashMap<u64, Vec<(Value, Value)>>,
    len: usize,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert or update. The caller guarantees the key is hashable.
    pub fn set(&mut self, key: Value, value: Value) {
        let Some(hash) = key.hash_key() else {
            return;
        };
        let bucket = self.buckets.entry(hash).or_default();
        for entry in bucket.iter_mut() {
            if entry.0.key_eq(&key) {
                entry.1 = value;
                return;
            }
        }
        bucket.push((key, value));
        self.len += 1;
    }

    /// Value plus present-bit for a key.
    pub fn get(&self, key: &Value) -> (Value, bool) {
        let Some(hash) = key.hash_key() else {
            return (Value::Null, false);
        };
        if let Some(bucket) = self.buckets.get(&hash) {
            for (existing, value) in bucket {
                if existing.key_eq(key) {
                    return (value.clone(), true);
                }
            }
        }
        (Value::Null, false)
    }

    /// Remove an entry by key equality; reports whether one was removed.
    pub fn delete(&mut self, key: &Value) -> bool {
        let Some(hash) = key.hash_key() else {
            return false;
        };
        if let Some(bucket) = self.buckets.get_mut(&hash) {
            if let Some(index) = bucket.iter().position(|(existing, _)| existing.key_eq(key)) {
                bucket.remove(index);
                self.len -= 1;
                return true;
            }
        }
        false
    }

    pub fn keys(&self) -> Vec<Value> {
        self.iter().map(|(key, _)| key.clone()).collect()
    }

    /// Iteration order is unspecified but stable while the dict is not
    /// mutated.
    pub fn iter(&self) -> impl Iterator<Item = &(Value, Value)> {
        self.buckets.values().flatten()
    }

    pub fn equals(&self, other: &Dict) -> bool {
        if self.len != other.len {
            return false;
        }
        self.iter().all(|(key, value)| {
            let (found, present) = other.get(key);
            present && value.equals(&found)
        })
    }
}

impl Display for Dict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{rendered}}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_then_get() {
        let mut dict = Dict::new();
        dict.set(Value::Str("a".into()), Value::Int(1));

        let (value, present) = dict.get(&Value::Str("a".into()));
        assert!(present);
        assert!(value.equals(&Value::Int(1)));
        assert_eq!(dict.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let dict = Dict::new();
        let (value, present) = dict.get(&Value::Int(0));
        assert!(!present);
        assert!(value.equals(&Value::Null));
    }

    #[test]
    fn test_set_updates_in_place() {
        let mut dict = Dict::new();
        dict.set(Value::Int(1), Value::Str("one".into()));
        dict.set(Value::Int(1), Value::Str("uno".into()));

        assert_eq!(dict.len(), 1);
        let (value, _) = dict.get(&Value::Int(1));
        assert!(value.equals(&Value::Str("uno".into())));
    }

    #[test]
    fn test_delete() {
        let mut dict = Dict::new();
        dict.set(Value::Bool(true), Value::Int(1));
        assert!(dict.delete(&Value::Bool(true)));
        assert!(!dict.delete(&Value::Bool(true)));
        assert!(dict.is_empty());
    }

    #[test]
    fn test_mixed_key_tags() {
        let mut dict = Dict::new();
        dict.set(Value::Int(1), Value::Str("int".into()));
        dict.set(Value::Str("1".into()), Value::Str("str".into()));
        dict.set(Value::Null, Value::Str("null".into()));

        assert_eq!(dict.len(), 3);
        assert!(dict.get(&Value::Int(1)).1);
        assert!(dict.get(&Value::Str("1".into())).1);
        assert!(dict.get(&Value::Null).1);
    }

    #[test]
    fn test_int_and_float_keys_are_distinct() {
        let mut dict = Dict::new();
        dict.set(Value::Int(1), Value::Str("int".into()));
        dict.set(Value::Float(1.0), Value::Str("float".into()));
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn test_structural_dict_equality() {
        let mut a = Dict::new();
        a.set(Value::Str("k".into()), Value::Int(1));
        let mut b = Dict::new();
        b.set(Value::Str("k".into()), Value::Int(1));
        assert!(a.equals(&b));

        b.set(Value::Str("extra".into()), Value::Null);
        assert!(!a.equals(&b));
    }
}
