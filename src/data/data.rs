//! Data Bag
//!
//! The typed key/value store populated by argument and flag processors
//! during a graph walk and read by executors and validators. One bag is
//! created per invocation and discarded afterwards.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::operator::ArgValue;
use super::os::{BashOs, Os};

/// A heterogeneously-typed value stored in the data bag.
#[derive(Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    StringList(Vec<String>),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
    BoolList(Vec<bool>),
    /// User-defined payloads, compared by identity.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(v) => write!(f, "String({:?})", v),
            Value::Int(v) => write!(f, "Int({})", v),
            Value::Float(v) => write!(f, "Float({})", v),
            Value::Bool(v) => write!(f, "Bool({})", v),
            Value::StringList(v) => write!(f, "StringList({:?})", v),
            Value::IntList(v) => write!(f, "IntList({:?})", v),
            Value::FloatList(v) => write!(f, "FloatList({:?})", v),
            Value::BoolList(v) => write!(f, "BoolList({:?})", v),
            Value::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::StringList(a), Value::StringList(b)) => a == b,
            (Value::IntList(a), Value::IntList(b)) => a == b,
            (Value::FloatList(a), Value::FloatList(b)) => a == b,
            (Value::BoolList(a), Value::BoolList(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Per-invocation typed store plus the side channels processors consult.
pub struct Data {
    values: IndexMap<String, Value>,
    /// Env-var line rendering for the host shell.
    pub os: Arc<dyn Os>,
    /// Set while a completer runs on behalf of complexecute, so completers
    /// can specialize (e.g. the file completer returns the directory itself
    /// at a directory boundary).
    pub complexecute: bool,
}

impl Data {
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
            os: Arc::new(BashOs),
            complexecute: false,
        }
    }

    pub fn with_os(os: Arc<dyn Os>) -> Self {
        Self { os, ..Self::new() }
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn set_value(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Store a typed value through its operator.
    pub fn set<T: ArgValue>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), value.to_value());
    }

    /// Read a typed value back through its operator. Returns `None` when the
    /// key is missing or holds a different type.
    pub fn get<T: ArgValue>(&self, key: &str) -> Option<T> {
        self.values.get(key).and_then(T::from_value)
    }

    /// Store a user-defined payload.
    pub fn set_custom<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Value::Custom(Arc::new(value)));
    }

    /// Read a user-defined payload back.
    pub fn get_custom<T: Any + Send + Sync>(&self, key: &str) -> Option<&T> {
        match self.values.get(key) {
            Some(Value::Custom(v)) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.get::<String>(key)
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        self.get::<i64>(key)
    }

    pub fn float(&self, key: &str) -> Option<f64> {
        self.get::<f64>(key)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get::<bool>(key)
    }

    pub fn string_list(&self, key: &str) -> Option<Vec<String>> {
        self.get::<Vec<String>>(key)
    }

    pub fn int_list(&self, key: &str) -> Option<Vec<i64>> {
        self.get::<Vec<i64>>(key)
    }

    pub fn float_list(&self, key: &str) -> Option<Vec<f64>> {
        self.get::<Vec<f64>>(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for Data {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.iter()).finish()
    }
}

impl PartialEq for Data {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_round_trip() {
        let mut data = Data::new();
        data.set("s", "hello".to_string());
        data.set("n", 42i64);
        data.set("f", 2.5f64);
        data.set("b", true);
        data.set("sl", vec!["a".to_string(), "b".to_string()]);

        assert_eq!(data.string("s").as_deref(), Some("hello"));
        assert_eq!(data.int("n"), Some(42));
        assert_eq!(data.float("f"), Some(2.5));
        assert_eq!(data.bool("b"), Some(true));
        assert_eq!(data.string_list("sl"), Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_type_mismatch_returns_none() {
        let mut data = Data::new();
        data.set("n", 42i64);
        assert_eq!(data.string("n"), None);
        assert_eq!(data.float("n"), None);
    }

    #[test]
    fn test_custom_payload() {
        #[derive(Debug, PartialEq)]
        struct Pair(u8, u8);

        let mut data = Data::new();
        data.set_custom("p", Pair(1, 2));
        assert_eq!(data.get_custom::<Pair>("p"), Some(&Pair(1, 2)));
        assert_eq!(data.get_custom::<String>("p"), None);
    }

    #[test]
    fn test_missing_key() {
        let data = Data::new();
        assert!(!data.has("nope"));
        assert_eq!(data.int("nope"), None);
    }

    #[test]
    fn test_data_equality_ignores_side_channels() {
        let mut a = Data::new();
        let mut b = Data::new();
        a.set("x", 1i64);
        b.set("x", 1i64);
        b.complexecute = true;
        assert_eq!(a, b);
    }
}
