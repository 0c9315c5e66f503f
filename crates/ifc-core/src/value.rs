//! Runtime values and method bodies
//!
//! `Value` is the data a member can hold. `Callable` is a shared method body
//! that contracts install as defaults and classes declare directly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::object::{ClassType, Instance, Property, PropertyKey};
use crate::Result;

// ── Values ────────────────────────────────────────────────

/// A data value stored in a property
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null / uninitialized
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value (i64)
    Integer(i64),
    /// Float value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Ordered map (BTreeMap for deterministic iteration)
    Object(BTreeMap<String, Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Object(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\": {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert from serde_json::Value (deterministic, uses BTreeMap)
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to serde_json::Value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::json!(*i),
            Value::Float(f) => serde_json::json!(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(arr) => serde_json::Value::Array(arr.iter().map(Value::to_json).collect()),
            Value::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

// ── Method bodies ─────────────────────────────────────────

/// The `this` a method body runs against
#[derive(Clone, Copy)]
pub enum Receiver<'a> {
    /// Static call on the class itself
    Class(&'a ClassType),
    /// Instance call
    Instance(&'a Instance),
}

impl<'a> Receiver<'a> {
    /// Resolve a member visible from this receiver
    pub fn get(&self, key: &PropertyKey) -> Option<&'a Property> {
        match *self {
            Receiver::Class(class) => class.lookup_static(key),
            Receiver::Instance(instance) => instance.get(key),
        }
    }

    /// Resolve a data member's value, if `key` holds data
    pub fn value(&self, key: &PropertyKey) -> Option<&'a Value> {
        self.get(key).and_then(Property::as_value)
    }
}

type MethodFn = dyn for<'r> Fn(Receiver<'r>, &[Value]) -> Result<Value> + Send + Sync;

/// Shared method body.
///
/// Cloning shares the body. `same` tells whether two callables are the
/// same implementation.
#[derive(Clone)]
pub struct Callable(Arc<MethodFn>);

impl Callable {
    pub fn new<F>(body: F) -> Self
    where
        F: for<'r> Fn(Receiver<'r>, &[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Callable(Arc::new(body))
    }

    /// Body that ignores its receiver and arguments
    pub fn constant(value: Value) -> Self {
        Callable::new(move |_, _| Ok(value.clone()))
    }

    pub fn call(&self, receiver: Receiver<'_>, args: &[Value]) -> Result<Value> {
        (self.0)(receiver, args)
    }

    pub fn same(&self, other: &Callable) -> bool {
        Arc::as_ptr(&self.0) as *const () == Arc::as_ptr(&other.0) as *const ()
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_conversion_keeps_shape() {
        let json = serde_json::json!({"x": 1, "tags": ["a", true], "ratio": 0.5, "none": null});
        let value = Value::from_json(&json);
        assert!(matches!(value, Value::Object(_)));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_display_is_stable() {
        let value = Value::Array(vec![Value::Integer(1), "two".into(), Value::Null]);
        assert_eq!(value.to_string(), "[1, \"two\", null]");
    }

    #[test]
    fn test_constant_callable_returns_value() {
        let class = ClassType::new("Unit");
        let body = Callable::constant(Value::Integer(7));
        let result = body.call(Receiver::Class(&class), &[]).unwrap();
        assert_eq!(result, Value::Integer(7));
    }

    #[test]
    fn test_same_tracks_shared_body() {
        let a = Callable::constant(Value::Null);
        let b = Callable::constant(Value::Null);
        assert!(a.same(&a.clone()));
        assert!(!a.same(&b), "equal behavior is not the same implementation");
    }

    #[test]
    fn test_callable_sees_receiver_args() {
        let sum = Callable::new(|_, args| {
            let total = args
                .iter()
                .map(|v| match v {
                    Value::Integer(i) => *i,
                    _ => 0,
                })
                .sum::<i64>();
            Ok(Value::Integer(total))
        });
        let class = ClassType::new("Adder");
        let out = sum
            .call(Receiver::Class(&class), &[Value::Integer(2), Value::Integer(3)])
            .unwrap();
        assert_eq!(out, Value::Integer(5));
    }
}
