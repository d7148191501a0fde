//! Dynamic values
//!
//! Arguments, return values, annotation arguments and thrown errors all
//! travel as [`Value`]. Host values the weaver must not inspect (pending
//! futures, handles) ride along as [`Value::Opaque`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::class::Instance;

/// A dynamically typed value
#[derive(Clone, Default)]
pub enum Value {
    /// No value
    #[default]
    Unit,
    /// Boolean
    Bool(bool),
    /// 64-bit integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// String
    Str(String),
    /// Ordered list
    List(Vec<Value>),
    /// String-keyed record
    Map(BTreeMap<String, Value>),
    /// Reference to a class instance
    Instance(Instance),
    /// Placeholder returned by `abstract_value()`, carrying its template
    Abstract(Box<Value>),
    /// Host value passed through untouched
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Wrap a host value
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Value::Opaque(Arc::new(value))
    }

    /// Get a type description string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Instance(_) => "instance",
            Value::Abstract(_) => "abstract",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Check if this is [`Value::Unit`]
    pub fn is_unit(&self) -> bool {
        matches!(self, Value::Unit)
    }

    /// Check if this is an `abstract_value()` placeholder
    pub fn is_abstract(&self) -> bool {
        matches!(self, Value::Abstract(_))
    }

    /// Get as bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as float (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get as list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Get as record
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Get as instance
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Downcast an opaque host value
    pub fn downcast_opaque<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        match self {
            Value::Opaque(inner) => inner.clone().downcast::<T>().ok(),
            _ => None,
        }
    }

    /// Unwrap a placeholder into its template; other values are returned as is
    pub fn into_template(self) -> Value {
        match self {
            Value::Abstract(template) => *template,
            other => other,
        }
    }

    /// Convert plain data to JSON
    ///
    /// Returns `None` for instances, placeholders and opaque values.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Value::Unit => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Option<Vec<_>>>()?,
            ),
            Value::Map(map) => {
                let mut object = serde_json::Map::new();
                for (key, value) in map {
                    object.insert(key.clone(), value.to_json()?);
                }
                serde_json::Value::Object(object)
            }
            Value::Instance(_) | Value::Abstract(_) | Value::Opaque(_) => return None,
        })
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            (Value::Abstract(a), Value::Abstract(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "Unit"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Instance(instance) => write!(f, "Instance({:?})", instance),
            Value::Abstract(template) => f.debug_tuple("Abstract").field(template).finish(),
            Value::Opaque(_) => write!(f, "Opaque(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            Value::Instance(instance) => write!(f, "[object {}]", instance.class().name()),
            Value::Abstract(template) => write!(f, "abstract({})", template),
            Value::Opaque(_) => write!(f, "<opaque>"),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Unit,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(object) => Value::Map(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({ "path": "/users", "retries": 3, "tags": ["a", "b"] });
        let value = Value::from(json.clone());

        let map = value.as_map().unwrap();
        assert_eq!(map.get("path"), Some(&Value::from("/users")));
        assert_eq!(map.get("retries"), Some(&Value::Int(3)));
        assert_eq!(value.to_json(), Some(json));
    }

    #[test]
    fn test_usize_saturates() {
        assert_eq!(Value::from(3usize), Value::Int(3));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(Value::from(usize::MAX), Value::Int(i64::MAX));
    }

    #[test]
    fn test_abstract_template() {
        let placeholder = Value::Abstract(Box::new(Value::List(vec![])));
        assert!(placeholder.is_abstract());
        assert_eq!(placeholder.into_template(), Value::List(vec![]));
        assert_eq!(Value::Int(1).into_template(), Value::Int(1));
    }

    #[test]
    fn test_opaque_identity() {
        let a = Value::opaque(41u32);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Value::opaque(41u32));
        assert_eq!(a.downcast_opaque::<u32>().as_deref(), Some(&41));
        assert!(a.downcast_opaque::<String>().is_none());
        assert_eq!(a.to_json(), None);
    }

    #[test]
    fn test_display() {
        let value = Value::List(vec![Value::Int(1), Value::from("two"), Value::Bool(true)]);
        assert_eq!(value.to_string(), "[1, two, true]");
        assert_eq!(Value::Unit.to_string(), "()");
    }
}
