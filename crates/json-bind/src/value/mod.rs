//! The dynamic value model every codec encodes from and decodes into.

use std::sync::Arc;

use base64::Engine;
use indexmap::IndexMap;

use crate::type_def::TypeDescriptor;

/// Runtime value handled by codecs.
///
/// Declared types carry their [`TypeDescriptor`] so polymorphic and
/// dynamically typed positions can find the codec for the value at hand.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Elements of a list, set or array.
    List(Vec<Value>),
    /// Key/value pairs in insertion order. Keys may be any value.
    Map(Vec<(Value, Value)>),
    Enum(EnumValue),
    Object(Object),
}

/// A constant of a declared enum.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    pub type_: TypeDescriptor,
    pub constant: Arc<str>,
}

impl EnumValue {
    pub fn new(type_: TypeDescriptor, constant: &str) -> Self {
        Self {
            type_,
            constant: Arc::from(constant),
        }
    }
}

/// An instance of a declared record, bean or builder-built type.
/// Field order does not take part in equality.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub type_: TypeDescriptor,
    pub fields: IndexMap<String, Value>,
}

impl Object {
    pub fn new(type_: TypeDescriptor) -> Self {
        Self {
            type_,
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}

static NULL: Value = Value::Null;

impl Value {
    /// Shared `null`, for accessors that need to hand out a reference to
    /// an absent field.
    pub fn null_ref() -> &'static Value {
        &NULL
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Enum(_) => "enum",
            Value::Object(_) => "object",
        }
    }

    /// The descriptor used to find an encoder when the static type of a
    /// position is unknown. `None` for `null`.
    pub fn runtime_type(&self) -> Option<TypeDescriptor> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(_) => TypeDescriptor::bool(),
            Value::Int(_) => TypeDescriptor::int(),
            Value::Float(_) => TypeDescriptor::float(),
            Value::Str(_) => TypeDescriptor::string(),
            Value::Bytes(_) => TypeDescriptor::bytes(),
            Value::List(_) => TypeDescriptor::list(TypeDescriptor::any()),
            Value::Map(_) => TypeDescriptor::map(TypeDescriptor::any(), TypeDescriptor::any()),
            Value::Enum(e) => e.type_.clone(),
            Value::Object(o) => o.type_.clone(),
        })
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Field of an object value.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.as_object().and_then(|o| o.get(name))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl From<EnumValue> for Value {
    fn from(v: EnumValue) -> Self {
        Value::Enum(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(0.0)),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(arr) => Value::List(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => Value::Map(
                obj.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::json!(i),
            Value::Float(f) => serde_json::json!(f),
            Value::Str(s) => serde_json::Value::String(s),
            Value::Bytes(b) => {
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (key_text(k), serde_json::Value::from(v)))
                    .collect(),
            ),
            Value::Enum(e) => serde_json::Value::String(e.constant.to_string()),
            Value::Object(o) => serde_json::Value::Object(
                o.fields
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

fn key_text(key: Value) -> String {
    match key {
        Value::Str(s) => s,
        other => serde_json::Value::from(other).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_equality_ignores_field_order() {
        let t = TypeDescriptor::named("Pair");
        let a = Object::new(t.clone()).with("x", 1).with("y", 2);
        let b = Object::new(t).with("y", 2).with("x", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn runtime_types() {
        assert_eq!(Value::Null.runtime_type(), None);
        assert_eq!(Value::from(1).runtime_type(), Some(TypeDescriptor::int()));
        assert_eq!(
            Value::List(vec![]).runtime_type(),
            Some(TypeDescriptor::list(TypeDescriptor::any()))
        );
        let t = TypeDescriptor::named("Node");
        assert_eq!(
            Value::Object(Object::new(t.clone())).runtime_type(),
            Some(t)
        );
    }

    #[test]
    fn serde_json_conversion() {
        let v = Value::from(serde_json::json!({"a": [1, 2.5, null, "s"]}));
        assert_eq!(
            v,
            Value::Map(vec![(
                Value::from("a"),
                Value::List(vec![
                    Value::Int(1),
                    Value::Float(2.5),
                    Value::Null,
                    Value::from("s")
                ])
            )])
        );
        let back: serde_json::Value = v.into();
        assert_eq!(back, serde_json::json!({"a": [1, 2.5, null, "s"]}));
    }
}
