//! Scalar and field value model
//!
//! Bindings carry scalar values only (they double as store attributes and
//! lookup keys); result fields may additionally be homogeneous numeric
//! arrays. Both serialize untagged so the container file reads as plain
//! JSON.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A parameter binding: axis name to scalar value, for one invocation.
///
/// `BTreeMap` keeps key order deterministic, so two bindings over the same
/// axes always compare and render identically.
pub type Binding = BTreeMap<String, Value>;

/// Named result fields produced by a sweep function (and the keyword
/// arguments it consumes).
pub type Fields = BTreeMap<String, FieldValue>;

/// Scalar value of a single parameter.
///
/// Lookup in the result store uses exact equality, including floats: a
/// binding matches only a run written from bit-identical values. Values
/// produced by the same generator expansion satisfy this by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Boolean flag
    Bool(bool),
    /// Signed integer
    Int(i64),
    /// Double-precision float
    Float(f64),
    /// String label
    Str(String),
}

impl Value {
    /// Numeric view of the value, if it has one.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Bool(_) | Self::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// One named result field: a scalar or a homogeneous numeric array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Single scalar value
    Scalar(Value),
    /// Homogeneous numeric array
    Array(Vec<f64>),
}

impl FieldValue {
    /// Scalar view of the field, `None` for arrays.
    #[must_use]
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Array(_) => None,
        }
    }

    /// Array view of the field, `None` for scalars.
    #[must_use]
    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Self::Array(v) => Some(v),
            Self::Scalar(_) => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        Self::Scalar(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Scalar(Value::Float(v))
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Scalar(Value::Int(v))
    }
}

impl From<Vec<f64>> for FieldValue {
    fn from(v: Vec<f64>) -> Self {
        Self::Array(v)
    }
}

/// Lift a binding into keyword arguments for a sweep function call.
#[must_use]
pub fn binding_to_fields(binding: &Binding) -> Fields {
    binding
        .iter()
        .map(|(name, value)| (name.clone(), FieldValue::Scalar(value.clone())))
        .collect()
}

/// Recover the scalar binding from keyword arguments.
///
/// # Errors
///
/// Returns [`Error::Configuration`] if any field carries an array; a
/// binding is scalar by definition.
pub fn fields_to_binding(fields: &Fields) -> Result<Binding> {
    fields
        .iter()
        .map(|(name, field)| match field.as_scalar() {
            Some(value) => Ok((name.clone(), value.clone())),
            None => Err(Error::Configuration(format!(
                "binding key '{name}' carries an array, expected a scalar"
            ))),
        })
        .collect()
}

/// Compact one-line rendering of a binding, used in error messages.
#[must_use]
pub fn binding_to_string(binding: &Binding) -> String {
    let pairs: Vec<String> = binding.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{{{}}}", pairs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_json_round_trip() {
        let values = vec![
            Value::Bool(true),
            Value::Int(42),
            Value::Float(2.5),
            Value::Str("label".to_string()),
        ];
        for value in values {
            let json = serde_json::to_string(&value).unwrap();
            let back: Value = serde_json::from_str(&json).unwrap();
            assert_eq!(value, back);
        }
    }

    #[test]
    fn test_field_value_untagged_shapes() {
        let scalar: FieldValue = serde_json::from_str("3.5").unwrap();
        assert_eq!(scalar.as_scalar(), Some(&Value::Float(3.5)));

        let array: FieldValue = serde_json::from_str("[1.0, 2.0]").unwrap();
        assert_eq!(array.as_array(), Some(&[1.0, 2.0][..]));
    }

    #[test]
    fn test_binding_fields_round_trip() {
        let mut binding = Binding::new();
        binding.insert("a".to_string(), Value::Int(2));
        binding.insert("b".to_string(), Value::Float(1.5));

        let fields = binding_to_fields(&binding);
        assert_eq!(fields_to_binding(&fields).unwrap(), binding);
    }

    #[test]
    fn test_fields_to_binding_rejects_arrays() {
        let mut fields = Fields::new();
        fields.insert("xs".to_string(), FieldValue::Array(vec![1.0]));
        assert!(fields_to_binding(&fields).is_err());
    }

    #[test]
    fn test_binding_rendering_is_ordered() {
        let mut binding = Binding::new();
        binding.insert("b".to_string(), Value::Int(30));
        binding.insert("a".to_string(), Value::Int(2));
        assert_eq!(binding_to_string(&binding), "{a=2, b=30}");
    }
}
