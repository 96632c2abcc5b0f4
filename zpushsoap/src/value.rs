//! Untyped SOAP values.

use crate::error::{Result, SoapError};

/// A value as carried on the wire, before conversion to a typed structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SoapValue {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    String(String),
    Array(Vec<SoapValue>),
    /// `soap-enc:Struct`: members keyed by element name.
    Struct(Vec<(String, SoapValue)>),
    /// `ns2:Map` (Apache object map): explicit key/value items.
    Map(Vec<(String, SoapValue)>),
}

impl SoapValue {
    pub fn kind(&self) -> &'static str {
        match self {
            SoapValue::Nil => "nil",
            SoapValue::Bool(_) => "boolean",
            SoapValue::Int(_) => "int",
            SoapValue::String(_) => "string",
            SoapValue::Array(_) => "array",
            SoapValue::Struct(_) => "struct",
            SoapValue::Map(_) => "map",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, SoapValue::Nil)
    }

    /// Members of a struct or map, in document order.
    pub fn entries(&self) -> Option<&[(String, SoapValue)]> {
        match self {
            SoapValue::Struct(entries) | SoapValue::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Looks up a struct or map member, ignoring ASCII case.
    pub fn get(&self, key: &str) -> Option<&SoapValue> {
        self.entries()?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SoapValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_entries(self) -> Result<Vec<(String, SoapValue)>> {
        match self {
            SoapValue::Struct(entries) | SoapValue::Map(entries) => Ok(entries),
            other => Err(SoapError::Conversion {
                expected: "struct or map",
                found: other.kind(),
            }),
        }
    }
}

impl From<bool> for SoapValue {
    fn from(value: bool) -> Self {
        SoapValue::Bool(value)
    }
}

impl From<i64> for SoapValue {
    fn from(value: i64) -> Self {
        SoapValue::Int(value)
    }
}

impl From<i32> for SoapValue {
    fn from(value: i32) -> Self {
        SoapValue::Int(value.into())
    }
}

impl From<&str> for SoapValue {
    fn from(value: &str) -> Self {
        SoapValue::String(value.to_string())
    }
}

impl From<String> for SoapValue {
    fn from(value: String) -> Self {
        SoapValue::String(value)
    }
}
