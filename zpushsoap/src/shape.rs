//! Typed side of the serializer.
//!
//! A [`SoapShape`] describes what a response node is expected to hold. It
//! selects the map handler for dictionaries and gives struct/map members
//! their field types; everything else is resolved from `xsi:type`. The
//! [`SoapSerialize`] / [`SoapDeserialize`] traits convert between native
//! types and [`SoapValue`].

use std::collections::BTreeMap;

use crate::error::{Result, SoapError};
use crate::value::SoapValue;

/// Expected shape of a SOAP node.
#[derive(Debug, Clone)]
pub enum SoapShape {
    Any,
    Bool,
    Int,
    String,
    List(Box<SoapShape>),
    /// String-keyed map of values of the inner shape.
    Dictionary(Box<SoapShape>),
    /// Fixed set of named fields.
    Record(&'static [SoapField]),
}

/// One field of a [`SoapShape::Record`]. The shape is a function so that
/// field tables can be `static` and refer to other records.
#[derive(Debug)]
pub struct SoapField {
    pub name: &'static str,
    pub shape: fn() -> SoapShape,
}

impl SoapField {
    pub const fn new(name: &'static str, shape: fn() -> SoapShape) -> Self {
        SoapField { name, shape }
    }
}

impl SoapShape {
    /// Shape of the member `name` of a struct or map with this shape.
    /// Unknown members are untyped.
    pub fn member(&self, name: &str) -> SoapShape {
        match self {
            SoapShape::Record(fields) => fields
                .iter()
                .find(|f| f.name.eq_ignore_ascii_case(name))
                .map(|f| (f.shape)())
                .unwrap_or(SoapShape::Any),
            SoapShape::Dictionary(value) => (**value).clone(),
            _ => SoapShape::Any,
        }
    }

    /// Shape of the items of a list with this shape.
    pub fn item(&self) -> SoapShape {
        match self {
            SoapShape::List(item) => (**item).clone(),
            _ => SoapShape::Any,
        }
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self, SoapShape::Dictionary(_))
    }
}

pub trait SoapSerialize {
    fn to_soap(&self) -> SoapValue;
}

pub trait SoapDeserialize: Sized {
    fn shape() -> SoapShape;
    fn from_soap(value: SoapValue) -> Result<Self>;
}

fn mismatch<T>(expected: &'static str, value: &SoapValue) -> Result<T> {
    Err(SoapError::Conversion {
        expected,
        found: value.kind(),
    })
}

impl SoapSerialize for SoapValue {
    fn to_soap(&self) -> SoapValue {
        self.clone()
    }
}

impl SoapDeserialize for SoapValue {
    fn shape() -> SoapShape {
        SoapShape::Any
    }

    fn from_soap(value: SoapValue) -> Result<Self> {
        Ok(value)
    }
}

impl SoapSerialize for bool {
    fn to_soap(&self) -> SoapValue {
        SoapValue::Bool(*self)
    }
}

impl SoapDeserialize for bool {
    fn shape() -> SoapShape {
        SoapShape::Bool
    }

    fn from_soap(value: SoapValue) -> Result<Self> {
        match value {
            SoapValue::Bool(b) => Ok(b),
            SoapValue::Int(i) => Ok(i != 0),
            SoapValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(true),
                "false" | "0" | "" => Ok(false),
                _ => Err(SoapError::InvalidValue {
                    kind: "boolean",
                    value: s,
                }),
            },
            other => mismatch("boolean", &other),
        }
    }
}

impl SoapSerialize for i64 {
    fn to_soap(&self) -> SoapValue {
        SoapValue::Int(*self)
    }
}

impl SoapDeserialize for i64 {
    fn shape() -> SoapShape {
        SoapShape::Int
    }

    fn from_soap(value: SoapValue) -> Result<Self> {
        match value {
            SoapValue::Int(i) => Ok(i),
            SoapValue::Bool(b) => Ok(i64::from(b)),
            SoapValue::String(s) => s.trim().parse().map_err(|_| SoapError::InvalidValue {
                kind: "int",
                value: s,
            }),
            other => mismatch("int", &other),
        }
    }
}

impl SoapSerialize for i32 {
    fn to_soap(&self) -> SoapValue {
        SoapValue::Int((*self).into())
    }
}

impl SoapDeserialize for i32 {
    fn shape() -> SoapShape {
        SoapShape::Int
    }

    fn from_soap(value: SoapValue) -> Result<Self> {
        let wide = i64::from_soap(value)?;
        i32::try_from(wide).map_err(|_| SoapError::InvalidValue {
            kind: "int",
            value: wide.to_string(),
        })
    }
}

impl SoapSerialize for str {
    fn to_soap(&self) -> SoapValue {
        SoapValue::String(self.to_string())
    }
}

impl SoapSerialize for String {
    fn to_soap(&self) -> SoapValue {
        SoapValue::String(self.clone())
    }
}

impl SoapDeserialize for String {
    fn shape() -> SoapShape {
        SoapShape::String
    }

    /// Integers and booleans are accepted: the server encodes ids such as
    /// `0` as `xsd:int`.
    fn from_soap(value: SoapValue) -> Result<Self> {
        match value {
            SoapValue::String(s) => Ok(s),
            SoapValue::Int(i) => Ok(i.to_string()),
            SoapValue::Bool(b) => Ok(b.to_string()),
            other => mismatch("string", &other),
        }
    }
}

impl<T: SoapSerialize + ?Sized> SoapSerialize for &T {
    fn to_soap(&self) -> SoapValue {
        (**self).to_soap()
    }
}

impl<T: SoapSerialize> SoapSerialize for Option<T> {
    fn to_soap(&self) -> SoapValue {
        self.as_ref().map_or(SoapValue::Nil, T::to_soap)
    }
}

impl<T: SoapDeserialize> SoapDeserialize for Option<T> {
    fn shape() -> SoapShape {
        T::shape()
    }

    fn from_soap(value: SoapValue) -> Result<Self> {
        match value {
            SoapValue::Nil => Ok(None),
            value => T::from_soap(value).map(Some),
        }
    }
}

impl<T: SoapSerialize> SoapSerialize for [T] {
    fn to_soap(&self) -> SoapValue {
        SoapValue::Array(self.iter().map(T::to_soap).collect())
    }
}

impl<T: SoapSerialize> SoapSerialize for Vec<T> {
    fn to_soap(&self) -> SoapValue {
        self.as_slice().to_soap()
    }
}

impl<T: SoapDeserialize> SoapDeserialize for Vec<T> {
    fn shape() -> SoapShape {
        SoapShape::List(Box::new(T::shape()))
    }

    /// A nil list is empty; a map is read as the list of its values.
    fn from_soap(value: SoapValue) -> Result<Self> {
        match value {
            SoapValue::Nil => Ok(Vec::new()),
            SoapValue::Array(items) => items.into_iter().map(T::from_soap).collect(),
            SoapValue::Map(entries) | SoapValue::Struct(entries) => {
                entries.into_iter().map(|(_, v)| T::from_soap(v)).collect()
            }
            other => mismatch("array", &other),
        }
    }
}

impl<T: SoapSerialize> SoapSerialize for BTreeMap<String, T> {
    fn to_soap(&self) -> SoapValue {
        SoapValue::Map(self.iter().map(|(k, v)| (k.clone(), v.to_soap())).collect())
    }
}

impl<T: SoapDeserialize> SoapDeserialize for BTreeMap<String, T> {
    fn shape() -> SoapShape {
        SoapShape::Dictionary(Box::new(T::shape()))
    }

    fn from_soap(value: SoapValue) -> Result<Self> {
        match value {
            SoapValue::Nil => Ok(BTreeMap::new()),
            // PHP sends an empty associative array as an empty soap-enc:Array.
            SoapValue::Array(items) if items.is_empty() => Ok(BTreeMap::new()),
            value => value
                .into_entries()?
                .into_iter()
                .map(|(k, v)| T::from_soap(v).map(|v| (k, v)))
                .collect(),
        }
    }
}

/// Reads the members of a struct or map into a record type.
///
/// ```
/// use zpushsoap::{RecordReader, SoapValue};
///
/// let value = SoapValue::Map(vec![("Name".into(), "inbox".into())]);
/// let mut record = RecordReader::new(value).unwrap();
/// let name: String = record.required("name").unwrap();
/// let flags: i64 = record.or_default("flags").unwrap();
/// assert_eq!((name.as_str(), flags), ("inbox", 0));
/// ```
#[derive(Debug)]
pub struct RecordReader {
    entries: Vec<(String, SoapValue)>,
}

impl RecordReader {
    pub fn new(value: SoapValue) -> Result<Self> {
        Ok(RecordReader {
            entries: value.into_entries()?,
        })
    }

    /// Removes and returns the member `name` (ASCII case ignored).
    pub fn take(&mut self, name: &str) -> Option<SoapValue> {
        let index = self
            .entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    pub fn required<T: SoapDeserialize>(&mut self, name: &str) -> Result<T> {
        let value = self
            .take(name)
            .ok_or_else(|| SoapError::MissingField(name.to_string()))?;
        T::from_soap(value)
    }

    pub fn optional<T: SoapDeserialize>(&mut self, name: &str) -> Result<Option<T>> {
        match self.take(name) {
            None | Some(SoapValue::Nil) => Ok(None),
            Some(value) => T::from_soap(value).map(Some),
        }
    }

    pub fn or_default<T: SoapDeserialize + Default>(&mut self, name: &str) -> Result<T> {
        Ok(self.optional(name)?.unwrap_or_default())
    }
}
