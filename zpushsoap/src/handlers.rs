//! Type handlers, keyed by `(namespace URI, local type name)`.
//!
//! The registry is built once. Serialization picks a handler from the
//! variant of the [`SoapValue`]; deserialization picks one from the node's
//! `xsi:type`, except for dictionaries which always use the map handler.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use xmltree::{Element, XMLNode};

use crate::error::{Result, SoapError};
use crate::serializer::{deserialize_node, serialize};
use crate::shape::SoapShape;
use crate::value::SoapValue;
use crate::xml::{child, child_elements, inner_text};
use crate::{XMLNS_APACHE, XMLNS_SOAP_ENC, XMLNS_XSD};

pub trait TypeHandler: Send + Sync {
    fn namespace(&self) -> &'static str;

    fn name(&self) -> &'static str;

    /// `prefix:name` as written in `xsi:type` by this serializer.
    fn qualified_name(&self) -> String {
        let prefix = match self.namespace() {
            XMLNS_XSD => "xsd",
            XMLNS_SOAP_ENC => "soap-enc",
            XMLNS_APACHE => "ns2",
            _ => "ns",
        };
        format!("{prefix}:{}", self.name())
    }

    fn deserialize(&self, node: &Element, shape: &SoapShape) -> Result<SoapValue>;

    fn serialize(&self, name: &str, value: &SoapValue) -> Element;
}

fn typed_element(name: &str, handler: &dyn TypeHandler) -> Element {
    let mut element = Element::new(name);
    element
        .attributes
        .insert("xsi:type".to_string(), handler.qualified_name());
    element
}

fn text_element(name: &str, handler: &dyn TypeHandler, text: String) -> Element {
    let mut element = typed_element(name, handler);
    element.children.push(XMLNode::Text(text));
    element
}

struct BooleanHandler;

impl TypeHandler for BooleanHandler {
    fn namespace(&self) -> &'static str {
        XMLNS_XSD
    }

    fn name(&self) -> &'static str {
        "boolean"
    }

    fn deserialize(&self, node: &Element, _shape: &SoapShape) -> Result<SoapValue> {
        let text = inner_text(node);
        match text.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(SoapValue::Bool(true)),
            "false" | "0" | "" => Ok(SoapValue::Bool(false)),
            _ => Err(SoapError::InvalidValue {
                kind: "boolean",
                value: text,
            }),
        }
    }

    fn serialize(&self, name: &str, value: &SoapValue) -> Element {
        let text = matches!(value, SoapValue::Bool(true)).to_string();
        text_element(name, self, text)
    }
}

struct IntHandler {
    name: &'static str,
}

impl TypeHandler for IntHandler {
    fn namespace(&self) -> &'static str {
        XMLNS_XSD
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn deserialize(&self, node: &Element, _shape: &SoapShape) -> Result<SoapValue> {
        let text = inner_text(node);
        text.trim()
            .parse()
            .map(SoapValue::Int)
            .map_err(|_| SoapError::InvalidValue {
                kind: "int",
                value: text,
            })
    }

    fn serialize(&self, name: &str, value: &SoapValue) -> Element {
        let text = match value {
            SoapValue::Int(i) => i.to_string(),
            _ => String::from("0"),
        };
        text_element(name, self, text)
    }
}

struct StringHandler;

impl TypeHandler for StringHandler {
    fn namespace(&self) -> &'static str {
        XMLNS_XSD
    }

    fn name(&self) -> &'static str {
        "string"
    }

    fn deserialize(&self, node: &Element, _shape: &SoapShape) -> Result<SoapValue> {
        Ok(SoapValue::String(inner_text(node)))
    }

    fn serialize(&self, name: &str, value: &SoapValue) -> Element {
        let text = value.as_str().unwrap_or_default().to_string();
        text_element(name, self, text)
    }
}

struct ArrayHandler;

impl ArrayHandler {
    /// `soap-enc:arrayType` value: the common item type, or `xsd:anyType`.
    fn array_type(items: &[SoapValue]) -> String {
        let mut types = items
            .iter()
            .filter(|v| !v.is_nil())
            .map(|v| handler_for_value(v).qualified_name());
        let item_type = match types.next() {
            Some(first) if types.all(|t| t == first) => first,
            _ => String::from("xsd:anyType"),
        };
        format!("{item_type}[{}]", items.len())
    }
}

impl TypeHandler for ArrayHandler {
    fn namespace(&self) -> &'static str {
        XMLNS_SOAP_ENC
    }

    fn name(&self) -> &'static str {
        "Array"
    }

    fn deserialize(&self, node: &Element, shape: &SoapShape) -> Result<SoapValue> {
        let item_shape = shape.item();
        child_elements(node)
            .map(|item| deserialize_node(item, &item_shape))
            .collect::<Result<Vec<_>>>()
            .map(SoapValue::Array)
    }

    fn serialize(&self, name: &str, value: &SoapValue) -> Element {
        let items: &[SoapValue] = match value {
            SoapValue::Array(items) => items,
            _ => &[],
        };
        let mut element = typed_element(name, self);
        element
            .attributes
            .insert("soap-enc:arrayType".to_string(), Self::array_type(items));
        for item in items {
            element.children.push(XMLNode::Element(serialize("item", item)));
        }
        element
    }
}

/// `soap-enc:Struct`: one child element per member.
struct StructHandler;

impl TypeHandler for StructHandler {
    fn namespace(&self) -> &'static str {
        XMLNS_SOAP_ENC
    }

    fn name(&self) -> &'static str {
        "Struct"
    }

    fn deserialize(&self, node: &Element, shape: &SoapShape) -> Result<SoapValue> {
        child_elements(node)
            .map(|member| -> Result<(String, SoapValue)> {
                let key = member.name.to_ascii_lowercase();
                let value = deserialize_node(member, &shape.member(&key))?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>>>()
            .map(SoapValue::Struct)
    }

    fn serialize(&self, name: &str, value: &SoapValue) -> Element {
        let mut element = typed_element(name, self);
        for (key, member) in value.entries().unwrap_or_default() {
            element.children.push(XMLNode::Element(serialize(key, member)));
        }
        element
    }
}

fn read_map_items(node: &Element, shape: &SoapShape) -> Result<Vec<(String, SoapValue)>> {
    child_elements(node)
        .map(|item| -> Result<(String, SoapValue)> {
            let key_node = child(item, "key").ok_or(SoapError::MalformedItem("key"))?;
            let key = match deserialize_node(key_node, &SoapShape::String)? {
                SoapValue::String(s) => s,
                SoapValue::Int(i) => i.to_string(),
                other => {
                    return Err(SoapError::Conversion {
                        expected: "string",
                        found: other.kind(),
                    });
                }
            };
            let value = match child(item, "value") {
                Some(value_node) => deserialize_node(value_node, &shape.member(&key))?,
                None => SoapValue::Nil,
            };
            Ok((key, value))
        })
        .collect()
}

fn write_map_items(element: &mut Element, value: &SoapValue) {
    for (key, member) in value.entries().unwrap_or_default() {
        let mut item = Element::new("item");
        item.children.push(XMLNode::Element(serialize(
            "key",
            &SoapValue::String(key.clone()),
        )));
        item.children
            .push(XMLNode::Element(serialize("value", member)));
        element.children.push(XMLNode::Element(item));
    }
}

/// Apache `ns2:Map`, also the encoding of every record sent to the server.
struct ObjectMapHandler;

impl TypeHandler for ObjectMapHandler {
    fn namespace(&self) -> &'static str {
        XMLNS_APACHE
    }

    fn name(&self) -> &'static str {
        "Map"
    }

    fn deserialize(&self, node: &Element, shape: &SoapShape) -> Result<SoapValue> {
        read_map_items(node, shape).map(SoapValue::Map)
    }

    fn serialize(&self, name: &str, value: &SoapValue) -> Element {
        let mut element = typed_element(name, self);
        write_map_items(&mut element, value);
        element
    }
}

/// Used whenever a dictionary is expected, whatever the declared type: the
/// server declares its associative arrays as `soap-enc:Array` of items.
struct DictionaryHandler;

impl TypeHandler for DictionaryHandler {
    fn namespace(&self) -> &'static str {
        XMLNS_SOAP_ENC
    }

    fn name(&self) -> &'static str {
        "Array"
    }

    fn deserialize(&self, node: &Element, shape: &SoapShape) -> Result<SoapValue> {
        read_map_items(node, shape).map(SoapValue::Map)
    }

    fn serialize(&self, name: &str, value: &SoapValue) -> Element {
        OBJECT_MAP.serialize(name, value)
    }
}

static BOOLEAN: BooleanHandler = BooleanHandler;
static INT: IntHandler = IntHandler { name: "int" };
static STRING: StringHandler = StringHandler;
static ARRAY: ArrayHandler = ArrayHandler;
static STRUCT: StructHandler = StructHandler;
static OBJECT_MAP: ObjectMapHandler = ObjectMapHandler;
static DICTIONARY: DictionaryHandler = DictionaryHandler;

/// Aliases accepted on input for the integer handler.
static INT_ALIASES: [IntHandler; 4] = [
    IntHandler { name: "long" },
    IntHandler { name: "short" },
    IntHandler { name: "byte" },
    IntHandler { name: "integer" },
];

static REGISTRY: Lazy<HashMap<String, &'static dyn TypeHandler>> = Lazy::new(|| {
    let handlers: Vec<&'static dyn TypeHandler> =
        vec![&BOOLEAN, &INT, &STRING, &ARRAY, &STRUCT, &OBJECT_MAP];
    handlers
        .into_iter()
        .chain(INT_ALIASES.iter().map(|h| h as &'static dyn TypeHandler))
        .map(|h| (registry_key(h.namespace(), h.name()), h))
        .collect()
});

fn registry_key(namespace: &str, name: &str) -> String {
    format!("{{{namespace}}}{name}")
}

/// Handler registered for `{namespace}name`.
pub fn lookup(namespace: &str, name: &str) -> Option<&'static dyn TypeHandler> {
    REGISTRY.get(&registry_key(namespace, name)).copied()
}

/// Handler for deserializing a node expected to hold `shape` and declaring
/// `xsi:type` `{namespace}name`.
pub(crate) fn handler_for_node(
    shape: &SoapShape,
    declared: Option<(&str, &str)>,
) -> Option<&'static dyn TypeHandler> {
    if shape.is_dictionary() {
        return Some(&DICTIONARY);
    }
    let (namespace, name) = declared?;
    lookup(namespace, name)
}

/// Handler for serializing `value`. Struct and map values both go out as
/// Apache maps, the object encoding the server understands.
pub(crate) fn handler_for_value(value: &SoapValue) -> &'static dyn TypeHandler {
    match value {
        SoapValue::Bool(_) => &BOOLEAN,
        SoapValue::Int(_) => &INT,
        SoapValue::String(_) => &STRING,
        SoapValue::Array(_) => &ARRAY,
        SoapValue::Struct(_) | SoapValue::Map(_) | SoapValue::Nil => &OBJECT_MAP,
    }
}
