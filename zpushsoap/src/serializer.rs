//! Entry points of the SOAP serializer.

use tracing::trace;
use xmltree::Element;

use crate::error::{Result, SoapError};
use crate::handlers::{handler_for_node, handler_for_value};
use crate::shape::{SoapDeserialize, SoapSerialize, SoapShape};
use crate::value::SoapValue;
use crate::xml::{attribute, resolve_prefix};

/// Encodes `value` as an element called `name`; nil becomes `xsi:nil`.
pub fn serialize(name: &str, value: &SoapValue) -> Element {
    if value.is_nil() {
        let mut element = Element::new(name);
        element
            .attributes
            .insert("xsi:nil".to_string(), "true".to_string());
        return element;
    }
    handler_for_value(value).serialize(name, value)
}

/// Encodes a native value.
pub fn serialize_value<T: SoapSerialize + ?Sized>(name: &str, value: &T) -> Element {
    serialize(name, &value.to_soap())
}

/// `(namespace URI, local name)` declared by the node's `xsi:type`.
fn declared_type(node: &Element) -> Result<Option<(String, String)>> {
    let Some(declared) = attribute(node, "type") else {
        return Ok(None);
    };
    let (namespace, name) = match declared.split_once(':') {
        Some((prefix, name)) => (resolve_prefix(node, prefix), name),
        None => (resolve_prefix(node, ""), declared),
    };
    let namespace = namespace.ok_or_else(|| SoapError::UnknownType {
        namespace: String::new(),
        name: declared.to_string(),
    })?;
    Ok(Some((namespace, name.to_string())))
}

fn is_nil(node: &Element) -> bool {
    attribute(node, "nil").is_some_and(|v| matches!(v.trim(), "true" | "1"))
}

/// Decodes a node expected to hold `shape` into an untyped value.
///
/// Fails on a missing or unregistered `xsi:type` (except where a dictionary
/// is expected), never guessing a type.
pub fn deserialize_node(node: &Element, shape: &SoapShape) -> Result<SoapValue> {
    if is_nil(node) {
        return Ok(SoapValue::Nil);
    }
    let declared = declared_type(node)?;
    let declared_ref = declared.as_ref().map(|(ns, n)| (ns.as_str(), n.as_str()));
    let handler = handler_for_node(shape, declared_ref).ok_or_else(|| match &declared {
        Some((namespace, name)) => SoapError::UnknownType {
            namespace: namespace.clone(),
            name: name.clone(),
        },
        None => SoapError::MissingType(node.name.clone()),
    })?;
    trace!(element = %node.name, handler = handler.name(), "deserializing");
    handler.deserialize(node, shape)
}

/// Decodes a node into a native value, driven by the type's shape.
pub fn deserialize<T: SoapDeserialize>(node: &Element) -> Result<T> {
    let value = deserialize_node(node, &T::shape())?;
    T::from_soap(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{RecordReader, SoapField};
    use std::collections::BTreeMap;

    const NS: &str = r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:SOAP-ENC="http://schemas.xmlsoap.org/soap/encoding/" xmlns:soap-enc="http://schemas.xmlsoap.org/soap/encoding/" xmlns:ns2="http://xml.apache.org/xml-soap""#;

    fn parse(body: &str) -> Element {
        let xml = format!("<wrapper {NS}>{body}</wrapper>");
        let root = Element::parse(xml.as_bytes()).unwrap();
        root.children
            .into_iter()
            .find_map(|n| n.as_element().cloned())
            .unwrap()
    }

    #[derive(Debug, PartialEq)]
    struct User {
        id: String,
        name: String,
        active: bool,
    }

    static USER_FIELDS: &[SoapField] = &[
        SoapField::new("id", String::shape),
        SoapField::new("name", String::shape),
        SoapField::new("active", bool::shape),
    ];

    impl SoapSerialize for User {
        fn to_soap(&self) -> SoapValue {
            SoapValue::Map(vec![
                ("id".into(), self.id.to_soap()),
                ("name".into(), self.name.to_soap()),
                ("active".into(), self.active.to_soap()),
            ])
        }
    }

    impl SoapDeserialize for User {
        fn shape() -> SoapShape {
            SoapShape::Record(USER_FIELDS)
        }

        fn from_soap(value: SoapValue) -> Result<Self> {
            let mut record = RecordReader::new(value)?;
            Ok(User {
                id: record.required("id")?,
                name: record.required("name")?,
                active: record.or_default("active")?,
            })
        }
    }

    fn user(id: &str) -> User {
        User {
            id: id.into(),
            name: "Test".into(),
            active: true,
        }
    }

    /// Serialized elements carry prefixed attributes without declarations;
    /// wrap them in an element that declares the prefixes before parsing.
    fn reparse(element: &Element) -> Element {
        let mut buf = Vec::new();
        let config = xmltree::EmitterConfig::new().write_document_declaration(false);
        element.write_with_config(&mut buf, config).unwrap();
        parse(&String::from_utf8(buf).unwrap())
    }

    #[test]
    fn nil_serialization() {
        let element = serialize("note", &SoapValue::Nil);
        assert_eq!(element.name, "note");
        assert_eq!(attribute(&element, "nil"), Some("true"));
        assert!(element.children.is_empty());
        let back = reparse(&serialize_value("note", &Option::<String>::None));
        assert_eq!(deserialize::<Option<String>>(&back).unwrap(), None);
    }

    #[test]
    fn struct_round_trip_ignores_unknown_fields() {
        let mut value = user("u1").to_soap();
        if let SoapValue::Map(entries) = &mut value {
            entries.push(("extra".into(), SoapValue::Int(7)));
        }
        let element = reparse(&serialize("return", &value));
        assert_eq!(deserialize::<User>(&element).unwrap(), user("u1"));
    }

    #[test]
    fn array_of_structs_keeps_order() {
        let users = vec![user("a"), user("b"), user("c")];
        let element = serialize_value("return", &users);
        assert_eq!(attribute(&element, "type"), Some("soap-enc:Array"));
        assert_eq!(attribute(&element, "arrayType"), Some("ns2:Map[3]"));
        let items: Vec<_> = element
            .children
            .iter()
            .filter_map(|n| n.as_element())
            .collect();
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|e| e.name == "item"));

        let back: Vec<User> = deserialize(&reparse(&element)).unwrap();
        assert_eq!(
            back.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn soap_enc_struct_members_are_case_insensitive() {
        let node = parse(
            r#"<return xsi:type="SOAP-ENC:Struct"><ID xsi:type="xsd:string">u1</ID><Name xsi:type="xsd:string">Test</Name><Active xsi:type="xsd:boolean">true</Active><Other xsi:type="xsd:int">3</Other></return>"#,
        );
        assert_eq!(deserialize::<User>(&node).unwrap(), user("u1"));
    }

    #[test]
    fn dictionary_uses_key_value_items() {
        let node = parse(
            r#"<return xsi:type="SOAP-ENC:Array"><item><key xsi:type="xsd:int">12</key><value xsi:type="xsd:string">twelve</value></item><item><key xsi:type="xsd:string">x</key><value xsi:nil="true"/></item></return>"#,
        );
        let map: BTreeMap<String, Option<String>> = deserialize(&node).unwrap();
        assert_eq!(map.get("12"), Some(&Some("twelve".to_string())));
        assert_eq!(map.get("x"), Some(&None));
    }

    #[test]
    fn unknown_and_missing_types_fail() {
        let node = parse(r#"<return xmlns:ns="urn:widgets" xsi:type="ns:UnknownWidget">1</return>"#);
        assert_eq!(
            deserialize::<SoapValue>(&node),
            Err(SoapError::UnknownType {
                namespace: "urn:widgets".into(),
                name: "UnknownWidget".into()
            })
        );
        let node = parse("<return>1</return>");
        assert_eq!(
            deserialize::<i64>(&node),
            Err(SoapError::MissingType("return".into()))
        );
    }

    #[test]
    fn strings_are_escaped() {
        let element = serialize_value("content", "<b>a & b</b>");
        let mut buf = Vec::new();
        element
            .write_with_config(&mut buf, xmltree::EmitterConfig::new().write_document_declaration(false))
            .unwrap();
        let xml = String::from_utf8(buf).unwrap();
        assert!(xml.contains("&lt;b>a &amp; b&lt;/b>") || xml.contains("&lt;b&gt;a &amp; b&lt;/b&gt;"));
        assert_eq!(deserialize::<String>(&reparse(&element)).unwrap(), "<b>a & b</b>");
    }
}
