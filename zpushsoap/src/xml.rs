//! Helpers over `xmltree` that ignore namespace prefixes.

use xmltree::{Element, XMLNode};

use crate::{XMLNS_APACHE, XMLNS_SOAP_ENC, XMLNS_XSD, XMLNS_XSI};

/// Value of the attribute whose local name is `local`, whatever its prefix.
pub(crate) fn attribute<'a>(node: &'a Element, local: &str) -> Option<&'a str> {
    node.attributes.iter().find_map(|(key, value)| {
        let key = key.to_string();
        let matches = key == local
            || key
                .rsplit_once(':')
                .is_some_and(|(_, name)| name == local)
            || key.ends_with(&format!("}}{local}"));
        matches.then_some(value.as_str())
    })
}

/// Concatenated text and CDATA content of `node`, children excluded.
pub(crate) fn inner_text(node: &Element) -> String {
    node.children
        .iter()
        .filter_map(|child| match child {
            XMLNode::Text(t) | XMLNode::CData(t) => Some(t.as_str()),
            _ => None,
        })
        .collect()
}

pub(crate) fn child_elements(node: &Element) -> impl Iterator<Item = &Element> {
    node.children.iter().filter_map(XMLNode::as_element)
}

pub(crate) fn child<'a>(node: &'a Element, local: &str) -> Option<&'a Element> {
    child_elements(node).find(|e| e.name == local)
}

/// Depth-first search on local names, `node` included.
pub(crate) fn find_descendant<'a>(node: &'a Element, local: &str) -> Option<&'a Element> {
    if node.name == local {
        return Some(node);
    }
    child_elements(node).find_map(|c| find_descendant(c, local))
}

/// Namespace URI bound to `prefix` at `node`. Falls back to the prefixes
/// SOAP toolkits conventionally use when the document does not declare one.
pub(crate) fn resolve_prefix(node: &Element, prefix: &str) -> Option<String> {
    if let Some(uri) = node.namespaces.as_ref().and_then(|ns| ns.get(prefix)) {
        return Some(uri.to_string());
    }
    let uri = match prefix.to_ascii_lowercase().as_str() {
        "xsd" => XMLNS_XSD,
        "xsi" => XMLNS_XSI,
        "soap-enc" | "soapenc" | "senc" => XMLNS_SOAP_ENC,
        "ns2" | "apache" => XMLNS_APACHE,
        _ => return None,
    };
    Some(uri.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_ignored() {
        let xml = r#"<a xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:type="xsd:string">x<![CDATA[<y>]]></a>"#;
        let node = Element::parse(xml.as_bytes()).unwrap();
        assert_eq!(attribute(&node, "type"), Some("xsd:string"));
        assert_eq!(attribute(&node, "nil"), None);
        assert_eq!(inner_text(&node), "x<y>");
        assert_eq!(resolve_prefix(&node, "xsi").as_deref(), Some(XMLNS_XSI));
        assert_eq!(resolve_prefix(&node, "xsd").as_deref(), Some(XMLNS_XSD));
        assert_eq!(resolve_prefix(&node, "zz"), None);
    }
}
