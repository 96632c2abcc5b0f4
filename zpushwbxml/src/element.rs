//! In-memory tag tree shared by the encoder and the decoder.
//!
//! Attributes live in a sorted map: attribute order carries no meaning and
//! two elements that differ only in the order their attributes were added
//! compare equal (and encode to the same bytes).

use std::collections::BTreeMap;
use std::fmt;

use xmltree::{EmitterConfig, XMLNode};

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    pub children: Vec<Element>,
    pub text: Option<String>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Leaf element holding `text`.
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Element {
            name: name.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn has_content(&self) -> bool {
        self.text.is_some() || !self.children.is_empty()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn get_child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follows a `/`-separated path of child names. The first segment must
    /// name `self`, so `root.find("Settings/Oof/Get")` starts at the root.
    pub fn find(&self, path: &str) -> Option<&Element> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next()? != self.name {
            return None;
        }
        segments.try_fold(self, |current, segment| current.get_child(segment))
    }

    /// Depth-first search for the first element called `name`, `self` included.
    pub fn find_descendant(&self, name: &str) -> Option<&Element> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_descendant(name))
    }

    /// Parses an XML fragment. Namespace prefixes are dropped, text is
    /// trimmed and whitespace-only text is ignored.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let root = xmltree::Element::parse(xml.as_bytes())?;
        Ok(Self::from_xmltree(&root))
    }

    fn from_xmltree(node: &xmltree::Element) -> Self {
        let mut element = Element::new(node.name.clone());
        for (key, value) in &node.attributes {
            element.attributes.insert(key.to_string(), value.clone());
        }
        let mut text = String::new();
        for child in &node.children {
            match child {
                XMLNode::Element(e) => element.children.push(Self::from_xmltree(e)),
                XMLNode::Text(t) | XMLNode::CData(t) => text.push_str(t),
                _ => {}
            }
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            element.text = Some(trimmed.to_string());
        }
        element
    }

    fn to_xmltree(&self) -> xmltree::Element {
        let mut node = xmltree::Element::new(&self.name);
        for (key, value) in &self.attributes {
            node.attributes.insert(key.clone(), value.clone());
        }
        if let Some(text) = &self.text {
            node.children.push(XMLNode::Text(text.clone()));
        }
        for child in &self.children {
            node.children.push(XMLNode::Element(child.to_xmltree()));
        }
        node
    }

    /// Indented XML rendering, used for trace logging.
    pub fn to_xml_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        let config = EmitterConfig::new()
            .write_document_declaration(false)
            .perform_indent(true)
            .indent_string("  ");
        self.to_xmltree()
            .write_with_config(&mut buf, config)
            .map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("Settings").child(
            Element::new("Oof").child(
                Element::new("Get").child(Element::with_text("BodyType", "TEXT")),
            ),
        )
    }

    #[test]
    fn find_follows_paths_from_the_root() {
        let doc = sample();
        assert_eq!(
            doc.find("Settings/Oof/Get/BodyType").and_then(|e| e.text()),
            Some("TEXT")
        );
        assert!(doc.find("Oof/Get").is_none());
        assert!(doc.find("Settings/Oof/Set").is_none());
        assert_eq!(doc.find_descendant("BodyType").map(|e| e.name.as_str()), Some("BodyType"));
    }

    #[test]
    fn attribute_order_is_not_significant() {
        let a = Element::new("x").attr("b", "2").attr("a", "1");
        let b = Element::new("x").attr("a", "1").attr("b", "2");
        assert_eq!(a, b);
    }

    #[test]
    fn parses_xml_and_trims_text() {
        let parsed = Element::from_xml(
            "<Settings>\n <Oof>\n  <Get>\n   <BodyType>\n    TEXT\n   </BodyType>\n  </Get>\n </Oof>\n</Settings>",
        )
        .unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn renders_xml() {
        let xml = sample().to_xml_string();
        assert!(xml.contains("<BodyType>TEXT</BodyType>"));
        assert!(xml.starts_with("<Settings>"));
    }
}
