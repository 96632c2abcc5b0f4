use crate::codepage::CodeSpace;
use crate::element::Element;
use crate::error::{Result, WbxmlError};
use crate::mbuint::write_mb_u32;
use crate::tokens::{END, FLAG_ATTRIBUTES, FLAG_CONTENT, STR_I, SWITCH_PAGE};

/// Streams an [`Element`] tree into WBXML.
///
/// Tag and attribute code pages are tracked separately, as in WBXML: a page
/// switch stays in effect until the next switch of the same kind, whatever
/// the nesting level.
pub(crate) struct Encoder<'a> {
    space: &'a CodeSpace,
    out: Vec<u8>,
    tag_page: u8,
    attr_page: u8,
}

impl<'a> Encoder<'a> {
    pub(crate) fn new(space: &'a CodeSpace) -> Self {
        Encoder {
            space,
            out: Vec::new(),
            tag_page: 0,
            attr_page: 0,
        }
    }

    /// Version, public identifier, charset and an empty string table.
    pub(crate) fn write_header(&mut self, version: u8, public_id: u32, charset: u32) {
        self.out.push(version);
        write_mb_u32(&mut self.out, public_id);
        write_mb_u32(&mut self.out, charset);
        write_mb_u32(&mut self.out, 0);
    }

    pub(crate) fn write_element(&mut self, element: &Element) -> Result<()> {
        let (page, token) = self
            .space
            .find_tag(self.tag_page, &element.name)
            .ok_or_else(|| WbxmlError::UnknownTag {
                name: element.name.clone(),
            })?;
        if page != self.tag_page {
            self.out.extend([SWITCH_PAGE, page]);
            self.tag_page = page;
        }

        let mut byte = token;
        if !element.attributes.is_empty() {
            byte |= FLAG_ATTRIBUTES;
        }
        if element.has_content() {
            byte |= FLAG_CONTENT;
        }
        self.out.push(byte);

        if !element.attributes.is_empty() {
            self.write_attributes(element)?;
        }
        if element.has_content() {
            if let Some(text) = &element.text {
                self.write_inline_string(&element.name, text)?;
            }
            for child in &element.children {
                self.write_element(child)?;
            }
            self.out.push(END);
        }
        Ok(())
    }

    fn write_attributes(&mut self, element: &Element) -> Result<()> {
        for (name, value) in &element.attributes {
            let (page, token) = self
                .space
                .find_attribute(self.attr_page, name)
                .ok_or_else(|| WbxmlError::UnknownAttribute {
                    tag: element.name.clone(),
                    name: name.clone(),
                })?;
            if page != self.attr_page {
                self.out.extend([SWITCH_PAGE, page]);
                self.attr_page = page;
            }
            self.out.push(token);
            self.write_inline_string(name, value)?;
        }
        self.out.push(END);
        Ok(())
    }

    fn write_inline_string(&mut self, owner: &str, text: &str) -> Result<()> {
        if text.as_bytes().contains(&0) {
            return Err(WbxmlError::EmbeddedNul(owner.to_string()));
        }
        self.out.push(STR_I);
        self.out.extend_from_slice(text.as_bytes());
        self.out.push(0);
        Ok(())
    }

    pub(crate) fn finish(self) -> Vec<u8> {
        self.out
    }
}
