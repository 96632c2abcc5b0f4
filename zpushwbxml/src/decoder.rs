use std::collections::BTreeMap;

use crate::codepage::CodeSpace;
use crate::document::{Charset, WbxmlDocument};
use crate::element::Element;
use crate::error::{Result, WbxmlError};
use crate::mbuint::read_mb_u32;
use crate::tokens::{
    END, ENTITY, FLAG_ATTRIBUTES, FLAG_CONTENT, OPAQUE, STR_I, STR_T, SWITCH_PAGE, TAG_MASK,
    is_global,
};

const MAX_DEPTH: usize = 256;

/// Reads a WBXML byte stream back into an [`Element`] tree.
///
/// Inline strings, string-table references, character entities and opaque
/// data all end up in `Element::text`. Extension tokens, processing
/// instructions and literal tags fail the decode.
pub(crate) struct Decoder<'a> {
    space: &'a CodeSpace,
    data: &'a [u8],
    pos: usize,
    charset: Charset,
    string_table: &'a [u8],
    string_table_offset: usize,
    tag_page: u8,
    attr_page: u8,
}

impl<'a> Decoder<'a> {
    pub(crate) fn new(space: &'a CodeSpace, data: &'a [u8]) -> Self {
        Decoder {
            space,
            data,
            pos: 0,
            charset: Charset::Utf8,
            string_table: &[],
            string_table_offset: 0,
            tag_page: 0,
            attr_page: 0,
        }
    }

    pub(crate) fn decode(mut self) -> Result<WbxmlDocument> {
        let version = self.next_byte()?;
        let public_id = self.mb_u32()?;
        if public_id == 0 {
            // Public identifier given as a string table index; not kept.
            self.mb_u32()?;
        }
        let mib = self.mb_u32()?;
        self.charset = Charset::from_mib_enum(mib).ok_or(WbxmlError::UnsupportedCharset(mib))?;
        let table_len = self.mb_u32()? as usize;
        let table_end = self
            .pos
            .checked_add(table_len)
            .filter(|&end| end <= self.data.len())
            .ok_or(WbxmlError::Truncated(self.data.len()))?;
        self.string_table = &self.data[self.pos..table_end];
        self.string_table_offset = self.pos;
        self.pos = table_end;

        let root = loop {
            let offset = self.pos;
            match self.next_byte()? {
                SWITCH_PAGE => self.tag_page = self.next_byte()?,
                token if is_global(token) => {
                    return Err(WbxmlError::UnexpectedToken { token, offset });
                }
                token => break self.read_element(token, offset, 0)?,
            }
        };
        if self.pos != self.data.len() {
            return Err(WbxmlError::TrailingData(self.data.len() - self.pos));
        }
        Ok(WbxmlDocument {
            version,
            public_id,
            charset: self.charset,
            root,
        })
    }

    fn read_element(&mut self, byte: u8, offset: usize, depth: usize) -> Result<Element> {
        if depth >= MAX_DEPTH {
            return Err(WbxmlError::TooDeep(MAX_DEPTH));
        }
        let token = byte & TAG_MASK;
        let name = self
            .space
            .lookup_name(self.tag_page, token)
            .ok_or(WbxmlError::UnknownToken {
                page: self.tag_page,
                token,
                offset,
            })?;
        let mut element = Element::new(name);
        if byte & FLAG_ATTRIBUTES != 0 {
            element.attributes = self.read_attributes()?;
        }
        if byte & FLAG_CONTENT != 0 {
            self.read_content(&mut element, depth)?;
        }
        Ok(element)
    }

    fn read_attributes(&mut self) -> Result<BTreeMap<String, String>> {
        let mut attributes = BTreeMap::new();
        let mut current: Option<(String, String)> = None;
        loop {
            let offset = self.pos;
            let byte = self.next_byte()?;
            match byte {
                END => break,
                SWITCH_PAGE => self.attr_page = self.next_byte()?,
                STR_I | STR_T | ENTITY | OPAQUE => {
                    let value = self.read_text_token(byte)?;
                    match current.as_mut() {
                        Some((_, existing)) => existing.push_str(&value),
                        None => return Err(WbxmlError::DanglingAttributeValue(offset)),
                    }
                }
                // Attribute value tokens (>= 0x80) and the remaining globals.
                token if token >= 0x80 || is_global(token) => {
                    return Err(WbxmlError::UnsupportedToken { token, offset });
                }
                token => {
                    let name = self
                        .space
                        .lookup_attribute_name(self.attr_page, token)
                        .ok_or(WbxmlError::UnknownToken {
                            page: self.attr_page,
                            token,
                            offset,
                        })?;
                    if let Some((name, value)) = current.replace((name.to_string(), String::new()))
                    {
                        attributes.insert(name, value);
                    }
                }
            }
        }
        if let Some((name, value)) = current {
            attributes.insert(name, value);
        }
        Ok(attributes)
    }

    fn read_content(&mut self, element: &mut Element, depth: usize) -> Result<()> {
        loop {
            let offset = self.pos;
            let byte = self.next_byte()?;
            match byte {
                END => return Ok(()),
                SWITCH_PAGE => self.tag_page = self.next_byte()?,
                STR_I | STR_T | ENTITY | OPAQUE => {
                    let text = self.read_text_token(byte)?;
                    element.text.get_or_insert_with(String::new).push_str(&text);
                }
                token if is_global(token) => {
                    return Err(WbxmlError::UnsupportedToken { token, offset });
                }
                token => {
                    let child = self.read_element(token, offset, depth + 1)?;
                    element.children.push(child);
                }
            }
        }
    }

    /// Reads the payload following one of the text-bearing global tokens.
    fn read_text_token(&mut self, token: u8) -> Result<String> {
        match token {
            STR_I => self.read_inline_string(),
            STR_T => {
                let index = self.mb_u32()?;
                self.read_table_string(index)
            }
            ENTITY => {
                let code = self.mb_u32()?;
                char::from_u32(code)
                    .map(String::from)
                    .ok_or(WbxmlError::InvalidEntity(code))
            }
            _ => {
                let len = self.mb_u32()? as usize;
                let start = self.pos;
                let end = start
                    .checked_add(len)
                    .filter(|&end| end <= self.data.len())
                    .ok_or(WbxmlError::Truncated(self.data.len()))?;
                self.pos = end;
                Charset::Utf8.decode(&self.data[start..end], start)
            }
        }
    }

    fn read_inline_string(&mut self) -> Result<String> {
        let start = self.pos;
        let len = self.data[start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(WbxmlError::Truncated(self.data.len()))?;
        self.pos = start + len + 1;
        self.charset.decode(&self.data[start..start + len], start)
    }

    fn read_table_string(&self, index: u32) -> Result<String> {
        let bad_index = WbxmlError::BadStringTableIndex {
            index,
            len: self.string_table.len(),
        };
        let start = index as usize;
        let rest = self.string_table.get(start..).ok_or(bad_index.clone())?;
        let len = rest.iter().position(|&b| b == 0).ok_or(bad_index)?;
        self.charset
            .decode(&rest[..len], self.string_table_offset + start)
    }

    fn next_byte(&mut self) -> Result<u8> {
        let byte = *self
            .data
            .get(self.pos)
            .ok_or(WbxmlError::Truncated(self.pos))?;
        self.pos += 1;
        Ok(byte)
    }

    fn mb_u32(&mut self) -> Result<u32> {
        read_mb_u32(self.data, &mut self.pos)
    }
}
