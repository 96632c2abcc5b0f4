//! Tag code pages and code spaces.
//!
//! A [`CodePage`] maps small integer tokens to tag (and attribute) names for
//! one numbered page; a [`CodeSpace`] groups the pages of one document type
//! together with its WBXML public identifier. Both are immutable once built
//! and can be shared freely between threads.

use std::collections::{BTreeMap, HashMap};

use crate::error::{Result, WbxmlError};
use crate::tokens::{FIRST_PAGE_TOKEN, TAG_MASK};

const LAST_ATTRIBUTE_TOKEN: u8 = 0x7F;

#[derive(Debug, Clone, Default)]
struct TokenTable {
    by_name: HashMap<&'static str, u8>,
    by_token: HashMap<u8, &'static str>,
}

impl TokenTable {
    fn insert(
        &mut self,
        page: u8,
        token: u8,
        name: &'static str,
        max: u8,
        kind: &'static str,
    ) -> Result<()> {
        if !(FIRST_PAGE_TOKEN..=max).contains(&token) {
            return Err(WbxmlError::TokenOutOfRange { page, token, kind });
        }
        if self.by_token.contains_key(&token) || self.by_name.contains_key(name) {
            return Err(WbxmlError::DuplicateToken {
                page,
                token,
                name,
                kind,
            });
        }
        self.by_name.insert(name, token);
        self.by_token.insert(token, name);
        Ok(())
    }
}

/// One numbered code page.
#[derive(Debug, Clone)]
pub struct CodePage {
    id: u8,
    name: &'static str,
    tags: TokenTable,
    attributes: TokenTable,
}

impl CodePage {
    /// Builds a page from its tag table and (possibly empty) attribute table.
    ///
    /// Tag tokens must lie in `0x05..=0x3F`, attribute tokens in `0x05..=0x7F`;
    /// tokens and names must be unique within each table.
    pub fn new(
        id: u8,
        name: &'static str,
        tags: &[(u8, &'static str)],
        attributes: &[(u8, &'static str)],
    ) -> Result<Self> {
        let mut page = CodePage {
            id,
            name,
            tags: TokenTable::default(),
            attributes: TokenTable::default(),
        };
        for &(token, tag) in tags {
            page.tags.insert(id, token, tag, TAG_MASK, "tag")?;
        }
        for &(token, attr) in attributes {
            page.attributes
                .insert(id, token, attr, LAST_ATTRIBUTE_TOKEN, "attribute")?;
        }
        Ok(page)
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn tag_token(&self, name: &str) -> Option<u8> {
        self.tags.by_name.get(name).copied()
    }

    pub fn tag_name(&self, token: u8) -> Option<&'static str> {
        self.tags.by_token.get(&token).copied()
    }

    pub fn attribute_token(&self, name: &str) -> Option<u8> {
        self.attributes.by_name.get(name).copied()
    }

    pub fn attribute_name(&self, token: u8) -> Option<&'static str> {
        self.attributes.by_token.get(&token).copied()
    }

    pub fn contains_tag(&self, name: &str) -> bool {
        self.tags.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tags.by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.by_token.is_empty()
    }
}

/// The set of code pages for one document family.
#[derive(Debug, Clone)]
pub struct CodeSpace {
    name: &'static str,
    public_id: u32,
    pages: BTreeMap<u8, CodePage>,
}

impl CodeSpace {
    pub fn new(name: &'static str, public_id: u32, pages: Vec<CodePage>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for page in pages {
            let id = page.id;
            if map.insert(id, page).is_some() {
                return Err(WbxmlError::DuplicateToken {
                    page: id,
                    token: 0,
                    name: "<page>",
                    kind: "page",
                });
            }
        }
        Ok(CodeSpace {
            name,
            public_id,
            pages: map,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// WBXML public identifier written in the document header.
    pub fn public_identifier(&self) -> u32 {
        self.public_id
    }

    pub fn page(&self, id: u8) -> Option<&CodePage> {
        self.pages.get(&id)
    }

    pub fn pages(&self) -> impl Iterator<Item = &CodePage> {
        self.pages.values()
    }

    pub fn lookup_token(&self, page: u8, name: &str) -> Option<u8> {
        self.page(page)?.tag_token(name)
    }

    pub fn lookup_name(&self, page: u8, token: u8) -> Option<&'static str> {
        self.page(page)?.tag_name(token)
    }

    pub fn lookup_attribute_name(&self, page: u8, token: u8) -> Option<&'static str> {
        self.page(page)?.attribute_name(token)
    }

    /// Resolves a tag name to `(page, token)`, preferring `current` and then
    /// the lowest-numbered page that defines it.
    pub fn find_tag(&self, current: u8, name: &str) -> Option<(u8, u8)> {
        if let Some(token) = self.lookup_token(current, name) {
            return Some((current, token));
        }
        self.pages
            .values()
            .find_map(|page| page.tag_token(name).map(|token| (page.id, token)))
    }

    /// Same resolution order as [`CodeSpace::find_tag`], on attribute tables.
    pub fn find_attribute(&self, current: u8, name: &str) -> Option<(u8, u8)> {
        if let Some(token) = self.page(current).and_then(|p| p.attribute_token(name)) {
            return Some((current, token));
        }
        self.pages
            .values()
            .find_map(|page| page.attribute_token(name).map(|token| (page.id, token)))
    }
}
