//! WBXML document: header fields plus the root [`Element`].

use tracing::trace;

use crate::codepage::CodeSpace;
use crate::decoder::Decoder;
use crate::element::Element;
use crate::encoder::Encoder;
use crate::error::{Result, WbxmlError};
use crate::tokens::VERSION_1_3;

/// Character sets the codec understands, identified on the wire by their
/// IANA MIBenum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Charset {
    #[default]
    Utf8,
    UsAscii,
    Latin1,
}

impl Charset {
    pub fn mib_enum(self) -> u32 {
        match self {
            Charset::Utf8 => 106,
            Charset::UsAscii => 3,
            Charset::Latin1 => 4,
        }
    }

    pub fn from_mib_enum(mib: u32) -> Option<Self> {
        match mib {
            106 => Some(Charset::Utf8),
            3 => Some(Charset::UsAscii),
            4 => Some(Charset::Latin1),
            _ => None,
        }
    }

    /// Decodes `bytes`, found at `offset` in the input, into a string.
    pub(crate) fn decode(self, bytes: &[u8], offset: usize) -> Result<String> {
        match self {
            Charset::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| WbxmlError::InvalidUtf8(offset + e.valid_up_to())),
            Charset::UsAscii => match bytes.iter().position(|b| !b.is_ascii()) {
                Some(bad) => Err(WbxmlError::InvalidUtf8(offset + bad)),
                None => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            },
            Charset::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WbxmlDocument {
    pub version: u8,
    pub public_id: u32,
    pub charset: Charset,
    pub root: Element,
}

impl WbxmlDocument {
    /// WBXML 1.3, UTF-8 document using the public identifier of `space`.
    pub fn new(space: &CodeSpace, root: Element) -> Self {
        WbxmlDocument {
            version: VERSION_1_3,
            public_id: space.public_identifier(),
            charset: Charset::Utf8,
            root,
        }
    }

    /// Encodes the document. Only UTF-8 output is supported.
    pub fn to_bytes(&self, space: &CodeSpace) -> Result<Vec<u8>> {
        if self.charset != Charset::Utf8 {
            return Err(WbxmlError::UnsupportedCharset(self.charset.mib_enum()));
        }
        trace!(codespace = space.name(), "encoding WBXML document:\n{}", self.root);
        let mut encoder = Encoder::new(space);
        encoder.write_header(self.version, self.public_id, self.charset.mib_enum());
        encoder.write_element(&self.root)?;
        Ok(encoder.finish())
    }

    /// Decodes a complete document; bytes after the root element are an error.
    pub fn from_bytes(space: &CodeSpace, bytes: &[u8]) -> Result<Self> {
        let document = Decoder::new(space, bytes).decode()?;
        trace!(codespace = space.name(), "decoded WBXML document:\n{}", document.root);
        Ok(document)
    }
}
