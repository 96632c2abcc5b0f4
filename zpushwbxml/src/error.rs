use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WbxmlError {
    #[error("unexpected end of WBXML data at offset {0}")]
    Truncated(usize),
    #[error("multi-byte integer at offset {0} does not fit in 32 bits")]
    IntegerOverflow(usize),
    #[error("unsupported WBXML charset (MIBenum {0})")]
    UnsupportedCharset(u32),
    #[error("unknown tag '{name}' (no code page defines it)")]
    UnknownTag { name: String },
    #[error("unknown attribute '{name}' on tag '{tag}'")]
    UnknownAttribute { tag: String, name: String },
    #[error("unknown token 0x{token:02x} on code page {page} at offset {offset}")]
    UnknownToken { page: u8, token: u8, offset: usize },
    #[error("unsupported token 0x{token:02x} at offset {offset}")]
    UnsupportedToken { token: u8, offset: usize },
    #[error("unexpected token 0x{token:02x} at offset {offset}")]
    UnexpectedToken { token: u8, offset: usize },
    #[error("attribute value without attribute name at offset {0}")]
    DanglingAttributeValue(usize),
    #[error("string table reference {index} outside table of {len} bytes")]
    BadStringTableIndex { index: u32, len: usize },
    #[error("invalid UTF-8 in string at offset {0}")]
    InvalidUtf8(usize),
    #[error("invalid character reference {0}")]
    InvalidEntity(u32),
    #[error("inline string for '{0}' contains a NUL byte")]
    EmbeddedNul(String),
    #[error("{0} trailing bytes after document body")]
    TrailingData(usize),
    #[error("element nesting deeper than {0} levels")]
    TooDeep(usize),
    #[error("code page {page}: token 0x{token:02x} is outside the range a {kind} token may use")]
    TokenOutOfRange {
        page: u8,
        token: u8,
        kind: &'static str,
    },
    #[error("code page {page}: duplicate {kind} entry for '{name}' / 0x{token:02x}")]
    DuplicateToken {
        page: u8,
        token: u8,
        name: &'static str,
        kind: &'static str,
    },
    #[error("XML error: {0}")]
    Xml(String),
}

impl From<xmltree::ParseError> for WbxmlError {
    fn from(err: xmltree::ParseError) -> Self {
        WbxmlError::Xml(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WbxmlError>;
