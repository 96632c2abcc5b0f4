//! Vendor headers exchanged with the server.

use crate::capabilities::{Capabilities, ServerVersion};

pub const HEADER_GAB_NAME: &str = "X-Push-GAB-Name";
pub const HEADER_CAPABILITIES: &str = "X-Push-Capabilities";
pub const HEADER_CLIENT_CAPABILITIES: &str = "X-Push-Plugin-Capabilities";
pub const HEADER_PLUGIN: &str = "X-Push-Plugin";
pub const HEADER_VERSION: &str = "X-Z-Push-Version";
pub const HEADER_SIGNATURES_HASH: &str = "X-Push-Signatures-Hash";
pub const HEADER_PROTOCOL_VERSION: &str = "MS-ASProtocolVersion";

pub const PROTOCOL_VERSION: &str = "14.0";
pub const CONTENT_TYPE_WBXML: &str = "application/vnd.ms-sync.wbxml";
pub const CONTENT_TYPE_XML: &str = "text/xml; charset=utf-8";

/// Server information carried by every response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders {
    pub gab_name: Option<String>,
    pub capabilities: Option<Capabilities>,
    pub version: Option<ServerVersion>,
    /// Version string as sent, even when it does not parse.
    pub raw_version: Option<String>,
    pub signatures_hash: Option<String>,
}

impl ResponseHeaders {
    /// Extracts the vendor headers. Names are matched case-insensitively and
    /// repeated headers are concatenated.
    pub fn from_headers(headers: &[(String, String)]) -> Self {
        let raw_version = header_value(headers, HEADER_VERSION);
        ResponseHeaders {
            gab_name: header_value(headers, HEADER_GAB_NAME).map(|v| decode_gab_name(&v)),
            capabilities: header_value(headers, HEADER_CAPABILITIES).map(|v| Capabilities::parse(&v)),
            version: raw_version.as_deref().and_then(ServerVersion::parse),
            raw_version,
            signatures_hash: header_value(headers, HEADER_SIGNATURES_HASH),
        }
    }
}

pub(crate) fn header_value(headers: &[(String, String)], name: &str) -> Option<String> {
    let mut values = headers
        .iter()
        .filter(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
        .peekable();
    values.peek()?;
    Some(values.collect())
}

/// The GAB name is hex-encoded UTF-8; older servers send it verbatim.
pub fn decode_gab_name(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_hexdigit()) {
        if let Some(decoded) = hex::decode(value).ok().and_then(|b| String::from_utf8(b).ok()) {
            return decoded;
        }
    }
    value.to_string()
}
