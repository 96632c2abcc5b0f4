use thiserror::Error;

/// Errors of the SOAP serializer
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SoapError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("XML write error: {0}")]
    Emit(String),

    /// SOAP Fault, or a document without a SOAP Body.
    #[error("SOAP fault: {}", message.as_deref().unwrap_or("no fault string"))]
    Fault {
        code: Option<String>,
        message: Option<String>,
    },

    #[error("no '{0}Response/return' element in SOAP Body")]
    MissingResponse(String),

    #[error("element '{0}' has no xsi:type")]
    MissingType(String),

    #[error("no handler for type {{{namespace}}}{name}")]
    UnknownType { namespace: String, name: String },

    #[error("invalid {kind} value '{value}'")]
    InvalidValue { kind: &'static str, value: String },

    #[error("expected {expected}, found {found}")]
    Conversion {
        expected: &'static str,
        found: &'static str,
    },

    #[error("missing field '{0}'")]
    MissingField(String),

    #[error("map item without <{0}>")]
    MalformedItem(&'static str),
}

impl SoapError {
    pub fn is_fault(&self) -> bool {
        matches!(self, SoapError::Fault { .. })
    }
}

impl From<xmltree::ParseError> for SoapError {
    fn from(err: xmltree::ParseError) -> Self {
        SoapError::Xml(err.to_string())
    }
}

impl From<xmltree::Error> for SoapError {
    fn from(err: xmltree::Error) -> Self {
        SoapError::Emit(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SoapError>;
