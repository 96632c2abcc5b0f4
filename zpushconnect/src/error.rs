use thiserror::Error;
use zpushsoap::SoapError;
use zpushwbxml::WbxmlError;

/// Failure of one request/response round trip.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The response could not be decoded (bad WBXML or XML, unknown token
    /// or `xsi:type`).
    #[error("malformed response: {0}")]
    Wire(String),

    /// SOAP fault or non-success HTTP status.
    #[error(
        "server fault (status {}): {}",
        .status.map_or_else(|| "none".to_string(), |s| s.to_string()),
        .message.as_deref().unwrap_or("no message")
    )]
    Fault {
        status: Option<u16>,
        message: Option<String>,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid certificate for {host} was rejected")]
    CertificateRejected { host: String },

    #[error("request cancelled")]
    Cancelled,

    /// Well-formed document without the expected content.
    #[error("unexpected response: {0}")]
    Response(String),
}

impl ConnectError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConnectError::Cancelled)
    }

    pub fn is_fault(&self) -> bool {
        matches!(self, ConnectError::Fault { .. })
    }

    pub(crate) fn response(message: impl Into<String>) -> Self {
        ConnectError::Response(message.into())
    }
}

impl From<WbxmlError> for ConnectError {
    fn from(err: WbxmlError) -> Self {
        ConnectError::Wire(err.to_string())
    }
}

impl From<SoapError> for ConnectError {
    fn from(err: SoapError) -> Self {
        match err {
            SoapError::Fault { code, message } => ConnectError::Fault {
                status: None,
                message: message.or(code),
            },
            SoapError::Xml(_)
            | SoapError::Emit(_)
            | SoapError::MissingType(_)
            | SoapError::UnknownType { .. } => ConnectError::Wire(err.to_string()),
            other => ConnectError::Response(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectError>;
