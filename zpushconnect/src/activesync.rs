//! ActiveSync commands: WBXML request bodies and typed responses.

use zpushwbxml::Element;

use crate::error::{ConnectError, Result};
use crate::headers::ResponseHeaders;

/// Decoded reply to an ActiveSync command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveSyncResponse {
    pub status: u16,
    pub headers: ResponseHeaders,
    /// Root of the WBXML body; `None` for an empty body.
    pub body: Option<Element>,
}

impl ActiveSyncResponse {
    /// Body root, or a response error naming the command.
    pub fn body(&self, command: &str) -> Result<&Element> {
        self.body
            .as_ref()
            .ok_or_else(|| ConnectError::response(format!("{command} response has no body")))
    }
}

/// A command sent as a WBXML document to `Microsoft-Server-ActiveSync`.
pub trait ActiveSyncRequest {
    type Response;

    /// Value of the `Cmd` query parameter.
    fn command(&self) -> &'static str;

    fn body(&self) -> Element;

    fn parse_response(&self, response: &ActiveSyncResponse) -> Result<Self::Response>;
}

/// Status value of a successful ActiveSync operation.
pub const STATUS_SUCCESS: &str = "1";

/// Fails unless the `Status` child of `element`, when present, is success.
pub(crate) fn check_status(element: &Element) -> Result<()> {
    match element.get_child("Status").and_then(Element::text) {
        None | Some(STATUS_SUCCESS) => Ok(()),
        Some(status) => Err(ConnectError::response(format!(
            "{} failed with status {status}",
            element.name
        ))),
    }
}

pub(crate) fn required_text<'a>(element: &'a Element, name: &str) -> Result<&'a str> {
    element
        .get_child(name)
        .and_then(Element::text)
        .ok_or_else(|| ConnectError::response(format!("{} has no {name}", element.name)))
}
