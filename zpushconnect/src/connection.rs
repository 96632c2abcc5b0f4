//! Connection façade: one typed request in, one typed response out.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use zpushsoap::{SoapError, SoapRequest, decode_response, encode_request, find_fault};
use zpushwbxml::{WbxmlDocument, activesync};

use crate::activesync::{ActiveSyncRequest, ActiveSyncResponse};
use crate::cancel::CancellationToken;
use crate::capabilities::Capabilities;
use crate::error::{ConnectError, Result};
use crate::folders::{
    AdditionalFolderListRequest, AdditionalFolderSetListRequest, FolderTree,
    ListUserFoldersRequest, SharedFolder,
};
use crate::freebusy::{MergedFreeBusy, ResolveRecipientsRequest};
use crate::headers::{
    CONTENT_TYPE_WBXML, CONTENT_TYPE_XML, HEADER_CLIENT_CAPABILITIES, HEADER_PLUGIN,
    HEADER_PROTOCOL_VERSION, PROTOCOL_VERSION, ResponseHeaders,
};
use crate::oof::{GetOofRequest, OofSettings, SetOofRequest};
use crate::signatures::{GetSignaturesRequest, Signatures};
use crate::transport::{self, HttpRequest, HttpResponse, HttpTransport};
use crate::trust::CertificateTrust;
use crate::webservice::WebService;

const ACTIVESYNC_PATH: &str = "Microsoft-Server-ActiveSync";
/// `DeviceId` and `DeviceType` of web-service calls.
const WEBSERVICE_DEVICE: &str = "webservice";
pub const DEFAULT_DEVICE_TYPE: &str = "WindowsOutlook";

/// Credentials and device identity used for every call.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    server: String,
    pub user_name: String,
    pub password: String,
    pub device_id: String,
    pub device_type: String,
}

impl Account {
    /// `server` is a host name, optionally with a port, a scheme and a path;
    /// only the host part is kept.
    pub fn new(
        server: &str,
        user_name: impl Into<String>,
        password: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Account {
            server: server_host(server),
            user_name: user_name.into(),
            password: password.into(),
            device_id: device_id.into(),
            device_type: DEFAULT_DEVICE_TYPE.to_string(),
        }
    }

    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = device_type.into();
        self
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Host name without the port, as used for certificate decisions.
    pub fn host(&self) -> &str {
        match self.server.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
            _ => &self.server,
        }
    }

    fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.user_name, self.password);
        format!("Basic {}", BASE64.encode(credentials))
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("server", &self.server)
            .field("user_name", &self.user_name)
            .field("device_id", &self.device_id)
            .field("device_type", &self.device_type)
            .finish_non_exhaustive()
    }
}

fn server_host(server: &str) -> String {
    let server = server.trim();
    let server = server
        .strip_prefix("https://")
        .or_else(|| server.strip_prefix("http://"))
        .unwrap_or(server);
    server
        .split('/')
        .next()
        .unwrap_or(server)
        .to_string()
}

/// How this client identifies itself to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    /// Sent as `X-Push-Plugin`.
    pub plugin: String,
    /// Sent as `X-Push-Plugin-Capabilities` on ActiveSync calls.
    pub capabilities: Capabilities,
}

impl ClientInfo {
    pub fn new(plugin: impl Into<String>, capabilities: Capabilities) -> Self {
        ClientInfo {
            plugin: plugin.into(),
            capabilities,
        }
    }
}

/// Dispatches requests for one account.
///
/// A connection holds no per-call state and can be cloned freely; clones
/// share the transport and the certificate decisions.
#[derive(Clone)]
pub struct Connection {
    account: Account,
    client: ClientInfo,
    transport: Arc<dyn HttpTransport>,
    trust: Arc<CertificateTrust>,
    cancel: Option<CancellationToken>,
}

impl Connection {
    pub fn new(
        account: Account,
        client: ClientInfo,
        transport: Arc<dyn HttpTransport>,
        trust: Arc<CertificateTrust>,
    ) -> Self {
        Connection {
            account,
            client,
            transport,
            trust,
            cancel: None,
        }
    }

    /// Calls made through the returned connection stop when `token` is
    /// cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn client(&self) -> &ClientInfo {
        &self.client
    }

    pub fn trust(&self) -> &CertificateTrust {
        &self.trust
    }

    pub fn activesync_url(&self, command: &str) -> String {
        format!(
            "https://{}/{ACTIVESYNC_PATH}?DeviceId={}&Cmd={}&User={}&DeviceType={}",
            self.account.server,
            urlencoding::encode(&self.account.device_id),
            urlencoding::encode(command),
            urlencoding::encode(&self.account.user_name),
            urlencoding::encode(&self.account.device_type),
        )
    }

    pub fn webservice_url(&self, service: WebService, user: Option<&str>) -> String {
        format!(
            "https://{}/{ACTIVESYNC_PATH}?DeviceId={WEBSERVICE_DEVICE}&Cmd={}&User={}&DeviceType={WEBSERVICE_DEVICE}",
            self.account.server,
            service.name(),
            urlencoding::encode(user.unwrap_or(&self.account.user_name)),
        )
    }

    fn common_headers(&self, content_type: &str) -> Vec<(String, String)> {
        vec![
            ("Authorization".to_string(), self.account.authorization()),
            (HEADER_PLUGIN.to_string(), self.client.plugin.clone()),
            (
                HEADER_PROTOCOL_VERSION.to_string(),
                PROTOCOL_VERSION.to_string(),
            ),
            ("Accept".to_string(), "*/*".to_string()),
            ("Content-Type".to_string(), content_type.to_string()),
        ]
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let result = transport::execute(&self.transport, &self.trust, self.cancel.as_ref(), request);
        if let Err(ConnectError::Cancelled) = &result {
            debug!(host = %self.account.host(), "Request cancelled");
        }
        result
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => {
                debug!(host = %self.account.host(), "Request cancelled");
                Err(ConnectError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    /// Sends an ActiveSync command and parses its WBXML reply.
    pub fn execute<R: ActiveSyncRequest>(&self, request: &R) -> Result<R::Response> {
        let command = request.command();
        let url = self.activesync_url(command);
        debug!(cmd = %command, url = %url, "ActiveSync request");

        let body = WbxmlDocument::new(activesync(), request.body()).to_bytes(activesync())?;
        let mut headers = self.common_headers(CONTENT_TYPE_WBXML);
        headers.push((
            HEADER_CLIENT_CAPABILITIES.to_string(),
            self.client.capabilities.to_string(),
        ));

        let response = self.send(HttpRequest {
            url,
            host: self.account.host().to_string(),
            headers,
            body,
        })?;
        self.check_cancelled()?;

        let headers = ResponseHeaders::from_headers(&response.headers);
        debug!(
            cmd = %command,
            status = response.status,
            capabilities = ?headers.capabilities,
            version = ?headers.raw_version,
            "ActiveSync response"
        );
        if !response.is_success() {
            warn!(cmd = %command, status = response.status, "ActiveSync request failed");
            return Err(ConnectError::Fault {
                status: Some(response.status),
                message: None,
            });
        }

        let body = if response.body.is_empty() {
            None
        } else {
            Some(WbxmlDocument::from_bytes(activesync(), &response.body)?.root)
        };
        self.check_cancelled()?;
        request.parse_response(&ActiveSyncResponse {
            status: response.status,
            headers,
            body,
        })
    }

    /// Calls a web-service method on `service`.
    pub fn execute_soap<R: SoapRequest>(
        &self,
        service: WebService,
        request: &R,
    ) -> Result<R::Response> {
        let url = self.webservice_url(service, request.user_name());
        debug!(service = service.name(), request = request.request_name(), url = %url, "SOAP request");

        let service_parameters = service.parameters(&self.account.device_id);
        let body = encode_request(request, &self.account.server, service_parameters.as_ref())?;
        let response = self.send(HttpRequest {
            url,
            host: self.account.host().to_string(),
            headers: self.common_headers(CONTENT_TYPE_XML),
            body: body.into_bytes(),
        })?;
        self.check_cancelled()?;

        debug!(request = request.request_name(), status = response.status, "SOAP response");
        if !response.is_success() {
            let message = fault_message(&response.body);
            warn!(
                request = request.request_name(),
                status = response.status,
                message = ?message,
                "SOAP request failed"
            );
            return Err(ConnectError::Fault {
                status: Some(response.status),
                message,
            });
        }

        self.check_cancelled()?;
        decode_response(request, &response.body).map_err(|err| {
            if !matches!(err, SoapError::Fault { .. }) {
                warn!(request = request.request_name(), error = %err, "Invalid SOAP response");
            }
            ConnectError::from(err)
        })
    }

    pub fn get_oof(&self) -> Result<OofSettings> {
        self.execute(&GetOofRequest)
    }

    pub fn set_oof(&self, settings: OofSettings) -> Result<()> {
        self.execute(&SetOofRequest::new(settings))
    }

    /// Merged free/busy of `recipient` from `start`; `None` when the server
    /// has no availability for that recipient.
    pub fn free_busy(
        &self,
        recipient: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Option<MergedFreeBusy>> {
        self.execute(&ResolveRecipientsRequest::new(recipient, start, end))
            .map(|resolved| resolved.free_busy)
    }

    pub fn signatures(&self) -> Result<Signatures> {
        self.execute_soap(WebService::Info, &GetSignaturesRequest)
    }

    /// Folders `user` can share, as a tree.
    pub fn user_folders(&self, user: &str) -> Result<FolderTree> {
        let folders = self.execute_soap(WebService::Info, &ListUserFoldersRequest::new(user))?;
        FolderTree::build(user, folders)
    }

    pub fn current_shares(&self) -> Result<Vec<SharedFolder>> {
        self.execute_soap(WebService::Device, &AdditionalFolderListRequest)
    }

    pub fn set_current_shares(&self, store: &str, shares: Vec<SharedFolder>) -> Result<bool> {
        self.execute_soap(
            WebService::Device,
            &AdditionalFolderSetListRequest::new(store, shares),
        )
    }
}

/// Fault text of an error response body, when it is a SOAP fault.
fn fault_message(body: &[u8]) -> Option<String> {
    let root = zpushsoap::Element::parse(body).ok()?;
    match find_fault(&root)? {
        SoapError::Fault { code, message } => message.or(code),
        _ => None,
    }
}
