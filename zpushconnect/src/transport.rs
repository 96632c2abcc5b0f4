//! HTTP transport: one POST per call, TLS trust decisions and cancellation.

use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, select};
use thiserror::Error;
use tracing::{debug, trace, warn};
use ureq::Agent;
use ureq::tls::TlsConfig;

use crate::cancel::CancellationToken;
use crate::error::{ConnectError, Result};
use crate::trust::CertificateTrust;

/// A POST ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    /// Host the trust decisions are keyed by.
    pub host: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("{0}")]
    Failed(String),
}

impl From<TransportError> for ConnectError {
    fn from(err: TransportError) -> Self {
        ConnectError::Transport(err.to_string())
    }
}

/// Sends a request and returns the raw response, whatever its status.
pub trait HttpTransport: Send + Sync {
    fn post(
        &self,
        request: &HttpRequest,
        verify_certificates: bool,
    ) -> std::result::Result<HttpResponse, TransportError>;
}

/// [`HttpTransport`] backed by `ureq`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    verified: Agent,
    unverified: Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let verified = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();
        let unverified = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .tls_config(TlsConfig::builder().disable_verification(true).build())
            .build();
        UreqTransport {
            verified: verified.into(),
            unverified: unverified.into(),
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

fn is_certificate_error(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Rustls(rustls::Error::InvalidCertificate(_)) => true,
        ureq::Error::Io(io) => io
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<rustls::Error>())
            .is_some_and(|e| matches!(e, rustls::Error::InvalidCertificate(_))),
        _ => false,
    }
}

fn transport_error(err: ureq::Error) -> TransportError {
    if is_certificate_error(&err) {
        TransportError::InvalidCertificate(err.to_string())
    } else {
        TransportError::Failed(err.to_string())
    }
}

impl HttpTransport for UreqTransport {
    fn post(
        &self,
        request: &HttpRequest,
        verify_certificates: bool,
    ) -> std::result::Result<HttpResponse, TransportError> {
        let agent = if verify_certificates {
            &self.verified
        } else {
            &self.unverified
        };
        let mut builder = agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let response = builder.send(&request.body[..]).map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let mut body = Vec::new();
        response
            .into_body()
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| TransportError::Failed(e.to_string()))?;
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Runs one POST, on a worker thread when the call can be cancelled.
fn post(
    transport: &Arc<dyn HttpTransport>,
    request: &Arc<HttpRequest>,
    verify_certificates: bool,
    cancel: Option<&CancellationToken>,
) -> Result<std::result::Result<HttpResponse, TransportError>> {
    let Some(cancel) = cancel else {
        return Ok(transport.post(request, verify_certificates));
    };
    if cancel.is_cancelled() {
        return Err(ConnectError::Cancelled);
    }

    let cancelled = cancel.subscribe();
    let (tx, rx) = bounded(1);
    let worker_transport = Arc::clone(transport);
    let worker_request = Arc::clone(request);
    thread::Builder::new()
        .name("zpush-http".to_string())
        .spawn(move || {
            let result = worker_transport.post(&worker_request, verify_certificates);
            // The caller is gone when the call was cancelled.
            let _ = tx.send(result);
        })
        .map_err(|e| ConnectError::Transport(e.to_string()))?;

    select! {
        recv(rx) -> result => {
            result.map_err(|_| ConnectError::Transport("HTTP worker stopped".to_string()))
        }
        recv(cancelled) -> _ => Err(ConnectError::Cancelled),
    }
}

/// Sends `request`, retrying without certificate verification when the
/// host's invalid certificate is trusted.
pub(crate) fn execute(
    transport: &Arc<dyn HttpTransport>,
    trust: &CertificateTrust,
    cancel: Option<&CancellationToken>,
    request: HttpRequest,
) -> Result<HttpResponse> {
    let request = Arc::new(request);
    trace!(url = %request.url, bytes = request.body.len(), "POST");

    let verify = trust.decision(&request.host) != Some(true);
    let response = match post(transport, &request, verify, cancel)? {
        Err(TransportError::InvalidCertificate(reason)) if verify => {
            debug!(host = %request.host, reason = %reason, "Certificate validation failed");
            if !trust.allows(&request.host) {
                return Err(ConnectError::CertificateRejected {
                    host: request.host.clone(),
                });
            }
            post(transport, &request, false, cancel)?
        }
        result => result,
    };

    if cancel.is_some_and(CancellationToken::is_cancelled) {
        return Err(ConnectError::Cancelled);
    }
    response.map_err(|err| {
        warn!(url = %request.url, error = %err, "HTTP request failed");
        ConnectError::from(err)
    })
}
