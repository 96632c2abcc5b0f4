//! # zpushconnect
//!
//! Typed requests against a Z-Push server, over ActiveSync (WBXML bodies) and
//! the Z-Push web services (SOAP).
//!
//! ## Features
//!
//! - [`Connection`]: one call per method, account credentials and client
//!   identification added to every request
//! - ActiveSync commands: out-of-office settings ([`GetOofRequest`],
//!   [`SetOofRequest`]) and recipient availability ([`ResolveRecipientsRequest`])
//! - Web services: signatures, available and shared folders
//! - Server headers (capabilities, version, GAB name, signatures hash)
//!   exposed through [`ResponseHeaders`]
//! - Cooperative cancellation with [`CancellationToken`]
//! - Per-host trust of invalid certificates through an injected
//!   [`CertificateTrust`]
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use zpushconnect::{
//!     Account, Capabilities, CertificateTrust, ClientInfo, Connection, UreqTransport,
//! };
//!
//! let account = Account::new("mail.example.com", "john", "secret", "0123abcd");
//! let client = ClientInfo::new("zpushctl/0.1.0", Capabilities::parse("oof,ooftime"));
//! let connection = Connection::new(
//!     account,
//!     client,
//!     Arc::new(UreqTransport::default()),
//!     Arc::new(CertificateTrust::reject_all()),
//! );
//!
//! let oof = connection.get_oof()?;
//! println!("out of office: {}", oof.state.is_enabled());
//! # Ok::<(), zpushconnect::ConnectError>(())
//! ```

pub mod activesync;
pub mod cancel;
pub mod capabilities;
pub mod connection;
pub mod error;
pub mod folders;
pub mod freebusy;
pub mod headers;
pub mod oof;
pub mod signatures;
pub mod transport;
pub mod trust;
pub mod webservice;

pub use activesync::{ActiveSyncRequest, ActiveSyncResponse};
pub use cancel::CancellationToken;
pub use capabilities::{Capabilities, ServerVersion};
pub use connection::{Account, ClientInfo, Connection};
pub use error::{ConnectError, Result};
pub use folders::{
    AdditionalFolderListRequest, AdditionalFolderSetListRequest, AvailableFolder, BackendId,
    FolderNode, FolderTree, ListUserFoldersRequest, ShareFlags, SharedFolder, SyncId, SyncKind,
    SyncType,
};
pub use freebusy::{
    FreeBusyBlock, FreeBusyType, MergedFreeBusy, ResolveRecipientsRequest, ResolvedRecipients,
    render_vfreebusy,
};
pub use headers::ResponseHeaders;
pub use oof::{GetOofRequest, OofSettings, OofState, OofTarget, SetOofRequest};
pub use signatures::{GetSignaturesRequest, Signature, Signatures};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, TransportError, UreqTransport};
pub use trust::{AllowHosts, CertificatePolicy, CertificateTrust, RejectInvalid};
pub use webservice::WebService;

pub use zpushwbxml::Element;
