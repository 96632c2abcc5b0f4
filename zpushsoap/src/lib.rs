//! # zpushsoap
//!
//! SOAP 1.1 rpc/encoded serializer for the Z-Push web services.
//!
//! ## Features
//!
//! - Requests: an envelope with the fixed prefix set (`xsi`, `xsd`, `soap`,
//!   `soap-enc`, `ns2`) around `<RequestName>` and its parameters
//! - Responses: `RequestNameResponse/return` located by local name, SOAP
//!   faults surfaced as [`SoapError::Fault`]
//! - Values dispatched through a fixed registry of [`TypeHandler`]s keyed by
//!   `xsi:type`; unknown types are errors
//! - Typed (de)serialization via [`SoapSerialize`] / [`SoapDeserialize`] and
//!   declared [`SoapShape`]s instead of runtime reflection
//!
//! ## Example
//!
//! ```
//! use zpushsoap::{SoapParameters, SoapRequest, decode_response, encode_request};
//!
//! struct AdditionalFolderSetListRequest;
//!
//! impl SoapRequest for AdditionalFolderSetListRequest {
//!     type Response = bool;
//!
//!     fn parameters(&self) -> SoapParameters {
//!         SoapParameters::new().with("store", "john")
//!     }
//! }
//!
//! let xml = encode_request(&AdditionalFolderSetListRequest, "https://mail.example.com", None).unwrap();
//! assert!(xml.contains("<AdditionalFolderSetList>"));
//!
//! let reply = br#"<Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
//!     xmlns:xsd="http://www.w3.org/2001/XMLSchema"><Body><AdditionalFolderSetListResponse>
//!     <return xsi:type="xsd:boolean">true</return></AdditionalFolderSetListResponse></Body></Envelope>"#;
//! assert!(decode_response(&AdditionalFolderSetListRequest, reply).unwrap());
//! ```

mod envelope;
mod error;
mod handlers;
mod parameters;
mod request;
mod serializer;
mod shape;
mod value;
mod xml;

pub use envelope::{build_request_envelope, check_fault, find_fault, parse_response};
pub use error::{Result, SoapError};
pub use handlers::{TypeHandler, lookup as lookup_type_handler};
pub use parameters::SoapParameters;
pub use request::{SoapRequest, decode_response, encode_request, request_name_of};
pub use serializer::{deserialize, deserialize_node, serialize, serialize_value};
pub use shape::{RecordReader, SoapDeserialize, SoapField, SoapSerialize, SoapShape};
pub use value::SoapValue;

pub const XMLNS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XMLNS_XSD: &str = "http://www.w3.org/2001/XMLSchema";
pub const XMLNS_SOAP_ENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const XMLNS_SOAP_ENC: &str = "http://schemas.xmlsoap.org/soap/encoding/";
/// Apache SOAP namespace of the `Map` object encoding.
pub const XMLNS_APACHE: &str = "http://xml.apache.org/xml-soap";

/// Re-exported so callers can implement [`SoapRequest::parse_response`].
pub use xmltree::Element;
