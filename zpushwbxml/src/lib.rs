//! # zpushwbxml
//!
//! WAP Binary XML (WBXML 1.3) codec with the ActiveSync code pages.
//!
//! ## Features
//!
//! - **Code spaces**: immutable token tables per code page, shared across threads
//! - **Encoder**: element tree to bytes, with minimal page switching
//! - **Decoder**: bytes to element tree; inline strings, string table,
//!   entities and opaque data are read as text
//! - **Fail closed**: unknown tokens, extensions and trailing bytes are errors
//!
//! ## Example
//!
//! ```
//! use zpushwbxml::{activesync, Element, WbxmlDocument};
//!
//! let request = Element::new("Settings").child(
//!     Element::new("Oof").child(Element::new("Get").child(Element::with_text("BodyType", "TEXT"))),
//! );
//! let bytes = WbxmlDocument::new(activesync(), request.clone())
//!     .to_bytes(activesync())
//!     .unwrap();
//! let decoded = WbxmlDocument::from_bytes(activesync(), &bytes).unwrap();
//! assert_eq!(decoded.root, request);
//! ```

pub mod activesync;
pub mod codepage;
mod decoder;
pub mod document;
pub mod element;
mod encoder;
pub mod error;
pub mod mbuint;
pub mod tokens;

pub use activesync::activesync;
pub use codepage::{CodePage, CodeSpace};
pub use document::{Charset, WbxmlDocument};
pub use element::Element;
pub use error::{Result, WbxmlError};
