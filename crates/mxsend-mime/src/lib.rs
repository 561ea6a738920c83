//! # mxsend-mime
//!
//! Transport-safe encoding and message assembly for direct SMTP delivery.
//!
//! ## Features
//!
//! - **Encoding**: Base64 bodies wrapped at 76 columns, RFC 2047 encoded words
//! - **Headers**: Ordered header blocks rendered with CRLF line endings
//! - **Messages**: Single-part `text/html` messages ready for the DATA phase
//!
//! ## Quick Start
//!
//! ```ignore
//! use mxsend_mime::HtmlMessage;
//!
//! let message = HtmlMessage::new(
//!     "Alice",
//!     "alice@example.com",
//!     "bob@example.org",
//!     "Quarterly numbers",
//!     "<p>See below.</p>",
//!     "mxsend",
//! );
//!
//! let payload = message.render_now();
//! assert!(payload.contains("Content-Transfer-Encoding: base64\r\n"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use header::Headers;
pub use message::{DEFAULT_PRIORITY, HtmlMessage, TransferEncoding};
