//! # mxsend-smtp
//!
//! Sends HTML mail directly to the recipient domain's mail exchange over
//! plain SMTP.
//!
//! ## Quick Start
//!
//! ```ignore
//! #[tokio::main]
//! async fn main() -> mxsend_smtp::Result<()> {
//!     mxsend_smtp::send_mail(
//!         "Newsletter",
//!         "news@example.com",
//!         "reader@example.org",
//!         "This week",
//!         "<h1>Hello</h1>",
//!     )
//!     .await
//! }
//! ```
//!
//! ## Handshake
//!
//! One send is a fixed sequence of stages, each waiting for one reply code:
//!
//! ```text
//! 220 → HELO → 250 → MAIL FROM → 250 → RCPT TO → 250 → DATA
//!     → 354 → message → 250 → QUIT → 221
//! ```
//!
//! Any other code ends the send with the server's raw reply line. The
//! stages run on a [`driver::Driver`], which hands each reply line to
//! exactly one step, in order, and never more than one at a time.
//!
//! ## Modules
//!
//! - [`command`]: SMTP command serialization
//! - [`connection`]: Transport, line tokenizing and configuration
//! - [`driver`]: Sequential step driver
//! - [`parser`]: Reply line helpers
//! - [`resolver`]: Mail-exchange lookup
//! - [`session`]: Handshake stages and the session loop
//! - [`types`]: Addresses and reply codes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
pub mod driver;
mod error;
mod mailer;
pub mod parser;
pub mod resolver;
pub mod session;
pub mod types;

pub use connection::{Config, ConfigBuilder};
pub use error::{Error, Result};
pub use mailer::{Mailer, send_mail};
pub use resolver::{DnsResolver, Resolve, StaticResolver};
pub use session::{Envelope, Session};
pub use types::{Address, ReplyCode};
