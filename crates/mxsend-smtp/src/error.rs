//! Error types for SMTP operations.

use std::io;
use std::time::Duration;

use crate::driver::Misuse;
use crate::types::ReplyCode;

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on the transport.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No mail-exchange host is published for the domain.
    #[error("No mail exchange found for domain: {0}")]
    NoMailExchange(String),

    /// The DNS lookup itself failed.
    #[error("DNS lookup failed: {0}")]
    Dns(#[from] hickory_resolver::ResolveError),

    /// Server answered with a code other than the one the current stage expects.
    #[error("Unexpected reply (expected {expected}): {line}")]
    UnexpectedReply {
        /// Code the stage was waiting for.
        expected: ReplyCode,
        /// Raw reply line from the server.
        line: String,
    },

    /// Server rejected the message body with 550 after DATA.
    #[error("Mail is intercepted: {0}")]
    Intercepted(String),

    /// No transport activity within the idle timeout.
    #[error("Timed out after {0:?} without server activity")]
    Timeout(Duration),

    /// Server closed the connection before the exchange completed.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Malformed input from the server.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// A configuration value cannot be put on the wire.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The protocol driver was used against its contract.
    #[error("Driver contract violated: {0}")]
    Driver(#[from] Misuse),
}

impl Error {
    /// Creates an unexpected-reply error for a raw line.
    #[must_use]
    pub fn unexpected(expected: ReplyCode, line: impl Into<String>) -> Self {
        Self::UnexpectedReply {
            expected,
            line: line.into(),
        }
    }

    /// Returns the reply code carried by a server rejection, if any.
    #[must_use]
    pub fn reply_code(&self) -> Option<ReplyCode> {
        match self {
            Self::UnexpectedReply { line, .. } | Self::Intercepted(line) => {
                ReplyCode::from_line(line)
            }
            _ => None,
        }
    }

    /// Returns true if the server rejected the exchange permanently (5xx).
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        self.reply_code().is_some_and(ReplyCode::is_permanent)
    }

    /// Returns true if the server rejected the exchange transiently (4xx).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.reply_code().is_some_and(ReplyCode::is_transient)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_reply_message_carries_line() {
        let err = Error::unexpected(ReplyCode::OK, "500 5.5.1 Unrecognized command");
        let text = err.to_string();
        assert!(text.contains("500 5.5.1 Unrecognized command"));
        assert!(text.contains("250"));
    }

    #[test]
    fn test_intercepted_distinct_text() {
        let err = Error::Intercepted("550 spam detected".into());
        assert_eq!(err.to_string(), "Mail is intercepted: 550 spam detected");
    }

    #[test]
    fn test_classification() {
        let permanent = Error::unexpected(ReplyCode::OK, "550 no such user");
        assert!(permanent.is_permanent());
        assert!(!permanent.is_transient());

        let transient = Error::unexpected(ReplyCode::OK, "451 try later");
        assert!(transient.is_transient());
        assert!(!transient.is_permanent());

        assert!(Error::Intercepted("550 blocked".into()).is_permanent());
        assert!(!Error::ConnectionClosed.is_permanent());
        assert_eq!(Error::Timeout(Duration::from_secs(1)).reply_code(), None);
    }

    #[test]
    fn test_garbage_line_has_no_code() {
        let err = Error::unexpected(ReplyCode::SERVICE_READY, "hello there");
        assert_eq!(err.reply_code(), None);
        assert!(!err.is_permanent());
    }
}
