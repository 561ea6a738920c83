//! Outgoing protocol data.
//!
// Allow missing_const_for_fn since Vec methods aren't const in stable Rust.
#![allow(clippy::missing_const_for_fn)]
//!
//! Stages produce these values; the session loop writes them to the
//! transport.

use crate::command::Command;

/// Data to transmit to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transmit {
    /// Raw bytes to send to the server.
    pub data: Vec<u8>,
}

impl Transmit {
    /// Creates a new transmit from bytes.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Creates the DATA-phase payload for a rendered message.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// dot-stuffed, and the terminating `.` line is appended.
    #[must_use]
    pub fn message(rendered: &str) -> Self {
        let mut data = Vec::with_capacity(rendered.len() + 8);
        let body = rendered.strip_suffix('\n').unwrap_or(rendered);

        if !body.is_empty() {
            for line in body.split('\n') {
                let line = line.strip_suffix('\r').unwrap_or(line);
                if line.starts_with('.') {
                    data.push(b'.');
                }
                data.extend_from_slice(line.as_bytes());
                data.extend_from_slice(b"\r\n");
            }
        }

        data.extend_from_slice(b".\r\n");
        Self { data }
    }

    /// Returns the data as a string slice, if valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }
}

impl From<Command> for Transmit {
    fn from(cmd: Command) -> Self {
        Self::new(cmd.serialize())
    }
}

impl AsRef<[u8]> for Transmit {
    fn as_ref(&self) -> &[u8] {
        &self.data
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
    fn test_transmit_from_command() {
        let t: Transmit = Command::Data.into();
        assert_eq!(t.as_str(), Some("DATA\r\n"));
        assert_eq!(t.as_ref(), b"DATA\r\n");
    }

    #[test]
    fn test_message_appends_terminator() {
        let t = Transmit::message("Subject: hi\r\n\r\nYm9keQ==\r\n");
        assert_eq!(t.as_str(), Some("Subject: hi\r\n\r\nYm9keQ==\r\n.\r\n"));
    }

    #[test]
    fn test_message_normalizes_bare_lf() {
        let t = Transmit::message("A: b\n\nbody\n");
        assert_eq!(t.as_str(), Some("A: b\r\n\r\nbody\r\n.\r\n"));
    }

    #[test]
    fn test_message_dot_stuffing() {
        let t = Transmit::message("A: b\r\n\r\n.hidden\r\n..\r\n");
        assert_eq!(t.as_str(), Some("A: b\r\n\r\n..hidden\r\n...\r\n.\r\n"));
    }

    #[test]
    fn test_message_unterminated_last_line() {
        let t = Transmit::message("A: b\r\n\r\nbody");
        assert_eq!(t.as_str(), Some("A: b\r\n\r\nbody\r\n.\r\n"));
    }

    #[test]
    fn test_message_empty() {
        assert_eq!(Transmit::message("").as_str(), Some(".\r\n"));
    }

    #[test]
    fn test_transmit_as_ref() {
        let t = Transmit::new(vec![1, 2, 3]);
        let slice: &[u8] = t.as_ref();
        assert_eq!(slice, &[1, 2, 3]);
    }
}
