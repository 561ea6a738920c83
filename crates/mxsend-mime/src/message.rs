//! Single-part HTML message assembly.

use std::fmt;

use chrono::{DateTime, FixedOffset, Local};

use crate::content_type::ContentType;
use crate::encoding::{encode_base64_lines, encode_word};
use crate::header::Headers;

/// Default `X-Priority` value (normal).
pub const DEFAULT_PRIORITY: u8 = 3;

/// Content transfer encoding of the message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferEncoding {
    /// Base64 encoding, wrapped at 76 columns.
    #[default]
    Base64,
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => write!(f, "base64"),
        }
    }
}

/// An HTML message addressed to a single recipient.
///
/// Renders to the exact bytes sent after the server accepts `DATA`,
/// minus the SMTP end-of-data marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlMessage {
    /// Sender display name.
    pub sender_name: String,
    /// Sender address.
    pub sender: String,
    /// Recipient address.
    pub recipient: String,
    /// Subject line (unencoded).
    pub subject: String,
    /// HTML body (unencoded).
    pub html: String,
    /// `X-Mailer` header value.
    pub mailer: String,
    /// `X-Priority` header value.
    pub priority: u8,
}

impl HtmlMessage {
    /// Creates a new message with the default priority.
    #[must_use]
    pub fn new(
        sender_name: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        html: impl Into<String>,
        mailer: impl Into<String>,
    ) -> Self {
        Self {
            sender_name: sender_name.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            subject: subject.into(),
            html: html.into(),
            mailer: mailer.into(),
            priority: DEFAULT_PRIORITY,
        }
    }

    /// Builds the header block for a message dated `date`.
    #[must_use]
    pub fn headers(&self, date: &DateTime<FixedOffset>) -> Headers {
        let mut headers = Headers::new();
        headers.add(
            "From",
            format!("{} <{}>", encode_word(&self.sender_name), self.sender),
        );
        headers.add("To", self.recipient.clone());
        headers.add("Subject", encode_word(&self.subject));
        headers.add("Date", date.to_rfc2822());
        headers.add("MIME-Version", "1.0");
        headers.add("Content-Type", ContentType::text_html().to_string());
        headers.add(
            "Content-Transfer-Encoding",
            TransferEncoding::Base64.to_string(),
        );
        headers.add("X-Priority", self.priority.to_string());
        headers.add("X-Mailer", self.mailer.clone());
        headers
    }

    /// Renders headers, blank separator line and encoded body, each line
    /// terminated by CRLF.
    #[must_use]
    pub fn render(&self, date: &DateTime<FixedOffset>) -> String {
        let mut out = self.headers(date).to_string();
        out.push_str("\r\n");
        let body = encode_base64_lines(self.html.as_bytes());
        if !body.is_empty() {
            out.push_str(&body);
            out.push_str("\r\n");
        }
        out
    }

    /// Renders the message dated with the current local time.
    #[must_use]
    pub fn render_now(&self) -> String {
        self.render(&Local::now().fixed_offset())
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

    fn sample() -> HtmlMessage {
        HtmlMessage::new(
            "Zoë",
            "zoe@sender.example",
            "bob@rcpt.example",
            "Grüße",
            "<p>Hello</p>",
            "mxsend/test",
        )
    }

    fn fixed_date() -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc2822("Tue, 1 Jul 2025 10:52:37 +0200").unwrap()
    }

    #[test]
    fn test_header_order() {
        let headers = sample().headers(&fixed_date());
        let names: Vec<&str> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(
            names,
            vec![
                "From",
                "To",
                "Subject",
                "Date",
                "MIME-Version",
                "Content-Type",
                "Content-Transfer-Encoding",
                "X-Priority",
                "X-Mailer",
            ]
        );
    }

    #[test]
    fn test_header_values() {
        let headers = sample().headers(&fixed_date());
        assert_eq!(
            headers.get("From"),
            Some("=?utf-8?B?Wm/Dqw==?= <zoe@sender.example>")
        );
        assert_eq!(headers.get("To"), Some("bob@rcpt.example"));
        assert_eq!(headers.get("Subject"), Some("=?utf-8?B?R3LDvMOfZQ==?="));
        assert_eq!(
            headers.get("Date"),
            Some(fixed_date().to_rfc2822().as_str())
        );
        assert!(headers.get("Date").unwrap().ends_with("Jul 2025 10:52:37 +0200"));
        assert_eq!(headers.get("Content-Type"), Some("text/html; charset=utf-8"));
        assert_eq!(headers.get("Content-Transfer-Encoding"), Some("base64"));
        assert_eq!(headers.get("X-Priority"), Some("3"));
        assert_eq!(headers.get("X-Mailer"), Some("mxsend/test"));
    }

    #[test]
    fn test_render_layout() {
        let rendered = sample().render(&fixed_date());
        let (head, body) = rendered.split_once("\r\n\r\n").unwrap();

        assert!(head.starts_with("From: "));
        assert!(head.ends_with("X-Mailer: mxsend/test"));
        assert_eq!(body, "PHA+SGVsbG88L3A+\r\n");
    }

    #[test]
    fn test_render_empty_body() {
        let mut message = sample();
        message.html = String::new();
        let rendered = message.render(&fixed_date());
        assert!(rendered.ends_with("X-Mailer: mxsend/test\r\n\r\n"));
    }

    #[test]
    fn test_render_now_has_date() {
        let rendered = sample().render_now();
        assert!(rendered.contains("\r\nDate: "));
    }
}
