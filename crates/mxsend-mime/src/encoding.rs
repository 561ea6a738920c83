//! Transport-safe encoding utilities.
//!
//! Message bodies travel as Base64 wrapped at the RFC 2045 line limit, and
//! header text that may carry non-ASCII characters travels as RFC 2047
//! encoded words.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Maximum encoded line length for Base64 bodies (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Charset label used for encoded words and the body.
pub const CHARSET: &str = "utf-8";

/// Encodes data as Base64.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-separated lines of at most
/// [`MAX_LINE_LENGTH`] characters.
///
/// The result has no trailing line break. Empty input yields an empty string.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    // Base64 output is pure ASCII, so byte chunks are valid char boundaries.
    for (i, chunk) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        result.push_str(&String::from_utf8_lossy(chunk));
    }

    result
}

/// Encodes header text as a single RFC 2047 Base64 encoded word.
///
/// Format: `=?utf-8?B?encoded-text?=`
///
/// The text is always encoded, even plain ASCII, so display names with
/// quotes, commas or angle brackets can never break header syntax.
#[must_use]
pub fn encode_word(text: &str) -> String {
    format!("=?{CHARSET}?B?{}?=", encode_base64(text.as_bytes()))
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
    use proptest::prelude::*;

    #[test]
    fn test_base64_encode() {
        assert_eq!(encode_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
        assert_eq!(encode_base64(b""), "");
    }

    #[test]
    fn test_base64_lines_short_input_single_line() {
        assert_eq!(encode_base64_lines(b"<p>hi</p>"), "PHA+aGk8L3A+");
    }

    #[test]
    fn test_base64_lines_wraps_at_limit() {
        let data = vec![b'a'; 120];
        let encoded = encode_base64_lines(&data);
        let lines: Vec<&str> = encoded.split("\r\n").collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), MAX_LINE_LENGTH);
        assert_eq!(lines[1].len(), MAX_LINE_LENGTH);
        assert_eq!(lines[2].len(), 8);
        assert!(!encoded.ends_with("\r\n"));
    }

    #[test]
    fn test_base64_lines_empty() {
        assert_eq!(encode_base64_lines(b""), "");
    }

    #[test]
    fn test_encode_word_always_encodes() {
        assert_eq!(encode_word("Hello"), "=?utf-8?B?SGVsbG8=?=");
        assert_eq!(encode_word("Héllo"), "=?utf-8?B?SMOpbGxv?=");
    }

    proptest! {
        #[test]
        fn base64_lines_never_exceed_limit(data in proptest::collection::vec(any::<u8>(), 0..1024)) {
            let encoded = encode_base64_lines(&data);
            for line in encoded.split("\r\n") {
                prop_assert!(line.len() <= MAX_LINE_LENGTH);
                prop_assert!(!line.starts_with('.'));
            }
            prop_assert_eq!(encoded.replace("\r\n", ""), encode_base64(&data));
        }
    }
}
