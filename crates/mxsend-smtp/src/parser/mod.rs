//! SMTP reply line helpers.
//!
//! SMTP replies can be single-line or multi-line:
//! - Single: `250 OK\r\n`
//! - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`

/// Checks if a line continues a multi-line reply.
///
/// Continuation lines carry a three-digit code followed by `-`. Anything
/// else (including a bare code or an unparseable line) ends the reply.
#[must_use]
pub fn is_continuation_line(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() >= 4 && bytes[..3].iter().all(u8::is_ascii_digit) && bytes[3] == b'-'
}

/// Returns the human-readable text of a reply line, without its code.
#[must_use]
pub fn reply_text(line: &str) -> &str {
    let bytes = line.as_bytes();
    if bytes.len() >= 3 && bytes[..3].iter().all(u8::is_ascii_digit) {
        line.get(4..).unwrap_or("")
    } else {
        line
    }
}
