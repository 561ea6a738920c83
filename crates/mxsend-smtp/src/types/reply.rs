//! SMTP reply codes.

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Extracts the reply code from a raw response line.
    ///
    /// The code is the number formed by the line's leading ASCII digits, so
    /// `"250 OK"`, `"250-SIZE"` and `"250"` all yield 250. Returns `None` when
    /// the line does not start with a digit or the number does not fit.
    #[must_use]
    pub fn from_line(line: &str) -> Option<Self> {
        let digits = line
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits == 0 {
            return None;
        }
        line[..digits].parse().ok().map(Self)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true if this is a transient error (4xx).
    #[must_use]
    pub const fn is_transient(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }

    /// Returns true if this is a permanent error (5xx).
    #[must_use]
    pub const fn is_permanent(self) -> bool {
        self.0 >= 500 && self.0 < 600
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Codes the handshake waits for or singles out
impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);
    /// 421 Service not available, closing transmission channel
    pub const SERVICE_UNAVAILABLE: Self = Self(421);
    /// 451 Local error in processing
    pub const LOCAL_ERROR: Self = Self(451);
    /// 500 Syntax error, command unrecognized
    pub const SYNTAX_ERROR: Self = Self(500);
    /// 503 Bad sequence of commands
    pub const BAD_SEQUENCE: Self = Self(503);
    /// 550 Mailbox unavailable or message refused
    pub const MAILBOX_UNAVAILABLE: Self = Self(550);
    /// 554 Transaction failed
    pub const TRANSACTION_FAILED: Self = Self(554);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    mod from_line_tests {
        use super::*;

        #[test]
        fn single_line() {
            assert_eq!(ReplyCode::from_line("250 OK"), Some(ReplyCode::OK));
        }

        #[test]
        fn continuation_line() {
            assert_eq!(
                ReplyCode::from_line("220-mx.example.com ESMTP"),
                Some(ReplyCode::SERVICE_READY)
            );
        }

        #[test]
        fn bare_code() {
            assert_eq!(ReplyCode::from_line("221"), Some(ReplyCode::CLOSING));
        }

        #[test]
        fn no_digits() {
            assert_eq!(ReplyCode::from_line("OK 250"), None);
            assert_eq!(ReplyCode::from_line(""), None);
            assert_eq!(ReplyCode::from_line(" 250 OK"), None);
        }

        #[test]
        fn overflow() {
            assert_eq!(ReplyCode::from_line("9999999 nope"), None);
        }
    }

    mod reply_code_tests {
        use super::*;

        #[test]
        fn success_codes() {
            assert!(ReplyCode::OK.is_success());
            assert!(ReplyCode::SERVICE_READY.is_success());
            assert!(ReplyCode::CLOSING.is_success());
        }

        #[test]
        fn start_data_is_neither_success_nor_error() {
            assert!(!ReplyCode::START_DATA.is_success());
            assert!(!ReplyCode::START_DATA.is_transient());
            assert!(!ReplyCode::START_DATA.is_permanent());
        }

        #[test]
        fn transient_errors() {
            assert!(ReplyCode::SERVICE_UNAVAILABLE.is_transient());
            assert!(ReplyCode::LOCAL_ERROR.is_transient());
        }

        #[test]
        fn permanent_errors() {
            assert!(ReplyCode::MAILBOX_UNAVAILABLE.is_permanent());
            assert!(ReplyCode::SYNTAX_ERROR.is_permanent());
            assert!(ReplyCode::BAD_SEQUENCE.is_permanent());
            assert!(ReplyCode::TRANSACTION_FAILED.is_permanent());
        }

        #[test]
        fn display() {
            assert_eq!(format!("{}", ReplyCode::OK), "250");
            assert_eq!(format!("{}", ReplyCode::new(354)), "354");
        }

        #[test]
        fn ordering() {
            assert!(ReplyCode::OK < ReplyCode::START_DATA);
            assert!(ReplyCode::START_DATA < ReplyCode::MAILBOX_UNAVAILABLE);
        }
    }
}
