//! Line tokenizer for the inbound byte stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::trace;

use crate::error::{Error, Result};
use crate::parser::is_continuation_line;

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Splits a byte stream into text lines, one per server response line.
///
/// Lines end at LF; a preceding CR is stripped. Invalid UTF-8 is replaced
/// rather than rejected, since only the leading reply code matters.
#[derive(Debug)]
pub struct LineSource<R> {
    reader: BufReader<R>,
}

impl<R> LineSource<R>
where
    R: AsyncRead + Unpin,
{
    /// Wraps a stream.
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, inner),
        }
    }

    /// Returns a reference to the wrapped stream.
    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    /// Returns a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut R {
        self.reader.get_mut()
    }

    /// Unwraps the stream. Buffered unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }

    /// Reads the next line without its terminator.
    ///
    /// Returns `None` at end of stream. A final line without a terminator is
    /// still returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the line, not counting its
    /// terminator, exceeds [`MAX_LINE_LENGTH`].
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        let mut buf = Vec::new();
        // Longest allowed line plus CRLF plus one overflow byte.
        let limit = u64::try_from(MAX_LINE_LENGTH + 3).unwrap_or(u64::MAX);
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await?;

        if read == 0 {
            return Ok(None);
        }

        if buf.last() == Some(&b'\n') {
            buf.pop();
            if buf.last() == Some(&b'\r') {
                buf.pop();
            }
        }

        if buf.len() > MAX_LINE_LENGTH {
            return Err(Error::Protocol(format!(
                "reply line exceeds {MAX_LINE_LENGTH} bytes"
            )));
        }

        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    /// Reads the final line of the next reply.
    ///
    /// Continuation lines (`250-...`) are consumed and skipped, so a
    /// multi-line reply surfaces as its last line only. A blank line is not
    /// a continuation and is returned as an empty reply.
    ///
    /// # Errors
    ///
    /// Returns an error if reading a line fails.
    pub async fn next_reply(&mut self) -> Result<Option<String>> {
        loop {
            let Some(line) = self.next_line().await? else {
                return Ok(None);
            };

            if is_continuation_line(&line) {
                trace!(line = %line, "reply continues");
                continue;
            }

            return Ok(Some(line));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_next_line_strips_terminators() {
        let mut lines = LineSource::new(&b"220 ready\r\n250 OK\n354 go\r\n"[..]);
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("220 ready"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("250 OK"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("354 go"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_line_unterminated_tail() {
        let mut lines = LineSource::new(&b"221 bye"[..]);
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("221 bye"));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_line_too_long() {
        let data = vec![b'2'; MAX_LINE_LENGTH + 10];
        let mut lines = LineSource::new(&data[..]);
        assert!(matches!(
            lines.next_line().await,
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn test_next_line_at_limit_accepted() {
        let mut data = vec![b'2'; MAX_LINE_LENGTH];
        data.extend_from_slice(b"\n");
        let mut lines = LineSource::new(&data[..]);
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_LENGTH);
    }

    #[tokio::test]
    async fn test_next_reply_folds_continuations() {
        let data = b"220-mx.example.com ESMTP\r\n220-no UCE\r\n220 ready\r\n250 OK\r\n";
        let mut lines = LineSource::new(&data[..]);
        assert_eq!(lines.next_reply().await.unwrap().as_deref(), Some("220 ready"));
        assert_eq!(lines.next_reply().await.unwrap().as_deref(), Some("250 OK"));
        assert_eq!(lines.next_reply().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_line_crlf_at_limit_accepted() {
        let mut data = vec![b'2'; MAX_LINE_LENGTH];
        data.extend_from_slice(b"\r\n250 OK\r\n");
        let mut lines = LineSource::new(&data[..]);
        let line = lines.next_line().await.unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_LENGTH);
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("250 OK"));
    }

    #[tokio::test]
    async fn test_next_line_over_limit_terminated_rejected() {
        let mut data = vec![b'2'; MAX_LINE_LENGTH + 1];
        data.extend_from_slice(b"\r\n");
        let mut lines = LineSource::new(&data[..]);
        assert!(matches!(lines.next_line().await, Err(Error::Protocol(_))));

        let mut data = vec![b'2'; MAX_LINE_LENGTH + 1];
        data.extend_from_slice(b"\n");
        let mut lines = LineSource::new(&data[..]);
        assert!(matches!(lines.next_line().await, Err(Error::Protocol(_))));
    }

    #[tokio::test]
    async fn test_next_reply_returns_blank_line() {
        let mut lines = LineSource::new(&b"220 ready\r\n\r\n250 OK\r\n"[..]);
        assert_eq!(lines.next_reply().await.unwrap().as_deref(), Some("220 ready"));
        assert_eq!(lines.next_reply().await.unwrap().as_deref(), Some(""));
        assert_eq!(lines.next_reply().await.unwrap().as_deref(), Some("250 OK"));
    }

    #[tokio::test]
    async fn test_reply_split_across_reads() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"250-SIZE 10240000\r\n25")
            .read(b"0 OK\r\n")
            .build();
        let mut lines = LineSource::new(mock);
        assert_eq!(lines.next_reply().await.unwrap().as_deref(), Some("250 OK"));
    }

    #[tokio::test]
    async fn test_next_reply_eof_inside_reply() {
        let mut lines = LineSource::new(&b"250-PIPELINING\r\n"[..]);
        assert_eq!(lines.next_reply().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_replaced() {
        let mut lines = LineSource::new(&b"250 caf\xe9\r\n"[..]);
        let line = lines.next_line().await.unwrap().unwrap();
        assert!(line.starts_with("250 caf"));
    }
}
