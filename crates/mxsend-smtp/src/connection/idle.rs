//! Inactivity timer around a byte stream.

use std::fmt;
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep, sleep};

/// Stream wrapper that fails an operation once the stream has made no
/// progress for the configured duration.
///
/// Every completed read, write, flush or shutdown pushes the deadline out
/// again, so a slow peer that keeps moving bytes never times out.
pub struct IdleTimeout<S> {
    inner: S,
    limit: Duration,
    deadline: Pin<Box<Sleep>>,
}

impl<S> IdleTimeout<S> {
    /// Wraps a stream. The clock starts immediately.
    pub fn new(inner: S, limit: Duration) -> Self {
        Self {
            inner,
            limit,
            deadline: Box::pin(sleep(limit)),
        }
    }

    /// Returns the inactivity limit.
    pub const fn limit(&self) -> Duration {
        self.limit
    }

    /// Unwraps the stream.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn touch(&mut self) {
        let next = Instant::now() + self.limit;
        self.deadline.as_mut().reset(next);
    }

    fn poll_elapsed(&mut self, cx: &mut Context<'_>) -> Poll<io::Error> {
        self.deadline
            .as_mut()
            .poll(cx)
            .map(|()| io::Error::new(io::ErrorKind::TimedOut, IdleElapsed(self.limit)))
    }
}

/// Returns true if `err` was raised by an [`IdleTimeout`].
pub fn is_idle_elapsed(err: &io::Error) -> bool {
    err.get_ref().is_some_and(|inner| inner.is::<IdleElapsed>())
}

#[derive(Debug)]
struct IdleElapsed(Duration);

impl fmt::Display for IdleElapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no transport activity for {:?}", self.0)
    }
}

impl std::error::Error for IdleElapsed {}

impl<S: fmt::Debug> fmt::Debug for IdleTimeout<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdleTimeout")
            .field("inner", &self.inner)
            .field("limit", &self.limit)
            .finish_non_exhaustive()
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for IdleTimeout<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_read(cx, buf) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.poll_elapsed(cx).map(Err),
        }
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for IdleTimeout<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_write(cx, buf) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.poll_elapsed(cx).map(Err),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_flush(cx) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.poll_elapsed(cx).map(Err),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_shutdown(cx) {
            Poll::Ready(result) => {
                this.touch();
                Poll::Ready(result)
            }
            Poll::Pending => this.poll_elapsed(cx).map(Err),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt, duplex};

    #[tokio::test(start_paused = true)]
    async fn test_silent_peer_elapses() {
        let (client, _server) = duplex(64);
        let mut stream = IdleTimeout::new(client, Duration::from_secs(10));

        let mut buf = [0u8; 8];
        let err = stream.read(&mut buf).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
        assert!(is_idle_elapsed(&err));
    }

    #[tokio::test(start_paused = true)]
    async fn test_trickling_peer_keeps_stream_alive() {
        let (client, mut server) = duplex(64);
        let mut stream = IdleTimeout::new(client, Duration::from_secs(10));

        let peer = tokio::spawn(async move {
            for chunk in [&b"250-a\r\n"[..], b"250-b\r\n", b"250 c\r\n"] {
                tokio::time::sleep(Duration::from_secs(6)).await;
                server.write_all(chunk).await.unwrap();
            }
            server
        });

        let mut buf = vec![0u8; 21];
        stream.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"250-a\r\n250-b\r\n250 c\r\n");
        drop(peer.await.unwrap());
    }

    #[test]
    fn test_foreign_timeout_not_idle() {
        let err = io::Error::new(io::ErrorKind::TimedOut, "connect timed out");
        assert!(!is_idle_elapsed(&err));
    }
}
