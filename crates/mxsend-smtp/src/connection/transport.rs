//! Byte transport to the mail exchange.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use super::idle::{IdleTimeout, is_idle_elapsed};
use super::lines::LineSource;
use crate::error::{Error, Result};

/// Bidirectional stream that fails once it has been idle too long.
///
/// The idle timer restarts whenever bytes move in either direction, so a
/// slow but live peer is never cut off mid-reply or mid-body.
///
/// Generic over the stream so sessions can run over TCP in production and
/// over in-memory pipes in tests.
#[derive(Debug)]
pub struct Transport<S> {
    lines: LineSource<IdleTimeout<S>>,
}

impl<S> Transport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S, idle_timeout: Duration) -> Self {
        Self {
            lines: LineSource::new(IdleTimeout::new(stream, idle_timeout)),
        }
    }

    /// Returns the idle timeout.
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.lines.get_ref().limit()
    }

    /// Reads the final line of the next server reply.
    ///
    /// Returns `None` if the server closed the stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the server goes quiet for the idle
    /// timeout, or an I/O error.
    pub async fn read_reply(&mut self) -> Result<Option<String>> {
        let idle = self.idle_timeout();
        self.lines
            .next_reply()
            .await
            .map_err(|err| timed_out(err, idle))
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the peer stops draining data for the
    /// idle timeout, or an I/O error.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let idle = self.idle_timeout();
        let stream = self.lines.get_mut();
        let written = async {
            stream.write_all(data).await?;
            stream.flush().await
        };
        written.await.map_err(|err| timed_out(err.into(), idle))?;
        trace!(bytes = data.len(), "wrote to transport");
        Ok(())
    }

    /// Gracefully closes the write half and releases the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown fails or stalls.
    pub async fn end(mut self) -> Result<()> {
        let idle = self.idle_timeout();
        self.lines
            .get_mut()
            .shutdown()
            .await
            .map_err(|err| timed_out(err.into(), idle))?;
        debug!("transport ended");
        Ok(())
    }

    /// Closes the stream immediately without a graceful shutdown.
    pub fn destroy(self) {
        drop(self.lines.into_inner().into_inner());
        debug!("transport destroyed");
    }
}

/// Opens a TCP transport to `host:port`.
///
/// # Errors
///
/// Returns [`Error::Timeout`] if the connection is not established within
/// `connect_timeout`, or an I/O error.
pub async fn connect(
    host: &str,
    port: u16,
    connect_timeout: Duration,
    idle_timeout: Duration,
) -> Result<Transport<TcpStream>> {
    debug!(host, port, "connecting");
    let stream = tokio::time::timeout(connect_timeout, TcpStream::connect((host, port)))
        .await
        .map_err(|_| Error::Timeout(connect_timeout))??;
    Ok(Transport::new(stream, idle_timeout))
}

fn timed_out(err: Error, idle: Duration) -> Error {
    match err {
        Error::Io(io) if is_idle_elapsed(&io) => Error::Timeout(idle),
        other => other,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, duplex};

    #[tokio::test]
    async fn test_write_and_read() {
        let (client, mut server) = duplex(1024);
        let mut transport = Transport::new(client, Duration::from_secs(5));

        server.write_all(b"220 ready\r\n").await.unwrap();
        assert_eq!(transport.read_reply().await.unwrap().as_deref(), Some("220 ready"));

        transport.write_all(b"QUIT\r\n").await.unwrap();
        let mut buf = [0u8; 6];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"QUIT\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_times_out() {
        let (client, _server) = duplex(1024);
        let mut transport = Transport::new(client, Duration::from_secs(10));

        let err = transport.read_reply().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_stalls_times_out() {
        let (client, _server) = duplex(16);
        let mut transport = Transport::new(client, Duration::from_secs(10));

        let err = transport.write_all(&[b'x'; 64]).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_reader_does_not_time_out() {
        let (client, mut server) = duplex(1024);
        let mut transport = Transport::new(client, Duration::from_secs(10));

        // Drains 1 KiB every 2 s, so 20 KiB takes 40 s in total.
        let reader = tokio::spawn(async move {
            let mut received = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                tokio::time::sleep(Duration::from_secs(2)).await;
                let n = server.read(&mut chunk).await.unwrap();
                if n == 0 {
                    return received;
                }
                received.extend_from_slice(&chunk[..n]);
            }
        });

        let body = vec![b'a'; 20 * 1024];
        transport.write_all(&body).await.unwrap();
        transport.end().await.unwrap();

        assert_eq!(reader.await.unwrap(), body);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trickled_reply_does_not_time_out() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"250-mx.example.com\r\n")
            .wait(Duration::from_secs(6))
            .read(b"250-SIZE 10240000\r\n")
            .wait(Duration::from_secs(6))
            .read(b"250 OK\r\n")
            .build();
        let mut transport = Transport::new(mock, Duration::from_secs(10));

        assert_eq!(transport.read_reply().await.unwrap().as_deref(), Some("250 OK"));
    }

    #[tokio::test]
    async fn test_read_after_peer_close() {
        let (client, server) = duplex(1024);
        drop(server);
        let mut transport = Transport::new(client, Duration::from_secs(5));
        assert_eq!(transport.read_reply().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_end_signals_eof_to_peer() {
        let (client, mut server) = duplex(1024);
        let transport = Transport::new(client, Duration::from_secs(5));
        transport.end().await.unwrap();

        let mut buf = Vec::new();
        assert_eq!(server.read_to_end(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_destroy_closes_stream() {
        let (client, mut server) = duplex(1024);
        let transport = Transport::new(client, Duration::from_secs(5));
        transport.destroy();

        let mut buf = Vec::new();
        assert_eq!(server.read_to_end(&mut buf).await.unwrap(), 0);
    }
}
