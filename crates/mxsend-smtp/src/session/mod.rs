//! One mail send over one connection.
//!
//! A [`Session`] owns the envelope and the wire-level settings of a send.
//! [`Session::run`] feeds server replies through a [`Driver`] loaded with
//! the handshake [`Stage`]s and writes whatever they emit back to the
//! transport, until the exchange closes or fails.

mod stage;
mod transmit;

use std::collections::VecDeque;

use mxsend_mime::HtmlMessage;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

pub use stage::{Stage, Transition};
pub use transmit::Transmit;

use crate::connection::{Config, Transport};
use crate::driver::Driver;
use crate::error::{Error, Result};
use crate::types::Address;

/// The parties and content of one mail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Display name of the sender.
    pub sender_name: String,
    /// Sender mailbox, used for `MAIL FROM` and the `From` header.
    pub sender: Address,
    /// Recipient mailbox, used for `RCPT TO` and the `To` header.
    pub recipient: Address,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html_body: String,
}

impl Envelope {
    /// Creates an envelope, validating both addresses.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] if either address is malformed.
    pub fn new(
        sender_name: impl Into<String>,
        sender: impl Into<String>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        html_body: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            sender_name: sender_name.into(),
            sender: Address::new(sender)?,
            recipient: Address::new(recipient)?,
            subject: subject.into(),
            html_body: html_body.into(),
        })
    }

    /// Returns the domain whose mail exchange receives this mail.
    #[must_use]
    pub fn recipient_domain(&self) -> &str {
        self.recipient.domain()
    }
}

/// A single send: envelope plus the settings that shape the wire exchange.
#[derive(Debug, Clone)]
pub struct Session {
    envelope: Envelope,
    helo_domain: String,
    mailer: String,
}

impl Session {
    /// Creates a session. HELO announces the configured domain, or the
    /// sender's domain if none is set.
    #[must_use]
    pub fn new(envelope: Envelope, config: &Config) -> Self {
        let helo_domain = config
            .helo_domain
            .clone()
            .unwrap_or_else(|| envelope.sender.domain().to_string());
        Self {
            envelope,
            helo_domain,
            mailer: config.mailer.clone(),
        }
    }

    /// Returns the envelope.
    #[must_use]
    pub const fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Returns the domain announced in HELO.
    #[must_use]
    pub fn helo_domain(&self) -> &str {
        &self.helo_domain
    }

    /// Builds the message sent after DATA.
    #[must_use]
    pub fn message(&self) -> HtmlMessage {
        let envelope = &self.envelope;
        HtmlMessage::new(
            envelope.sender_name.as_str(),
            envelope.sender.as_str(),
            envelope.recipient.as_str(),
            envelope.subject.as_str(),
            envelope.html_body.as_str(),
            self.mailer.as_str(),
        )
    }

    /// Creates a driver loaded with every handshake stage, in order.
    #[must_use]
    pub fn driver() -> Driver<Exchange, Error> {
        let mut driver = Driver::new();
        for stage in Stage::SEQUENCE {
            driver.enqueue(stage);
        }
        driver
    }

    /// Runs the handshake over a connected transport.
    ///
    /// On a rejected reply the transport is closed gracefully; on a
    /// transport error, timeout or premature end of stream it is dropped.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the exchange.
    pub async fn run<S>(self, transport: Transport<S>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let recipient = self.envelope.recipient.clone();
        let result = exchange(self, transport).await;
        match &result {
            Ok(()) => info!(%recipient, "mail delivered"),
            Err(err) => warn!(%recipient, error = %err, "mail not delivered"),
        }
        result
    }
}

async fn exchange<S>(session: Session, mut transport: Transport<S>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (failed_tx, mut failed_rx) = oneshot::channel();
    let mut driver = Session::driver();
    driver.on_failure(move |cause| {
        let _ = failed_tx.send(cause);
    });
    let mut exchange = Exchange::new(session);

    loop {
        let line = match transport.read_reply().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                driver.terminate();
                transport.destroy();
                return Err(Error::ConnectionClosed);
            }
            Err(err) => {
                driver.terminate();
                transport.destroy();
                return Err(err);
            }
        };
        debug!(line = %line, "received reply");

        if let Err(misuse) = driver.deliver(&line, &mut exchange) {
            transport.destroy();
            return Err(misuse.into());
        }

        if let Ok(cause) = failed_rx.try_recv() {
            if let Err(err) = transport.end().await {
                debug!(error = %err, "close after rejection failed");
            }
            return Err(cause);
        }

        while let Some(transmit) = exchange.poll_transmit() {
            if let Err(err) = transport.write_all(transmit.as_ref()).await {
                driver.terminate();
                transport.destroy();
                return Err(err);
            }
        }

        if exchange.is_closed() {
            return transport.end().await;
        }
    }
}

/// Per-send state the handshake stages run against.
///
/// Stages read the session and queue outbound data here; the session loop
/// drains it onto the transport.
#[derive(Debug)]
pub struct Exchange {
    session: Session,
    outbound: VecDeque<Transmit>,
    closed: bool,
}

impl Exchange {
    /// Creates an exchange with nothing queued.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self {
            session,
            outbound: VecDeque::new(),
            closed: false,
        }
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Queues data for the transport.
    pub fn queue(&mut self, transmit: Transmit) {
        self.outbound.push_back(transmit);
    }

    /// Marks the exchange complete.
    pub const fn close(&mut self) {
        self.closed = true;
    }

    /// Takes the next queued transmit.
    pub fn poll_transmit(&mut self) -> Option<Transmit> {
        self.outbound.pop_front()
    }

    /// Returns true once the final stage has accepted its reply.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::types::ReplyCode;
    use std::time::Duration;

    fn envelope() -> Envelope {
        Envelope::new(
            "Zoë",
            "zoe@news.example",
            "reader@inbox.example",
            "Grüße",
            "<p>Hello</p>",
        )
        .unwrap()
    }

    #[test]
    fn test_envelope_rejects_bad_addresses() {
        let err = Envelope::new("A", "not-an-address", "b@example.com", "s", "b").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));

        let err = Envelope::new("A", "a@example.com", "b@@example.com", "s", "b").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(_)));
    }

    #[test]
    fn test_recipient_domain() {
        assert_eq!(envelope().recipient_domain(), "inbox.example");
    }

    #[test]
    fn test_helo_defaults_to_sender_domain() {
        let session = Session::new(envelope(), &Config::new());
        assert_eq!(session.helo_domain(), "news.example");
    }

    #[test]
    fn test_helo_override() {
        let config = Config::builder().helo_domain("relay.example.net").build().unwrap();
        let session = Session::new(envelope(), &config);
        assert_eq!(session.helo_domain(), "relay.example.net");
    }

    #[test]
    fn test_message_uses_envelope_and_mailer() {
        let config = Config::builder().mailer("Bulletin").build().unwrap();
        let message = Session::new(envelope(), &config).message();
        assert_eq!(message.sender, "zoe@news.example");
        assert_eq!(message.recipient, "reader@inbox.example");
        assert_eq!(message.subject, "Grüße");
        assert_eq!(message.mailer, "Bulletin");
    }

    #[test]
    fn test_driver_holds_every_stage() {
        let driver = Session::driver();
        assert_eq!(driver.remaining(), Stage::SEQUENCE.len());
        assert!(!driver.is_terminated());
    }

    #[tokio::test]
    async fn test_run_stops_at_rejected_sender() {
        use tokio_test::io::Builder;

        let mock = Builder::new()
            .read(b"220 mx ready\r\n")
            .write(b"HELO news.example\r\n")
            .read(b"250 hi\r\n")
            .write(b"MAIL FROM:<zoe@news.example>\r\n")
            .read(b"553 5.7.1 sender rejected\r\n")
            .build();

        let session = Session::new(envelope(), &Config::new());
        let err = session
            .run(Transport::new(mock, Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert_eq!(err.reply_code(), Some(ReplyCode::new(553)));
    }

    #[test]
    fn test_exchange_queue_is_fifo() {
        let mut exchange = Exchange::new(Session::new(envelope(), &Config::new()));
        exchange.queue(Transmit::new(b"one".to_vec()));
        exchange.queue(Transmit::new(b"two".to_vec()));
        assert_eq!(exchange.poll_transmit().unwrap().as_str(), Some("one"));
        assert_eq!(exchange.poll_transmit().unwrap().as_str(), Some("two"));
        assert!(exchange.poll_transmit().is_none());

        exchange.close();
        assert!(exchange.is_closed());
    }
}
