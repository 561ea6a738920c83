//! Handshake stages.
//!
//! One send walks a fixed, closed sequence of stages. Each stage waits for
//! one reply code; on a match it emits the next command, otherwise the send
//! fails with the raw reply line.
//!
//! ```text
//! Greeting ─220→ HELO
//! HeloAck  ─250→ MAIL FROM
//! MailAck  ─250→ RCPT TO
//! RcptAck  ─250→ DATA
//! DataReady─354→ message + "."
//! MessageAck─250→ QUIT      (550 ⇒ intercepted)
//! QuitAck  ─221→ close
//! ```

use tracing::debug;

use super::{Exchange, Session, Transmit};
use crate::command::Command;
use crate::driver::{Step, StepOutcome};
use crate::error::{Error, Result};
use crate::parser::reply_text;
use crate::types::ReplyCode;

/// A state of the SMTP handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Waiting for the server greeting.
    Greeting,
    /// HELO sent.
    HeloAck,
    /// MAIL FROM sent.
    MailAck,
    /// RCPT TO sent.
    RcptAck,
    /// DATA sent.
    DataReady,
    /// Message body sent.
    MessageAck,
    /// QUIT sent.
    QuitAck,
}

/// What a stage does after accepting its reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Send data and move to the next stage.
    Send(Transmit),
    /// The exchange is complete; close the transport.
    Close,
}

impl Stage {
    /// Every stage, in handshake order.
    pub const SEQUENCE: [Self; 7] = [
        Self::Greeting,
        Self::HeloAck,
        Self::MailAck,
        Self::RcptAck,
        Self::DataReady,
        Self::MessageAck,
        Self::QuitAck,
    ];

    /// Returns the reply code this stage waits for.
    #[must_use]
    pub const fn expected(self) -> ReplyCode {
        match self {
            Self::Greeting => ReplyCode::SERVICE_READY,
            Self::HeloAck | Self::MailAck | Self::RcptAck | Self::MessageAck => ReplyCode::OK,
            Self::DataReady => ReplyCode::START_DATA,
            Self::QuitAck => ReplyCode::CLOSING,
        }
    }

    /// Returns the stage that follows this one.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Greeting => Some(Self::HeloAck),
            Self::HeloAck => Some(Self::MailAck),
            Self::MailAck => Some(Self::RcptAck),
            Self::RcptAck => Some(Self::DataReady),
            Self::DataReady => Some(Self::MessageAck),
            Self::MessageAck => Some(Self::QuitAck),
            Self::QuitAck => None,
        }
    }

    /// Validates a reply line and decides what to send next.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Intercepted`] for a 550 after the message body, and
    /// [`Error::UnexpectedReply`] for any other code mismatch.
    pub fn advance(self, line: &str, session: &Session) -> Result<Transition> {
        let code = ReplyCode::from_line(line);

        if self == Self::MessageAck && code == Some(ReplyCode::MAILBOX_UNAVAILABLE) {
            return Err(Error::Intercepted(line.to_string()));
        }
        if code != Some(self.expected()) {
            return Err(Error::unexpected(self.expected(), line));
        }

        let envelope = session.envelope();
        let transition = match self {
            Self::Greeting => Transition::Send(
                Command::Helo {
                    domain: session.helo_domain().to_string(),
                }
                .into(),
            ),
            Self::HeloAck => Transition::Send(
                Command::MailFrom {
                    from: envelope.sender.clone(),
                }
                .into(),
            ),
            Self::MailAck => Transition::Send(
                Command::RcptTo {
                    to: envelope.recipient.clone(),
                }
                .into(),
            ),
            Self::RcptAck => Transition::Send(Command::Data.into()),
            Self::DataReady => {
                Transition::Send(Transmit::message(&session.message().render_now()))
            }
            Self::MessageAck => Transition::Send(Command::Quit.into()),
            Self::QuitAck => Transition::Close,
        };
        Ok(transition)
    }
}

impl Step<Exchange, Error> for Stage {
    fn run(self: Box<Self>, line: &str, exchange: &mut Exchange) -> StepOutcome<Error> {
        let stage = *self;
        match stage.advance(line, exchange.session()) {
            Ok(Transition::Send(transmit)) => {
                debug!(?stage, reply = reply_text(line), next = ?stage.next(), "stage accepted reply");
                exchange.queue(transmit);
                StepOutcome::Proceed
            }
            Ok(Transition::Close) => {
                debug!(?stage, "handshake complete");
                exchange.close();
                StepOutcome::Finished
            }
            Err(err) => {
                debug!(?stage, error = %err, "stage rejected reply");
                StepOutcome::Fail(err)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;
    use crate::connection::Config;
    use crate::session::Envelope;

    fn session() -> Session {
        let envelope = Envelope::new(
            "Alice",
            "alice@sender.example",
            "bob@rcpt.example",
            "Hello",
            "<b>hi</b>",
        )
        .unwrap();
        Session::new(envelope, &Config::new())
    }

    fn sent(transition: Transition) -> String {
        match transition {
            Transition::Send(t) => t.as_str().unwrap().to_string(),
            Transition::Close => panic!("expected a transmit"),
        }
    }

    #[test]
    fn test_sequence_matches_next() {
        for pair in Stage::SEQUENCE.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
        assert_eq!(Stage::QuitAck.next(), None);
    }

    #[test]
    fn test_expected_codes() {
        let codes: Vec<u16> = Stage::SEQUENCE.iter().map(|s| s.expected().as_u16()).collect();
        assert_eq!(codes, vec![220, 250, 250, 250, 354, 250, 221]);
    }

    #[test]
    fn test_greeting_sends_helo_with_sender_domain() {
        let s = session();
        let out = sent(Stage::Greeting.advance("220 mx.rcpt.example ESMTP", &s).unwrap());
        assert_eq!(out, "HELO sender.example\r\n");
    }

    #[test]
    fn test_envelope_commands() {
        let s = session();
        assert_eq!(
            sent(Stage::HeloAck.advance("250 hello", &s).unwrap()),
            "MAIL FROM:<alice@sender.example>\r\n"
        );
        assert_eq!(
            sent(Stage::MailAck.advance("250 2.1.0 Ok", &s).unwrap()),
            "RCPT TO:<bob@rcpt.example>\r\n"
        );
        assert_eq!(sent(Stage::RcptAck.advance("250 2.1.5 Ok", &s).unwrap()), "DATA\r\n");
        assert_eq!(sent(Stage::MessageAck.advance("250 queued", &s).unwrap()), "QUIT\r\n");
    }

    #[test]
    fn test_data_ready_sends_message() {
        let s = session();
        let out = sent(Stage::DataReady.advance("354 End data with <CR><LF>.<CR><LF>", &s).unwrap());

        assert!(out.starts_with("From: =?utf-8?B?QWxpY2U=?= <alice@sender.example>\r\n"));
        assert!(out.contains("\r\nTo: bob@rcpt.example\r\n"));
        assert!(out.contains("\r\nSubject: =?utf-8?B?SGVsbG8=?=\r\n"));
        assert!(out.contains("\r\nX-Mailer: mxsend/"));
        assert!(out.contains("\r\n\r\nPGI+aGk8L2I+\r\n"));
        assert!(out.ends_with("\r\n.\r\n"));
    }

    #[test]
    fn test_quit_ack_closes() {
        let s = session();
        assert_eq!(Stage::QuitAck.advance("221 bye", &s).unwrap(), Transition::Close);
    }

    #[test]
    fn test_mismatch_carries_raw_line() {
        let s = session();
        let err = Stage::RcptAck.advance("500 syntax error", &s).unwrap_err();
        match &err {
            Error::UnexpectedReply { expected, line } => {
                assert_eq!(*expected, ReplyCode::OK);
                assert_eq!(line, "500 syntax error");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_550_after_body_is_intercepted() {
        let s = session();
        let err = Stage::MessageAck.advance("550 5.7.1 spam", &s).unwrap_err();
        assert!(matches!(err, Error::Intercepted(ref line) if line == "550 5.7.1 spam"));
    }

    #[test]
    fn test_550_elsewhere_is_plain_mismatch() {
        let s = session();
        let err = Stage::MailAck.advance("550 no such user", &s).unwrap_err();
        assert!(matches!(err, Error::UnexpectedReply { .. }));
    }

    #[test]
    fn test_garbage_line_is_mismatch() {
        let s = session();
        let err = Stage::Greeting.advance("hello?", &s).unwrap_err();
        assert!(matches!(err, Error::UnexpectedReply { .. }));
    }

    #[test]
    fn test_step_writes_into_exchange() {
        let mut exchange = Exchange::new(session());
        let outcome = Box::new(Stage::Greeting).run("220 ready", &mut exchange);
        assert!(matches!(outcome, StepOutcome::Proceed));
        assert_eq!(
            exchange.poll_transmit().unwrap().as_str(),
            Some("HELO sender.example\r\n")
        );
        assert!(exchange.poll_transmit().is_none());
    }

    #[test]
    fn test_step_failure_writes_nothing() {
        let mut exchange = Exchange::new(session());
        let outcome = Box::new(Stage::Greeting).run("554 go away", &mut exchange);
        assert!(matches!(outcome, StepOutcome::Fail(Error::UnexpectedReply { .. })));
        assert!(exchange.poll_transmit().is_none());
        assert!(!exchange.is_closed());
    }
}
