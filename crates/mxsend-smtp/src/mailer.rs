//! High-level send API.

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::connection::{Config, connect};
use crate::driver::Completion;
use crate::error::Result;
use crate::resolver::{DnsResolver, Resolve};
use crate::session::{Envelope, Session};

/// Sends mail straight to each recipient's mail exchange.
#[derive(Debug, Clone)]
pub struct Mailer<R = DnsResolver> {
    resolver: R,
    config: Config,
}

impl Mailer<DnsResolver> {
    /// Creates a mailer using system DNS and the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the system DNS configuration cannot be read.
    pub fn new() -> Result<Self> {
        Ok(Self::with_resolver(DnsResolver::new()?, Config::new()))
    }
}

impl<R: Resolve> Mailer<R> {
    /// Creates a mailer with a custom resolver and configuration.
    #[must_use]
    pub const fn with_resolver(resolver: R, config: Config) -> Self {
        Self { resolver, config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Sends one mail and waits for the exchange to finish.
    ///
    /// The mail exchange is resolved before any connection is opened.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`](crate::Error::InvalidConfig) before
    /// any lookup if the configuration cannot be sent, otherwise the first
    /// failure: resolution, connection, a rejected reply, a timeout or a
    /// dropped connection.
    pub async fn send(&self, envelope: &Envelope) -> Result<()> {
        self.config.validate()?;

        let domain = envelope.recipient_domain();
        let host = match self.resolver.resolve_mail_exchange(domain).await {
            Ok(host) => host,
            Err(err) => {
                warn!(domain, error = %err, "mail exchange lookup failed");
                return Err(err);
            }
        };

        debug!(domain, host = %host, port = self.config.port, "sending via mail exchange");
        let transport = match connect(
            &host,
            self.config.port,
            self.config.connect_timeout,
            self.config.idle_timeout,
        )
        .await
        {
            Ok(transport) => transport,
            Err(err) => {
                warn!(host = %host, error = %err, "connection failed");
                return Err(err);
            }
        };

        Session::new(envelope.clone(), &self.config)
            .run(transport)
            .await
    }
}

impl<R> Mailer<R>
where
    R: Resolve + Clone + Send + Sync + 'static,
{
    /// Sends one mail in the background and reports the outcome to
    /// `callback`.
    ///
    /// The callback is invoked exactly once, with `Ok(())` after the server
    /// acknowledges QUIT or with the first failure.
    pub fn send_with_callback<F>(&self, envelope: Envelope, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<()>) + Send + 'static,
    {
        let mailer = self.clone();
        let mut completion = Completion::new(callback);
        tokio::spawn(async move {
            let result = mailer.send(&envelope).await;
            completion.fire(result);
        })
    }
}

/// Sends an HTML mail to `recipient` through its mail exchange, using system
/// DNS and the default configuration.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`](crate::Error::InvalidAddress) for a
/// malformed address, otherwise the first failure of the send.
pub async fn send_mail(
    sender_name: &str,
    sender: &str,
    recipient: &str,
    subject: &str,
    html_body: &str,
) -> Result<()> {
    let envelope = Envelope::new(sender_name, sender, recipient, subject, html_body)?;
    Mailer::new()?.send(&envelope).await
}
