//! Send configuration types.

use std::time::Duration;

use crate::error::{Error, Result};

/// Standard SMTP relay port.
pub const DEFAULT_PORT: u16 = 25;

/// Default time allowed for the TCP connection to be established.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time allowed between transport events once connected.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default `X-Mailer` header value.
pub const DEFAULT_MAILER: &str = concat!("mxsend/", env!("CARGO_PKG_VERSION"));

/// Configuration for one send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server port.
    pub port: u16,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Idle timeout applied to every read and write.
    pub idle_timeout: Duration,
    /// Domain announced in HELO. Defaults to the sender's domain.
    pub helo_domain: Option<String>,
    /// `X-Mailer` header value.
    pub mailer: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Creates the default configuration: port 25, 30 s connect timeout,
    /// 10 s idle timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port: DEFAULT_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            helo_domain: None,
            mailer: DEFAULT_MAILER.to_string(),
        }
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Validates the values that end up on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the HELO domain is empty or
    /// contains whitespace or control characters, or if the mailer contains
    /// control characters.
    pub fn validate(&self) -> Result<()> {
        if let Some(domain) = &self.helo_domain {
            if domain.is_empty() {
                return Err(Error::InvalidConfig("helo_domain is empty".into()));
            }
            if domain.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err(Error::InvalidConfig(format!(
                    "helo_domain contains whitespace or control characters: {domain:?}"
                )));
            }
        }
        if self.mailer.chars().any(char::is_control) {
            return Err(Error::InvalidConfig(format!(
                "mailer contains control characters: {:?}",
                self.mailer
            )));
        }
        Ok(())
    }
}

/// Builder for send configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::new(),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub const fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Overrides the domain announced in HELO.
    #[must_use]
    pub fn helo_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.helo_domain = Some(domain.into());
        self
    }

    /// Sets the `X-Mailer` header value.
    #[must_use]
    pub fn mailer(mut self, mailer: impl Into<String>) -> Self {
        self.config.mailer = mailer.into();
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a value cannot be sent; see
    /// [`Config::validate`].
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
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

    #[test]
    fn test_config_new() {
        let config = Config::new();
        assert_eq!(config.port, 25);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Duration::from_secs(10));
        assert_eq!(config.helo_domain, None);
        assert!(config.mailer.starts_with("mxsend/"));
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder()
            .port(2525)
            .connect_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(3))
            .helo_domain("relay.example.net")
            .mailer("Newsletter Bot")
            .build()
            .unwrap();

        assert_eq!(config.port, 2525);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.idle_timeout, Duration::from_secs(3));
        assert_eq!(config.helo_domain.as_deref(), Some("relay.example.net"));
        assert_eq!(config.mailer, "Newsletter Bot");
    }

    #[test]
    fn test_builder_defaults_match_config() {
        assert_eq!(ConfigBuilder::default().build().unwrap(), Config::default());
    }

    #[test]
    fn test_builder_rejects_line_breaks() {
        let err = Config::builder()
            .helo_domain("evil.example\r\nRCPT TO:<victim@example.com>")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Config::builder()
            .mailer("Bot\r\nBcc: victim@example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = Config::builder().mailer("Bot\n").build().unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_builder_rejects_bad_helo_domain() {
        for domain in ["", "two words.example", "tab\there"] {
            let err = Config::builder().helo_domain(domain).build().unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{domain:?}");
        }
    }

    #[test]
    fn test_validate_catches_direct_field_edits() {
        let mut config = Config::new();
        config.mailer = "Bot\rX-Injected: 1".to_string();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        config.mailer = "Bulletin 2.0 (Grüße)".to_string();
        assert!(config.validate().is_ok());
    }
}
