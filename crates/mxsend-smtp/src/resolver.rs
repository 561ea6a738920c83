//! Mail-exchange resolution.

use std::collections::HashMap;
use std::future::Future;

use hickory_resolver::TokioResolver;
use hickory_resolver::config::ResolverOpts;
use hickory_resolver::name_server::TokioConnectionProvider;
use tracing::debug;

use crate::error::{Error, Result};

/// Resolves the host that accepts mail for a domain.
pub trait Resolve {
    /// Returns the mail-exchange host name for `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoMailExchange`] if the domain publishes no mail
    /// exchange, or [`Error::Dns`] if the lookup fails.
    fn resolve_mail_exchange(&self, domain: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Resolver backed by the system DNS configuration.
///
/// Picks the MX record with the lowest preference value. There is no
/// fallback to address records.
#[derive(Clone)]
pub struct DnsResolver {
    resolver: TokioResolver,
}

impl DnsResolver {
    /// Creates a resolver from the system configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the system configuration cannot be read.
    pub fn new() -> Result<Self> {
        Self::with_options(ResolverOpts::default())
    }

    /// Creates a resolver from the system configuration with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the system configuration cannot be read.
    pub fn with_options(opts: ResolverOpts) -> Result<Self> {
        let resolver = TokioResolver::builder(TokioConnectionProvider::default())?
            .with_options(opts)
            .build();
        Ok(Self { resolver })
    }
}

impl std::fmt::Debug for DnsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DnsResolver").finish_non_exhaustive()
    }
}

impl Resolve for DnsResolver {
    async fn resolve_mail_exchange(&self, domain: &str) -> Result<String> {
        let lookup = match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => lookup,
            Err(err) if err.is_no_records_found() => {
                return Err(Error::NoMailExchange(domain.to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let records = lookup.iter().map(|mx| {
            let host = mx.exchange().to_utf8();
            debug!(domain, host = %host, preference = mx.preference(), "MX record");
            (mx.preference(), host)
        });

        let Some(host) = best_exchange(records) else {
            return Err(Error::NoMailExchange(domain.to_string()));
        };
        debug!(domain, host = %host, "resolved mail exchange");
        Ok(host)
    }
}

/// Picks the host of the lowest-preference record, root dot stripped.
///
/// Returns `None` for an empty set or a null MX (`.`), which means the
/// domain accepts no mail.
fn best_exchange(records: impl IntoIterator<Item = (u16, String)>) -> Option<String> {
    let (_, name) = records.into_iter().min_by_key(|(preference, _)| *preference)?;
    let host = name.strip_suffix('.').unwrap_or(&name);
    if host.is_empty() {
        return None;
    }
    Some(host.to_string())
}

/// Resolver with a fixed domain-to-host table.
///
/// Useful in tests and for sending through a known relay.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    hosts: HashMap<String, String>,
    fallback: Option<String>,
}

impl StaticResolver {
    /// Creates an empty resolver; every lookup fails.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver that answers every domain with `host`.
    #[must_use]
    pub fn always(host: impl Into<String>) -> Self {
        Self {
            hosts: HashMap::new(),
            fallback: Some(host.into()),
        }
    }

    /// Maps a domain to a host. Domains compare case-insensitively.
    #[must_use]
    pub fn with_host(mut self, domain: &str, host: impl Into<String>) -> Self {
        self.hosts.insert(domain.to_ascii_lowercase(), host.into());
        self
    }
}

impl Resolve for StaticResolver {
    async fn resolve_mail_exchange(&self, domain: &str) -> Result<String> {
        self.hosts
            .get(&domain.to_ascii_lowercase())
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| Error::NoMailExchange(domain.to_string()))
    }
}
