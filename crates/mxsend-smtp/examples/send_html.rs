#![allow(clippy::doc_markdown)]
//! Example: Send an HTML mail straight to the recipient's mail exchange
//!
//! Outbound port 25 must be reachable, and the recipient's server must
//! accept mail from your address without authentication.
//!
//! ## Running
//!
//! ```bash
//! RUST_LOG=mxsend_smtp=trace cargo run --package mxsend-smtp --example send_html -- \
//!     sender@example.com recipient@example.org
//! ```

use std::env;

use anyhow::{Context, bail};
use mxsend_smtp::{Envelope, Mailer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mxsend_smtp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = env::args().skip(1);
    let (Some(sender), Some(recipient)) = (args.next(), args.next()) else {
        bail!("usage: send_html <sender> <recipient>");
    };

    let envelope = Envelope::new(
        "mxsend example",
        sender,
        recipient,
        "Hello from mxsend",
        "<h1>Hello</h1><p>Delivered without a relay.</p>",
    )?;

    let mailer = Mailer::new().context("reading system DNS configuration")?;
    mailer.send(&envelope).await.context("sending mail")?;

    info!("done");
    Ok(())
}
