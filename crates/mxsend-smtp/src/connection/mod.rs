//! Transport, line tokenizing and send configuration.

mod config;
mod idle;
mod lines;
mod transport;

pub use config::{
    Config, ConfigBuilder, DEFAULT_CONNECT_TIMEOUT, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAILER,
    DEFAULT_PORT,
};
pub use idle::{IdleTimeout, is_idle_elapsed};
pub use lines::{LineSource, MAX_LINE_LENGTH};
pub use transport::{Transport, connect};
