//! Configuration for the simulator.
//!
//! Port and message tracing come from the command line (see `main.rs`).
//! Everything else uses defaults that can be overridden through a few
//! environment variables:
//!
//! - `OUCH_BIND_ADDR`               (default: "0.0.0.0")
//! - `OUCH_MAX_CLIENTS`             (default: "1024")
//! - `OUCH_RECV_BUFFER_SIZE`        (default: "131072")
//! - `OUCH_MAX_ORDERS`              (default: unlimited)
//! - `OUCH_MAX_ORDER_QTY`           (default: unlimited)
//! - `OUCH_REJECT_DUPLICATE_TOKENS` (default: "false")

use std::env;
use std::str::FromStr;

use anyhow::{ensure, Context, Result};
use ouch_core::RegistryLimits;
use ouch_protocol::NETWORK_RECV_SIZE;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Log every read and every reply.
    pub trace_messages: bool,

    /// Maximum number of simultaneously connected clients.
    pub max_clients: usize,

    /// Receive buffer capacity per connection, in bytes.
    pub recv_buffer_size: usize,

    /// Admission checks for new orders.
    pub limits: RegistryLimits,
}

impl Config {
    pub const DEFAULT_PORT: u16 = 4722;
    pub const DEFAULT_RECV_BUFFER_SIZE: usize = 128 * 1024;

    /// Construct a `Config` from environment variables, falling back
    /// to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let config = Config {
            bind_addr: lookup("OUCH_BIND_ADDR").unwrap_or(defaults.bind_addr),
            max_clients: parse_or(&lookup, "OUCH_MAX_CLIENTS", defaults.max_clients)?,
            recv_buffer_size: parse_or(
                &lookup,
                "OUCH_RECV_BUFFER_SIZE",
                defaults.recv_buffer_size,
            )?,
            limits: RegistryLimits {
                max_orders: parse_opt(&lookup, "OUCH_MAX_ORDERS")?,
                max_order_qty: parse_opt(&lookup, "OUCH_MAX_ORDER_QTY")?,
                reject_duplicate_tokens: parse_or(
                    &lookup,
                    "OUCH_REJECT_DUPLICATE_TOKENS",
                    false,
                )?,
            },
            ..defaults
        };

        ensure!(
            config.recv_buffer_size > NETWORK_RECV_SIZE,
            "OUCH_RECV_BUFFER_SIZE must be larger than {} bytes",
            NETWORK_RECV_SIZE
        );
        Ok(config)
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: "0.0.0.0".to_string(),
            port: Config::DEFAULT_PORT,
            trace_messages: false,
            max_clients: 1024,
            recv_buffer_size: Config::DEFAULT_RECV_BUFFER_SIZE,
            limits: RegistryLimits::default(),
        }
    }
}

fn parse_opt<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|val| {
            val.trim()
                .parse::<T>()
                .with_context(|| format!("invalid value {val:?} for {key}"))
        })
        .transpose()
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(lookup, key)?.unwrap_or(default))
}
