//! ouch-server
//!
//! Single-threaded OUCH 4.2 order-entry simulator over TCP.

pub mod config;
pub mod types;
pub mod server;

// these are internal modules, not re-exported
mod connection;
mod dispatch;

pub use config::Config;
pub use server::{Server, ShutdownHandle};
