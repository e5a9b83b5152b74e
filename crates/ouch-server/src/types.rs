//! Shared types for the simulator's TCP server.
//!
//! This module defines:
//! - `ConnectionId`: a lightweight handle for accepted connections
//! - `ConnectionState`: the per-connection lifecycle
//! - `ServerEvent`: what connection tasks report to the server loop
//! - channel aliases between connections and the server loop

use std::collections::HashMap;
use std::fmt;

use ouch_core::{InboundMessage, OutboundMessage};
use tokio::sync::mpsc;

/// Identifier for an accepted connection.
///
/// Unique over the lifetime of the server; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a connection. `Shutdown` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Initial,
    Connected,
    Shutdown,
}

impl ConnectionState {
    pub const ALL: [ConnectionState; 3] = [
        ConnectionState::Initial,
        ConnectionState::Connected,
        ConnectionState::Shutdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Initial => "Initial",
            ConnectionState::Connected => "Connected",
            ConnectionState::Shutdown => "Shutdown",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message flowing from a connection task into the server loop.
#[derive(Debug)]
pub enum ServerEvent {
    /// A complete, decoded client message.
    Inbound {
        connection: ConnectionId,
        msg: InboundMessage,
    },

    /// The connection has shut down; its replies can be dropped.
    Closed { connection: ConnectionId },
}

/// Channel from connections → server loop.
pub type EventTx = mpsc::UnboundedSender<ServerEvent>;
pub type EventRx = mpsc::UnboundedReceiver<ServerEvent>;

/// Replies from the server loop to one connection's writer.
pub type OutboundTx = mpsc::UnboundedSender<OutboundMessage>;
pub type OutboundRx = mpsc::UnboundedReceiver<OutboundMessage>;

/// Live connections and their reply channels.
pub type ConnectionMap = HashMap<ConnectionId, OutboundTx>;
