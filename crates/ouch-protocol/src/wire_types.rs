//! Low-level wire types and constants.
//!
//! This module defines:
//! - the tag byte of every OUCH 4.2 message,
//! - the exact record size of each message (tag byte included),
//! - a display-name table for logging.
//!
//! The actual encode/decode logic lives in `binary_codec`.

use std::fmt;

/// Bytes requested from the socket per read.
///
/// Receive buffers must be strictly larger than this.
pub const NETWORK_RECV_SIZE: usize = 1500;

/// Direction a message travels in.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// Client → server.
    Inbound,
    /// Server → client.
    Outbound,
}

/// Every OUCH 4.2 message type, keyed by its tag byte.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    // Inbound.
    NewOrder = b'O',
    CancelOrder = b'X',

    // Outbound.
    SystemEvent = b'S',
    OrderAck = b'A',
    OrderCanceled = b'C',
    OrderExecuted = b'E',
    OrderRejected = b'J',
    OrderBroken = b'B',
    CancelPending = b'P',
    CancelRejected = b'I',
    PriorityUpdate = b'T',
    OrderModified = b'M',
}

impl MessageType {
    pub const ALL: [MessageType; 12] = [
        MessageType::NewOrder,
        MessageType::CancelOrder,
        MessageType::SystemEvent,
        MessageType::OrderAck,
        MessageType::OrderCanceled,
        MessageType::OrderExecuted,
        MessageType::OrderRejected,
        MessageType::OrderBroken,
        MessageType::CancelPending,
        MessageType::CancelRejected,
        MessageType::PriorityUpdate,
        MessageType::OrderModified,
    ];

    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Look up an inbound (client-originated) tag.
    pub fn inbound_from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'O' => Some(MessageType::NewOrder),
            b'X' => Some(MessageType::CancelOrder),
            _ => None,
        }
    }

    /// Look up an outbound (server-originated) tag.
    pub fn outbound_from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'S' => Some(MessageType::SystemEvent),
            b'A' => Some(MessageType::OrderAck),
            b'C' => Some(MessageType::OrderCanceled),
            b'E' => Some(MessageType::OrderExecuted),
            b'J' => Some(MessageType::OrderRejected),
            b'B' => Some(MessageType::OrderBroken),
            b'P' => Some(MessageType::CancelPending),
            b'I' => Some(MessageType::CancelRejected),
            b'T' => Some(MessageType::PriorityUpdate),
            b'M' => Some(MessageType::OrderModified),
            _ => None,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            MessageType::NewOrder | MessageType::CancelOrder => Direction::Inbound,
            _ => Direction::Outbound,
        }
    }

    /// Exact record length in bytes, tag byte included.
    pub const fn required_size(self) -> usize {
        match self {
            MessageType::NewOrder => 49,
            MessageType::CancelOrder => 19,
            MessageType::SystemEvent => 10,
            MessageType::OrderAck => 65,
            MessageType::OrderCanceled => 28,
            MessageType::OrderExecuted => 40,
            MessageType::OrderRejected => 24,
            MessageType::OrderBroken => 32,
            MessageType::CancelPending => 23,
            MessageType::CancelRejected => 23,
            MessageType::PriorityUpdate => 36,
            MessageType::OrderModified => 28,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::NewOrder => "NewOrder",
            MessageType::CancelOrder => "CancelOrder",
            MessageType::SystemEvent => "SystemEvent",
            MessageType::OrderAck => "OrderAck",
            MessageType::OrderCanceled => "OrderCanceled",
            MessageType::OrderExecuted => "OrderExecuted",
            MessageType::OrderRejected => "OrderRejected",
            MessageType::OrderBroken => "OrderBroken",
            MessageType::CancelPending => "CancelPending",
            MessageType::CancelRejected => "CancelRejected",
            MessageType::PriorityUpdate => "PriorityUpdate",
            MessageType::OrderModified => "OrderModified",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record size for any known tag, or `None`.
///
/// Inbound tags are checked first; the two tag spaces are disjoint.
pub fn message_size(tag: u8) -> Option<usize> {
    MessageType::inbound_from_tag(tag)
        .or_else(|| MessageType::outbound_from_tag(tag))
        .map(MessageType::required_size)
}
