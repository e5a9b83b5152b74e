//! OUCH 4.2 message records.
//!
//! These are the logical contents of each fixed-layout wire record, with
//! integers held in native byte order. Tag bytes, widths and byte order
//! live in the `ouch-protocol` crate; this module is purely logical.
//!
//! - [`InboundMessage`]: what clients send (new order, cancel).
//! - [`OutboundMessage`]: what the server can send back. Only `Ack`,
//!   `Rejected` and `Canceled` are produced by the simulator; the other
//!   variants exist so the full reply format set can be encoded and
//!   decoded.
//!
//! Single-byte attribute fields (`display`, `capacity`, `iso`, ...) are
//! kept as raw bytes: the simulator echoes them without interpretation.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::alpha::{Mpid, Symbol, Token};
use crate::order::OrderId;
use crate::side::Side;

/// Well-known single-byte field values.
pub mod constants {
    pub const LIQUIDITY_ADDED: u8 = b'A';
    pub const LIQUIDITY_REMOVED: u8 = b'R';

    pub const CAPACITY_AGENCY: u8 = b'A';
    pub const CAPACITY_PRINCIPAL: u8 = b'P';
    pub const CAPACITY_RISKLESS: u8 = b'R';

    pub const ISO_ELIGIBLE: u8 = b'Y';
    pub const ISO_NOT_ELIGIBLE: u8 = b'N';

    pub const CROSS_NONE: u8 = b'N';
    pub const CUSTOMER_NON_RETAIL: u8 = b'N';
    pub const DISPLAY_ATTRIBUTABLE: u8 = b'A';

    pub const EVENT_START_OF_DAY: u8 = b'S';
    pub const EVENT_END_OF_DAY: u8 = b'E';

    /// Order state byte carried in an `OrderAck`: the order is live.
    pub const ACK_STATE_LIVE: u8 = b'L';

    /// Reject reason used for every registration failure.
    pub const REJECT_REASON_TOKEN: u8 = b'T';

    /// Cancel reason: canceled on user request.
    pub const CANCEL_REASON_USER: u8 = b'U';

    /// Largest order quantity OUCH 4.2 accepts.
    pub const MAX_QTY: u32 = 1_000_000;
}

// ============================================================================
// INBOUND: client → server
// ============================================================================

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    NewOrder(NewOrder),
    CancelOrder(CancelOrder),
}

impl InboundMessage {
    pub fn token(&self) -> &Token {
        match self {
            InboundMessage::NewOrder(n) => &n.token,
            InboundMessage::CancelOrder(c) => &c.token,
        }
    }
}

/// Enter Order (`'O'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub token: Token,
    /// Raw side byte; see [`NewOrder::side`].
    pub side: u8,
    pub qty: u32,
    pub symbol: Symbol,
    pub px: u32,
    pub tif: u32,
    pub mpid: Mpid,
    pub display: u8,
    pub capacity: u8,
    pub iso: u8,
    pub min_qty: u32,
    pub cross_type: u8,
    pub customer_type: u8,
}

impl NewOrder {
    /// A new order with the given economics and default attributes.
    pub fn new(token: Token, side: Side, qty: u32, symbol: Symbol, px: u32) -> Self {
        NewOrder {
            token,
            side: side.as_byte(),
            qty,
            symbol,
            px,
            ..NewOrder::default()
        }
    }

    /// Parsed side, if the byte is a known side.
    pub fn side(&self) -> Option<Side> {
        Side::from_byte(self.side)
    }
}

impl Default for NewOrder {
    fn default() -> Self {
        NewOrder {
            token: Token::blank(),
            side: Side::Buy.as_byte(),
            qty: 0,
            symbol: Symbol::blank(),
            px: 0,
            tif: 0,
            mpid: Mpid::blank(),
            display: constants::DISPLAY_ATTRIBUTABLE,
            capacity: constants::CAPACITY_AGENCY,
            iso: constants::ISO_NOT_ELIGIBLE,
            min_qty: 0,
            cross_type: constants::CROSS_NONE,
            customer_type: constants::CUSTOMER_NON_RETAIL,
        }
    }
}

/// Cancel Order (`'X'`).
///
/// `qty` is the quantity the client wants to remain open; 0 cancels the
/// whole order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelOrder {
    pub token: Token,
    pub qty: u32,
}

// ============================================================================
// OUTBOUND: server → client
// ============================================================================

/// A reply record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    SystemEvent(SystemEvent),
    Ack(OrderAck),
    Canceled(OrderCanceled),
    Executed(OrderExecuted),
    Rejected(OrderRejected),
    Broken(OrderBroken),
    CancelPending(CancelPending),
    CancelRejected(CancelRejected),
    PriorityUpdate(PriorityUpdate),
    Modified(OrderModified),
}

impl OutboundMessage {
    /// Token of the order this reply concerns, if any.
    pub fn token(&self) -> Option<&Token> {
        match self {
            OutboundMessage::SystemEvent(_) => None,
            OutboundMessage::Ack(m) => Some(&m.token),
            OutboundMessage::Canceled(m) => Some(&m.token),
            OutboundMessage::Executed(m) => Some(&m.token),
            OutboundMessage::Rejected(m) => Some(&m.token),
            OutboundMessage::Broken(m) => Some(&m.token),
            OutboundMessage::CancelPending(m) => Some(&m.token),
            OutboundMessage::CancelRejected(m) => Some(&m.token),
            OutboundMessage::PriorityUpdate(m) => Some(&m.token),
            OutboundMessage::Modified(m) => Some(&m.token),
        }
    }
}

/// System Event (`'S'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemEvent {
    pub timestamp: u64,
    pub event_code: u8,
}

/// Order Accepted (`'A'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderAck {
    pub timestamp: u64,
    pub token: Token,
    pub side: u8,
    pub qty: u32,
    pub symbol: Symbol,
    pub px: u32,
    pub tif: u32,
    pub mpid: Mpid,
    pub display: u8,
    pub order_id: OrderId,
    pub capacity: u8,
    pub iso: u8,
    pub min_qty: u32,
    pub cross_type: u8,
    pub state: u8,
}

impl OrderAck {
    /// Ack for `req`, echoing every request field verbatim.
    pub fn from_new_order(req: &NewOrder, order_id: OrderId, timestamp: u64) -> Self {
        OrderAck {
            timestamp,
            token: req.token,
            side: req.side,
            qty: req.qty,
            symbol: req.symbol,
            px: req.px,
            tif: req.tif,
            mpid: req.mpid,
            display: req.display,
            order_id,
            capacity: req.capacity,
            iso: req.iso,
            min_qty: req.min_qty,
            cross_type: req.cross_type,
            state: constants::ACK_STATE_LIVE,
        }
    }
}

/// Order Canceled (`'C'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderCanceled {
    pub timestamp: u64,
    pub token: Token,
    pub qty: u32,
    pub reason: u8,
}

/// Order Executed (`'E'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExecuted {
    pub timestamp: u64,
    pub token: Token,
    pub qty: u32,
    pub px: u32,
    pub liquidity_flag: u8,
    pub match_id: u64,
}

/// Order Rejected (`'J'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRejected {
    pub timestamp: u64,
    pub token: Token,
    pub reason: u8,
}

/// Broken Trade (`'B'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBroken {
    pub timestamp: u64,
    pub token: Token,
    pub match_id: u64,
    pub reason: u8,
}

/// Cancel Pending (`'P'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelPending {
    pub timestamp: u64,
    pub token: Token,
}

/// Cancel Reject (`'I'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelRejected {
    pub timestamp: u64,
    pub token: Token,
}

/// Order Priority Update (`'T'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityUpdate {
    pub timestamp: u64,
    pub token: Token,
    pub px: u32,
    pub display: u8,
    pub order_id: OrderId,
}

/// Order Modified (`'M'`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderModified {
    pub timestamp: u64,
    pub token: Token,
    pub side: u8,
    pub qty: u32,
}

/// Nanoseconds since midnight UTC, the OUCH 4.2 timestamp convention.
pub fn timestamp_now() -> u64 {
    const NANOS_PER_DAY: u128 = 86_400 * 1_000_000_000;

    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (since_epoch.as_nanos() % NANOS_PER_DAY) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_echoes_request_fields() {
        let req = NewOrder {
            tif: 99_999,
            min_qty: 10,
            iso: constants::ISO_ELIGIBLE,
            ..NewOrder::new(
                "TOKEN00000001".parse().unwrap(),
                Side::Sell,
                300,
                "MSFT".parse().unwrap(),
                1_234_500,
            )
        };

        let ack = OrderAck::from_new_order(&req, OrderId(7), 42);
        assert_eq!(ack.token, req.token);
        assert_eq!(ack.side, b'S');
        assert_eq!(ack.qty, 300);
        assert_eq!(ack.px, 1_234_500);
        assert_eq!(ack.tif, 99_999);
        assert_eq!(ack.min_qty, 10);
        assert_eq!(ack.iso, b'Y');
        assert_eq!(ack.order_id, OrderId(7));
        assert_eq!(ack.state, constants::ACK_STATE_LIVE);
        assert_eq!(ack.timestamp, 42);
    }

    #[test]
    fn timestamp_is_within_one_day() {
        assert!(timestamp_now() < 86_400 * 1_000_000_000);
    }
}
