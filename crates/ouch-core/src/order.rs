//! Per-order state kept by the simulator.
//!
//! An `Order` is built from an inbound [`NewOrder`] and then only ever
//! changes state. There is no execution path, so `filled_qty` stays at 0
//! for now.
//!
//! This type is **not** exposed over the wire; replies are built from the
//! request that triggered them, not from the stored record.

use std::fmt;

use crate::alpha::{Mpid, Symbol, Token};
use crate::messages::NewOrder;
use crate::side::Side;

/// Server-assigned order identifier.
///
/// Issued sequentially from 0 and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderState {
    Initial,
    New,
    Open,
    Canceled,
    Filled,
    Rejected,
}

impl OrderState {
    pub const ALL: [OrderState; 6] = [
        OrderState::Initial,
        OrderState::New,
        OrderState::Open,
        OrderState::Canceled,
        OrderState::Filled,
        OrderState::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Initial => "INITIAL",
            OrderState::New => "NEW",
            OrderState::Open => "OPEN",
            OrderState::Canceled => "CANCELED",
            OrderState::Filled => "FILLED",
            OrderState::Rejected => "REJECTED",
        }
    }

    /// Only resting orders can be canceled.
    pub fn is_cancelable(self) -> bool {
        matches!(self, OrderState::New | OrderState::Open)
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single registered order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub token: Token,
    pub state: OrderState,
    pub side: Side,

    pub qty: u32,
    pub filled_qty: u32,

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

impl Order {
    /// Construct a `New` order from an inbound request.
    pub fn from_new_order(id: OrderId, side: Side, msg: &NewOrder) -> Self {
        Order {
            id,
            token: msg.token,
            state: OrderState::New,
            side,
            qty: msg.qty,
            filled_qty: 0,
            symbol: msg.symbol,
            px: msg.px,
            tif: msg.tif,
            mpid: msg.mpid,
            display: msg.display,
            capacity: msg.capacity,
            iso: msg.iso,
            min_qty: msg.min_qty,
            cross_type: msg.cross_type,
            customer_type: msg.customer_type,
        }
    }

    /// Quantity not yet filled.
    pub fn leaves_qty(&self) -> u32 {
        self.qty.saturating_sub(self.filled_qty)
    }
}
