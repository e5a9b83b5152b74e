//! Error types for the order-entry core.
//!
//! None of these are fatal to the process. A registration failure turns
//! into an `OrderRejected` reply; a cancel failure is dropped silently by
//! the server.

use thiserror::Error;

use crate::order::{OrderId, OrderState};

/// Failure of an [`OrderRegistry`](crate::registry::OrderRegistry) operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The identifier space has run out.
    #[error("order identifier space exhausted")]
    IdsExhausted,

    /// The configured order capacity has been reached.
    #[error("order capacity of {0} reached")]
    CapacityReached(usize),

    /// The side byte is not one of `B`, `S`, `T`, `E`.
    #[error("invalid side byte 0x{0:02x}")]
    InvalidSide(u8),

    /// The order quantity exceeds the configured maximum.
    #[error("quantity {qty} exceeds maximum {max}")]
    QuantityTooLarge { qty: u32, max: u32 },

    /// Another live order already uses this token.
    #[error("duplicate token {0}")]
    DuplicateToken(String),

    /// No order carries this identifier.
    #[error("unknown order {0}")]
    UnknownOrder(OrderId),

    /// The order exists but its state does not allow cancellation.
    #[error("order {id} is {state} and cannot be canceled")]
    NotCancelable { id: OrderId, state: OrderState },
}

/// Failure to build a fixed-width alpha field from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlphaError {
    #[error("value of {len} bytes does not fit a {width}-byte field")]
    TooLong { width: usize, len: usize },
}
