//! ouch-core
//!
//! Pure order-entry logic for the OUCH 4.2 simulator:
//! - fixed-width alpha fields and sides
//! - message records (inbound requests, outbound replies)
//! - order records and their lifecycle states
//! - the in-memory order registry

pub mod alpha;
pub mod side;
pub mod messages;
pub mod order;
pub mod registry;
pub mod error;

pub use alpha::{Alpha, Mpid, Symbol, Token};
pub use side::Side;

pub use messages::{
    CancelOrder,
    CancelPending,
    CancelRejected,
    InboundMessage,
    NewOrder,
    OrderAck,
    OrderBroken,
    OrderCanceled,
    OrderExecuted,
    OrderModified,
    OrderRejected,
    OutboundMessage,
    PriorityUpdate,
    SystemEvent,
};

pub use order::{Order, OrderId, OrderState};
pub use registry::{OrderRegistry, RegistryLimits};
pub use error::{AlphaError, RegistryError};
