//! Order-entry reply policy.
//!
//! The server loop owns the `OrderRegistry` and hands every decoded
//! client message to [`respond`], which applies it to the registry and
//! decides what, if anything, goes back to the originating connection:
//!
//! - `NewOrder` accepted   => `OrderAck` (state `'L'`)
//! - `NewOrder` refused    => `OrderRejected` (reason `'T'`)
//! - `CancelOrder` applied => `OrderCanceled` (reason `'U'`, request qty)
//! - `CancelOrder` unknown token or not cancelable => no reply
//!
//! Replies are never broadcast; routing is always back to the sender.

use ouch_core::messages::constants::{CANCEL_REASON_USER, REJECT_REASON_TOKEN};
use ouch_core::{
    CancelOrder, InboundMessage, NewOrder, OrderAck, OrderCanceled, OrderRegistry,
    OrderRejected, OutboundMessage,
};
use tracing::{debug, warn};

/// Apply `msg` to `registry` and build the reply, stamped with `timestamp`.
pub fn respond(
    registry: &mut OrderRegistry,
    msg: &InboundMessage,
    timestamp: u64,
) -> Option<OutboundMessage> {
    match msg {
        InboundMessage::NewOrder(req) => Some(on_new_order(registry, req, timestamp)),
        InboundMessage::CancelOrder(req) => on_cancel_order(registry, req, timestamp),
    }
}

fn on_new_order(registry: &mut OrderRegistry, req: &NewOrder, timestamp: u64) -> OutboundMessage {
    match registry.register(req) {
        Ok(order_id) => OutboundMessage::Ack(OrderAck::from_new_order(req, order_id, timestamp)),
        Err(err) => {
            warn!(token = %req.token, error = %err, "rejecting new order");
            OutboundMessage::Rejected(OrderRejected {
                timestamp,
                token: req.token,
                reason: REJECT_REASON_TOKEN,
            })
        }
    }
}

fn on_cancel_order(
    registry: &mut OrderRegistry,
    req: &CancelOrder,
    timestamp: u64,
) -> Option<OutboundMessage> {
    let Some(order_id) = registry.find(&req.token) else {
        debug!(token = %req.token, "cancel for unknown token ignored");
        return None;
    };

    if let Err(err) = registry.cancel(order_id) {
        debug!(token = %req.token, error = %err, "cancel ignored");
        return None;
    }

    Some(OutboundMessage::Canceled(OrderCanceled {
        timestamp,
        token: req.token,
        qty: req.qty,
        reason: CANCEL_REASON_USER,
    }))
}
