// crates/ouch-core/tests/registry_scenarios.rs
//
// Drives the registry from an encoded wire session, the same path the
// server takes: encode → frame → register / find / cancel.

use ouch_core::{
    CancelOrder, InboundMessage, NewOrder, OrderId, OrderRegistry, OrderState, Side, Token,
};
use ouch_protocol::{encode_input, next_frame, Frame, RwBuffer};

fn tok(s: &str) -> Token {
    s.parse().unwrap()
}

fn new_order(token: &str, side: Side, qty: u32) -> InboundMessage {
    InboundMessage::NewOrder(NewOrder::new(tok(token), side, qty, "IBM".parse().unwrap(), 1_250_000))
}

fn cancel(token: &str) -> InboundMessage {
    InboundMessage::CancelOrder(CancelOrder {
        token: tok(token),
        qty: 0,
    })
}

/// Replay a session and return, per message, the identifier touched
/// (registered or canceled), if any.
fn replay(registry: &mut OrderRegistry, session: &[InboundMessage]) -> Vec<Option<OrderId>> {
    let mut wire = Vec::new();
    for msg in session {
        encode_input(msg, &mut wire);
    }

    let mut buf = RwBuffer::with_capacity(64 * 1024).unwrap();
    buf.put_slice(&wire).unwrap();

    let mut touched = Vec::new();
    while let Some(Frame::Message(msg)) = next_frame(&mut buf) {
        let id = match msg {
            InboundMessage::NewOrder(n) => registry.register(&n).ok(),
            InboundMessage::CancelOrder(c) => registry
                .find(&c.token)
                .filter(|&id| registry.cancel(id).is_ok()),
        };
        touched.push(id);
    }
    touched
}

#[test]
fn mixed_session_transitions() {
    let mut registry = OrderRegistry::new();

    let touched = replay(
        &mut registry,
        &[
            new_order("BUY1", Side::Buy, 100),
            new_order("SELL1", Side::Sell, 200),
            cancel("NOPE"),
            cancel("BUY1"),
            cancel("BUY1"),
            new_order("SHORT1", Side::Short, 300),
            new_order("SSE1", Side::ShortExempt, 400),
        ],
    );

    assert_eq!(
        touched,
        vec![
            Some(OrderId(0)),
            Some(OrderId(1)),
            None,
            Some(OrderId(0)),
            None,
            Some(OrderId(2)),
            Some(OrderId(3)),
        ]
    );

    let states: Vec<_> = registry.orders().map(|o| (o.token.to_string(), o.state)).collect();
    assert_eq!(
        states,
        vec![
            ("BUY1".to_string(), OrderState::Canceled),
            ("SELL1".to_string(), OrderState::New),
            ("SHORT1".to_string(), OrderState::New),
            ("SSE1".to_string(), OrderState::New),
        ]
    );
}

#[test]
fn reused_token_cancels_latest_order() {
    let mut registry = OrderRegistry::new();

    let touched = replay(
        &mut registry,
        &[
            new_order("SAME", Side::Buy, 100),
            new_order("SAME", Side::Buy, 50),
            cancel("SAME"),
        ],
    );

    assert_eq!(touched, vec![Some(OrderId(0)), Some(OrderId(1)), Some(OrderId(1))]);
    assert_eq!(registry.get(OrderId(0)).unwrap().state, OrderState::New);
    assert_eq!(registry.get(OrderId(1)).unwrap().state, OrderState::Canceled);
    assert_eq!(registry.get(OrderId(1)).unwrap().leaves_qty(), 50);
}
