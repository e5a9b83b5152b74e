//! Binary encoding/decoding for OUCH 4.2 records.
//!
//! Every message is a packed, fixed-layout record whose first byte is the
//! tag (see `wire_types`). There is no length prefix: the tag alone
//! determines the record size.
//!
//! ```text
//! NewOrder 'O' (49)
//!   [0]      tag
//!   [1..15]  token
//!   [15]     side
//!   [16..20] qty (u32)
//!   [20..28] symbol
//!   [28..32] px (u32)
//!   [32..36] tif (u32)
//!   [36..40] mpid
//!   [40]     display
//!   [41]     capacity
//!   [42]     iso
//!   [43..47] min_qty (u32)
//!   [47]     cross_type
//!   [48]     customer_type
//!
//! CancelOrder 'X' (19)
//!   [1..15]  token
//!   [15..19] qty (u32)
//!
//! OrderAck 'A' (65)
//!   [1..9]   timestamp (u64)
//!   [9..23]  token
//!   [23]     side
//!   [24..28] qty (u32)
//!   [28..36] symbol
//!   [36..40] px (u32)
//!   [40..44] tif (u32)
//!   [44..48] mpid
//!   [48]     display
//!   [49..57] order_id (u64)
//!   [57]     capacity
//!   [58]     iso
//!   [59..63] min_qty (u32)
//!   [63]     cross_type
//!   [64]     state
//!
//! OrderRejected 'J' (24)
//!   [1..9]   timestamp (u64)
//!   [9..23]  token
//!   [23]     reason
//!
//! OrderCanceled 'C' (28)
//!   [1..9]   timestamp (u64)
//!   [9..23]  token
//!   [23..27] qty (u32)
//!   [27]     reason
//! ```
//!
//! The remaining outbound records (`S`, `E`, `B`, `P`, `I`, `T`, `M`)
//! follow the same pattern; see their `WireRecord` impls below.
//!
//! Byte order: every integer wider than one byte is big-endian on the
//! wire, in both directions. Records in memory always hold native
//! integers; conversion happens here and nowhere else.

use bytes::{Buf, BufMut};
use thiserror::Error;

use ouch_core::{
    Alpha, CancelOrder, CancelPending, CancelRejected, InboundMessage, NewOrder, OrderAck,
    OrderBroken, OrderCanceled, OrderExecuted, OrderId, OrderModified, OrderRejected,
    OutboundMessage, PriorityUpdate, SystemEvent,
};

use crate::wire_types::MessageType;

/// Errors that can arise when decoding a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Buffer too short for the record.
    #[error("buffer truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// Unknown or unsupported tag byte.
    #[error("unknown message type 0x{0:02x}")]
    UnknownMessageType(u8),

    /// The buffer holds a different record than the one requested.
    #[error("expected {expected} record, found tag 0x{found:02x}")]
    UnexpectedTag { expected: MessageType, found: u8 },
}

/// A fixed-layout record with a known tag and size.
pub trait WireRecord: Sized {
    const TYPE: MessageType;

    /// Record size in bytes, tag included.
    const SIZE: usize = Self::TYPE.required_size();

    /// Decode the body (everything after the tag).
    ///
    /// `body` holds at least `SIZE - 1` bytes.
    fn decode_body(body: &mut &[u8]) -> Self;

    /// Append the body (everything after the tag).
    fn encode_body<B: BufMut>(&self, out: &mut B);
}

/// Decode one `T` from the start of `buf`.
pub fn decode_record<T: WireRecord>(buf: &[u8]) -> Result<T, ProtocolError> {
    if buf.len() < T::SIZE {
        return Err(ProtocolError::Truncated {
            needed: T::SIZE,
            available: buf.len(),
        });
    }
    if buf[0] != T::TYPE.tag() {
        return Err(ProtocolError::UnexpectedTag {
            expected: T::TYPE,
            found: buf[0],
        });
    }

    let mut body = &buf[1..T::SIZE];
    Ok(T::decode_body(&mut body))
}

/// Append one `T`, tag included.
pub fn encode_record<T: WireRecord, B: BufMut>(record: &T, out: &mut B) {
    out.put_u8(T::TYPE.tag());
    record.encode_body(out);
}

// ============================================================================
// INPUT: client → server
// ============================================================================

/// Decode a single input message from the start of `buf`.
///
/// Returns the message and the number of bytes it occupied.
pub fn decode_input(buf: &[u8]) -> Result<(InboundMessage, usize), ProtocolError> {
    let tag = *buf.first().ok_or(ProtocolError::Truncated {
        needed: 1,
        available: 0,
    })?;

    let msg = match MessageType::inbound_from_tag(tag) {
        Some(MessageType::NewOrder) => InboundMessage::NewOrder(decode_record(buf)?),
        Some(MessageType::CancelOrder) => InboundMessage::CancelOrder(decode_record(buf)?),
        _ => return Err(ProtocolError::UnknownMessageType(tag)),
    };

    let used = inbound_type(&msg).required_size();
    Ok((msg, used))
}

/// Encode a single input message.
pub fn encode_input<B: BufMut>(msg: &InboundMessage, out: &mut B) {
    match msg {
        InboundMessage::NewOrder(n) => encode_record(n, out),
        InboundMessage::CancelOrder(c) => encode_record(c, out),
    }
}

pub fn inbound_type(msg: &InboundMessage) -> MessageType {
    match msg {
        InboundMessage::NewOrder(_) => MessageType::NewOrder,
        InboundMessage::CancelOrder(_) => MessageType::CancelOrder,
    }
}

// ============================================================================
// OUTPUT: server → client
// ============================================================================

/// Encode a single output message.
pub fn encode_output<B: BufMut>(msg: &OutboundMessage, out: &mut B) {
    match msg {
        OutboundMessage::SystemEvent(m) => encode_record(m, out),
        OutboundMessage::Ack(m) => encode_record(m, out),
        OutboundMessage::Canceled(m) => encode_record(m, out),
        OutboundMessage::Executed(m) => encode_record(m, out),
        OutboundMessage::Rejected(m) => encode_record(m, out),
        OutboundMessage::Broken(m) => encode_record(m, out),
        OutboundMessage::CancelPending(m) => encode_record(m, out),
        OutboundMessage::CancelRejected(m) => encode_record(m, out),
        OutboundMessage::PriorityUpdate(m) => encode_record(m, out),
        OutboundMessage::Modified(m) => encode_record(m, out),
    }
}

/// Decode a single output message from the start of `buf`.
///
/// This is useful on the **client** side when reading from the server.
pub fn decode_output(buf: &[u8]) -> Result<(OutboundMessage, usize), ProtocolError> {
    let tag = *buf.first().ok_or(ProtocolError::Truncated {
        needed: 1,
        available: 0,
    })?;
    let wire_type =
        MessageType::outbound_from_tag(tag).ok_or(ProtocolError::UnknownMessageType(tag))?;

    let msg = match wire_type {
        MessageType::SystemEvent => OutboundMessage::SystemEvent(decode_record(buf)?),
        MessageType::OrderAck => OutboundMessage::Ack(decode_record(buf)?),
        MessageType::OrderCanceled => OutboundMessage::Canceled(decode_record(buf)?),
        MessageType::OrderExecuted => OutboundMessage::Executed(decode_record(buf)?),
        MessageType::OrderRejected => OutboundMessage::Rejected(decode_record(buf)?),
        MessageType::OrderBroken => OutboundMessage::Broken(decode_record(buf)?),
        MessageType::CancelPending => OutboundMessage::CancelPending(decode_record(buf)?),
        MessageType::CancelRejected => OutboundMessage::CancelRejected(decode_record(buf)?),
        MessageType::PriorityUpdate => OutboundMessage::PriorityUpdate(decode_record(buf)?),
        MessageType::OrderModified => OutboundMessage::Modified(decode_record(buf)?),
        MessageType::NewOrder | MessageType::CancelOrder => {
            return Err(ProtocolError::UnknownMessageType(tag))
        }
    };

    Ok((msg, wire_type.required_size()))
}

pub fn outbound_type(msg: &OutboundMessage) -> MessageType {
    match msg {
        OutboundMessage::SystemEvent(_) => MessageType::SystemEvent,
        OutboundMessage::Ack(_) => MessageType::OrderAck,
        OutboundMessage::Canceled(_) => MessageType::OrderCanceled,
        OutboundMessage::Executed(_) => MessageType::OrderExecuted,
        OutboundMessage::Rejected(_) => MessageType::OrderRejected,
        OutboundMessage::Broken(_) => MessageType::OrderBroken,
        OutboundMessage::CancelPending(_) => MessageType::CancelPending,
        OutboundMessage::CancelRejected(_) => MessageType::CancelRejected,
        OutboundMessage::PriorityUpdate(_) => MessageType::PriorityUpdate,
        OutboundMessage::Modified(_) => MessageType::OrderModified,
    }
}

// ============================================================================
// Record layouts
// ============================================================================

impl WireRecord for NewOrder {
    const TYPE: MessageType = MessageType::NewOrder;

    fn decode_body(body: &mut &[u8]) -> Self {
        NewOrder {
            token: get_alpha(body),
            side: body.get_u8(),
            qty: body.get_u32(),
            symbol: get_alpha(body),
            px: body.get_u32(),
            tif: body.get_u32(),
            mpid: get_alpha(body),
            display: body.get_u8(),
            capacity: body.get_u8(),
            iso: body.get_u8(),
            min_qty: body.get_u32(),
            cross_type: body.get_u8(),
            customer_type: body.get_u8(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_slice(self.token.as_bytes());
        out.put_u8(self.side);
        out.put_u32(self.qty);
        out.put_slice(self.symbol.as_bytes());
        out.put_u32(self.px);
        out.put_u32(self.tif);
        out.put_slice(self.mpid.as_bytes());
        out.put_u8(self.display);
        out.put_u8(self.capacity);
        out.put_u8(self.iso);
        out.put_u32(self.min_qty);
        out.put_u8(self.cross_type);
        out.put_u8(self.customer_type);
    }
}

impl WireRecord for CancelOrder {
    const TYPE: MessageType = MessageType::CancelOrder;

    fn decode_body(body: &mut &[u8]) -> Self {
        CancelOrder {
            token: get_alpha(body),
            qty: body.get_u32(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_slice(self.token.as_bytes());
        out.put_u32(self.qty);
    }
}

impl WireRecord for SystemEvent {
    const TYPE: MessageType = MessageType::SystemEvent;

    fn decode_body(body: &mut &[u8]) -> Self {
        SystemEvent {
            timestamp: body.get_u64(),
            event_code: body.get_u8(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_u8(self.event_code);
    }
}

impl WireRecord for OrderAck {
    const TYPE: MessageType = MessageType::OrderAck;

    fn decode_body(body: &mut &[u8]) -> Self {
        OrderAck {
            timestamp: body.get_u64(),
            token: get_alpha(body),
            side: body.get_u8(),
            qty: body.get_u32(),
            symbol: get_alpha(body),
            px: body.get_u32(),
            tif: body.get_u32(),
            mpid: get_alpha(body),
            display: body.get_u8(),
            order_id: OrderId(body.get_u64()),
            capacity: body.get_u8(),
            iso: body.get_u8(),
            min_qty: body.get_u32(),
            cross_type: body.get_u8(),
            state: body.get_u8(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
        out.put_u8(self.side);
        out.put_u32(self.qty);
        out.put_slice(self.symbol.as_bytes());
        out.put_u32(self.px);
        out.put_u32(self.tif);
        out.put_slice(self.mpid.as_bytes());
        out.put_u8(self.display);
        out.put_u64(self.order_id.0);
        out.put_u8(self.capacity);
        out.put_u8(self.iso);
        out.put_u32(self.min_qty);
        out.put_u8(self.cross_type);
        out.put_u8(self.state);
    }
}

impl WireRecord for OrderCanceled {
    const TYPE: MessageType = MessageType::OrderCanceled;

    fn decode_body(body: &mut &[u8]) -> Self {
        OrderCanceled {
            timestamp: body.get_u64(),
            token: get_alpha(body),
            qty: body.get_u32(),
            reason: body.get_u8(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
        out.put_u32(self.qty);
        out.put_u8(self.reason);
    }
}

impl WireRecord for OrderExecuted {
    const TYPE: MessageType = MessageType::OrderExecuted;

    fn decode_body(body: &mut &[u8]) -> Self {
        OrderExecuted {
            timestamp: body.get_u64(),
            token: get_alpha(body),
            qty: body.get_u32(),
            px: body.get_u32(),
            liquidity_flag: body.get_u8(),
            match_id: body.get_u64(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
        out.put_u32(self.qty);
        out.put_u32(self.px);
        out.put_u8(self.liquidity_flag);
        out.put_u64(self.match_id);
    }
}

impl WireRecord for OrderRejected {
    const TYPE: MessageType = MessageType::OrderRejected;

    fn decode_body(body: &mut &[u8]) -> Self {
        OrderRejected {
            timestamp: body.get_u64(),
            token: get_alpha(body),
            reason: body.get_u8(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
        out.put_u8(self.reason);
    }
}

impl WireRecord for OrderBroken {
    const TYPE: MessageType = MessageType::OrderBroken;

    fn decode_body(body: &mut &[u8]) -> Self {
        OrderBroken {
            timestamp: body.get_u64(),
            token: get_alpha(body),
            match_id: body.get_u64(),
            reason: body.get_u8(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
        out.put_u64(self.match_id);
        out.put_u8(self.reason);
    }
}

impl WireRecord for CancelPending {
    const TYPE: MessageType = MessageType::CancelPending;

    fn decode_body(body: &mut &[u8]) -> Self {
        CancelPending {
            timestamp: body.get_u64(),
            token: get_alpha(body),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
    }
}

impl WireRecord for CancelRejected {
    const TYPE: MessageType = MessageType::CancelRejected;

    fn decode_body(body: &mut &[u8]) -> Self {
        CancelRejected {
            timestamp: body.get_u64(),
            token: get_alpha(body),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
    }
}

impl WireRecord for PriorityUpdate {
    const TYPE: MessageType = MessageType::PriorityUpdate;

    fn decode_body(body: &mut &[u8]) -> Self {
        PriorityUpdate {
            timestamp: body.get_u64(),
            token: get_alpha(body),
            px: body.get_u32(),
            display: body.get_u8(),
            order_id: OrderId(body.get_u64()),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
        out.put_u32(self.px);
        out.put_u8(self.display);
        out.put_u64(self.order_id.0);
    }
}

impl WireRecord for OrderModified {
    const TYPE: MessageType = MessageType::OrderModified;

    fn decode_body(body: &mut &[u8]) -> Self {
        OrderModified {
            timestamp: body.get_u64(),
            token: get_alpha(body),
            side: body.get_u8(),
            qty: body.get_u32(),
        }
    }

    fn encode_body<B: BufMut>(&self, out: &mut B) {
        out.put_u64(self.timestamp);
        out.put_slice(self.token.as_bytes());
        out.put_u8(self.side);
        out.put_u32(self.qty);
    }
}

// -----------------------------------------------------------------------------
// Helpers
// -----------------------------------------------------------------------------

fn get_alpha<const N: usize>(body: &mut &[u8]) -> Alpha<N> {
    let mut out = [0u8; N];
    body.copy_to_slice(&mut out);
    Alpha(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ouch_core::messages::constants;
    use ouch_core::{Side, Token};

    fn token() -> Token {
        "TOKEN00000001".parse().unwrap()
    }

    fn new_order() -> NewOrder {
        NewOrder {
            tif: 0x0102_0304,
            min_qty: 7,
            ..NewOrder::new(token(), Side::Buy, 100, "AAPL".parse().unwrap(), 1_500_000)
        }
    }

    #[test]
    fn new_order_layout_is_packed_big_endian() {
        let mut buf = Vec::new();
        encode_record(&new_order(), &mut buf);

        assert_eq!(buf.len(), 49);
        assert_eq!(buf[0], b'O');
        assert_eq!(&buf[1..15], b"TOKEN00000001 ");
        assert_eq!(buf[15], b'B');
        assert_eq!(&buf[16..20], &[0, 0, 0, 100]);
        assert_eq!(&buf[20..28], b"AAPL    ");
        assert_eq!(&buf[28..32], &1_500_000u32.to_be_bytes());
        assert_eq!(&buf[32..36], &[1, 2, 3, 4]);
        assert_eq!(&buf[43..47], &[0, 0, 0, 7]);
    }

    #[test]
    fn decode_input_reads_native_values() {
        let mut buf = Vec::new();
        encode_input(&InboundMessage::NewOrder(new_order()), &mut buf);
        buf.extend_from_slice(b"trailing");

        let (msg, used) = decode_input(&buf).unwrap();
        assert_eq!(used, 49);
        assert_eq!(msg, InboundMessage::NewOrder(new_order()));
    }

    #[test]
    fn cancel_layout() {
        let mut buf = Vec::new();
        encode_record(&CancelOrder { token: token(), qty: 0x0a0b }, &mut buf);
        assert_eq!(buf.len(), 19);
        assert_eq!(buf[0], b'X');
        assert_eq!(&buf[15..19], &[0, 0, 0x0a, 0x0b]);
    }

    #[test]
    fn ack_layout_places_order_id_after_display() {
        let ack = OrderAck::from_new_order(&new_order(), OrderId(0x0102), 0xAABB);
        let mut buf = Vec::new();
        encode_output(&OutboundMessage::Ack(ack.clone()), &mut buf);

        assert_eq!(buf.len(), 65);
        assert_eq!(buf[0], b'A');
        assert_eq!(&buf[1..9], &0xAABBu64.to_be_bytes());
        assert_eq!(&buf[9..23], b"TOKEN00000001 ");
        assert_eq!(buf[23], b'B');
        assert_eq!(&buf[24..28], &100u32.to_be_bytes());
        assert_eq!(&buf[49..57], &0x0102u64.to_be_bytes());
        assert_eq!(buf[64], constants::ACK_STATE_LIVE);

        assert_eq!(decode_output(&buf).unwrap(), (OutboundMessage::Ack(ack), 65));
    }

    #[test]
    fn rejected_and_canceled_layouts() {
        let mut buf = Vec::new();
        encode_output(
            &OutboundMessage::Rejected(OrderRejected {
                timestamp: 1,
                token: token(),
                reason: constants::REJECT_REASON_TOKEN,
            }),
            &mut buf,
        );
        assert_eq!(buf.len(), 24);
        assert_eq!(buf[0], b'J');
        assert_eq!(buf[23], b'T');

        buf.clear();
        encode_output(
            &OutboundMessage::Canceled(OrderCanceled {
                timestamp: 1,
                token: token(),
                qty: 100,
                reason: constants::CANCEL_REASON_USER,
            }),
            &mut buf,
        );
        assert_eq!(buf.len(), 28);
        assert_eq!(buf[0], b'C');
        assert_eq!(&buf[23..27], &100u32.to_be_bytes());
        assert_eq!(buf[27], b'U');
    }

    #[test]
    fn format_only_records_have_declared_sizes() {
        let samples = [
            OutboundMessage::SystemEvent(SystemEvent {
                timestamp: 5,
                event_code: constants::EVENT_START_OF_DAY,
            }),
            OutboundMessage::Executed(OrderExecuted {
                timestamp: 5,
                token: token(),
                qty: 10,
                px: 20,
                liquidity_flag: constants::LIQUIDITY_ADDED,
                match_id: 99,
            }),
            OutboundMessage::Broken(OrderBroken {
                timestamp: 5,
                token: token(),
                match_id: 99,
                reason: b'E',
            }),
            OutboundMessage::CancelPending(CancelPending { timestamp: 5, token: token() }),
            OutboundMessage::CancelRejected(CancelRejected { timestamp: 5, token: token() }),
            OutboundMessage::PriorityUpdate(PriorityUpdate {
                timestamp: 5,
                token: token(),
                px: 20,
                display: b'Y',
                order_id: OrderId(3),
            }),
            OutboundMessage::Modified(OrderModified {
                timestamp: 5,
                token: token(),
                side: b'S',
                qty: 40,
            }),
        ];

        for msg in samples {
            let mut buf = Vec::new();
            encode_output(&msg, &mut buf);
            let ty = outbound_type(&msg);
            assert_eq!(buf.len(), ty.required_size(), "{ty}");
            assert_eq!(decode_output(&buf).unwrap(), (msg, ty.required_size()));
        }
    }

    #[test]
    fn truncated_and_unknown_inputs() {
        let mut buf = Vec::new();
        encode_record(&CancelOrder { token: token(), qty: 1 }, &mut buf);

        assert_eq!(
            decode_input(&buf[..10]),
            Err(ProtocolError::Truncated {
                needed: 19,
                available: 10
            })
        );
        assert_eq!(
            decode_input(b"Zabc"),
            Err(ProtocolError::UnknownMessageType(b'Z'))
        );
        assert_eq!(
            decode_input(&[]),
            Err(ProtocolError::Truncated {
                needed: 1,
                available: 0
            })
        );
        assert_eq!(
            decode_record::<NewOrder>(&[b'X'; 49]),
            Err(ProtocolError::UnexpectedTag {
                expected: MessageType::NewOrder,
                found: b'X'
            })
        );
    }
}
