//! Stream framing for inbound messages.
//!
//! A TCP stream delivers bytes in arbitrary chunks. The tag byte at the
//! read position fixes the record size, so a message is complete once
//! that many bytes are buffered. Until then nothing is consumed and the
//! next read simply extends the same partial record.

use ouch_core::{CancelOrder, InboundMessage, NewOrder};

use crate::rw_buffer::RwBuffer;
use crate::wire_types::MessageType;

/// Outcome of one framing attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A complete message; its bytes have been consumed.
    Message(InboundMessage),

    /// The tag is known but the record is not fully buffered yet.
    Incomplete {
        kind: MessageType,
        needed: usize,
        available: usize,
    },

    /// The tag byte is not an inbound message type. Nothing consumed.
    Unrecognized { tag: u8, available: usize },
}

/// Frame the next message at the buffer's read position.
///
/// Returns `None` when no unread bytes remain.
pub fn next_frame(buf: &mut RwBuffer) -> Option<Frame> {
    let available = buf.read_avail();
    let tag = *buf.read_head().first()?;

    let Some(kind) = MessageType::inbound_from_tag(tag) else {
        return Some(Frame::Unrecognized { tag, available });
    };

    let msg = match kind {
        MessageType::NewOrder => buf.try_consume::<NewOrder>().map(InboundMessage::NewOrder),
        MessageType::CancelOrder => buf
            .try_consume::<CancelOrder>()
            .map(InboundMessage::CancelOrder),
        _ => None,
    };

    Some(match msg {
        Some(msg) => Frame::Message(msg),
        None => Frame::Incomplete {
            kind,
            needed: kind.required_size(),
            available,
        },
    })
}
