//! ouch-protocol
//!
//! Wire-level handling of the OUCH 4.2 order-entry protocol.
//!
//! This crate is responsible for turning `ouch_core` message records into
//! bytes and back again, and for carving complete messages out of a TCP
//! byte stream.
//!
//! - [`wire_types`]   : tag bytes and record sizes
//! - [`binary_codec`] : fixed-layout record encode/decode
//! - [`rw_buffer`]    : per-connection receive buffer
//! - [`framing`]      : partial-read aware message framing

pub mod wire_types;
pub mod binary_codec;
pub mod rw_buffer;
pub mod framing;

pub use binary_codec::{
    ProtocolError,
    WireRecord,
    decode_input,
    encode_input,
    decode_output,
    encode_output,
};
pub use framing::{next_frame, Frame};
pub use rw_buffer::{BufferError, RwBuffer};
pub use wire_types::{message_size, MessageType, NETWORK_RECV_SIZE};
