//! Per-connection state and I/O tasks.
//!
//! Each accepted socket is split in two:
//! - a reader task that owns the `Connection` (receive buffer, framing,
//!   lifecycle) and forwards decoded messages to the server loop,
//! - a writer task that drains the connection's reply channel and writes
//!   encoded records to the socket.

use std::io;

use bytes::BytesMut;
use ouch_protocol::binary_codec::outbound_type;
use ouch_protocol::{encode_output, next_frame, BufferError, Frame, RwBuffer, NETWORK_RECV_SIZE};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::types::{ConnectionId, ConnectionState, EventTx, OutboundRx, ServerEvent};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("receive buffer: {0}")]
    Buffer(#[from] BufferError),

    #[error("socket: {0}")]
    Io(#[from] io::Error),

    #[error("server event loop has stopped")]
    ServerGone,
}

/// One client connection, from accept to shutdown.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    name: String,
    state: ConnectionState,
    recv_buffer: RwBuffer,
    events: EventTx,
    trace_messages: bool,
}

impl Connection {
    pub fn new(id: ConnectionId, events: EventTx, trace_messages: bool) -> Self {
        Connection {
            id,
            name: String::new(),
            state: ConnectionState::Initial,
            recv_buffer: RwBuffer::default(),
            events,
            trace_messages,
        }
    }

    /// Peer `ip:port`, empty until started.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Configure the accepted socket and move to `Connected`.
    pub fn start(&mut self, stream: &TcpStream, recv_buffer_size: usize) -> Result<(), ConnectionError> {
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;
        self.attach(peer.to_string(), recv_buffer_size)?;
        info!(conn = %self.name, id = %self.id, "connection established");
        Ok(())
    }

    fn attach(&mut self, name: String, recv_buffer_size: usize) -> Result<(), ConnectionError> {
        self.recv_buffer.init(recv_buffer_size)?;
        self.name = name;
        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Free space for the next socket read.
    pub fn read_space(&mut self) -> &mut [u8] {
        self.recv_buffer.write_head()
    }

    /// Handle `n` bytes just read into [`Connection::read_space`].
    ///
    /// Frames and forwards every complete message, then makes room for
    /// the next read. Reads that land after shutdown are ignored.
    pub fn on_read(&mut self, n: usize) -> Result<(), ConnectionError> {
        if self.state != ConnectionState::Connected {
            return Ok(());
        }

        self.recv_buffer.mark_written(n);
        if self.trace_messages {
            info!(
                conn = %self.name,
                xfer = n,
                read_avail = self.recv_buffer.read_avail(),
                "read"
            );
        }

        self.consume_buffer()?;

        if self.recv_buffer.above_high_watermark() {
            warn!(
                conn = %self.name,
                unread = self.recv_buffer.read_avail(),
                high_watermark = self.recv_buffer.high_watermark(),
                "receive buffer above high watermark"
            );
        }

        if let Err(err) = self.recv_buffer.prepare_write(NETWORK_RECV_SIZE) {
            error!(conn = %self.name, error = %err, "receive buffer exhausted");
            self.recv_buffer.clear();
            return Err(err.into());
        }
        Ok(())
    }

    fn consume_buffer(&mut self) -> Result<(), ConnectionError> {
        while let Some(frame) = next_frame(&mut self.recv_buffer) {
            match frame {
                Frame::Message(msg) => {
                    if self.trace_messages {
                        info!(conn = %self.name, ?msg, "received message");
                    }
                    self.events
                        .send(ServerEvent::Inbound {
                            connection: self.id,
                            msg,
                        })
                        .map_err(|_| ConnectionError::ServerGone)?;
                }
                Frame::Incomplete { .. } => break,
                Frame::Unrecognized { tag, available } => {
                    error!(
                        conn = %self.name,
                        len = available,
                        tag = %char::from(tag),
                        "unrecognized message type, discarding input"
                    );
                    self.recv_buffer.mark_read(available);
                    break;
                }
            }
        }
        Ok(())
    }

    /// Move to `Shutdown` and tell the server loop. Safe to call twice.
    pub fn shutdown(&mut self, reason: &str) {
        if self.state == ConnectionState::Shutdown {
            return;
        }
        info!(conn = %self.name, id = %self.id, reason, "connection shutdown");

        self.state = ConnectionState::Shutdown;
        self.recv_buffer.release();
        let _ = self.events.send(ServerEvent::Closed {
            connection: self.id,
        });
    }
}

/// Reader loop: socket → `Connection` → server loop.
pub async fn run_reader(
    mut conn: Connection,
    mut reader: OwnedReadHalf,
    mut shutdown: watch::Receiver<bool>,
) {
    while conn.state() == ConnectionState::Connected {
        if *shutdown.borrow() {
            conn.shutdown("server stopping");
            break;
        }

        let read = tokio::select! {
            res = reader.read(conn.read_space()) => Some(res),
            _ = shutdown.changed() => None,
        };

        match read {
            None => {
                if shutdown.has_changed().is_err() {
                    conn.shutdown("server stopped");
                }
            }
            Some(Ok(0)) => conn.shutdown("peer closed"),
            Some(Ok(n)) => {
                if let Err(err) = conn.on_read(n) {
                    conn.shutdown(&err.to_string());
                }
            }
            Some(Err(err)) => conn.shutdown(&format!("read failed: {err}")),
        }
    }
}

/// Writer loop: reply channel → socket.
///
/// Ends when the server drops the channel or the socket fails.
pub async fn run_writer(
    name: String,
    mut writer: OwnedWriteHalf,
    mut out_rx: OutboundRx,
    trace_messages: bool,
) {
    let mut out = BytesMut::with_capacity(256);

    while let Some(msg) = out_rx.recv().await {
        out.clear();
        encode_output(&msg, &mut out);

        if trace_messages {
            info!(
                conn = %name,
                tag = %char::from(outbound_type(&msg).tag()),
                size = out.len(),
                "sending message"
            );
        }

        if let Err(err) = writer.write_all(&out).await {
            warn!(conn = %name, error = %err, "write failed");
            break;
        }
    }

    if let Err(err) = writer.shutdown().await {
        debug!(conn = %name, error = %err, "socket shutdown");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ouch_core::{CancelOrder, InboundMessage, NewOrder, Side};
    use ouch_protocol::encode_input;
    use tokio::sync::mpsc;

    use crate::types::EventRx;

    const CAPACITY: usize = 8 * 1024;

    fn connected(trace: bool) -> (Connection, EventRx) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut conn = Connection::new(ConnectionId(7), tx, trace);
        conn.attach("127.0.0.1:50000".to_string(), CAPACITY).unwrap();
        (conn, rx)
    }

    fn feed(conn: &mut Connection, bytes: &[u8]) -> Result<(), ConnectionError> {
        conn.read_space()[..bytes.len()].copy_from_slice(bytes);
        conn.on_read(bytes.len())
    }

    fn drain(rx: &mut EventRx) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev);
        }
        out
    }

    fn new_order_bytes(token: &str) -> Vec<u8> {
        let msg = InboundMessage::NewOrder(NewOrder::new(
            token.parse().unwrap(),
            Side::Buy,
            100,
            "AAPL".parse().unwrap(),
            1_500_000,
        ));
        let mut bytes = Vec::new();
        encode_input(&msg, &mut bytes);
        bytes
    }

    #[test]
    fn split_message_is_forwarded_once_complete() {
        let (mut conn, mut rx) = connected(false);
        let bytes = new_order_bytes("SPLIT1");

        feed(&mut conn, &bytes[..3]).unwrap();
        assert!(drain(&mut rx).is_empty());

        feed(&mut conn, &bytes[3..]).unwrap();
        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ServerEvent::Inbound { connection: ConnectionId(7), msg: InboundMessage::NewOrder(n) }
                if n.token.to_string() == "SPLIT1"
        ));
    }

    #[test]
    fn several_messages_in_one_read() {
        let (mut conn, mut rx) = connected(true);
        let mut bytes = new_order_bytes("A");
        encode_input(
            &InboundMessage::CancelOrder(CancelOrder {
                token: "A".parse().unwrap(),
                qty: 0,
            }),
            &mut bytes,
        );
        bytes.extend_from_slice(&new_order_bytes("B")[..10]);

        feed(&mut conn, &bytes).unwrap();
        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            &events[1],
            ServerEvent::Inbound { msg: InboundMessage::CancelOrder(_), .. }
        ));
    }

    #[test]
    fn unrecognized_input_is_discarded() {
        let (mut conn, mut rx) = connected(false);

        feed(&mut conn, b"Zgarbage").unwrap();
        assert!(drain(&mut rx).is_empty());
        assert_eq!(conn.state(), ConnectionState::Connected);

        // The next valid message frames normally.
        feed(&mut conn, &new_order_bytes("AFTER")).unwrap();
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn exhausted_buffer_is_an_error() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut conn = Connection::new(ConnectionId(1), tx, false);
        conn.attach("peer".to_string(), NETWORK_RECV_SIZE + 10).unwrap();

        // A 48-byte partial NewOrder leaves less than one network read of room.
        let partial = &new_order_bytes("X")[..48];
        assert!(matches!(
            feed(&mut conn, partial),
            Err(ConnectionError::Buffer(BufferError::Exhausted { .. }))
        ));
    }

    #[test]
    fn shutdown_is_idempotent_and_reported_once() {
        let (mut conn, mut rx) = connected(false);

        conn.shutdown("test");
        conn.shutdown("again");
        assert_eq!(conn.state(), ConnectionState::Shutdown);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ServerEvent::Closed { connection: ConnectionId(7) }));
    }

    #[test]
    fn reads_after_shutdown_are_ignored() {
        let (mut conn, mut rx) = connected(false);
        conn.shutdown("test");
        drain(&mut rx);

        assert!(conn.on_read(0).is_ok());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn closed_server_loop_is_an_error() {
        let (mut conn, rx) = connected(false);
        drop(rx);
        assert!(matches!(
            feed(&mut conn, &new_order_bytes("LOST")),
            Err(ConnectionError::ServerGone)
        ));
    }
}
