//! Per-connection receive buffer.
//!
//! A single fixed-capacity byte buffer with separate read and write
//! cursors:
//!
//! ```text
//! 0            read_mark         write_mark            capacity
//! |  consumed  |     unread      |       free          |
//! ```
//!
//! Socket reads land in `write_head()` and are committed with
//! `mark_written`; decoded records are consumed from `read_head()` with
//! `mark_read` / `try_consume`. When the free tail gets too small,
//! `prepare_write` compacts the unread bytes back to offset 0.

use thiserror::Error;
use tracing::trace;

use crate::binary_codec::WireRecord;
use crate::wire_types::NETWORK_RECV_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("receive buffer already initialized")]
    AlreadyInitialized,

    #[error("receive buffer of {capacity} bytes must exceed one network read (1500 bytes)")]
    TooSmall { capacity: usize },

    /// Not enough room even after compaction.
    #[error("need {needed} bytes of write room, {available} available after compaction")]
    Exhausted { needed: usize, available: usize },
}

/// Fixed-capacity read/write buffer.
///
/// A default-constructed buffer has no storage; call [`RwBuffer::init`]
/// before use. Invariant: `read_mark <= write_mark <= capacity`.
#[derive(Debug, Default)]
pub struct RwBuffer {
    storage: Vec<u8>,
    read_mark: usize,
    write_mark: usize,
    low_watermark: usize,
    high_watermark: usize,
}

impl RwBuffer {
    /// Allocate and initialize a buffer in one step.
    pub fn with_capacity(capacity: usize) -> Result<Self, BufferError> {
        let mut buf = RwBuffer::default();
        buf.init(capacity)?;
        Ok(buf)
    }

    /// Allocate `capacity` zeroed bytes.
    ///
    /// Fails if the buffer already has storage, or if `capacity` is not
    /// strictly larger than one network read.
    pub fn init(&mut self, capacity: usize) -> Result<(), BufferError> {
        if self.is_initialized() {
            return Err(BufferError::AlreadyInitialized);
        }
        if capacity <= NETWORK_RECV_SIZE {
            return Err(BufferError::TooSmall { capacity });
        }

        self.storage = vec![0u8; capacity];
        self.read_mark = 0;
        self.write_mark = 0;
        self.low_watermark = NETWORK_RECV_SIZE.max(capacity / 10);
        self.high_watermark = self.low_watermark * 9;
        Ok(())
    }

    /// Free the storage. The buffer can be initialized again afterwards.
    pub fn release(&mut self) {
        *self = RwBuffer::default();
    }

    pub fn is_initialized(&self) -> bool {
        !self.storage.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Free bytes after `write_mark`.
    pub fn write_avail(&self) -> usize {
        self.capacity() - self.write_mark
    }

    /// Unread bytes.
    pub fn read_avail(&self) -> usize {
        self.write_mark - self.read_mark
    }

    /// The unread region `[read_mark, write_mark)`.
    pub fn read_head(&self) -> &[u8] {
        &self.storage[self.read_mark..self.write_mark]
    }

    /// The free region `[write_mark, capacity)`.
    pub fn write_head(&mut self) -> &mut [u8] {
        &mut self.storage[self.write_mark..]
    }

    /// Commit `len` bytes written into `write_head()`.
    ///
    /// # Panics
    /// If `len > write_avail()`.
    pub fn mark_written(&mut self, len: usize) {
        assert!(
            len <= self.write_avail(),
            "mark_written({len}) past capacity (write_avail = {})",
            self.write_avail()
        );
        self.write_mark += len;
    }

    /// Consume `len` unread bytes.
    ///
    /// # Panics
    /// If `len > read_avail()`.
    pub fn mark_read(&mut self, len: usize) {
        assert!(
            len <= self.read_avail(),
            "mark_read({len}) past write mark (read_avail = {})",
            self.read_avail()
        );
        self.read_mark += len;
    }

    /// Make sure at least `len` bytes of write room follow `write_mark`,
    /// compacting if the consumed prefix would make up the difference.
    pub fn prepare_write(&mut self, len: usize) -> Result<(), BufferError> {
        if len > self.write_avail() {
            self.compact();
        }
        if len > self.write_avail() {
            return Err(BufferError::Exhausted {
                needed: len,
                available: self.write_avail(),
            });
        }
        Ok(())
    }

    /// Move the unread region to offset 0.
    pub fn compact(&mut self) {
        let unread = self.read_avail();
        if self.read_mark != 0 {
            self.storage.copy_within(self.read_mark..self.write_mark, 0);
            trace!(moved = unread, from = self.read_mark, "compacted receive buffer");
        }
        self.read_mark = 0;
        self.write_mark = unread;
    }

    /// Copy `data` in after the unread region, compacting if needed.
    pub fn put_slice(&mut self, data: &[u8]) -> Result<(), BufferError> {
        self.prepare_write(data.len())?;
        self.write_head()[..data.len()].copy_from_slice(data);
        self.mark_written(data.len());
        Ok(())
    }

    /// Decode the next `T` and consume its bytes, or `None` if fewer
    /// than `T::SIZE` bytes are unread. Nothing is consumed on `None`.
    ///
    /// The caller has already matched the tag byte against `T`.
    pub fn try_consume<T: WireRecord>(&mut self) -> Option<T> {
        if self.read_avail() < T::SIZE {
            return None;
        }

        let head = self.read_head();
        debug_assert_eq!(head[0], T::TYPE.tag());
        let mut body = &head[1..T::SIZE];
        let record = T::decode_body(&mut body);

        self.mark_read(T::SIZE);
        Some(record)
    }

    /// Drop everything, read or not.
    pub fn clear(&mut self) {
        self.read_mark = 0;
        self.write_mark = 0;
    }

    pub fn low_watermark(&self) -> usize {
        self.low_watermark
    }

    pub fn high_watermark(&self) -> usize {
        self.high_watermark
    }

    /// Whether unread data has piled up past the high watermark.
    pub fn above_high_watermark(&self) -> bool {
        self.read_avail() > self.high_watermark
    }
}
