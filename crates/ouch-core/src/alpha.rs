//! Fixed-width alphanumeric fields.
//!
//! OUCH alpha fields are left-justified and padded on the right with
//! spaces. The bytes are carried verbatim: the server never interprets
//! a token, it only compares and echoes it.

use std::fmt;
use std::str::FromStr;

use crate::error::AlphaError;

/// A fixed-width, space-padded byte string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alpha<const N: usize>(pub [u8; N]);

/// Client order token (14 bytes).
pub type Token = Alpha<14>;

/// Instrument symbol (8 bytes).
pub type Symbol = Alpha<8>;

/// Market participant identifier (4 bytes).
pub type Mpid = Alpha<4>;

impl<const N: usize> Alpha<N> {
    pub const WIDTH: usize = N;

    /// An all-spaces field.
    pub const fn blank() -> Self {
        Alpha([b' '; N])
    }

    /// Build a field from `s`, padding with spaces.
    ///
    /// Input longer than `N` bytes is rejected rather than truncated, so
    /// two distinct tokens can never collapse onto the same wire value.
    pub fn new(s: &str) -> Result<Self, AlphaError> {
        let src = s.as_bytes();
        if src.len() > N {
            return Err(AlphaError::TooLong {
                width: N,
                len: src.len(),
            });
        }

        let mut out = [b' '; N];
        out[..src.len()].copy_from_slice(src);
        Ok(Alpha(out))
    }

    pub fn from_bytes(bytes: [u8; N]) -> Self {
        Alpha(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// The field with trailing padding removed.
    pub fn trimmed(&self) -> &[u8] {
        let end = self
            .0
            .iter()
            .rposition(|&b| b != b' ' && b != 0)
            .map_or(0, |i| i + 1);
        &self.0[..end]
    }
}

impl<const N: usize> Default for Alpha<N> {
    fn default() -> Self {
        Self::blank()
    }
}

impl<const N: usize> FromStr for Alpha<N> {
    type Err = AlphaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Alpha::new(s)
    }
}

impl<const N: usize> fmt::Display for Alpha<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(self.trimmed()))
    }
}

impl<const N: usize> fmt::Debug for Alpha<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}
