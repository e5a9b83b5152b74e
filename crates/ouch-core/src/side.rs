//! Order side as carried in the OUCH 4.2 `side` byte.

use std::fmt;

/// Order side.
///
/// OUCH 4.2 defines four sides on the wire:
/// `'B'` buy, `'S'` sell, `'T'` sell short, `'E'` sell short exempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
    Short,
    ShortExempt,
}

impl Side {
    /// Every side, in wire-table order.
    pub const ALL: [Side; 4] = [Side::Buy, Side::Sell, Side::Short, Side::ShortExempt];

    /// The wire byte for this side.
    pub fn as_byte(self) -> u8 {
        match self {
            Side::Buy => b'B',
            Side::Sell => b'S',
            Side::Short => b'T',
            Side::ShortExempt => b'E',
        }
    }

    pub fn as_char(self) -> char {
        self.as_byte() as char
    }

    /// Parse a wire byte (case-sensitive).
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            b'B' => Some(Side::Buy),
            b'S' => Some(Side::Sell),
            b'T' => Some(Side::Short),
            b'E' => Some(Side::ShortExempt),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Buy => "Buy",
            Side::Sell => "Sell",
            Side::Short => "Short",
            Side::ShortExempt => "ShortExempt",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
