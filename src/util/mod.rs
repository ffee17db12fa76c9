//! Utility Functions Module
//!
//! Helpers shared by the codec, the property interpreter and the prober.
//!
//! # Overview
//!
//! Utilities provided include:
//! - A bounds-checked big-endian reader over a byte slice
//! - Hex formatting for payloads and frame dumps
//! - Decimal rendering of big-endian integers of any width
//! - Communication statistics for a probe run
//!
//! # Example
//!
//! ```
//! use echonet_probe::util::{be_unsigned_decimal, Buffer};
//!
//! let data = [0x00, 0x02, 0x01, 0x02];
//! let mut buffer = Buffer::new(&data);
//! let len = buffer.read_u8().unwrap() as usize + 2;
//! assert_eq!(buffer.read_bytes(len), Some(&[0x02, 0x01][..]));
//! assert_eq!(buffer.remaining(), 1);
//! assert_eq!(be_unsigned_decimal(&[0x01, 0x00]), "256");
//! ```

#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec::Vec};

/// Buffer utilities for reading data
pub struct Buffer<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Buffer<'a> {
    /// Create a new buffer reader
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Get remaining bytes
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if buffer has at least n bytes remaining
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Option<u8> {
        if self.has_remaining(1) {
            let value = self.data[self.position];
            self.position += 1;
            Some(value)
        } else {
            None
        }
    }

    /// Read n bytes
    pub fn read_bytes(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.has_remaining(n) {
            let bytes = &self.data[self.position..self.position + n];
            self.position += n;
            Some(bytes)
        } else {
            None
        }
    }
}

/// Lower-case hex string of a payload, e.g. `abcd`
pub fn to_hex(data: &[u8]) -> String {
    hex::encode(data)
}

/// Hex dump utility for debugging
///
/// Produces one line per 16 bytes with an offset column and an ASCII gutter.
pub fn hex_dump(data: &[u8], prefix: &str) -> String {
    let mut result = String::new();

    for (i, chunk) in data.chunks(16).enumerate() {
        result.push_str(prefix);
        result.push_str(&format!("{:04X}: ", i * 16));

        for (j, byte) in chunk.iter().enumerate() {
            if j == 8 {
                result.push(' ');
            }
            result.push_str(&format!("{:02X} ", byte));
        }

        for j in chunk.len()..16 {
            if j == 8 {
                result.push(' ');
            }
            result.push_str("   ");
        }

        result.push_str(" |");

        for byte in chunk {
            if byte.is_ascii_graphic() || *byte == b' ' {
                result.push(*byte as char);
            } else {
                result.push('.');
            }
        }

        result.push_str("|\n");
    }

    result
}

/// Decimal digits of a big-endian unsigned integer of any width.
///
/// An empty slice is zero.
pub fn be_unsigned_decimal(data: &[u8]) -> String {
    // Base-256 digits, most significant first, without leading zeros
    let mut digits: Vec<u8> = data.iter().copied().skip_while(|&b| b == 0).collect();
    if digits.is_empty() {
        return "0".into();
    }

    let mut decimal = Vec::new();
    while !digits.is_empty() {
        let mut remainder = 0u16;
        for digit in digits.iter_mut() {
            let acc = (remainder << 8) | *digit as u16;
            *digit = (acc / 10) as u8;
            remainder = acc % 10;
        }
        decimal.push(b'0' + remainder as u8);

        let leading = digits.iter().take_while(|&&b| b == 0).count();
        digits.drain(..leading);
    }

    decimal.iter().rev().map(|&d| d as char).collect()
}

/// Sign and decimal magnitude of a big-endian two's-complement integer of
/// any width, e.g. `[0xFF, 0xF6]` is `(true, "10")`.
///
/// Returns `None` for an empty slice.
pub fn be_signed_decimal(data: &[u8]) -> Option<(bool, String)> {
    let negative = *data.first()? & 0x80 != 0;
    if !negative {
        return Some((false, be_unsigned_decimal(data)));
    }

    // Magnitude is the two's complement: invert, then add one
    let mut magnitude: Vec<u8> = data.iter().map(|b| !b).collect();
    for byte in magnitude.iter_mut().rev() {
        let (sum, carry) = byte.overflowing_add(1);
        *byte = sum;
        if !carry {
            break;
        }
    }
    Some((true, be_unsigned_decimal(&magnitude)))
}

/// Communication statistics for a probe run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommunicationStats {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub errors: u64,
    pub timeouts: u64,
}

impl CommunicationStats {
    /// Create new statistics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sent message
    pub fn record_sent(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    /// Record a received message
    pub fn record_received(&mut self, bytes: usize) {
        self.messages_received += 1;
        self.bytes_received += bytes as u64;
    }

    /// Record an error
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Record a timeout
    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    /// Get success rate percentage
    pub fn success_rate(&self) -> f64 {
        let total = self.messages_sent as f64;
        if total == 0.0 {
            return 100.0;
        }
        let failures = (self.errors + self.timeouts) as f64;
        ((total - failures) / total) * 100.0
    }
}
