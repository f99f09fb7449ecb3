//! Fixed-capacity line buffer.
//!
//! Holds at most `N - 1` payload bytes: one slot stays reserved for the
//! terminator the C-side listener used to write, so a 64-byte buffer carries
//! 63 characters. Bytes past that are refused, never silently dropped.

use crate::config::DEFAULT_LISTENER_CAPACITY;

/// Line input buffer
pub struct LineBuffer<const N: usize = DEFAULT_LISTENER_CAPACITY> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> LineBuffer<N> {
    /// Payload bytes the buffer accepts.
    pub const LIMIT: usize = N - 1;

    /// Create empty buffer
    pub const fn new() -> Self {
        assert!(N >= 2, "Line buffer needs room for one byte plus terminator");
        Self {
            buf: [0u8; N],
            len: 0,
        }
    }

    /// Push a byte. Returns `false` (and keeps the buffer unchanged) when full.
    pub fn push(&mut self, c: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buf[self.len] = c;
        self.len += 1;
        true
    }

    /// Remove last byte
    pub fn backspace(&mut self) {
        if self.len > 0 {
            self.len -= 1;
        }
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Set buffer contents from string. Returns `false` if it had to be cut.
    pub fn set(&mut self, s: &str) -> bool {
        let bytes = s.as_bytes();
        let copy_len = bytes.len().min(Self::LIMIT);
        self.buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
        self.len = copy_len;
        copy_len == bytes.len()
    }

    /// Buffer as text. A multibyte character cut at the limit is dropped.
    pub fn as_str(&self) -> &str {
        let bytes = self.as_bytes();
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }

    /// Get buffer length
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// No room for another payload byte.
    pub fn is_full(&self) -> bool {
        self.len >= Self::LIMIT
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}
