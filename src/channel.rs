//! Character stream abstraction.
//!
//! Everything the bridge touches goes through [`CharStream`]: hardware UARTs,
//! in-memory pipes on the host, or [`NoStream`] when a handle is not wired up.
//!
//! # Contract
//!
//! ```text
//! available() ──▶ how many bytes can be read right now (never blocks)
//! read()      ──▶ next byte, or None
//! peek()      ──▶ next byte without consuming it
//! write()     ──▶ bytes accepted by the channel
//! ```
//!
//! The bridge never opens, configures or closes a channel. Lifecycle belongs
//! to whoever constructed it.

use alloc::collections::VecDeque;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::config::LineEnding;

/// Byte-oriented channel with non-blocking availability queries.
pub trait CharStream {
    /// Number of bytes that can be read without blocking.
    fn available(&self) -> usize;

    /// Read one byte. Returns `None` if nothing is buffered.
    fn read(&mut self) -> Option<u8>;

    /// Look at the next byte without consuming it.
    fn peek(&self) -> Option<u8>;

    /// Write bytes. Returns the number of bytes accepted.
    fn write(&mut self, bytes: &[u8]) -> usize;

    /// Write text.
    fn write_str(&mut self, text: &str) -> usize {
        self.write(text.as_bytes())
    }

    /// Write text followed by a line terminator.
    fn write_line(&mut self, text: &[u8], ending: LineEnding) -> usize {
        self.write(text) + self.write(ending.as_bytes())
    }
}

impl<T: CharStream + ?Sized> CharStream for &mut T {
    fn available(&self) -> usize {
        (**self).available()
    }

    fn read(&mut self) -> Option<u8> {
        (**self).read()
    }

    fn peek(&self) -> Option<u8> {
        (**self).peek()
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        (**self).write(bytes)
    }
}

/// Drain every currently available byte from `stream` into `out`.
///
/// This is the one primitive both front-ends share: the framed protocol
/// uses it to collect a response, the relay to build one chunk.
///
/// Returns the number of bytes appended, at most `limit`. Stops as soon as
/// the stream reports nothing available, so a response split across reads
/// is simply picked up by the next call. The limit keeps a source that never
/// runs dry from holding the caller past its deadline.
pub fn drain_available<S: CharStream + ?Sized>(stream: &mut S, out: &mut Vec<u8>, limit: usize) -> usize {
    let start = out.len();
    while out.len() - start < limit && stream.available() > 0 {
        match stream.read() {
            Some(byte) => out.push(byte),
            None => break,
        }
    }
    out.len() - start
}

/// `core::fmt::Write` adapter over a channel, for console output.
///
/// Newlines go out as `\r\n` so serial terminals return the carriage.
pub struct FmtWriter<'a, S: CharStream + ?Sized>(pub &'a mut S);

impl<'a, S: CharStream + ?Sized> core::fmt::Write for FmtWriter<'a, S> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let mut lines = s.split('\n');
        if let Some(first) = lines.next() {
            self.0.write_str(first);
        }
        for line in lines {
            self.0.write(b"\r\n");
            self.0.write_str(line);
        }
        Ok(())
    }
}

/// Placeholder for an unset channel handle.
///
/// Never has data, swallows nothing (reports zero bytes written).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStream;

impl CharStream for NoStream {
    fn available(&self) -> usize {
        0
    }

    fn read(&mut self) -> Option<u8> {
        None
    }

    fn peek(&self) -> Option<u8> {
        None
    }

    fn write(&mut self, _bytes: &[u8]) -> usize {
        0
    }
}

/// I/O counters kept by [`MemoryStream`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamCounters {
    /// Successful `read()` calls.
    pub reads: usize,
    /// `write()` calls (including empty writes).
    pub writes: usize,
    /// Bytes accepted by `write()`.
    pub bytes_written: usize,
}

/// In-memory channel: a host-side pipe.
///
/// `rx` holds bytes waiting to be read by the bridge, `tx` collects what the
/// bridge wrote. Reads can be split into bursts so that a drain stops after
/// each burst, the way a UART FIFO runs dry between incoming packets.
#[derive(Debug, Default, Clone)]
pub struct MemoryStream {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    /// Bytes exposed per burst. `None` exposes the whole rx queue.
    burst: Option<usize>,
    /// Bytes left in the current burst.
    remaining: usize,
    /// Set when a burst was just exhausted; the next `available()` reports 0.
    gap: Cell<bool>,
    counters: StreamCounters,
}

impl MemoryStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream with `input` waiting to be read.
    pub fn with_input(input: &[u8]) -> Self {
        let mut stream = Self::new();
        stream.feed(input);
        stream
    }

    /// Only expose `burst` bytes at a time. Once a burst has been read the
    /// stream reports nothing available for one query, then exposes the next.
    pub fn with_burst(mut self, burst: usize) -> Self {
        self.burst = Some(burst.max(1));
        self.remaining = 0;
        self
    }

    /// Queue more bytes for the bridge to read.
    pub fn feed(&mut self, input: &[u8]) {
        self.rx.extend(input.iter().copied());
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Take and clear everything written so far.
    pub fn take_written(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }

    /// Bytes still waiting in the rx queue, exposed or not.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// I/O counters.
    pub fn counters(&self) -> StreamCounters {
        self.counters
    }

    fn visible(&self) -> usize {
        match self.burst {
            None => self.rx.len(),
            Some(_) if self.remaining > 0 => self.remaining,
            Some(burst) => self.rx.len().min(burst),
        }
    }
}

impl CharStream for MemoryStream {
    fn available(&self) -> usize {
        if self.gap.replace(false) {
            return 0;
        }
        self.visible()
    }

    fn read(&mut self) -> Option<u8> {
        let visible = self.visible();
        if visible == 0 {
            return None;
        }
        let byte = self.rx.pop_front()?;
        self.counters.reads += 1;
        if self.burst.is_some() {
            self.remaining = visible - 1;
            self.gap.set(self.remaining == 0);
        }
        Some(byte)
    }

    fn peek(&self) -> Option<u8> {
        if self.visible() == 0 {
            return None;
        }
        self.rx.front().copied()
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        self.counters.writes += 1;
        self.counters.bytes_written += bytes.len();
        self.tx.extend_from_slice(bytes);
        bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_available_collects_everything() {
        let mut stream = MemoryStream::with_input(b"hello");
        let mut out = Vec::new();

        assert_eq!(drain_available(&mut stream, &mut out, 64), 5);
        assert_eq!(out, b"hello");
        assert_eq!(stream.available(), 0);
    }

    #[test]
    fn test_burst_limits_available() {
        let mut stream = MemoryStream::with_input(b"abcde").with_burst(2);

        assert_eq!(stream.available(), 2);
        let mut out = Vec::new();
        assert_eq!(drain_available(&mut stream, &mut out, 64), 2);
        assert_eq!(out, b"ab");

        // next burst is visible on the following query
        assert_eq!(stream.available(), 2);
        assert_eq!(stream.peek(), Some(b'c'));
    }

    #[test]
    fn test_drain_available_stops_at_limit() {
        let mut stream = MemoryStream::with_input(b"abcdef");
        let mut out = Vec::new();

        assert_eq!(drain_available(&mut stream, &mut out, 4), 4);
        assert_eq!(out, b"abcd");
        assert_eq!(stream.pending(), 2);
    }

    #[test]
    fn test_write_line_appends_ending() {
        let mut stream = MemoryStream::new();
        stream.write_line(b"ok", LineEnding::CrLf);
        assert_eq!(stream.written(), b"ok\r\n");
        assert_eq!(stream.counters().writes, 2);
    }

    #[test]
    fn test_fmt_writer_expands_newlines() {
        use core::fmt::Write;

        let mut stream = MemoryStream::new();
        let _ = writeln!(FmtWriter(&mut stream), "a\nb");
        assert_eq!(stream.written(), b"a\r\nb\r\n");
    }

    #[test]
    fn test_no_stream_is_inert() {
        let mut stream = NoStream;
        assert_eq!(stream.available(), 0);
        assert_eq!(stream.read(), None);
        assert_eq!(stream.write(b"x"), 0);
    }
}
