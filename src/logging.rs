//! Non-blocking logging for the bridge.
//!
//! # Architecture
//!
//! ```text
//! Bridge loop            LogStream             Drain (debug channel)
//! ───────────            ─────────             ─────────────────────
//!
//! bridge_log!() ──────▶ [L0][L1][L2] ──────▶ CharStream::write
//! stack format           lock-free ring        when the loop is idle
//! never blocks           fixed entries
//! ```
//!
//! # Rules
//!
//! - Logging never blocks the relay or the settle window
//! - Any number of producers per stream, drained by one loop
//! - Messages are dropped (and counted) when the ring is full
//! - Messages below the stream's level are discarded before formatting

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 120;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Convert from raw u8 value (saturates at Trace).
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a level name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
        .into_iter()
        .find(|level| level.as_str().eq_ignore_ascii_case(name))
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Bridge clock time in milliseconds.
    pub timestamp_ms: u64,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        timestamp_ms: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text. Invalid UTF-8 (cut mid-character) is trimmed.
    pub fn message(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// One ring slot. `seq` tells producers and the consumer whose turn it is.
struct Slot {
    seq: AtomicU32,
    entry: UnsafeCell<LogEntry>,
}

impl Slot {
    const fn new(seq: u32) -> Self {
        Self {
            seq: AtomicU32::new(seq),
            entry: UnsafeCell::new(LogEntry::EMPTY),
        }
    }
}

/// Lock-free log ring. Any number of producers, drained by one loop.
///
/// Each slot carries a sequence stamp: `pos` when free for the producer
/// claiming position `pos`, `pos + 1` once filled, `pos + N` after it was
/// drained. A position is claimed with a CAS on the index, so two
/// producers never own the same slot.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    slots: [Slot; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
    level: AtomicU8,
}

// SAFETY: A slot's entry is only touched by the thread that won the CAS on
// write_idx (or read_idx) for that position, and only while the slot's
// stamp grants it. Stamps are published with Release and read with Acquire.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream that keeps `Info` and above.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        const FREE: Slot = Slot::new(0);
        let mut slots = [FREE; N];
        let mut i = 0;
        while i < N {
            slots[i] = Slot::new(i as u32);
            i += 1;
        }

        Self {
            slots,
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Most verbose level still recorded.
    #[inline]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed))
    }

    /// Change the most verbose level still recorded.
    #[inline]
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    /// Would a message at `level` be recorded?
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level <= self.level()
    }

    /// Push a log entry (never blocks, safe from any number of threads).
    ///
    /// Returns `true` if message was queued, `false` if filtered or dropped
    /// (ring full).
    pub fn push(&self, timestamp_ms: u64, level: LogLevel, msg: &[u8]) -> bool {
        if !self.enabled(level) {
            return false;
        }

        let mut pos = self.write_idx.load(Ordering::Relaxed);
        let slot = loop {
            let slot = &self.slots[(pos as usize) & Self::MASK];
            let lag = slot.seq.load(Ordering::Acquire).wrapping_sub(pos) as i32;

            if lag == 0 {
                match self.write_idx.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => break slot,
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                // slot still holds an undrained entry from the previous lap
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            } else {
                pos = self.write_idx.load(Ordering::Relaxed);
            }
        };

        // SAFETY: The CAS above made this thread the only owner of `pos`,
        // and the consumer will not read the slot until the stamp below.
        unsafe {
            let entry = &mut *slot.entry.get();
            entry.timestamp_ms = timestamp_ms;
            entry.level = level;
            entry.len = msg.len().min(MAX_MSG_LEN) as u8;
            entry.msg[..entry.len as usize].copy_from_slice(&msg[..entry.len as usize]);
        }

        slot.seq.store(pos.wrapping_add(1), Ordering::Release);
        true
    }

    /// Drain next log entry.
    ///
    /// Returns `None` if no entries available. An entry whose producer is
    /// still writing it counts as not available yet.
    pub fn drain(&self) -> Option<LogEntry> {
        let mut pos = self.read_idx.load(Ordering::Relaxed);
        loop {
            let slot = &self.slots[(pos as usize) & Self::MASK];
            let lag = slot.seq.load(Ordering::Acquire).wrapping_sub(pos.wrapping_add(1)) as i32;

            if lag == 0 {
                match self.read_idx.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: Filled stamp observed with Acquire, and the
                        // CAS made this thread the only reader of `pos`.
                        let entry = unsafe { *slot.entry.get() };
                        slot.seq.store(pos.wrapping_add(N as u32), Ordering::Release);
                        return Some(entry);
                    }
                    Err(current) => pos = current,
                }
            } else if lag < 0 {
                return None;
            } else {
                pos = self.read_idx.load(Ordering::Relaxed);
            }
        }
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    /// Check if there are entries to drain.
    #[inline]
    pub fn has_entries(&self) -> bool {
        self.pending() > 0
    }

    /// Entries claimed by producers and not drained yet.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Acquire);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a message into a buffer, cutting it at the buffer's end.
///
/// Returns the number of bytes written and whether anything was cut.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> (usize, bool) {
    use core::fmt::Write;

    struct BufWriter<'a> {
        buf: &'a mut [u8],
        pos: usize,
        truncated: bool,
    }

    impl<'a> Write for BufWriter<'a> {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let bytes = s.as_bytes();
            let remaining = self.buf.len() - self.pos;
            let to_write = bytes.len().min(remaining);
            self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
            if to_write < bytes.len() {
                self.truncated = true;
            }
            Ok(())
        }
    }

    let mut writer = BufWriter {
        buf,
        pos: 0,
        truncated: false,
    };
    let _ = core::fmt::write(&mut writer, args);
    (writer.pos, writer.truncated)
}

/// Non-blocking log macro.
///
/// # Example
///
/// ```ignore
/// bridge_log!(LogLevel::Info, BRIDGE_LOG_STREAM, now_ms, "frame {} bytes", len);
/// ```
#[macro_export]
macro_rules! bridge_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let level = $level;
        if $stream.enabled(level) {
            let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
            let (len, _) = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
            $stream.push($timestamp, level, &buf[..len]);
        }
    }};
}

#[macro_export]
macro_rules! bridge_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::bridge_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! bridge_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::bridge_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! bridge_error {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::bridge_log!($crate::logging::LogLevel::Error, $stream, $timestamp, $($arg)*)
    };
}

#[macro_export]
macro_rules! bridge_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::bridge_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

/// Maximum verbosity.
#[macro_export]
macro_rules! bridge_trace {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::bridge_log!($crate::logging::LogLevel::Trace, $stream, $timestamp, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_stream_basic() {
        let stream = LogStream::<16>::new();

        assert!(stream.push(1000, LogLevel::Info, b"test message"));
        assert!(stream.has_entries());
        assert_eq!(stream.pending(), 1);

        let entry = stream.drain().unwrap();
        assert_eq!(entry.timestamp_ms, 1000);
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message(), "test message");

        assert!(!stream.has_entries());
    }

    #[test]
    fn test_log_stream_full() {
        let stream = LogStream::<4>::new();

        assert!(stream.push(1, LogLevel::Info, b"1"));
        assert!(stream.push(2, LogLevel::Info, b"2"));
        assert!(stream.push(3, LogLevel::Info, b"3"));
        assert!(stream.push(4, LogLevel::Info, b"4"));

        // Should drop
        assert!(!stream.push(5, LogLevel::Info, b"5"));
        assert_eq!(stream.dropped(), 1);

        // Ring still intact: oldest first
        assert_eq!(stream.drain().unwrap().message(), "1");
        assert!(stream.push(6, LogLevel::Info, b"6"));
        assert_eq!(stream.pending(), 4);
    }

    #[test]
    fn test_level_filter() {
        let stream = LogStream::<8>::new();

        assert!(!stream.push(1, LogLevel::Debug, b"hidden"));
        assert_eq!(stream.dropped(), 0);

        stream.set_level(LogLevel::Trace);
        assert!(stream.push(2, LogLevel::Debug, b"shown"));
    }

    #[test]
    fn test_macro_respects_level() {
        let stream = LogStream::<8>::new();
        crate::bridge_debug!(stream, 1, "x={}", 1);
        assert!(!stream.has_entries());

        crate::bridge_warn!(stream, 2, "x={}", 2);
        assert_eq!(stream.drain().unwrap().message(), "x=2");
    }

    #[test]
    fn test_format_to_buffer() {
        let mut buf = [0u8; 32];
        let (len, truncated) = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hello 42");
        assert!(!truncated);
    }

    #[test]
    fn test_format_to_buffer_truncates() {
        let mut buf = [0u8; 4];
        let (len, truncated) = format_to_buffer(&mut buf, format_args!("Hello {}", 42));
        assert_eq!(&buf[..len], b"Hell");
        assert!(truncated);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("WARN"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn test_producer_consumer_threads() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<64>::new());
        let producer = {
            let stream = Arc::clone(&stream);
            thread::spawn(move || {
                let mut sent = 0;
                for j in 0..200u64 {
                    let msg = format!("msg {}", j);
                    if stream.push(j, LogLevel::Info, msg.as_bytes()) {
                        sent += 1;
                    }
                }
                sent
            })
        };

        let mut received = 0;
        let mut last = None;
        while !producer.is_finished() || stream.has_entries() {
            if let Some(entry) = stream.drain() {
                // order preserved
                if let Some(prev) = last {
                    assert!(entry.timestamp_ms > prev);
                }
                last = Some(entry.timestamp_ms);
                received += 1;
            }
        }

        let sent = producer.join().unwrap();
        assert_eq!(received, sent);
        assert_eq!(sent + stream.dropped() as usize, 200);
    }

    #[test]
    fn test_concurrent_producers_keep_every_message() {
        use std::sync::Arc;
        use std::thread;

        let stream = Arc::new(LogStream::<256>::new());
        let producers: Vec<_> = (0..4u64)
            .map(|t| {
                let stream = Arc::clone(&stream);
                thread::spawn(move || {
                    for j in 0..50u64 {
                        let msg = format!("t{} m{}", t, j);
                        assert!(stream.push(t * 1000 + j, LogLevel::Info, msg.as_bytes()));
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let mut seen = Vec::new();
        while let Some(entry) = stream.drain() {
            // every slot holds exactly the message its producer wrote
            let t = entry.timestamp_ms / 1000;
            let j = entry.timestamp_ms % 1000;
            assert_eq!(entry.message(), format!("t{} m{}", t, j));
            seen.push(entry.timestamp_ms);
        }

        seen.sort_unstable();
        let expected: Vec<u64> = (0..4u64).flat_map(|t| (0..50u64).map(move |j| t * 1000 + j)).collect();
        assert_eq!(seen, expected);
        assert_eq!(stream.dropped(), 0);
    }
}
