//! Log output over a bridge channel.
//!
//! Formats [`LogEntry`] values and writes them to any [`CharStream`]. On the
//! firmware this is the debug channel, drained whenever the polling loop has
//! nothing else to do.
//!
//! ```text
//! LogStream ──▶ format_log_entry ──▶ debug UART ──▶ PC serial monitor
//! ```

use crate::channel::CharStream;
use crate::logging::{format_to_buffer, LogEntry, LogStream};

/// Size of the per-line format buffer.
pub const LINE_BUF_SIZE: usize = 160;

/// Format log entry into `buf`.
///
/// Format: `[timestamp_ms] LEVEL: message\r\n`
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let (len, _) = format_to_buffer(
        buf,
        format_args!(
            "[{:10}] {}: {}\r\n",
            entry.timestamp_ms,
            entry.level.as_str(),
            entry.message()
        ),
    );
    len
}

/// Write one log entry to a channel.
pub fn write_log_entry<S: CharStream + ?Sized>(out: &mut S, entry: &LogEntry) -> usize {
    let mut format_buf = [0u8; LINE_BUF_SIZE];
    let len = format_log_entry(entry, &mut format_buf);
    out.write(&format_buf[..len])
}

/// Drain up to `max_entries` entries from `log` into `out`.
///
/// If messages were dropped since the last report, a warning line with the
/// count goes out first and the counter is reset. Returns the number of
/// entries written (the drop report is not counted).
pub fn drain_log<S: CharStream + ?Sized, const N: usize>(
    log: &LogStream<N>,
    out: &mut S,
    max_entries: usize,
) -> usize {
    let dropped = log.dropped();
    if dropped > 0 {
        let mut msg = [0u8; 48];
        let (len, _) = format_to_buffer(&mut msg, format_args!("[WARN] Dropped: {}\r\n", dropped));
        out.write(&msg[..len]);
        log.reset_dropped();
    }

    let mut written = 0;
    while written < max_entries {
        let Some(entry) = log.drain() else { break };
        write_log_entry(out, &entry);
        written += 1;
    }
    written
}
