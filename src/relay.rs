//! Time-bounded relay between two channels.
//!
//! # Window
//!
//! ```text
//! src.available() < min ──▶ return (no I/O at all)
//!
//! start ─┬─ drain ≤ max_chunk ─▶ write chunk + EOL ─┬─ ... ─┤ start + window
//!        └────────── deadline checked every chunk ──┘
//! ```
//!
//! Each chunk is whatever `src` had buffered at that moment (capped at
//! `max_chunk`), written as one line. The deadline is checked before every
//! chunk, so a source that never runs dry still ends the window on time. Chunk boundaries follow the reads, not the sender's lines, so a
//! line can be split or merged with the next one.

use alloc::vec::Vec;

use crate::channel::{drain_available, CharStream};
use crate::clock::{Clock, Deadline};
use crate::config::BridgeConfig;

/// What one relay window moved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// Lines written to the destination.
    pub chunks: usize,
    /// Payload bytes copied (terminators excluded).
    pub bytes: usize,
}

impl RelayStats {
    /// True when nothing was copied.
    pub fn is_idle(&self) -> bool {
        self.chunks == 0
    }
}

impl core::ops::Add for RelayStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            chunks: self.chunks + rhs.chunks,
            bytes: self.bytes + rhs.bytes,
        }
    }
}

/// Copy everything `src` offers to `dst` for one relay window.
///
/// Does nothing unless `src` already holds `config.relay_min_available`
/// bytes on entry; bytes arriving later wait for the next call.
pub fn push_me_pull_you<A, B, K>(src: &mut A, dst: &mut B, clock: &K, config: &BridgeConfig) -> RelayStats
where
    A: CharStream + ?Sized,
    B: CharStream + ?Sized,
    K: Clock + ?Sized,
{
    let mut stats = RelayStats::default();
    if src.available() < config.relay_min_available {
        return stats;
    }

    let window = Deadline::after(clock, config.relay_window_ms);
    let mut chunk = Vec::new();
    while !window.expired(clock) {
        chunk.clear();
        if drain_available(src, &mut chunk, config.max_chunk) == 0 {
            continue;
        }
        dst.write_line(&chunk, config.line_ending);
        stats.chunks += 1;
        stats.bytes += chunk.len();
    }
    stats
}
