//! Global log stream instance.
//!
//! The bridge runs in one cooperative loop, so one stream is enough:
//! the engine and listener produce, the firmware loop drains it to the
//! debug channel.

use crate::logging::LogStream;

/// Bridge log stream.
///
/// Single producer (the polling loop), single consumer (the log drain).
pub static BRIDGE_LOG_STREAM: LogStream = LogStream::new();
