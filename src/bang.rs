//! The bridge engine.
//!
//! [`Bang`] owns the two channels it was built with: the command channel to
//! the host agent, and an optional debug channel that mirrors traffic. Both
//! are fixed at construction and never swapped.
//!
//! # Usage
//!
//! ```ignore
//! let mut bang = Bang::with_debug(cmd_uart, dbg_uart, EspClock)
//!     .with_log(&BRIDGE_LOG_STREAM);
//!
//! let listing = bang.exec("ls -la");
//! bang.write_file("notes.txt", &["first", "second"]);
//!
//! loop {
//!     bang.sync();
//! }
//! ```

use alloc::string::String;

use crate::channel::{CharStream, NoStream};
use crate::clock::Clock;
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::logging::{LogLevel, LogStream};
use crate::protocol::{self, CommandId, Frame};
use crate::relay::{self, RelayStats};

/// What one `sync()` moved, per direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Command channel → debug channel.
    pub to_debug: RelayStats,
    /// Debug channel → command channel.
    pub to_command: RelayStats,
}

impl SyncStats {
    /// Both directions added together.
    pub fn total(&self) -> RelayStats {
        self.to_debug + self.to_command
    }
}

/// Object-safe view of the engine, for code that should not care which
/// channel types it was built with (the console).
pub trait BridgeOps {
    /// See [`Bang::try_send_and_recv`].
    fn try_send_and_recv(&mut self, id: CommandId, payload: &str) -> Result<String, BridgeError>;
    /// See [`Bang::write_file`].
    fn write_file(&mut self, filename: &str, lines: &[&str]) -> usize;
    /// See [`Bang::sync`].
    fn sync(&mut self) -> SyncStats;
}

/// Command/relay engine over a command channel and an optional debug channel.
pub struct Bang<C, D, K> {
    cmd: Option<C>,
    dbg: Option<D>,
    clock: K,
    config: BridgeConfig,
    log: Option<&'static LogStream>,
}

impl<K: Clock> Bang<NoStream, NoStream, K> {
    /// Engine with no channels. Every command returns empty text.
    pub fn new(clock: K) -> Self {
        Self::from_parts(None, None, clock)
    }
}

impl<C: CharStream, K: Clock> Bang<C, NoStream, K> {
    /// Engine with a command channel only. `sync()` is a no-op.
    pub fn with_command(cmd: C, clock: K) -> Self {
        Self::from_parts(Some(cmd), None, clock)
    }
}

impl<C: CharStream, D: CharStream, K: Clock> Bang<C, D, K> {
    /// Engine with both a command channel and a debug channel.
    pub fn with_debug(cmd: C, dbg: D, clock: K) -> Self {
        Self::from_parts(Some(cmd), Some(dbg), clock)
    }

    /// Engine from optional handles.
    pub fn from_parts(cmd: Option<C>, dbg: Option<D>, clock: K) -> Self {
        Self {
            cmd,
            dbg,
            clock,
            config: BridgeConfig::DEFAULT,
            log: None,
        }
    }

    /// Replace the default timing and framing.
    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Record frames and relay activity in `log`.
    pub fn with_log(mut self, log: &'static LogStream) -> Self {
        self.log = Some(log);
        self
    }

    /// Timing and framing in use.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Clock driving the settle and relay windows.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// False for engines built without a command channel.
    pub fn has_command_channel(&self) -> bool {
        self.cmd.is_some()
    }

    /// `sync()` only relays when this is true.
    pub fn has_debug_channel(&self) -> bool {
        self.dbg.is_some()
    }

    /// Direct access to the command channel (e.g. to drain stray output).
    pub fn command_stream_mut(&mut self) -> Option<&mut C> {
        self.cmd.as_mut()
    }

    /// Direct access to the debug channel.
    pub fn debug_stream_mut(&mut self) -> Option<&mut D> {
        self.dbg.as_mut()
    }

    /// Send one frame and return whatever the host answered within the
    /// settle window.
    ///
    /// Without a command channel this returns empty text and writes nothing.
    /// A late answer is not waited for; it shows up in the next call's read.
    pub fn send_and_recv(&mut self, id: CommandId, payload: &str) -> String {
        self.try_send_and_recv(id, payload).unwrap_or_default()
    }

    /// [`send_and_recv`](Self::send_and_recv) with the reason for an empty
    /// result.
    pub fn try_send_and_recv(&mut self, id: CommandId, payload: &str) -> Result<String, BridgeError> {
        let frame = Frame::new(id, payload);
        let result = protocol::try_send_and_recv(self.cmd.as_mut(), &self.clock, &self.config, &frame);

        match &result {
            Ok(response) => self.log(
                LogLevel::Debug,
                format_args!("{} {}B -> {}B", id.as_byte() as char, frame.wire_len(), response.len()),
            ),
            Err(BridgeError::WindowExpired) => self.log(
                LogLevel::Warn,
                format_args!("{} no answer in {}ms", id.as_byte() as char, self.config.settle_ms),
            ),
            Err(_) => {}
        }
        result
    }

    /// `!` run a shell command on the host.
    pub fn exec(&mut self, command: &str) -> String {
        self.send_and_recv(CommandId::Execute, command)
    }

    /// `@` run a host macro.
    pub fn run_macro(&mut self, name: &str) -> String {
        self.send_and_recv(CommandId::Macro, name)
    }

    /// `#` pass text through to the host's serial output.
    pub fn serial(&mut self, text: &str) -> String {
        self.send_and_recv(CommandId::Serial, text)
    }

    /// `&` compile and upload a sketch.
    pub fn compile_and_upload(&mut self, sketch: &str) -> String {
        self.send_and_recv(CommandId::CompileAndUpload, sketch)
    }

    /// Recreate `filename` on the host from `lines`, one `exec` per line.
    ///
    /// Returns the summed length of the generated shell commands, which is
    /// local accounting only, not what the host wrote. Empty `lines` does
    /// no I/O and returns 0.
    pub fn write_file(&mut self, filename: &str, lines: &[&str]) -> usize {
        let mut len = 0;
        for command in protocol::file_upload_commands(filename, lines) {
            len += command.len();
            self.exec(&command);
        }
        len
    }

    /// Relay `src` to `dst` for one window, if `src` has enough buffered.
    pub fn push_me_pull_you<A, B>(&self, src: &mut A, dst: &mut B) -> RelayStats
    where
        A: CharStream + ?Sized,
        B: CharStream + ?Sized,
    {
        relay::push_me_pull_you(src, dst, &self.clock, &self.config)
    }

    /// Relay command → debug, then debug → command.
    ///
    /// No-op unless both channels are configured.
    pub fn sync(&mut self) -> SyncStats {
        let (Some(cmd), Some(dbg)) = (self.cmd.as_mut(), self.dbg.as_mut()) else {
            return SyncStats::default();
        };

        let stats = SyncStats {
            to_debug: relay::push_me_pull_you(cmd, dbg, &self.clock, &self.config),
            to_command: relay::push_me_pull_you(dbg, cmd, &self.clock, &self.config),
        };

        if !stats.total().is_idle() {
            self.log(
                LogLevel::Trace,
                format_args!("sync {}B up, {}B down", stats.to_debug.bytes, stats.to_command.bytes),
            );
        }
        stats
    }

    fn log(&self, level: LogLevel, args: core::fmt::Arguments<'_>) {
        if let Some(log) = self.log {
            crate::bridge_log!(level, log, self.clock.now_ms(), "{}", args);
        }
    }
}

impl<C: CharStream, D: CharStream, K: Clock> BridgeOps for Bang<C, D, K> {
    fn try_send_and_recv(&mut self, id: CommandId, payload: &str) -> Result<String, BridgeError> {
        Bang::try_send_and_recv(self, id, payload)
    }

    fn write_file(&mut self, filename: &str, lines: &[&str]) -> usize {
        Bang::write_file(self, filename, lines)
    }

    fn sync(&mut self) -> SyncStats {
        Bang::sync(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryStream;
    use crate::clock::StepClock;

    #[test]
    fn test_unset_channel_is_silent() {
        let mut bang = Bang::new(StepClock::new(0, 1));
        assert_eq!(bang.exec("ls"), "");
        assert_eq!(bang.try_send_and_recv(CommandId::Execute, "ls"), Err(BridgeError::NoChannel));
        assert_eq!(bang.write_file("f", &["a", "b"]), 2 * "echo \"a\" > f".len() + 1);
    }

    #[test]
    fn test_logs_missed_window() {
        static LOG: LogStream = LogStream::new();

        let mut bang = Bang::with_command(MemoryStream::new(), StepClock::new(0, 1)).with_log(&LOG);
        assert_eq!(bang.run_macro("build"), "");

        let entry = LOG.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert!(entry.message().contains("no answer"));
    }

    #[test]
    fn test_sync_without_debug_is_noop() {
        let mut bang = Bang::with_command(MemoryStream::with_input(b"data"), StepClock::new(0, 1));
        assert_eq!(bang.sync(), SyncStats::default());
        assert_eq!(bang.command_stream_mut().unwrap().counters().reads, 0);
    }
}
