//! Module: config
//!
//! Purpose: Timing windows, framing and UART settings for the bridge.
//!
//! Architecture:
//! - [`BridgeConfig`]: what the engine and listener need at runtime
//! - [`UartConfig`]: how the firmware sets up each physical channel
//! - All values fixed at construction, copied into the engine
//!
//! Safety: Safe. Plain `Copy` data.

/// Line terminator written after frames and relayed chunks.
///
/// Must match what the remote command processor splits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n` (Arduino `println`)
    CrLf,
}

impl LineEnding {
    /// Terminator bytes.
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::Lf => b"\n",
            LineEnding::CrLf => b"\r\n",
        }
    }

    /// True for either terminator byte.
    pub const fn is_terminator(byte: u8) -> bool {
        byte == b'\n' || byte == b'\r'
    }
}

/// Default wait after sending a frame before draining the response.
pub const DEFAULT_SETTLE_MS: u64 = 100;

/// Default duration of one relay window.
pub const DEFAULT_RELAY_WINDOW_MS: u64 = 20;

/// Source must have at least this many bytes buffered for a relay to run.
pub const DEFAULT_RELAY_MIN_AVAILABLE: usize = 2;

/// Most bytes taken from a channel between two deadline checks.
pub const DEFAULT_MAX_CHUNK: usize = 256;

/// Incremental listener buffer size (payload limit is one less).
pub const DEFAULT_LISTENER_CAPACITY: usize = 64;

/// Runtime configuration for the bridge engine and listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Settle window after a frame is written, in ms.
    pub settle_ms: u64,
    /// Relay window per direction, in ms.
    pub relay_window_ms: u64,
    /// Relay guard threshold.
    pub relay_min_available: usize,
    /// Terminator for frames and relayed chunks.
    pub line_ending: LineEnding,
    /// Read bound between deadline checks; also the longest relayed line.
    pub max_chunk: usize,
}

impl BridgeConfig {
    /// 100 ms settle, 20 ms relay window, guard of 2 bytes, CRLF.
    pub const DEFAULT: Self = Self {
        settle_ms: DEFAULT_SETTLE_MS,
        relay_window_ms: DEFAULT_RELAY_WINDOW_MS,
        relay_min_available: DEFAULT_RELAY_MIN_AVAILABLE,
        line_ending: LineEnding::CrLf,
        max_chunk: DEFAULT_MAX_CHUNK,
    };

    /// Wait after each frame before collecting the answer.
    pub const fn with_settle_ms(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Length of one relay window, also the response collection bound.
    pub const fn with_relay_window_ms(mut self, relay_window_ms: u64) -> Self {
        self.relay_window_ms = relay_window_ms;
        self
    }

    /// Bytes the source must hold before a relay window opens.
    pub const fn with_relay_min_available(mut self, relay_min_available: usize) -> Self {
        self.relay_min_available = relay_min_available;
        self
    }

    /// Terminator for frames and relayed lines.
    pub const fn with_line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Zero is raised to one so every read step makes progress.
    pub const fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = if max_chunk == 0 { 1 } else { max_chunk };
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// UART line settings for one bridge channel.
///
/// Pins are typed peripherals and are wired in `main` (see the `uart`
/// module docs for the board layout), not stored here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UartConfig {
    pub baud_rate: u32,
}

impl UartConfig {
    /// Command channel to the host agent. 38400 is the agent's default baud.
    pub const COMMAND: Self = Self { baud_rate: 38_400 };

    /// Debug/mirror channel (USB-UART adapter).
    pub const DEBUG: Self = Self { baud_rate: 115_200 };

    /// Operator console and log output (UART0).
    pub const CONSOLE: Self = Self { baud_rate: 115_200 };
}

impl Default for UartConfig {
    fn default() -> Self {
        Self::COMMAND
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_windows() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.settle_ms, 100);
        assert_eq!(cfg.relay_window_ms, 20);
        assert_eq!(cfg.relay_min_available, 2);
        assert_eq!(cfg.line_ending, LineEnding::CrLf);
        assert_eq!(cfg.max_chunk, 256);
    }

    #[test]
    fn test_uart_presets() {
        assert_eq!(UartConfig::default(), UartConfig::COMMAND);
        assert_eq!(UartConfig::COMMAND.baud_rate, 38_400);
        assert_eq!(UartConfig::DEBUG.baud_rate, 115_200);
        assert_eq!(UartConfig::CONSOLE.baud_rate, 115_200);
    }

    #[test]
    fn test_max_chunk_never_zero() {
        assert_eq!(BridgeConfig::DEFAULT.with_max_chunk(0).max_chunk, 1);
    }

    #[test]
    fn test_builder_overrides() {
        let cfg = BridgeConfig::DEFAULT
            .with_settle_ms(5)
            .with_line_ending(LineEnding::Lf);
        assert_eq!(cfg.settle_ms, 5);
        assert_eq!(cfg.line_ending.as_bytes(), b"\n");
        assert_eq!(cfg.relay_window_ms, DEFAULT_RELAY_WINDOW_MS);
    }
}
