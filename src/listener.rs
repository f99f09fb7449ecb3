//! Incremental command listener.
//!
//! The polling-loop front-end: call [`CommandListener::update`] as often as
//! the loop allows; it consumes whatever the channel has buffered and never
//! waits for more.
//!
//! # Grammar
//!
//! ```text
//! ... noise ... ! payload \r|\n
//!               │  └─ up to N-1 bytes, kept across polls
//!               └─ command-start marker
//! ```
//!
//! Bytes outside a command are discarded. A payload that fills the buffer
//! completes as truncated; the remaining bytes stay in the channel and are
//! read afterwards as ordinary (non-command) input.
//!
//! There is no global "current listener": formatted output goes through an
//! explicit instance, see [`host_print!`](crate::host_print).

use alloc::borrow::Cow;
use alloc::string::String;

use crate::channel::CharStream;
use crate::config::{LineEnding, DEFAULT_LISTENER_CAPACITY};
use crate::error::BridgeError;
use crate::line_buffer::LineBuffer;
use crate::logging::format_to_buffer;

/// Byte that opens a command.
pub const COMMAND_MARKER: u8 = b'!';

/// Tag passed to the callback for every command.
pub const CALLBACK_TAG: u8 = 123;

/// A completed command, as handed to the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceivedCommand<'a> {
    pub tag: u8,
    /// Payload bytes exactly as received, not necessarily UTF-8.
    pub payload: &'a [u8],
    /// The payload hit the buffer limit before a terminator arrived.
    pub truncated: bool,
}

impl<'a> ReceivedCommand<'a> {
    /// Payload as text; invalid sequences become U+FFFD.
    pub fn payload_str(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.payload)
    }
}

/// Callback invoked for each completed command, with the user context.
pub type CommandCallback<C> = fn(&mut C, &ReceivedCommand<'_>);

/// Result of a formatted write to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostWrite {
    /// Bytes handed to the channel.
    pub written: usize,
    /// The rendered text did not fit the format buffer.
    pub truncated: bool,
}

impl HostWrite {
    /// Bytes written, or `Truncated` if the text was cut short.
    pub fn check(self) -> Result<usize, BridgeError> {
        if self.truncated {
            Err(BridgeError::Truncated)
        } else {
            Ok(self.written)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListenState {
    Idle,
    Collecting,
}

/// Byte-at-a-time command parser over one channel.
///
/// Channel, callback and user context are set once in [`new`](Self::new).
pub struct CommandListener<S, C = (), const N: usize = DEFAULT_LISTENER_CAPACITY> {
    stream: S,
    callback: Option<CommandCallback<C>>,
    user_data: C,
    line: LineBuffer<N>,
    state: ListenState,
}

impl<S: CharStream, C, const N: usize> CommandListener<S, C, N> {
    /// Listener over `stream`. Without a callback, commands are still
    /// parsed and counted.
    pub fn new(stream: S, callback: Option<CommandCallback<C>>, user_data: C) -> Self {
        Self {
            stream,
            callback,
            user_data,
            line: LineBuffer::new(),
            state: ListenState::Idle,
        }
    }

    /// Consume everything currently buffered in the channel.
    ///
    /// Returns the number of commands completed during this poll.
    pub fn update(&mut self) -> usize {
        let mut completed = 0;

        while self.stream.available() > 0 {
            match self.state {
                ListenState::Idle => {
                    let Some(byte) = self.stream.read() else { break };
                    if byte == COMMAND_MARKER {
                        self.line.clear();
                        self.state = ListenState::Collecting;
                    }
                }
                ListenState::Collecting => {
                    let Some(next) = self.stream.peek() else { break };
                    if LineEnding::is_terminator(next) {
                        self.stream.read();
                        self.complete(false);
                        completed += 1;
                    } else if self.line.is_full() {
                        // leave `next` in the channel
                        self.complete(true);
                        completed += 1;
                    } else {
                        self.stream.read();
                        self.line.push(next);
                    }
                }
            }
        }

        completed
    }

    /// Render `args` into an `N`-byte buffer (one byte short, like
    /// `vsnprintf`) and write it to this listener's channel.
    pub fn host_printf(&mut self, args: core::fmt::Arguments<'_>) -> HostWrite {
        let mut buf = [0u8; N];
        let (len, truncated) = format_to_buffer(&mut buf[..N - 1], args);
        HostWrite {
            written: self.stream.write(&buf[..len]),
            truncated,
        }
    }

    /// Inside a command, waiting for more bytes.
    pub fn is_collecting(&self) -> bool {
        self.state == ListenState::Collecting
    }

    /// Payload collected so far for the command in progress.
    pub fn partial(&self) -> &[u8] {
        self.line.as_bytes()
    }

    pub fn user_data(&self) -> &C {
        &self.user_data
    }

    pub fn user_data_mut(&mut self) -> &mut C {
        &mut self.user_data
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    fn complete(&mut self, truncated: bool) {
        self.state = ListenState::Idle;
        if let Some(callback) = self.callback {
            let command = ReceivedCommand {
                tag: CALLBACK_TAG,
                payload: self.line.as_bytes(),
                truncated,
            };
            callback(&mut self.user_data, &command);
        }
        self.line.clear();
    }
}

/// `printf`-style output to the host through an explicit listener.
///
/// ```ignore
/// host_print!(listener, "temp: {}\n", celsius);
/// ```
#[macro_export]
macro_rules! host_print {
    ($listener:expr, $($arg:tt)*) => {
        $listener.host_printf(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::MemoryStream;

    #[test]
    fn test_partial_kept_between_polls() {
        let mut listener: CommandListener<MemoryStream> =
            CommandListener::new(MemoryStream::with_input(b"!he"), None, ());

        assert_eq!(listener.update(), 0);
        assert!(listener.is_collecting());
        assert_eq!(listener.partial(), b"he");

        listener.stream_mut().feed(b"llo\r\n");
        assert_eq!(listener.update(), 1);
        assert!(!listener.is_collecting());
    }

    #[test]
    fn test_host_printf_truncates() {
        let mut listener: CommandListener<MemoryStream, (), 8> =
            CommandListener::new(MemoryStream::new(), None, ());

        let result = host_print!(listener, "value={}", 123456);
        assert_eq!(result, HostWrite { written: 7, truncated: true });
        assert_eq!(listener.stream().written(), b"value=1");
        assert_eq!(result.check(), Err(BridgeError::Truncated));
    }
}
