//! Command framing.
//!
//! A frame is one identifier character followed by the payload text, sent as
//! one line. The host agent answers with plain text that is collected during
//! the settle window.
//!
//! ```text
//! !ls -la\r\n          execute a shell command
//! @build\r\n           run a host macro
//! #hello\r\n           print on the host's serial output
//! &blink\r\n           compile and upload a sketch
//! ```

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::channel::{drain_available, CharStream};
use crate::clock::{Clock, Deadline};
use crate::config::BridgeConfig;
use crate::error::BridgeError;

/// Command identifier alphabet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandId {
    /// `!`: run a shell command, answer with its output.
    Execute,
    /// `@`: run a macro registered on the host.
    Macro,
    /// `#`: raw text passthrough to the host's serial output.
    Serial,
    /// `&`: compile and upload a sketch.
    CompileAndUpload,
}

impl CommandId {
    /// All identifiers, in wire-character order.
    pub const ALL: [CommandId; 4] = [
        CommandId::Execute,
        CommandId::Macro,
        CommandId::Serial,
        CommandId::CompileAndUpload,
    ];

    /// Wire character.
    pub const fn as_byte(self) -> u8 {
        match self {
            CommandId::Execute => b'!',
            CommandId::Macro => b'@',
            CommandId::Serial => b'#',
            CommandId::CompileAndUpload => b'&',
        }
    }

    /// Identifier for a wire character.
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_byte() == byte)
    }
}

/// One outgoing frame. Built per call, never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame<'a> {
    pub id: CommandId,
    pub payload: &'a str,
}

impl<'a> Frame<'a> {
    /// Frame for `payload`, sent unchanged.
    pub const fn new(id: CommandId, payload: &'a str) -> Self {
        Self { id, payload }
    }

    /// Frame bytes without the line terminator.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.payload.len() + 1);
        bytes.push(self.id.as_byte());
        bytes.extend_from_slice(self.payload.as_bytes());
        bytes
    }

    /// Frame length in bytes, terminator excluded.
    pub fn wire_len(&self) -> usize {
        self.payload.len() + 1
    }
}

/// Write `frame`, wait out the settle window, collect the response.
///
/// Collection stops when the channel runs dry or one relay window after the
/// settle window, whichever comes first. Returns the raw response bytes;
/// empty when nothing arrived in time.
pub fn exchange<S, K>(stream: &mut S, clock: &K, config: &BridgeConfig, frame: &Frame<'_>) -> Vec<u8>
where
    S: CharStream + ?Sized,
    K: Clock + ?Sized,
{
    stream.write_line(&frame.encode(), config.line_ending);

    Deadline::after(clock, config.settle_ms).wait(clock);

    let collect = Deadline::after(clock, config.relay_window_ms);
    let mut response = Vec::new();
    while stream.available() > 0 && !collect.expired(clock) {
        if drain_available(stream, &mut response, config.max_chunk) == 0 {
            break;
        }
    }
    response
}

/// [`exchange`] against an optional channel, as text.
///
/// `NoChannel` when unset (zero writes), `WindowExpired` when the host did
/// not answer within the settle window.
pub fn try_send_and_recv<S, K>(
    stream: Option<&mut S>,
    clock: &K,
    config: &BridgeConfig,
    frame: &Frame<'_>,
) -> Result<String, BridgeError>
where
    S: CharStream + ?Sized,
    K: Clock + ?Sized,
{
    let stream = stream.ok_or(BridgeError::NoChannel)?;
    let response = exchange(stream, clock, config, frame);
    if response.is_empty() {
        return Err(BridgeError::WindowExpired);
    }
    Ok(String::from_utf8_lossy(&response).into_owned())
}

/// Shell command that writes one line of a file on the host.
///
/// The first line truncates (`>`), later lines append (`>>`).
pub fn file_line_command(filename: &str, line: &str, first: bool) -> String {
    let redirect = if first { ">" } else { ">>" };
    format!("echo \"{}\" {} {}", line, redirect, filename)
}

/// All commands needed to upload `lines` into `filename`, in order.
pub fn file_upload_commands<'a>(
    filename: &'a str,
    lines: &'a [&'a str],
) -> impl Iterator<Item = String> + 'a {
    lines
        .iter()
        .enumerate()
        .map(move |(i, line)| file_line_command(filename, line, i == 0))
}
