//! Operator console.
//!
//! Lines typed on the console channel drive the bridge engine by name
//! (`exec ls`, `macro build`, `sync`). Polled from the main loop,
//! no dedicated task.

pub mod commands;
pub mod console;
pub mod error;
pub mod parser;

pub use commands::{command_names, execute, COMMANDS};
pub use console::Console;
pub use error::ConsoleError;
pub use parser::{parse_line, ParsedCommand};
