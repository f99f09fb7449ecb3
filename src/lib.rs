//! # bang-bridge
//!
//! Serial command bridge between a host agent and a microcontroller.
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────── Bang ────────────┐
//! host agent ◀──▶│ command channel   debug chan │◀──▶ debug monitor
//!                │  frames: ! @ # &   relay     │
//!                └──────────────────────────────┘
//! ```
//!
//! Two front-ends share one primitive (drain what is available, bounded by a
//! [`Deadline`](clock::Deadline)):
//! - [`Bang`]: framed request/response plus the timed bidirectional relay
//! - [`CommandListener`]: byte-at-a-time parser for a polling loop
//!
//! Everything is single-threaded and cooperative; no call waits longer than
//! its configured window.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod bang;
pub mod channel;
pub mod clock;
pub mod config;
pub mod console;
pub mod error;
pub mod line_buffer;
pub mod listener;
pub mod log_drain;
pub mod log_globals;
pub mod logging;
pub mod protocol;
pub mod relay;
#[cfg(target_os = "espidf")]
pub mod uart;

pub use bang::{Bang, BridgeOps, SyncStats};
pub use channel::{CharStream, MemoryStream, NoStream};
pub use clock::{Clock, StepClock};
pub use config::{BridgeConfig, LineEnding};
pub use error::BridgeError;
pub use listener::{CommandListener, ReceivedCommand};
pub use log_globals::BRIDGE_LOG_STREAM;
pub use protocol::CommandId;
pub use relay::RelayStats;
