//! Command handlers

use core::fmt::Write;

use super::parser::ParsedCommand;
use super::ConsoleError;
use crate::bang::BridgeOps;
use crate::error::BridgeError;
use crate::logging::LogLevel;
use crate::protocol::CommandId;

/// Command descriptor
pub struct CommandDescriptor {
    pub name: &'static str,
    pub brief: &'static str,
    pub handler: fn(&mut dyn BridgeOps, &ParsedCommand<'_>, &mut dyn Write) -> Result<(), ConsoleError>,
}

/// All available commands
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor { name: "help", brief: "List commands", handler: cmd_help },
    CommandDescriptor { name: "exec", brief: "Run shell command on host", handler: cmd_exec },
    CommandDescriptor { name: "macro", brief: "Run host macro", handler: cmd_macro },
    CommandDescriptor { name: "serial", brief: "Print text on host", handler: cmd_serial },
    CommandDescriptor { name: "upload", brief: "Compile and upload sketch", handler: cmd_upload },
    CommandDescriptor { name: "write", brief: "Write one line to host file", handler: cmd_write },
    CommandDescriptor { name: "sync", brief: "Relay pending traffic", handler: cmd_sync },
    CommandDescriptor { name: "log", brief: "Show or set log level", handler: cmd_log },
    CommandDescriptor { name: "stats", brief: "System statistics", handler: cmd_stats },
];

/// Execute a parsed command
pub fn execute(bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    if cmd.command.is_empty() {
        return Ok(()); // Empty line, do nothing
    }

    let handler = COMMANDS
        .iter()
        .find(|c| c.name == cmd.command)
        .ok_or(ConsoleError::UnknownCommand)?;

    (handler.handler)(bridge, cmd, out)
}

/// Get all command names
pub fn command_names() -> impl Iterator<Item = &'static str> {
    COMMANDS.iter().map(|c| c.name)
}

// --- Command Implementations ---

fn cmd_help(_bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    if let Some(name) = cmd.arg(0) {
        let c = COMMANDS
            .iter()
            .find(|c| c.name == name)
            .ok_or(ConsoleError::UnknownCommand)?;
        let _ = writeln!(out, "{}: {}", c.name, c.brief);
    } else {
        for c in COMMANDS {
            let _ = writeln!(out, "  {:<8} {}", c.name, c.brief);
        }
    }
    Ok(())
}

/// Shared body of the four framed commands.
fn forward(
    bridge: &mut dyn BridgeOps,
    id: CommandId,
    payload: &str,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if payload.is_empty() {
        return Err(ConsoleError::MissingArg);
    }

    match bridge.try_send_and_recv(id, payload) {
        Ok(response) => {
            let _ = write!(out, "{}", response);
            if !response.ends_with('\n') {
                let _ = writeln!(out);
            }
            Ok(())
        }
        Err(BridgeError::WindowExpired) => {
            let _ = writeln!(out, "(no response)");
            Ok(())
        }
        Err(_) => Err(ConsoleError::NoChannel),
    }
}

fn cmd_exec(bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    forward(bridge, CommandId::Execute, cmd.rest, out)
}

fn cmd_macro(bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    forward(bridge, CommandId::Macro, cmd.rest, out)
}

fn cmd_serial(bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    forward(bridge, CommandId::Serial, cmd.rest, out)
}

fn cmd_upload(bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    forward(bridge, CommandId::CompileAndUpload, cmd.rest, out)
}

fn cmd_write(bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    let filename = cmd.arg(0).ok_or(ConsoleError::MissingArg)?;
    let line = cmd.tail(1);
    if line.is_empty() {
        return Err(ConsoleError::MissingArg);
    }

    let len = bridge.write_file(filename, &[line]);
    let _ = writeln!(out, "{}: {} chars sent", filename, len);
    Ok(())
}

fn cmd_sync(bridge: &mut dyn BridgeOps, _cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    let stats = bridge.sync();
    let _ = writeln!(
        out,
        "to debug: {}B in {} lines, to command: {}B in {} lines",
        stats.to_debug.bytes, stats.to_debug.chunks, stats.to_command.bytes, stats.to_command.chunks
    );
    Ok(())
}

fn cmd_log(_bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    let log = &crate::BRIDGE_LOG_STREAM;

    if let Some(name) = cmd.arg(0) {
        let level = LogLevel::parse(name).ok_or(ConsoleError::InvalidValue)?;
        log.set_level(level);
    }

    let _ = writeln!(out, "log level: {} (dropped {})", log.level().as_str(), log.dropped());
    Ok(())
}

fn cmd_stats(_bridge: &mut dyn BridgeOps, cmd: &ParsedCommand<'_>, out: &mut dyn Write) -> Result<(), ConsoleError> {
    match cmd.arg(0) {
        None => cmd_stats_overview(out),
        Some("log") => {
            let log = &crate::BRIDGE_LOG_STREAM;
            let _ = writeln!(out, "log pending: {}, dropped: {}", log.pending(), log.dropped());
            Ok(())
        }
        Some(_) => Err(ConsoleError::InvalidValue),
    }
}

fn cmd_stats_overview(out: &mut dyn Write) -> Result<(), ConsoleError> {
    #[cfg(target_os = "espidf")]
    {
        let heap_free = unsafe { esp_idf_svc::sys::esp_get_free_heap_size() };
        let uptime_us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
        let uptime_s = uptime_us / 1_000_000;

        let _ = writeln!(out, "uptime: {}s", uptime_s);
        let _ = writeln!(out, "heap: {} bytes free", heap_free);
    }

    #[cfg(not(target_os = "espidf"))]
    {
        let _ = writeln!(out, "stats: running on host");
    }

    Ok(())
}
