//! Command line parser
//!
//! First word is the command. Everything after it is kept verbatim as the
//! payload (shell commands need their spaces); `arg()` splits it on demand.

/// Parsed console line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// The command name (first token)
    pub command: &'a str,
    /// Rest of the line, leading whitespace removed, trailing kept
    pub rest: &'a str,
}

impl<'a> ParsedCommand<'a> {
    /// Create empty command
    pub const fn empty() -> Self {
        Self {
            command: "",
            rest: "",
        }
    }

    /// Whitespace-separated argument by index (0-based)
    pub fn arg(&self, idx: usize) -> Option<&'a str> {
        self.rest.split_whitespace().nth(idx)
    }

    /// Everything after the first `skip` arguments, verbatim
    pub fn tail(&self, skip: usize) -> &'a str {
        let mut rest = self.rest;
        for _ in 0..skip {
            rest = rest.trim_start();
            match rest.find(char::is_whitespace) {
                Some(end) => rest = &rest[end..],
                None => return "",
            }
        }
        rest.trim_start()
    }
}

/// Parse a console line into command and payload
pub fn parse_line(line: &str) -> ParsedCommand<'_> {
    let line = line.trim_start().trim_end_matches(['\r', '\n']);

    match line.find(char::is_whitespace) {
        Some(end) => ParsedCommand {
            command: &line[..end],
            rest: line[end..].trim_start(),
        },
        None => ParsedCommand {
            command: line,
            rest: "",
        },
    }
}
