//! Parser tests for console command line parsing

use bang_bridge::console::parser::{parse_line, ParsedCommand};

#[test]
fn test_parse_simple_command() {
    let cmd = parse_line("help");
    assert_eq!(cmd.command, "help");
    assert_eq!(cmd.rest, "");
    assert_eq!(cmd.arg(0), None);
}

#[test]
fn test_parse_keeps_payload_verbatim() {
    let cmd = parse_line("exec ls -la  /tmp");
    assert_eq!(cmd.command, "exec");
    assert_eq!(cmd.rest, "ls -la  /tmp");
}

#[test]
fn test_parse_args_on_demand() {
    let cmd = parse_line("write notes.txt hello world");
    assert_eq!(cmd.arg(0), Some("notes.txt"));
    assert_eq!(cmd.arg(1), Some("hello"));
    assert_eq!(cmd.arg(3), None);
    assert_eq!(cmd.tail(1), "hello world");
    assert_eq!(cmd.tail(3), "");
}

#[test]
fn test_parse_trims_leading_space_and_line_end() {
    let cmd = parse_line("   macro build\r\n");
    assert_eq!(cmd.command, "macro");
    assert_eq!(cmd.rest, "build");
}

#[test]
fn test_parse_empty_line() {
    assert_eq!(parse_line(""), ParsedCommand::empty());
    assert_eq!(parse_line("   ").command, "");
}
