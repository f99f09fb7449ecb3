//! Framed command protocol tests

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use bang_bridge::channel::{CharStream, MemoryStream};
use bang_bridge::clock::StepClock;
use bang_bridge::config::{BridgeConfig, LineEnding};
use bang_bridge::{Bang, BridgeError, CommandId};

fn frames(written: &[u8]) -> Vec<String> {
    String::from_utf8(written.to_vec())
        .unwrap()
        .split("\r\n")
        .filter(|l| !l.is_empty())
        .map(str::to_owned)
        .collect()
}

#[test]
fn test_unset_channel_returns_empty_without_waiting() {
    let clock = StepClock::new(0, 1);
    let mut bang = Bang::from_parts(None::<MemoryStream>, None::<MemoryStream>, &clock);

    for id in CommandId::ALL {
        for payload in ["", "ls", "a much longer payload with spaces", "ünïcödé"] {
            assert_eq!(bang.send_and_recv(id, payload), "");
        }
    }

    // no settle window was ever opened
    assert_eq!(clock.current(), 0);
}

#[test]
fn test_exec_frames_and_collects_response() {
    let clock = StepClock::new(0, 1);
    let mut bang = Bang::with_command(MemoryStream::with_input(b"a.txt\r\nb.txt\r\n"), &clock);

    let response = bang.exec("ls");

    assert_eq!(response, "a.txt\r\nb.txt\r\n");
    assert_eq!(bang.command_stream_mut().unwrap().written(), b"!ls\r\n");
    assert!(clock.current() >= 100, "settle window must elapse");
}

#[test]
fn test_each_operation_uses_its_identifier() {
    let mut bang = Bang::with_command(MemoryStream::new(), StepClock::new(0, 1));

    bang.exec("pwd");
    bang.run_macro("build");
    bang.serial("hello host");
    bang.compile_and_upload("blink");

    let sent = frames(bang.command_stream_mut().unwrap().written());
    assert_eq!(sent, ["!pwd", "@build", "#hello host", "&blink"]);
}

#[test]
fn test_response_in_bursts_is_concatenated() {
    let stream = MemoryStream::with_input(b"line one\nline two\n").with_burst(5);
    let mut bang = Bang::with_command(stream, StepClock::new(0, 1));

    assert_eq!(bang.exec("cat f"), "line one\nline two\n");
}

#[test]
fn test_late_response_lands_in_next_call() {
    let mut bang = Bang::with_command(MemoryStream::new(), StepClock::new(0, 1));

    assert_eq!(bang.exec("slow"), "");
    bang.command_stream_mut().unwrap().feed(b"slow output\n");

    assert_eq!(bang.exec("fast"), "slow output\n");
}

#[test]
fn test_try_send_and_recv_states() {
    let mut bang = Bang::with_command(MemoryStream::new(), StepClock::new(0, 1));
    assert_eq!(bang.try_send_and_recv(CommandId::Execute, "x"), Err(BridgeError::WindowExpired));

    bang.command_stream_mut().unwrap().feed(b"ok");
    assert_eq!(bang.try_send_and_recv(CommandId::Execute, "x"), Ok("ok".to_string()));

    let mut none = Bang::new(StepClock::new(0, 1));
    assert_eq!(none.try_send_and_recv(CommandId::Execute, "x"), Err(BridgeError::NoChannel));
}

#[test]
fn test_split_utf8_response_is_reassembled() {
    let stream = MemoryStream::with_input("température".as_bytes()).with_burst(5);
    let mut bang = Bang::with_command(stream, StepClock::new(0, 1));

    assert_eq!(bang.exec("sensor"), "température");
}

#[test]
fn test_line_ending_is_configurable() {
    let config = BridgeConfig::DEFAULT.with_line_ending(LineEnding::Lf).with_settle_ms(10);
    let clock = StepClock::new(0, 1);
    let mut bang = Bang::with_command(MemoryStream::new(), &clock).with_config(config);

    bang.exec("ls");

    assert_eq!(bang.command_stream_mut().unwrap().written(), b"!ls\n");
    assert!(clock.current() < 100);
}

#[test]
fn test_write_file_one_exec_per_line() {
    let mut bang = Bang::with_command(MemoryStream::new(), StepClock::new(0, 1));
    let lines = ["first", "second", "third"];

    let total = bang.write_file("notes.txt", &lines);

    let sent = frames(bang.command_stream_mut().unwrap().written());
    assert_eq!(
        sent,
        [
            "!echo \"first\" > notes.txt",
            "!echo \"second\" >> notes.txt",
            "!echo \"third\" >> notes.txt",
        ]
    );

    // identifier character is not part of the accounting
    let expected: usize = sent.iter().map(|f| f.len() - 1).sum();
    assert_eq!(total, expected);
}

#[test]
fn test_write_file_single_line_truncates() {
    let mut bang = Bang::with_command(MemoryStream::new(), StepClock::new(0, 1));

    let total = bang.write_file("x", &["only"]);

    assert_eq!(frames(bang.command_stream_mut().unwrap().written()), ["!echo \"only\" > x"]);
    assert_eq!(total, "echo \"only\" > x".len());
}

#[test]
fn test_write_file_empty_does_nothing() {
    let clock = StepClock::new(0, 1);
    let mut bang = Bang::with_command(MemoryStream::new(), &clock);

    assert_eq!(bang.write_file("notes.txt", &[]), 0);
    assert_eq!(bang.command_stream_mut().unwrap().counters().writes, 0);
    assert_eq!(clock.current(), 0);
}

/// Host that never stops talking.
struct Chatty;

impl CharStream for Chatty {
    fn available(&self) -> usize {
        32
    }

    fn read(&mut self) -> Option<u8> {
        Some(b'y')
    }

    fn peek(&self) -> Option<u8> {
        Some(b'y')
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        bytes.len()
    }
}

#[test]
fn test_endless_response_is_cut_after_one_window() {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let config = BridgeConfig::DEFAULT.with_max_chunk(8);
        let mut bang = Bang::with_command(Chatty, StepClock::new(0, 1)).with_config(config);
        let response = bang.exec("yes");
        let _ = tx.send((response, bang.clock().current()));
    });

    let (response, elapsed) = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("response collection must end while the host keeps sending");

    assert!(!response.is_empty());
    assert!(response.bytes().all(|b| b == b'y'));
    // settle window, then at most one relay window of 8-byte reads
    assert!(response.len() <= 8 * 21);
    assert!(elapsed < 100 + 40);
}
