#![cfg(feature = "cli")]

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn scode(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scode"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("scode should run")
}

fn scode_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_scode"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("scode should start");

    child
        .stdin
        .take()
        .expect("stdin should be piped")
        .write_all(input)
        .expect("stdin should accept input");

    child.wait_with_output().expect("scode should finish")
}

#[test]
fn echo_pretty_prints_both_encodings() {
    let output = scode(&["--format", "pretty", "echo", "S2", "N1235"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines[0], "S2 N1235");
    assert_eq!(lines[1], "\\xD3\\x02\\x8E\\xD3\\x04\\x00Y");
    assert_eq!(lines[2], "......Y");
}

#[test]
fn echo_json_from_stdin_reports_errors_and_continues() {
    let output = scode_with_stdin(&["--format", "json", "echo"], b"Gg\nM17 S'on'\n");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"command\":\"M17\""));
    assert!(stdout.contains("\"encoding\":\"human\""));
    assert!(stdout.contains("\"type\":\"str\""));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Parse Error"));
}

#[test]
fn convert_human_to_binary() {
    let output = scode_with_stdin(&["convert", "--to", "binary"], b"S2 N1235\n; done\n");
    assert!(output.status.success());
    assert_eq!(output.stdout, vec![0xD3, 0x02, 0x8E, 0xD3, 0x04, 0x00, 0x59]);
}

#[test]
fn convert_binary_to_human_skips_bad_crc() {
    let input = b"\xCD\x11\x00\x00\xD3\x02\x00\x8B";
    let output = scode_with_stdin(&["convert", "--to", "human"], input);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"S2\r\n");
}

#[test]
fn convert_strict_fails_with_data_invalid() {
    let output = scode_with_stdin(&["convert", "--to", "human", "--strict"], b"Gg\nS2\n");
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn crc_of_text_and_hex() {
    let output = scode(&["--format", "pretty", "crc", "Hello"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "0xF6");

    let output = scode(&["--format", "json", "crc", "--hex", "d3 02"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("\"crc\":139"));
}

#[test]
fn crc_rejects_bad_hex_with_usage() {
    let output = scode(&["crc", "--hex", "xyz"]);
    assert_eq!(output.status.code(), Some(64));
}

#[test]
fn version_extended_lists_polynomial() {
    let output = scode(&["version", "--extended"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("name: scode"));
    assert!(stdout.contains("crc8_polynomial: 0x07"));
}
