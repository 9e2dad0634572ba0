#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const CLEAR: &[u8] = b"  0   .        0.00 00\r";

fn spawn_run(hold: &str) -> std::process::Child {
    Command::new(env!("CARGO_BIN_EXE_gazbridge"))
        .args(["--log-level", "error", "run", "--source", "-", "--sink", "-"])
        .args(["--hold", hold])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("run command should start")
}

#[test]
fn finish_time_then_clear_after_hold() {
    let mut child = spawn_run("5");
    let started = Instant::now();
    {
        let mut stdin = child.stdin.take().expect("stdin should be piped");
        stdin
            .write_all(b"C0\r\nc1 00050.0000\r\n")
            .expect("events should be written");
    }

    let output = child.wait_with_output().expect("run should exit");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(started.elapsed() >= Duration::from_secs(5));

    let mut expected = b"  0   .       50.00 00\r".to_vec();
    expected.extend_from_slice(CLEAR);
    assert_eq!(output.stdout, expected);
}

#[test]
fn end_of_stream_while_running_stops_ticking() {
    let mut child = spawn_run("7");
    let mut stdin = child.stdin.take().expect("stdin should be piped");
    stdin.write_all(b"C0\r\n").expect("start should be written");
    stdin.flush().expect("stdin should flush");

    thread::sleep(Duration::from_millis(1_700));
    drop(stdin);

    let output = child.wait_with_output().expect("run should exit");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"  0   .        1.   00\r".to_vec());
}

#[test]
fn missing_source_device_fails_fast() {
    let output = Command::new(env!("CARGO_BIN_EXE_gazbridge"))
        .args(["--log-level", "error", "run"])
        .args(["--source", "/dev/gazbridge-does-not-exist", "--sink", "-"])
        .output()
        .expect("run command should execute");
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("FDS connection error"));
}
