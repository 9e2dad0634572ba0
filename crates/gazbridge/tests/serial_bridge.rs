#![cfg(target_os = "linux")]

use std::ffi::CStr;
use std::fs::File;
use std::io::Write;
use std::os::fd::FromRawFd;
use std::path::PathBuf;
use std::time::Duration;

use gazbridge::bridge::{Bridge, BridgeConfig, BridgeEvent, RunState};
use gazbridge::transport::SerialPort;

fn open_pty() -> (File, PathBuf) {
    // SAFETY: plain libc pty allocation; every return value is checked and
    // the master descriptor is handed to a `File` that owns it.
    unsafe {
        let fd = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
        assert!(fd >= 0, "posix_openpt failed");
        assert_eq!(libc::grantpt(fd), 0);
        assert_eq!(libc::unlockpt(fd), 0);
        let mut name = [0 as libc::c_char; 128];
        assert_eq!(libc::ptsname_r(fd, name.as_mut_ptr(), name.len()), 0);
        let path = PathBuf::from(CStr::from_ptr(name.as_ptr()).to_string_lossy().into_owned());
        (File::from_raw_fd(fd), path)
    }
}

#[tokio::test]
async fn reader_survives_quiet_serial_line_between_events() {
    let (mut master, slave) = open_pty();
    let port = SerialPort::open(&slave, 9600).expect("pty slave should open");
    let bridge = Bridge::start(port, tokio::io::sink(), BridgeConfig::default())
        .expect("bridge should start");
    let mut events = bridge.subscribe();
    let mut state = bridge.watch_state();

    master.write_all(b"C0\r\n").unwrap();
    tokio::time::timeout(Duration::from_secs(2), state.wait_for(|s| *s == RunState::Running))
        .await
        .expect("start should arrive")
        .unwrap();

    // Nothing is pending on the line now; the reader must keep waiting.
    tokio::time::sleep(Duration::from_millis(300)).await;

    master.write_all(b"c1 00012.3400\r\n").unwrap();
    tokio::time::timeout(Duration::from_secs(2), state.wait_for(|s| *s == RunState::Idle))
        .await
        .expect("stop should arrive")
        .unwrap();

    while let Ok(event) = events.try_recv() {
        assert!(
            !matches!(event, BridgeEvent::SourceStopped { .. }),
            "source ended early"
        );
    }
    bridge.shutdown().await.unwrap();
}
