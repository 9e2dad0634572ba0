use std::fmt;
use std::io;

use gazbridge_bridge::BridgeError;
use gazbridge_frame::FrameError;
use gazbridge_transport::TransportError;

// Exit codes follow the sysexits-style table shared with other field tools.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => TRANSPORT_ERROR,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Open { ref source, .. } | TransportError::Configure { ref source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            CliError::new(PERMISSION_DENIED, format!("{context}: {err}"))
        }
        TransportError::Io(source) => io_error(context, source),
        TransportError::UnsupportedBaud(_) => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::OutOfRange { .. } | FrameError::InvalidCentis(_) => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::ConnectionClosed => CliError::new(FAILURE, format!("{context}: {err}")),
    }
}

pub fn bridge_error(context: &str, err: BridgeError) -> CliError {
    match err {
        BridgeError::Frame(err) => frame_error(context, err),
        BridgeError::JoinTimeout { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        BridgeError::AlreadyRunning => CliError::new(INTERNAL, format!("{context}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    #[test]
    fn permission_denied_on_open() {
        let err = transport_error(
            "open failed",
            TransportError::Open {
                path: PathBuf::from("/dev/ttyUSB0"),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            },
        );
        assert_eq!(err.code, PERMISSION_DENIED);
        assert!(err.message.starts_with("open failed: "));
    }

    #[test]
    fn missing_device_is_transport_error() {
        let err = transport_error(
            "open failed",
            TransportError::Open {
                path: PathBuf::from("/dev/ttyUSB9"),
                source: io::Error::from(io::ErrorKind::NotFound),
            },
        );
        assert_eq!(err.code, TRANSPORT_ERROR);
    }

    #[test]
    fn bad_baud_is_usage() {
        assert_eq!(
            transport_error("open failed", TransportError::UnsupportedBaud(31250)).code,
            USAGE
        );
    }

    #[test]
    fn out_of_range_frame_is_data_invalid() {
        let err = bridge_error(
            "send failed",
            BridgeError::Frame(FrameError::OutOfRange { seconds: 1000 }),
        );
        assert_eq!(err.code, DATA_INVALID);
    }

    #[test]
    fn join_timeout_maps_to_timeout() {
        let err = bridge_error(
            "shutdown failed",
            BridgeError::JoinTimeout {
                activity: "ticker",
                timeout: Duration::from_secs(1),
            },
        );
        assert_eq!(err.code, TIMEOUT);
    }

    #[test]
    fn second_reader_is_internal() {
        let err = bridge_error("cannot start reader", BridgeError::AlreadyRunning);
        assert_eq!(err.code, INTERNAL);
    }
}
