use std::fmt;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use crate::exit::CliResult;

pub type Source = Box<dyn AsyncRead + Send + Unpin>;
pub type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Either a serial device or `-` for the process's own stdin/stdout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Stdio,
    Device(PathBuf),
}

impl Endpoint {
    pub fn is_stdio(&self) -> bool {
        matches!(self, Endpoint::Stdio)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Stdio => f.write_str("-"),
            Endpoint::Device(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn parse_endpoint(input: &str) -> Result<Endpoint, String> {
    match input.trim() {
        "" => Err("endpoint must not be empty".to_string()),
        "-" => Ok(Endpoint::Stdio),
        path => Ok(Endpoint::Device(PathBuf::from(path))),
    }
}

/// Open the timing box side. Must run inside the tokio runtime.
pub fn open_source(endpoint: &Endpoint, baud: u32) -> CliResult<Source> {
    match endpoint {
        Endpoint::Stdio => {
            info!("reading FDS events from stdin");
            Ok(Box::new(tokio::io::stdin()))
        }
        Endpoint::Device(path) => Ok(Box::new(open_device(path, baud, "FDS")?)),
    }
}

/// Open the scoreboard side. Must run inside the tokio runtime.
pub fn open_sink(endpoint: &Endpoint, baud: u32) -> CliResult<Sink> {
    match endpoint {
        Endpoint::Stdio => {
            info!("writing GAZ frames to stdout");
            Ok(Box::new(tokio::io::stdout()))
        }
        Endpoint::Device(path) => Ok(Box::new(open_device(path, baud, "GAZ")?)),
    }
}

#[cfg(unix)]
fn open_device(
    path: &Path,
    baud: u32,
    role: &str,
) -> CliResult<gazbridge_transport::SerialPort> {
    let port = gazbridge_transport::SerialPort::open(path, baud).map_err(|err| {
        crate::exit::transport_error(&format!("{role} connection error"), err)
    })?;
    info!(role, path = %path.display(), baud, "{role} connected");
    Ok(port)
}

#[cfg(not(unix))]
fn open_device(path: &Path, _baud: u32, role: &str) -> CliResult<tokio::io::DuplexStream> {
    Err(crate::exit::transport_error(
        &format!("{role} connection error ({})", path.display()),
        gazbridge_transport::TransportError::Unsupported,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dash_is_stdio() {
        assert_eq!(parse_endpoint("-").unwrap(), Endpoint::Stdio);
        assert_eq!(
            parse_endpoint("/dev/ttyUSB0").unwrap(),
            Endpoint::Device(PathBuf::from("/dev/ttyUSB0"))
        );
        assert!(parse_endpoint("  ").is_err());
    }

    #[test]
    fn display_round_trips_the_argument() {
        assert_eq!(Endpoint::Stdio.to_string(), "-");
        assert_eq!(
            Endpoint::Device(PathBuf::from("/dev/ttyS0")).to_string(),
            "/dev/ttyS0"
        );
    }
}
