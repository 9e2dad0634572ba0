use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tracing::{debug, info};

use crate::error::{Result, TransportError};

/// Baud rates with a termios speed constant on every supported Unix.
pub const SUPPORTED_BAUD_RATES: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

/// A serial device opened raw 8N1 and registered with the tokio reactor.
///
/// The descriptor is non-blocking; reads and writes suspend on readiness, so
/// a reader task can always be cancelled between reads.
pub struct SerialPort {
    inner: AsyncFd<File>,
    path: PathBuf,
    baud: u32,
}

impl SerialPort {
    /// Open `path` and configure it for `baud` 8N1 with no flow control.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(path: impl AsRef<Path>, baud: u32) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let speed = baud_constant(baud)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY | libc::O_NONBLOCK)
            .open(&path)
            .map_err(|source| TransportError::Open {
                path: path.clone(),
                source,
            })?;

        configure_raw(file.as_raw_fd(), speed).map_err(|source| TransportError::Configure {
            path: path.clone(),
            source,
        })?;
        debug!(?path, baud, "termios configured raw 8N1");

        let inner = AsyncFd::new(file).map_err(|source| TransportError::Configure {
            path: path.clone(),
            source,
        })?;

        info!(?path, baud, "serial device opened");
        Ok(Self { inner, path, baud })
    }

    /// Device path this port was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured baud rate.
    pub fn baud(&self) -> u32 {
        self.baud
    }
}

/// Map a numeric baud rate onto its termios speed constant.
pub fn baud_constant(baud: u32) -> Result<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        other => return Err(TransportError::UnsupportedBaud(other)),
    };
    Ok(speed)
}

fn configure_raw(fd: RawFd, speed: libc::speed_t) -> io::Result<()> {
    // SAFETY: `termios` is plain data, so an all-zero value is a valid bit
    // pattern; `tcgetattr` overwrites it before any field is read.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is an open descriptor owned by the caller and `tio` is a
    // valid, writable `termios` for the duration of each call below.
    unsafe {
        if libc::tcgetattr(fd, &mut tio) != 0 {
            return Err(io::Error::last_os_error());
        }
        libc::cfmakeraw(&mut tio);
    }

    tio.c_cflag &= !(libc::CSIZE | libc::PARENB | libc::CSTOPB);
    #[cfg(any(target_os = "linux", target_os = "macos"))]
    {
        tio.c_cflag &= !libc::CRTSCTS;
    }
    tio.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;
    tio.c_iflag &= !(libc::IXON | libc::IXOFF | libc::IXANY);
    // VMIN 0 makes a drained non-blocking tty read return 0 (EOF) instead of
    // EAGAIN; with VMIN 1 readiness is cleared and the reader waits.
    tio.c_cc[libc::VMIN] = 1;
    tio.c_cc[libc::VTIME] = 0;

    // SAFETY: same descriptor and `termios` as above.
    unsafe {
        if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::tcsetattr(fd, libc::TCSANOW, &tio) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

impl AsyncRead for SerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        loop {
            let mut guard = ready!(self.inner.poll_read_ready(cx))?;
            let unfilled = buf.initialize_unfilled();
            match guard.try_io(|inner| inner.get_ref().read(unfilled)) {
                Ok(Ok(len)) => {
                    buf.advance(len);
                    return Poll::Ready(Ok(()));
                }
                Ok(Err(err)) => return Poll::Ready(Err(err)),
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsyncWrite for SerialPort {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        loop {
            let mut guard = ready!(self.inner.poll_write_ready(cx))?;
            match guard.try_io(|inner| inner.get_ref().write(buf)) {
                Ok(result) => return Poll::Ready(result),
                Err(_would_block) => continue,
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("path", &self.path)
            .field("baud", &self.baud)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "gazbridge-transport-{tag}-{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .expect("time should be after epoch")
                .as_nanos()
        ))
    }

    #[test]
    fn supported_rates_map_to_constants() {
        for baud in SUPPORTED_BAUD_RATES {
            assert!(baud_constant(baud).is_ok(), "{baud} should be supported");
        }
    }

    #[test]
    fn unsupported_rate_rejected() {
        let err = baud_constant(12345).unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedBaud(12345)));
    }

    #[tokio::test]
    async fn open_missing_device_fails() {
        let path = unique_temp_path("missing");
        let err = SerialPort::open(&path, 9600).unwrap_err();
        assert!(matches!(err, TransportError::Open { .. }));
    }

    #[tokio::test]
    async fn open_regular_file_fails_configuration() {
        let path = unique_temp_path("regular");
        std::fs::write(&path, b"not a tty").unwrap();

        let err = SerialPort::open(&path, 9600).unwrap_err();
        assert!(matches!(err, TransportError::Configure { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn open_rejects_unsupported_baud_before_touching_device() {
        let path = unique_temp_path("baud");
        let err = SerialPort::open(&path, 31250).unwrap_err();
        assert!(matches!(err, TransportError::UnsupportedBaud(31250)));
    }

    #[cfg(target_os = "linux")]
    struct PtyPair {
        master: File,
        slave_path: PathBuf,
    }

    #[cfg(target_os = "linux")]
    fn open_pty() -> PtyPair {
        use std::ffi::CStr;
        use std::os::fd::FromRawFd;

        // SAFETY: plain libc pty allocation; every return value is checked and
        // the master descriptor is handed to a `File` that owns it.
        unsafe {
            let fd = libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY);
            assert!(fd >= 0, "posix_openpt failed");
            assert_eq!(libc::grantpt(fd), 0);
            assert_eq!(libc::unlockpt(fd), 0);
            let mut name = [0 as libc::c_char; 128];
            assert_eq!(libc::ptsname_r(fd, name.as_mut_ptr(), name.len()), 0);
            let slave_path = PathBuf::from(
                CStr::from_ptr(name.as_ptr())
                    .to_string_lossy()
                    .into_owned(),
            );
            PtyPair {
                master: File::from_raw_fd(fd),
                slave_path,
            }
        }
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn reads_and_writes_through_pty() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let mut pty = open_pty();
        let mut port = SerialPort::open(&pty.slave_path, 2400).unwrap();
        assert_eq!(port.baud(), 2400);
        assert_eq!(port.path(), pty.slave_path.as_path());

        pty.master.write_all(b"C0M\r").unwrap();
        let mut buf = [0u8; 4];
        port.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"C0M\r");

        port.write_all(b"  0   .        1.   00\r").await.unwrap();
        let mut echoed = [0u8; 23];
        let mut master = pty.master.try_clone().unwrap();
        tokio::task::spawn_blocking(move || master.read_exact(&mut echoed).map(|_| echoed))
            .await
            .unwrap()
            .map(|bytes| assert_eq!(&bytes, b"  0   .        1.   00\r"))
            .unwrap();
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn drained_port_waits_for_more_data() {
        use std::time::Duration;
        use tokio::io::AsyncReadExt;

        let mut pty = open_pty();
        let mut port = SerialPort::open(&pty.slave_path, 9600).unwrap();

        pty.master.write_all(b"C0M\r").unwrap();
        let mut buf = [0u8; 64];
        let first = port.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..first], b"C0M\r");

        let pending = tokio::time::timeout(Duration::from_millis(100), port.read(&mut buf)).await;
        assert!(pending.is_err(), "drained port must not report EOF: {pending:?}");

        pty.master.write_all(b"c1 00012.3400\r").unwrap();
        let mut line = [0u8; 14];
        tokio::time::timeout(Duration::from_secs(2), port.read_exact(&mut line))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&line, b"c1 00012.3400\r");
    }
}
