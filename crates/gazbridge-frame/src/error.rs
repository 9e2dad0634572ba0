/// Errors that can occur while building, scanning or sending frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The display has three digits of seconds; 1000 s and above cannot be shown.
    #[error("seconds out of display range ({seconds}, max 999)")]
    OutOfRange { seconds: u32 },

    /// Centiseconds must be 0..=99.
    #[error("centiseconds out of range ({0}, max 99)")]
    InvalidCentis(u8),

    /// An I/O error occurred while reading the source or writing the sink.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink accepted zero bytes; it has gone away.
    #[error("connection closed (sink accepted no bytes)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
