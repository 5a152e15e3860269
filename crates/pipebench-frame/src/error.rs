use std::io::ErrorKind;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The declared payload length exceeds the configured maximum.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

impl FrameError {
    /// Whether this error means the peer went away, as opposed to a protocol
    /// violation or a local I/O failure.
    pub fn is_disconnect(&self) -> bool {
        match self {
            FrameError::ConnectionClosed => true,
            FrameError::Io(err) => matches!(
                err.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            ),
            FrameError::PayloadTooLarge { .. } => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
