// Error types shared by the network and command layers
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FtpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid PORT argument: {0}")]
    InvalidPortArgument(String),

    #[error("Invalid STOR argument: {0}")]
    InvalidStorArgument(String),

    #[error("Worker pool is closed")]
    PoolClosed,
}

impl FtpError {
    /// True when the control channel itself is gone and the session cannot continue.
    pub fn is_disconnect(&self) -> bool {
        match self {
            FtpError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::UnexpectedEof
            ),
            _ => false,
        }
    }
}
