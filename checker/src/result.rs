//! The `result` module exposes a Result type that propagates one of many different Error types.

use crate::overlay::OverlayError;
use satellite_queue::QueueError;

#[derive(Debug)]
pub enum Error {
    /// Configuration could not be parsed or is inconsistent; fatal at startup.
    InvalidConfig(String),
    /// API misuse inside a scan; the scan aborts and is not retried.
    InvalidArgument(String),
    /// The overlay could not supply a fleet view; a previously published
    /// snapshot, if any, remains authoritative.
    UnavailableFleetView(OverlayError),
    /// Deadline hit or shutdown requested; per-fork buffers are discarded.
    Canceled,
    /// A repair-queue write failed; reconciliation must be skipped.
    QueueWrite(QueueError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidConfig(msg) => write!(f, "invalid config: {}", msg),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::UnavailableFleetView(e) => write!(f, "fleet view unavailable: {}", e),
            Error::Canceled => write!(f, "canceled"),
            Error::QueueWrite(e) => write!(f, "repair queue write failed: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl std::convert::From<OverlayError> for Error {
    fn from(e: OverlayError) -> Error {
        match e {
            OverlayError::Canceled => Error::Canceled,
            e => Error::UnavailableFleetView(e),
        }
    }
}

impl std::convert::From<QueueError> for Error {
    fn from(e: QueueError) -> Error {
        Error::QueueWrite(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_error() -> Result<()> {
        Err(QueueError::Write("disk full".to_string()))?;
        Ok(())
    }

    fn overlay_error() -> Result<()> {
        Err(OverlayError::Unavailable("connection refused".to_string()))?;
        Ok(())
    }

    #[test]
    fn test_from_conversions() {
        assert_matches!(queue_error(), Err(Error::QueueWrite(_)));
        assert_matches!(overlay_error(), Err(Error::UnavailableFleetView(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(Error::Canceled.to_string(), "canceled");
        assert!(queue_error().unwrap_err().to_string().contains("disk full"));
    }
}
