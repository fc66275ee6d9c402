//! Error types for livecloud

use thiserror::Error;

/// Main error type for livecloud operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Frame range {offset}+{length} exceeds buffer of {capacity} bytes")]
    OutOfBounds {
        offset: usize,
        length: usize,
        capacity: usize,
    },

    #[error("Truncated frame: {length} bytes leave {remainder} bytes after the last record")]
    TruncatedFrame { length: usize, remainder: usize },

    #[error("Invalid coordinate at point {index}: ({x}, {y}, {z})")]
    InvalidCoordinate { index: usize, x: f64, y: f64, z: f64 },

    #[error("Messaging error: {0}")]
    Messaging(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for livecloud operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = Error::OutOfBounds { offset: 8, length: 48, capacity: 40 };
        assert_eq!(err.to_string(), "Frame range 8+48 exceeds buffer of 40 bytes");

        let err = Error::TruncatedFrame { length: 50, remainder: 2 };
        assert!(err.to_string().contains("2 bytes"));

        let err = Error::InvalidCoordinate { index: 3, x: f64::NAN, y: 0.0, z: 1.0 };
        assert!(err.to_string().starts_with("Invalid coordinate at point 3"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "viewer.toml");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
