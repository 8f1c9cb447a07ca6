//! Error handling for the fmdemod library
//!
//! This module provides a unified error type for all operations in the
//! library, covering I/O, device setup and DSP configuration errors.

use std::fmt;
use std::io;

/// A specialized Result type for fmdemod operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fmdemod operations
#[derive(Debug)]
pub enum Error {
    /// I/O error (file operations, pipes, etc.)
    Io(io::Error),

    /// Invalid DSP or pipeline configuration
    InvalidArgument(String),

    /// Device configuration or initialization error
    Device(String),

    /// RTL-SDR specific error (requires "rtlsdr" feature)
    #[cfg(feature = "rtlsdr")]
    RtlSdr(rtl_sdr_rs::error::RtlsdrError),

    /// Generic error with custom message
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Error::Device(msg) => write!(f, "Device error: {}", msg),
            #[cfg(feature = "rtlsdr")]
            Error::RtlSdr(err) => write!(f, "RTL-SDR error: {}", err),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

// From conversions for common error types

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

#[cfg(feature = "rtlsdr")]
impl From<rtl_sdr_rs::error::RtlsdrError> for Error {
    fn from(err: rtl_sdr_rs::error::RtlsdrError) -> Self {
        Error::RtlSdr(err)
    }
}

// Helper constructors for common error scenarios

impl Error {
    /// Create an invalid-argument error with a custom message
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Create a device error with a custom message
    pub fn device<S: Into<String>>(msg: S) -> Self {
        Error::Device(msg.into())
    }

    /// Create a generic error with a custom message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Error::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as StdError;

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_string_conversion() {
        let err: Error = "test error".into();
        assert!(matches!(err, Error::Other(_)));
        assert_eq!(err.to_string(), "test error");
    }

    #[test]
    fn test_invalid_argument_constructor() {
        let err = Error::invalid_argument("mixer cannot be None");
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_device_error_constructor() {
        let err = Error::device("initialization failed");
        assert!(matches!(err, Error::Device(_)));
        assert!(err.to_string().contains("Device error"));
    }

    #[test]
    fn test_error_source() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.source().is_some());
    }
}
