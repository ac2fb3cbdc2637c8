//! Crate-level error type

use std::fmt;
use std::io;

use crate::config::ConfigError;
use crate::format::FormatError;

/// Error for operations outside a device's status reporting
#[derive(Debug)]
pub enum Error {
    /// I/O on the interpreter's streams or an image file
    Io(io::Error),
    /// Image header or layout
    Format(FormatError),
    /// Session configuration
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Format(e) => write!(f, "Format error: {}", e),
            Error::Config(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Format(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<FormatError> for Error {
    fn from(err: FormatError) -> Self {
        match err {
            FormatError::Io(e) => Error::Io(e),
            other => Error::Format(other),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type for crate-level operations
pub type Result<T> = std::result::Result<T, Error>;
