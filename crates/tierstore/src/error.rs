//! Error types for tierstore

use std::fmt;
use std::io;

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for store operations and store construction
#[derive(Debug)]
pub enum Error {
    /// I/O error
    Io(io::Error),

    /// Corrupt or unreadable entry file
    Parse(String),

    /// Increment/decrement on a value that is not an integer
    NotNumeric(String),

    /// Invalid key pattern
    Pattern(regex::Error),

    /// No constructor registered for this store kind
    UnknownStore(String),

    /// Malformed store configuration
    Config(String),

    /// Store cannot serve requests right now
    Unavailable(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Parse(msg) => write!(f, "Parse error: {}", msg),
            Error::NotNumeric(key) => write!(f, "Value for key '{}' is not an integer", key),
            Error::Pattern(e) => write!(f, "Invalid pattern: {}", e),
            Error::UnknownStore(kind) => write!(f, "Unknown store kind: {}", kind),
            Error::Config(msg) => write!(f, "Configuration error: {}", msg),
            Error::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Pattern(e) => Some(e),
            _ => None,
        }
    }
}

impl Error {
    /// Whether this error came from configuration rather than from serving a request
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::UnknownStore(_) | Error::Config(_))
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Pattern(err)
    }
}

impl From<nom::Err<nom::error::Error<&[u8]>>> for Error {
    fn from(err: nom::Err<nom::error::Error<&[u8]>>) -> Self {
        Error::Parse(format!("{:?}", err))
    }
}
