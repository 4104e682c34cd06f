//! Error types for hotswap-dict.

use std::fmt;

/// Result type alias for hotswap-dict operations.
pub type Result<T> = std::result::Result<T, DictError>;

/// Errors that can occur while checking, loading or publishing a dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    /// The remote resource could not be reached (connect/read timeout, DNS,
    /// refused connection, broken stream).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote resource answered with a status we do not handle.
    #[error("Unexpected status {status} from {location}")]
    Protocol {
        /// HTTP status code returned by the server
        status: u16,
        /// Location that was requested
        location: String,
    },

    /// A dictionary line could not be parsed. Recovered by skipping the line.
    #[error("Malformed dictionary line {line}: {reason}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// Why the line was rejected
        reason: &'static str,
    },

    /// The dictionary location or monitor settings are missing or unreadable.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Failed to load a dictionary body.
    #[error("Failed to load dictionary: {0}")]
    Load(String),

    /// A freshly loaded snapshot was rejected before publication.
    #[error("Dictionary validation failed: {0}")]
    Validation(String),

    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DictError {
    /// Returns `true` for errors caused by the network or the remote server,
    /// as opposed to local problems.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Protocol { .. })
    }
}

impl From<reqwest::Error> for DictError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return DictError::Protocol {
                status: status.as_u16(),
                location: err.url().map(|u| u.to_string()).unwrap_or_default(),
            };
        }
        DictError::Transport(err.to_string())
    }
}

impl From<config::ConfigError> for DictError {
    fn from(err: config::ConfigError) -> Self {
        DictError::Configuration(err.to_string())
    }
}

/// Validation error for snapshot validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// The snapshot holds no entries.
    Empty,

    /// A specific key maps to unacceptable variants.
    InvalidEntry {
        /// The offending key
        key: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid entry error.
    pub fn invalid_entry(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::Empty => write!(f, "dictionary has no entries"),
            Self::InvalidEntry { key, reason } => {
                write!(f, "Entry '{}' is invalid: {}", key, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for DictError {
    fn from(err: ValidationError) -> Self {
        DictError::Validation(err.to_string())
    }
}
