//! Error types for mediatree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MediaTreeError>;

#[derive(Debug, Error)]
pub enum MediaTreeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown user '{0}'")]
    UnknownUser(String),

    #[error("User '{0}' already exists")]
    UserExists(String),

    #[error("Malformed record on line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl MediaTreeError {
    /// Whether the error came from the storage layer rather than from the caller's input.
    pub fn is_storage(&self) -> bool {
        matches!(self, MediaTreeError::Io(_) | MediaTreeError::MalformedRow { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MediaTreeError::MalformedRow {
            line: 4,
            reason: "expected 8 fields, found 3".into(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed record on line 4: expected 8 fields, found 3"
        );
        assert_eq!(
            MediaTreeError::UnknownUser("alice".into()).to_string(),
            "Unknown user 'alice'"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: MediaTreeError = io.into();
        assert!(err.is_storage());
        assert!(!MediaTreeError::InvalidInput("x".into()).is_storage());
    }
}
