use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cookie error: {0}")]
    Cookie(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("No unused session key found after {0} attempts")]
    KeyGeneration(usize),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error_keeps_message() {
        // Given a storage error
        let err = StorageError::Storage("Connection refused".to_string());

        // When converting into a session error
        let session_err = SessionError::from(err);

        // Then the message is preserved
        assert_eq!(
            session_err.to_string(),
            "Storage error: Storage error: Connection refused"
        );
    }

    #[test]
    fn test_key_generation_display() {
        let err = SessionError::KeyGeneration(16);

        assert_eq!(
            err.to_string(),
            "No unused session key found after 16 attempts"
        );
    }

    #[test]
    fn test_from_util_error() {
        let err: SessionError = UtilError::Crypto("rng failure".to_string()).into();

        assert!(matches!(err, SessionError::Utils(UtilError::Crypto(_))));
    }
}
