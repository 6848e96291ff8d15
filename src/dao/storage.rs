//! Failures shared by every game store backend.

use std::error::Error as StdError;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

type BoxedSource = Box<dyn StdError + Send + Sync>;

/// Failure of a game store call, whatever the backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached or refused the request.
    #[error("game storage unreachable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: BoxedSource,
    },
    /// The backend answered with rows that do not fit the `games` table.
    #[error("game storage returned malformed rows: {message}")]
    Malformed { message: String },
}

impl StorageError {
    /// Wrap a transport or backend failure.
    pub fn unavailable(source: impl StdError + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    /// Report rows that do not fit the record shape.
    pub fn malformed(message: impl Into<String>) -> Self {
        StorageError::Malformed {
            message: message.into(),
        }
    }
}
