//! Error types shared by the PostgREST storage implementation.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`PostgrestDaoError`] failures.
pub type PostgrestResult<T> = Result<T, PostgrestDaoError>;

/// Failures that can occur while talking to PostgREST.
#[derive(Debug, Error)]
pub enum PostgrestDaoError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build PostgREST client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// The API key contains bytes that cannot be sent as a header.
    #[error("PostgREST API key is not a valid header value")]
    InvalidApiKey,
    /// A request could not be sent.
    #[error("failed to send PostgREST request to `{table}`")]
    RequestSend {
        table: String,
        #[source]
        source: reqwest::Error,
    },
    /// PostgREST answered with a non-success status code.
    #[error("unexpected PostgREST response status {status} for `{table}`")]
    RequestStatus { table: String, status: StatusCode },
    /// Response payload could not be decoded into rows.
    #[error("failed to decode PostgREST response for `{table}`")]
    DecodeResponse {
        table: String,
        #[source]
        source: reqwest::Error,
    },
    /// A single-row operation returned a different number of rows.
    #[error("expected at most one row from `{table}`, got {count}")]
    UnexpectedRows { table: String, count: usize },
}
