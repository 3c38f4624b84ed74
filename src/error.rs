/// Error types for the store and the comment tree fetch
use thiserror::Error;

/// Failure reported by the tracked-thread store.
///
/// `Host` carries the reason taken from the browser's last-error channel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{0}")]
    Host(String),

    #[error("Failed to decode stored value: {0}")]
    Decode(String),

    #[error("Failed to encode value for storage: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected payload: {0}")]
    Payload(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
