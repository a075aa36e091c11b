use uplink_crypto::HasherError;

/// Errors from fingerprint store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A local file could not be read for hashing.
    #[error(transparent)]
    Hash(#[from] HasherError),

    /// The persisted state could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The persisted state exists but is not a valid fingerprint mapping.
    #[error("malformed fingerprint state: {0}")]
    MalformedState(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
