use std::io;
use std::path::PathBuf;

use thiserror::Error;
use uplink_remote::RemoteError;
use uplink_store::StoreError;
use uplink_types::TypeError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("local I/O error on {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("malformed fingerprint state at {path}: {reason}")]
    State { path: String, reason: String },

    #[error("invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid ignore file {}: {reason}", path.display())]
    IgnoreFile { path: PathBuf, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid path: {0}")]
    Path(#[from] TypeError),
}

impl SyncError {
    pub(crate) fn local_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::LocalIo {
            path: path.into(),
            source,
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
