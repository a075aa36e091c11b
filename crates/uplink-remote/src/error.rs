use thiserror::Error;

/// Errors from remote filesystem operations.
///
/// Everything except [`RemoteError::NotFound`] is a transport-class failure
/// and aborts a sync pass.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The requested path does not exist on the remote side.
    #[error("not found: {0}")]
    NotFound(String),

    /// The server answered a command with an unexpected reply.
    #[error("{command} rejected: {code} {message}")]
    Rejected {
        command: String,
        code: u16,
        message: String,
    },

    /// The conversation with the server broke down.
    #[error("transport error: {0}")]
    Transport(String),

    /// The connection was already closed.
    #[error("connection closed")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RemoteError {
    /// Whether this error means "the path is absent".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for remote operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
