use async_trait::async_trait;

use crate::error::RemoteResult;
use crate::types::RemoteEntry;

/// Remote filesystem reachable over a single sequential connection.
///
/// Paths are `/`-separated strings as produced by
/// [`uplink_types::remote_path`]. Implementations must satisfy:
/// - `put` creates or overwrites; there is no separate create path.
/// - `get` fails with [`RemoteError::NotFound`](crate::RemoteError::NotFound)
///   when the path does not exist, and with another variant otherwise.
/// - `delete_dir` is only required to remove empty directories.
/// - `close` releases the connection and is safe to call once at the very
///   end, whatever happened before.
#[async_trait]
pub trait RemoteFs: Send {
    /// List the immediate children of `dir`.
    async fn list(&mut self, dir: &str) -> RemoteResult<Vec<RemoteEntry>>;

    /// Upload `data` to `path`, replacing any existing file.
    async fn put(&mut self, path: &str, data: &[u8]) -> RemoteResult<()>;

    /// Download the file at `path`.
    async fn get(&mut self, path: &str) -> RemoteResult<Vec<u8>>;

    /// Delete the file at `path`.
    async fn delete(&mut self, path: &str) -> RemoteResult<()>;

    /// Delete the empty directory at `path`.
    async fn delete_dir(&mut self, path: &str) -> RemoteResult<()>;

    /// Create the directory `path`. Its parent must exist.
    async fn make_dir(&mut self, path: &str) -> RemoteResult<()>;

    /// Release the connection.
    async fn close(&mut self) -> RemoteResult<()>;
}

#[async_trait]
impl<R: RemoteFs + ?Sized> RemoteFs for Box<R> {
    async fn list(&mut self, dir: &str) -> RemoteResult<Vec<RemoteEntry>> {
        (**self).list(dir).await
    }

    async fn put(&mut self, path: &str, data: &[u8]) -> RemoteResult<()> {
        (**self).put(path, data).await
    }

    async fn get(&mut self, path: &str) -> RemoteResult<Vec<u8>> {
        (**self).get(path).await
    }

    async fn delete(&mut self, path: &str) -> RemoteResult<()> {
        (**self).delete(path).await
    }

    async fn delete_dir(&mut self, path: &str) -> RemoteResult<()> {
        (**self).delete_dir(path).await
    }

    async fn make_dir(&mut self, path: &str) -> RemoteResult<()> {
        (**self).make_dir(path).await
    }

    async fn close(&mut self) -> RemoteResult<()> {
        (**self).close().await
    }
}
