use std::collections::HashSet;

use async_trait::async_trait;
use tracing::info;
use uplink_types::remote_path;

use crate::error::RemoteResult;
use crate::traits::RemoteFs;
use crate::types::RemoteEntry;

/// Wraps a backend and turns every mutation into a logged no-op.
///
/// Reads pass through to the real remote. Directories that would have been
/// created are remembered so that listing them (or anything below them)
/// yields an empty directory instead of a failure.
pub struct DryRunRemote<R> {
    inner: R,
    planned_dirs: HashSet<String>,
}

impl<R: RemoteFs> DryRunRemote<R> {
    pub fn new(inner: R) -> Self {
        info!("*DRY RUN* no changes will be made on the remote");
        Self {
            inner,
            planned_dirs: HashSet::new(),
        }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    fn is_planned(&self, dir: &str) -> bool {
        let mut current = remote_path::normalize(dir);
        loop {
            if self.planned_dirs.contains(&current) {
                return true;
            }
            let parent = remote_path::parent(&current);
            if parent == current {
                return false;
            }
            current = parent;
        }
    }
}

#[async_trait]
impl<R: RemoteFs> RemoteFs for DryRunRemote<R> {
    async fn list(&mut self, dir: &str) -> RemoteResult<Vec<RemoteEntry>> {
        if self.is_planned(dir) {
            return Ok(Vec::new());
        }
        self.inner.list(dir).await
    }

    async fn put(&mut self, path: &str, data: &[u8]) -> RemoteResult<()> {
        info!(path, bytes = data.len(), "dry run: skipping upload");
        Ok(())
    }

    async fn get(&mut self, path: &str) -> RemoteResult<Vec<u8>> {
        self.inner.get(path).await
    }

    async fn delete(&mut self, path: &str) -> RemoteResult<()> {
        info!(path, "dry run: skipping delete");
        Ok(())
    }

    async fn delete_dir(&mut self, path: &str) -> RemoteResult<()> {
        info!(path, "dry run: skipping directory removal");
        Ok(())
    }

    async fn make_dir(&mut self, path: &str) -> RemoteResult<()> {
        info!(path, "dry run: skipping directory creation");
        self.planned_dirs.insert(remote_path::normalize(path));
        Ok(())
    }

    async fn close(&mut self) -> RemoteResult<()> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryRemote, OpKind};

    #[tokio::test]
    async fn mutations_never_reach_inner() {
        let mut remote = DryRunRemote::new(InMemoryRemote::new().with_file("old.txt", "x"));
        remote.put("new.txt", b"n").await.unwrap();
        remote.delete("old.txt").await.unwrap();
        remote.make_dir("d").await.unwrap();
        remote.delete_dir("d").await.unwrap();

        let inner = remote.into_inner();
        assert!(inner.ops().iter().all(|op| !op.is_mutation()));
        assert!(inner.has_file("old.txt"));
        assert!(!inner.has_file("new.txt"));
    }

    #[tokio::test]
    async fn planned_dirs_list_empty() {
        let mut remote = DryRunRemote::new(InMemoryRemote::new());
        remote.make_dir("d").await.unwrap();
        assert!(remote.list("d").await.unwrap().is_empty());
        assert!(remote.list("d/e").await.unwrap().is_empty());
        assert!(remote.inner().ops_of(OpKind::List).is_empty());
    }

    #[tokio::test]
    async fn reads_pass_through() {
        let mut remote = DryRunRemote::new(InMemoryRemote::new().with_file("a", "a"));
        assert_eq!(remote.get("a").await.unwrap(), b"a");
        assert_eq!(remote.list(".").await.unwrap(), vec![RemoteEntry::file("a")]);
        remote.close().await.unwrap();
        assert_eq!(remote.inner().close_count(), 1);
    }
}
