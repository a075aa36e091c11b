use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use uplink_types::remote_path;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::RemoteFs;
use crate::types::RemoteEntry;

/// Remote tree exposed through a local mount point (NFS, SSHFS, SMB, ...).
///
/// Remote paths resolve under `root`; `.` is the root itself and absolute
/// remote paths are re-rooted there too. Paths that would climb out of the
/// root are refused.
#[derive(Debug)]
pub struct MountRemote {
    root: PathBuf,
    closed: bool,
}

impl MountRemote {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            closed: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> RemoteResult<PathBuf> {
        if self.closed {
            return Err(RemoteError::Closed);
        }
        let normalized = remote_path::normalize(path);
        let mut out = self.root.clone();
        for segment in normalized.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(RemoteError::Transport(format!(
                        "{path} escapes the mount root"
                    )))
                }
                s => out.push(s),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl RemoteFs for MountRemote {
    async fn list(&mut self, dir: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let native = self.resolve(dir)?;
        let mut reader = fs::read_dir(&native).await?;
        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                entries.push(RemoteEntry::dir(name));
            } else if file_type.is_file() {
                entries.push(RemoteEntry::file(name));
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn put(&mut self, path: &str, data: &[u8]) -> RemoteResult<()> {
        let native = self.resolve(path)?;
        fs::write(&native, data).await?;
        Ok(())
    }

    async fn get(&mut self, path: &str) -> RemoteResult<Vec<u8>> {
        let native = self.resolve(path)?;
        match fs::read(&native).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RemoteError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&mut self, path: &str) -> RemoteResult<()> {
        let native = self.resolve(path)?;
        fs::remove_file(&native).await?;
        Ok(())
    }

    async fn delete_dir(&mut self, path: &str) -> RemoteResult<()> {
        let native = self.resolve(path)?;
        fs::remove_dir(&native).await?;
        Ok(())
    }

    async fn make_dir(&mut self, path: &str) -> RemoteResult<()> {
        let native = self.resolve(path)?;
        fs::create_dir(&native).await?;
        Ok(())
    }

    async fn close(&mut self) -> RemoteResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_through_mount() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = MountRemote::new(dir.path());
        remote.make_dir("www").await.unwrap();
        remote.put("www/a.txt", b"hello").await.unwrap();
        assert_eq!(remote.get("www/a.txt").await.unwrap(), b"hello");
        assert_eq!(std::fs::read(dir.path().join("www/a.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn lists_sorted_files_and_dirs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("b")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        let mut remote = MountRemote::new(dir.path());
        let entries = remote.list(".").await.unwrap();
        assert_eq!(entries, vec![RemoteEntry::file("a.txt"), RemoteEntry::dir("b")]);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = MountRemote::new(dir.path());
        assert!(remote.get(".hashes").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn delete_dir_refuses_non_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("d")).unwrap();
        std::fs::write(dir.path().join("d/x"), b"x").unwrap();
        let mut remote = MountRemote::new(dir.path());
        assert!(remote.delete_dir("d").await.is_err());
    }

    #[tokio::test]
    async fn refuses_escape() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = MountRemote::new(dir.path());
        assert!(remote.list("../..").await.is_err());
    }

    #[tokio::test]
    async fn closed_mount_rejects_calls() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = MountRemote::new(dir.path());
        remote.close().await.unwrap();
        assert!(matches!(remote.list(".").await, Err(RemoteError::Closed)));
    }
}
