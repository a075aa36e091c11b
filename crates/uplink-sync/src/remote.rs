use std::collections::HashSet;
use std::future::Future;
use std::ops::AddAssign;
use std::pin::Pin;

use tracing::{debug, info, warn};
use uplink_remote::{RemoteError, RemoteFs};
use uplink_store::{FingerprintState, StoreError};
use uplink_types::remote_path;

use crate::error::{SyncError, SyncResult};
use crate::ignore::RemotePredicate;

/// Filtered children of a remote directory, as full remote paths.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RemoteListing {
    pub dir: String,
    pub files: Vec<String>,
    pub dirs: Vec<String>,
    /// Entries hidden by the ignore predicate or because they are the
    /// persisted state.
    pub hidden: usize,
}

impl RemoteListing {
    /// Final segments of the listed files.
    pub fn file_names(&self) -> HashSet<&str> {
        self.files.iter().map(|f| remote_path::file_name(f)).collect()
    }

    pub fn dir_names(&self) -> HashSet<&str> {
        self.dirs.iter().map(|d| remote_path::file_name(d)).collect()
    }
}

/// What a recursive directory removal deleted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Removal {
    pub files: usize,
    pub dirs: usize,
    /// Directories left in place because they still hold ignored entries.
    pub kept: usize,
}

impl AddAssign for Removal {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.dirs += other.dirs;
        self.kept += other.kept;
    }
}

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The remote side of a pass: one exclusively borrowed connection plus the
/// ignore predicate and the location of the persisted state.
pub struct RemoteTree<'r, R: RemoteFs + ?Sized> {
    remote: &'r mut R,
    ignored: RemotePredicate,
    state_path: String,
}

impl<'r, R: RemoteFs + ?Sized> RemoteTree<'r, R> {
    pub fn new(remote: &'r mut R, ignored: RemotePredicate, state_path: impl Into<String>) -> Self {
        Self {
            remote,
            ignored,
            state_path: remote_path::normalize(&state_path.into()),
        }
    }

    pub fn state_path(&self) -> &str {
        &self.state_path
    }

    fn is_hidden(&self, path: &str) -> bool {
        remote_path::normalize(path) == self.state_path || (self.ignored)(path)
    }

    /// List `dir`, dropping ignored entries and the persisted state.
    pub async fn ls(&mut self, dir: &str) -> SyncResult<RemoteListing> {
        let entries = self.remote.list(dir).await?;
        let mut listing = RemoteListing {
            dir: dir.to_string(),
            ..RemoteListing::default()
        };
        for entry in entries {
            let path = remote_path::join(dir, &entry.name);
            if self.is_hidden(&path) {
                listing.hidden += 1;
                continue;
            }
            if entry.is_dir() {
                listing.dirs.push(path);
            } else {
                listing.files.push(path);
            }
        }
        Ok(listing)
    }

    /// Delete `dir` and everything below it, children first.
    ///
    /// Ignored entries are left alone; a directory that still holds one is
    /// kept so that the empty-directory removal is never issued on it.
    pub fn delete_dir_recursive(&mut self, dir: String) -> BoxFuture<'_, SyncResult<Removal>> {
        Box::pin(async move {
            let listing = self.ls(&dir).await?;
            let mut removal = Removal::default();
            for file in &listing.files {
                self.delete(file).await?;
                removal.files += 1;
            }
            for sub in listing.dirs {
                removal += self.delete_dir_recursive(sub).await?;
            }
            if listing.hidden > 0 || removal.kept > 0 {
                warn!(path = %dir, hidden = listing.hidden, "keeping remote directory with ignored entries");
                removal.kept += 1;
                return Ok(removal);
            }
            info!(path = %dir, "removing remote directory");
            self.remote.delete_dir(&dir).await?;
            removal.dirs += 1;
            Ok(removal)
        })
    }

    /// Make sure `dir` exists, creating only the missing trailing segments.
    /// Returns the number of directories created.
    pub async fn ensure_dir(&mut self, dir: &str) -> SyncResult<usize> {
        let dir = remote_path::normalize(dir);
        let (start, segments) = remote_path::walk_segments(&dir);
        let mut current = start.to_string();
        let mut created = 0;
        for segment in segments {
            let entries = self.remote.list(&current).await?;
            let next = remote_path::join(&current, segment);
            if entries.iter().any(|e| e.is_dir() && e.name == segment) {
                debug!(path = %next, "remote directory exists");
            } else {
                self.make_dir(&next).await?;
                created += 1;
            }
            current = next;
        }
        Ok(created)
    }

    /// Read the persisted fingerprint state; a missing file is an empty one.
    pub async fn load_state(&mut self) -> SyncResult<FingerprintState> {
        let data = match self.remote.get(&self.state_path).await {
            Ok(data) => data,
            Err(RemoteError::NotFound(_)) => {
                info!(path = %self.state_path, "no fingerprint state on remote, starting fresh");
                return Ok(FingerprintState::new());
            }
            Err(e) => return Err(e.into()),
        };
        let state = FingerprintState::from_json_bytes(&data).map_err(|e| match e {
            StoreError::MalformedState(reason) => SyncError::State {
                path: self.state_path.clone(),
                reason,
            },
            other => SyncError::Store(other),
        })?;
        info!(path = %self.state_path, entries = state.len(), "downloaded fingerprint state");
        Ok(state)
    }

    /// Overwrite the persisted fingerprint state.
    pub async fn save_state(&mut self, state: &FingerprintState) -> SyncResult<()> {
        let data = state.to_json_bytes()?;
        self.remote.put(&self.state_path, &data).await?;
        info!(path = %self.state_path, entries = state.len(), "uploaded fingerprint state");
        Ok(())
    }

    pub async fn put(&mut self, path: &str, data: &[u8]) -> SyncResult<()> {
        self.remote.put(path, data).await?;
        Ok(())
    }

    pub async fn delete(&mut self, path: &str) -> SyncResult<()> {
        info!(path, "deleting remote file");
        self.remote.delete(path).await?;
        Ok(())
    }

    pub async fn make_dir(&mut self, path: &str) -> SyncResult<()> {
        info!(path, "creating remote directory");
        self.remote.make_dir(path).await?;
        Ok(())
    }
}
