use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uplink_types::{remote_path, RelPath};

use crate::error::{SyncError, SyncResult};

/// Name of the persisted fingerprint state under the remote root.
pub const DEFAULT_STATE_FILE: &str = ".hashes";

/// Paths that define one mirror.
///
/// Fingerprint keys are expressed relative to `project_dir`, so a local
/// directory of `public` yields keys like `public/index.html`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub project_dir: PathBuf,
    /// Local tree to mirror, relative to `project_dir` (or absolute inside it).
    pub local_dir: PathBuf,
    /// Remote directory mirroring `local_dir`; `.` is the login directory.
    pub remote_dir: String,
    pub state_file: String,
}

impl SyncConfig {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        local_dir: impl Into<PathBuf>,
        remote_dir: impl Into<String>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            local_dir: local_dir.into(),
            remote_dir: remote_dir.into(),
            state_file: DEFAULT_STATE_FILE.to_string(),
        }
    }

    pub fn with_state_file(mut self, name: impl Into<String>) -> Self {
        self.state_file = name.into();
        self
    }

    /// Absolute or cwd-relative local root.
    pub fn local_root(&self) -> PathBuf {
        self.project_dir.join(&self.local_dir)
    }

    /// Normalized remote root.
    pub fn remote_root(&self) -> String {
        remote_path::normalize(&self.remote_dir)
    }

    /// Remote path of the persisted fingerprint state.
    pub fn state_path(&self) -> String {
        remote_path::join(&self.remote_root(), &self.state_file)
    }

    /// Prefix prepended to every local relative path to form its
    /// fingerprint key.
    pub fn key_prefix(&self) -> SyncResult<RelPath> {
        let local: &Path = if self.local_dir.is_absolute() {
            self.local_dir.strip_prefix(&self.project_dir).map_err(|_| {
                SyncError::Config(format!(
                    "local directory {} is outside the project directory {}",
                    self.local_dir.display(),
                    self.project_dir.display()
                ))
            })?
        } else {
            &self.local_dir
        };
        RelPath::from_path(local).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Reject configurations that cannot describe a mirror.
    pub fn validate(&self) -> SyncResult<()> {
        if self.state_file.is_empty() || self.state_file.contains('/') {
            return Err(SyncError::Config(format!(
                "state file name {:?} must be a single path segment",
                self.state_file
            )));
        }
        let root = self.remote_root();
        if root == ".." || root.starts_with("../") {
            return Err(SyncError::Config(format!(
                "remote directory {:?} leaves the starting directory",
                self.remote_dir
            )));
        }
        self.key_prefix()?;
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(".", ".", ".")
    }
}
