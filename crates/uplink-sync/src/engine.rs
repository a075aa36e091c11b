//! The reconciliation engine.
//!
//! Each directory node goes through the same fixed sequence:
//!
//! ```text
//! LISTING -> UPLOADING -> PRUNING_FILES -> PRUNING_DIRS -> CREATING_DIRS -> RECURSING -> DONE
//! ```
//!
//! Every remote call is awaited before the next one is issued, and a
//! subtree is fully reconciled before its next sibling starts.

use std::fs;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tracing::{debug, info, warn};
use uplink_remote::RemoteFs;
use uplink_store::FingerprintStore;
use uplink_types::{remote_path, RelPath};

use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::ignore::{Filters, LocalPredicate};
use crate::local::list_local;
use crate::remote::RemoteTree;
use crate::report::SyncReport;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One pass over a local tree and its remote mirror.
pub struct SyncEngine<'r, R: RemoteFs + ?Sized> {
    tree: RemoteTree<'r, R>,
    store: FingerprintStore,
    local_root: PathBuf,
    remote_root: String,
    key_prefix: RelPath,
    local_ignored: LocalPredicate,
    report: SyncReport,
}

impl<'r, R: RemoteFs + ?Sized> SyncEngine<'r, R> {
    pub fn new(
        tree: RemoteTree<'r, R>,
        config: &SyncConfig,
        filters: &Filters,
        store: FingerprintStore,
    ) -> SyncResult<Self> {
        Ok(Self {
            tree,
            store,
            local_root: config.local_root(),
            remote_root: config.remote_root(),
            key_prefix: config.key_prefix()?,
            local_ignored: filters.local.clone(),
            report: SyncReport::default(),
        })
    }

    /// Create the remote root if it does not exist yet.
    pub async fn ensure_root(&mut self) -> SyncResult<()> {
        if self.remote_root == remote_path::CURRENT {
            return Ok(());
        }
        let root = self.remote_root.clone();
        self.report.dirs_created += self.tree.ensure_dir(&root).await?;
        Ok(())
    }

    /// Reconcile the directory at `rel` (relative to both roots) and
    /// everything below it.
    pub fn reconcile_directory(&mut self, rel: RelPath) -> BoxFuture<'_, SyncResult<()>> {
        Box::pin(async move {
            let local_dir = rel.to_native(&self.local_root);
            let remote_dir = remote_path::under(&self.remote_root, &rel);
            debug!(local = %local_dir.display(), remote = %remote_dir, "reconciling directory");

            let local = list_local(&local_dir, self.local_ignored.as_ref())?;
            let remote = self.tree.ls(&remote_dir).await?;
            let (local_files, local_dirs) = (local.file_names(), local.dir_names());
            let (remote_files, remote_dirs) = (remote.file_names(), remote.dir_names());

            for name in &local.files {
                let target = remote_path::join(&remote_dir, name);
                if remote_path::normalize(&target) == self.tree.state_path() {
                    warn!(path = %target, "local file shadows the fingerprint state, skipping");
                    continue;
                }
                let key = self.key_prefix.concat(&rel.join(name));
                let source = local_dir.join(name);
                if self.store.is_unchanged(&key, &source)? {
                    debug!(path = %key, "unchanged, skipping");
                    self.report.skipped += 1;
                    continue;
                }
                let data = fs::read(&source).map_err(|e| SyncError::local_io(&source, e))?;
                if remote_files.contains(name.as_str()) {
                    info!(path = %target, bytes = data.len(), "overwriting remote file");
                } else {
                    info!(path = %target, bytes = data.len(), "uploading new file");
                }
                self.tree.put(&target, &data).await?;
                self.store.record(&key, &source)?;
                self.report.uploaded += 1;
                self.report.bytes_uploaded += data.len() as u64;
            }

            for path in &remote.files {
                let name = remote_path::file_name(path);
                if local_files.contains(name) {
                    continue;
                }
                let key = self.key_prefix.concat(&rel.join(name));
                self.store.forget(&key);
                self.tree.delete(path).await?;
                self.report.files_deleted += 1;
            }

            for path in &remote.dirs {
                if local_dirs.contains(remote_path::file_name(path)) {
                    continue;
                }
                let removal = self.tree.delete_dir_recursive(path.clone()).await?;
                self.report.files_deleted += removal.files;
                self.report.dirs_deleted += removal.dirs;
            }

            for name in &local.dirs {
                if !remote_dirs.contains(name.as_str()) {
                    self.tree.make_dir(&remote_path::join(&remote_dir, name)).await?;
                    self.report.dirs_created += 1;
                }
            }

            for name in &local.dirs {
                self.reconcile_directory(rel.join(name)).await?;
            }
            Ok(())
        })
    }

    /// Persist the finalized fingerprints and return the pass report.
    ///
    /// Only call this after the whole tree was reconciled: finalizing keeps
    /// visited paths only.
    pub async fn finish(self) -> SyncResult<SyncReport> {
        let Self {
            mut tree,
            store,
            mut report,
            ..
        } = self;
        let finalized = store.finalize();
        tree.save_state(&finalized.state).await?;
        report.fingerprints = finalized.state.len();
        report.fingerprints_dropped = finalized.dropped.len();
        Ok(report)
    }
}

/// Run one full pass: load state, ensure the remote root, reconcile, and
/// persist. On any error the persisted state is left untouched.
///
/// The connection is not closed; see [`run_session`].
pub async fn run_pass<R: RemoteFs + ?Sized>(
    remote: &mut R,
    config: &SyncConfig,
    filters: &Filters,
) -> SyncResult<SyncReport> {
    config.validate()?;
    let mut tree = RemoteTree::new(remote, filters.remote.clone(), config.state_path());
    let state = tree.load_state().await?;
    let mut engine = SyncEngine::new(tree, config, filters, FingerprintStore::from_state(state))?;
    engine.ensure_root().await?;
    engine.reconcile_directory(RelPath::root()).await?;
    let report = engine.finish().await?;
    info!(
        uploaded = report.uploaded,
        skipped = report.skipped,
        deleted = report.files_deleted + report.dirs_deleted,
        created = report.dirs_created,
        "sync pass complete"
    );
    Ok(report)
}

/// Run a pass and close the connection exactly once, whatever the outcome.
///
/// A pass error takes precedence over a close error; a close error after a
/// successful pass is only logged since the state is already persisted.
pub async fn run_session<R: RemoteFs + ?Sized>(
    remote: &mut R,
    config: &SyncConfig,
    filters: &Filters,
) -> SyncResult<SyncReport> {
    let outcome = run_pass(remote, config, filters).await;
    if let Err(e) = remote.close().await {
        warn!(error = %e, "failed to close remote connection");
    }
    outcome
}
