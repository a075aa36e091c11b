use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uplink_crypto::ContentHasher;
use uplink_types::{Digest, RelPath};

use crate::error::StoreResult;
use crate::state::FingerprintState;

/// In-pass fingerprint store.
///
/// Loaded from the persisted [`FingerprintState`] at the start of a pass and
/// owned by the reconciliation engine until [`finalize`](Self::finalize).
/// Keys are paths relative to the project directory; the digest memo is keyed
/// by the absolute local path and lives only as long as the store.
pub struct FingerprintStore {
    fingerprints: FingerprintState,
    visited: HashSet<RelPath>,
    memo: HashMap<PathBuf, Digest>,
}

/// Result of finalizing a store at the end of a pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Finalized {
    /// The mapping to persist.
    pub state: FingerprintState,
    /// Keys that were dropped because they were not visited this pass.
    pub dropped: Vec<RelPath>,
}

impl FingerprintStore {
    /// An empty store, as on a first run.
    pub fn new() -> Self {
        Self::from_state(FingerprintState::new())
    }

    /// A store seeded with previously persisted fingerprints.
    pub fn from_state(state: FingerprintState) -> Self {
        Self {
            fingerprints: state,
            visited: HashSet::new(),
            memo: HashMap::new(),
        }
    }

    /// Digest of the file at `file`, read at most once per store lifetime.
    fn digest_of(&mut self, file: &Path) -> StoreResult<Digest> {
        if let Some(digest) = self.memo.get(file) {
            return Ok(*digest);
        }
        let digest = ContentHasher::hash_file(file)?;
        self.memo.insert(file.to_path_buf(), digest);
        Ok(digest)
    }

    /// Returns `true` iff a stored fingerprint for `key` equals the current
    /// digest of `file`. Marks `key` visited in every case.
    pub fn is_unchanged(&mut self, key: &RelPath, file: &Path) -> StoreResult<bool> {
        self.visited.insert(key.clone());
        let current = self.digest_of(file)?;
        let unchanged = self.fingerprints.get(key) == Some(&current);
        debug!(path = %key, digest = %current.short_hex(), unchanged, "freshness check");
        Ok(unchanged)
    }

    /// Store the current digest of `file` as the fingerprint for `key`.
    pub fn record(&mut self, key: &RelPath, file: &Path) -> StoreResult<Digest> {
        let digest = self.digest_of(file)?;
        self.fingerprints.insert(key.clone(), digest);
        Ok(digest)
    }

    /// Remove any fingerprint for `key`.
    pub fn forget(&mut self, key: &RelPath) -> Option<Digest> {
        self.fingerprints.remove(key)
    }

    /// Restrict the mapping to keys visited during this pass.
    pub fn finalize(self) -> Finalized {
        let mut dropped = Vec::new();
        let mut state = FingerprintState::new();
        for (key, digest) in self.fingerprints {
            if self.visited.contains(&key) {
                state.insert(key, digest);
            } else {
                info!(path = %key, "removing fingerprint for non-existent file");
                dropped.push(key);
            }
        }
        Finalized { state, dropped }
    }

    /// Stored fingerprint for `key`, if any.
    pub fn get(&self, key: &RelPath) -> Option<&Digest> {
        self.fingerprints.get(key)
    }

    /// Whether `key` has been checked during this pass.
    pub fn is_visited(&self, key: &RelPath) -> bool {
        self.visited.contains(key)
    }

    pub fn len(&self) -> usize {
        self.fingerprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fingerprints.is_empty()
    }
}

impl Default for FingerprintStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FingerprintStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintStore")
            .field("fingerprints", &self.fingerprints.len())
            .field("visited", &self.visited.len())
            .field("memoized", &self.memo.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rel(s: &str) -> RelPath {
        RelPath::new(s).unwrap()
    }

    fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn unknown_file_is_changed_but_visited() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.txt", b"a");
        let mut store = FingerprintStore::new();

        assert!(!store.is_unchanged(&rel("a.txt"), &file).unwrap());
        assert!(store.is_visited(&rel("a.txt")));
        assert!(store.get(&rel("a.txt")).is_none());
    }

    #[test]
    fn recorded_file_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.txt", b"a");
        let mut store = FingerprintStore::new();

        store.is_unchanged(&rel("a.txt"), &file).unwrap();
        let digest = store.record(&rel("a.txt"), &file).unwrap();
        assert_eq!(digest, Digest::from_bytes(b"a"));
        assert!(store.is_unchanged(&rel("a.txt"), &file).unwrap());
    }

    #[test]
    fn seeded_matching_digest_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.txt", b"same");
        let state: FingerprintState = [(rel("a.txt"), Digest::from_bytes(b"same"))]
            .into_iter()
            .collect();
        let mut store = FingerprintStore::from_state(state);
        assert!(store.is_unchanged(&rel("a.txt"), &file).unwrap());
    }

    #[test]
    fn seeded_stale_digest_is_changed() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.txt", b"new");
        let state: FingerprintState = [(rel("a.txt"), Digest::from_bytes(b"old"))]
            .into_iter()
            .collect();
        let mut store = FingerprintStore::from_state(state);
        assert!(!store.is_unchanged(&rel("a.txt"), &file).unwrap());
    }

    #[test]
    fn file_is_hashed_once_per_pass() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.txt", b"first");
        let mut store = FingerprintStore::new();

        store.is_unchanged(&rel("a.txt"), &file).unwrap();
        fs::write(&file, b"second").unwrap();
        let digest = store.record(&rel("a.txt"), &file).unwrap();
        assert_eq!(digest, Digest::from_bytes(b"first"));
    }

    #[test]
    fn forget_removes_entry() {
        let state: FingerprintState = [(rel("gone.txt"), Digest::from_bytes(b"x"))]
            .into_iter()
            .collect();
        let mut store = FingerprintStore::from_state(state);
        assert!(store.forget(&rel("gone.txt")).is_some());
        assert!(store.forget(&rel("gone.txt")).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn finalize_keeps_only_visited() {
        let dir = tempfile::tempdir().unwrap();
        let kept = write(dir.path(), "kept.txt", b"k");
        let state: FingerprintState = [
            (rel("kept.txt"), Digest::from_bytes(b"k")),
            (rel("deleted.txt"), Digest::from_bytes(b"d")),
        ]
        .into_iter()
        .collect();
        let mut store = FingerprintStore::from_state(state);
        store.is_unchanged(&rel("kept.txt"), &kept).unwrap();

        let finalized = store.finalize();
        assert_eq!(finalized.state.len(), 1);
        assert!(finalized.state.contains(&rel("kept.txt")));
        assert_eq!(finalized.dropped, vec![rel("deleted.txt")]);
    }

    #[test]
    fn visited_without_fingerprint_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "a.txt", b"a");
        let mut store = FingerprintStore::new();
        store.is_unchanged(&rel("a.txt"), &file).unwrap();
        assert!(store.finalize().state.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FingerprintStore::new();
        let result = store.is_unchanged(&rel("nope"), &dir.path().join("nope"));
        assert!(result.is_err());
        assert!(store.is_visited(&rel("nope")));
    }
}
