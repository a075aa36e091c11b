use serde::Serialize;

/// Outcome counters of one successful pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub uploaded: usize,
    pub bytes_uploaded: u64,
    pub skipped: usize,
    pub files_deleted: usize,
    pub dirs_deleted: usize,
    pub dirs_created: usize,
    /// Entries in the persisted fingerprint state.
    pub fingerprints: usize,
    /// Fingerprints dropped for files that no longer exist.
    pub fingerprints_dropped: usize,
}

impl SyncReport {
    /// Number of operations that changed the remote tree, excluding the
    /// fingerprint state itself.
    pub fn changes(&self) -> usize {
        self.uploaded + self.files_deleted + self.dirs_deleted + self.dirs_created
    }

    pub fn is_noop(&self) -> bool {
        self.changes() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_noop() {
        assert!(SyncReport::default().is_noop());
    }

    #[test]
    fn changes_ignore_skips() {
        let report = SyncReport {
            uploaded: 2,
            skipped: 10,
            dirs_created: 1,
            ..SyncReport::default()
        };
        assert_eq!(report.changes(), 3);
    }

    #[test]
    fn serializes_to_json() {
        let json = serde_json::to_value(SyncReport::default()).unwrap();
        assert_eq!(json["uploaded"], 0);
        assert_eq!(json["fingerprints_dropped"], 0);
    }
}
