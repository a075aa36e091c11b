//! Ignore rules and the predicates the engine consumes.
//!
//! Rules come from an optional JSON file at the project root:
//!
//! ```text
//! { "local": ["public/**/*.map"], "remote": ["www/cgi-bin"] }
//! ```
//!
//! Local patterns match paths relative to the project directory; remote
//! patterns match normalized remote paths. `*` never crosses a `/`.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uplink_types::{remote_path, RelPath};

use crate::error::{SyncError, SyncResult};

/// Default ignore file name, looked up in the project directory.
pub const DEFAULT_IGNORE_FILE: &str = ".ftpignore.json";

/// Returns `true` for an absolute local path that must be left alone.
pub type LocalPredicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Returns `true` for a remote path that must be left alone.
pub type RemotePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Raw contents of an ignore file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreFile {
    #[serde(default)]
    pub local: Vec<String>,
    #[serde(default)]
    pub remote: Vec<String>,
}

impl IgnoreFile {
    /// Load `path`; a missing file yields no rules.
    pub fn load(path: &Path) -> SyncResult<Self> {
        match fs::read(path) {
            Ok(data) => Self::parse(&data).map_err(|reason| SyncError::IgnoreFile {
                path: path.to_path_buf(),
                reason,
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no ignore file");
                Ok(Self::default())
            }
            Err(e) => Err(SyncError::local_io(path, e)),
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self, String> {
        serde_json::from_slice(data).map_err(|e| e.to_string())
    }
}

/// A compiled list of glob patterns.
#[derive(Clone, Debug)]
pub struct IgnoreSet {
    set: GlobSet,
    patterns: Vec<String>,
}

impl IgnoreSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> SyncResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| SyncError::Pattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| SyncError::Pattern {
            pattern: patterns.iter().map(|p| p.as_ref()).collect::<Vec<&str>>().join(", "),
            source,
        })?;
        Ok(Self {
            set,
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
        })
    }

    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
            patterns: Vec::new(),
        }
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.set.is_match(path)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Compiled local and remote ignore rules.
#[derive(Clone, Debug)]
pub struct IgnoreRules {
    local: IgnoreSet,
    remote: IgnoreSet,
}

impl IgnoreRules {
    pub fn none() -> Self {
        Self {
            local: IgnoreSet::empty(),
            remote: IgnoreSet::empty(),
        }
    }

    pub fn from_file(file: &IgnoreFile) -> SyncResult<Self> {
        let remote: Vec<String> = file.remote.iter().map(|p| remote_path::normalize(p)).collect();
        Ok(Self {
            local: IgnoreSet::new(&file.local)?,
            remote: IgnoreSet::new(&remote)?,
        })
    }

    /// Load and compile the ignore file at `path` (missing means no rules).
    pub fn load(path: &Path) -> SyncResult<Self> {
        Self::from_file(&IgnoreFile::load(path)?)
    }

    pub fn local(&self) -> &IgnoreSet {
        &self.local
    }

    pub fn remote(&self) -> &IgnoreSet {
        &self.remote
    }

    /// Predicates for the engine. Local paths are matched relative to
    /// `project_dir`; a matching symbolic link is never ignored.
    pub fn filters(&self, project_dir: &Path) -> Filters {
        let local = self.local.clone();
        let base = project_dir.to_path_buf();
        let remote = self.remote.clone();
        Filters {
            local: Arc::new(move |path: &Path| {
                local.is_match(&project_relative(&base, path)) && !is_symlink(path)
            }),
            remote: Arc::new(move |path: &str| remote.is_match(&remote_path::normalize(path))),
        }
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::none()
    }
}

/// The pair of injected ignore predicates.
#[derive(Clone)]
pub struct Filters {
    pub local: LocalPredicate,
    pub remote: RemotePredicate,
}

impl Filters {
    /// Ignore nothing.
    pub fn none() -> Self {
        Self {
            local: Arc::new(|_: &Path| false),
            remote: Arc::new(|_: &str| false),
        }
    }
}

impl std::fmt::Debug for Filters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filters").finish_non_exhaustive()
    }
}

fn project_relative(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    match RelPath::from_path(rel) {
        Ok(rel) => rel.as_str().to_string(),
        Err(_) => rel.to_string_lossy().into_owned(),
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Default location of the ignore file for a project.
pub fn default_ignore_path(project_dir: &Path) -> PathBuf {
    project_dir.join(DEFAULT_IGNORE_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_does_not_cross_separator() {
        let set = IgnoreSet::new(&["public/*.log"]).unwrap();
        assert!(set.is_match("public/debug.log"));
        assert!(!set.is_match("public/sub/debug.log"));
    }

    #[test]
    fn double_star_crosses_separator() {
        let set = IgnoreSet::new(&["public/**/*.map"]).unwrap();
        assert!(set.is_match("public/js/app.js.map"));
        assert!(set.is_match("public/a/b/c.map"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let err = IgnoreSet::new(&["a[b"]).unwrap_err();
        assert!(matches!(err, SyncError::Pattern { ref pattern, .. } if pattern == "a[b"));
    }

    #[test]
    fn parse_ignore_file() {
        let file = IgnoreFile::parse(br#"{"local": ["a"], "remote": ["b"]}"#).unwrap();
        assert_eq!(file.local, vec!["a"]);
        assert_eq!(file.remote, vec!["b"]);
        let partial = IgnoreFile::parse(br#"{"remote": ["b"]}"#).unwrap();
        assert!(partial.local.is_empty());
    }

    #[test]
    fn missing_ignore_file_means_no_rules() {
        let dir = tempfile::tempdir().unwrap();
        let file = IgnoreFile::load(&dir.path().join(DEFAULT_IGNORE_FILE)).unwrap();
        assert_eq!(file, IgnoreFile::default());
    }

    #[test]
    fn malformed_ignore_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_IGNORE_FILE);
        fs::write(&path, b"{not json").unwrap();
        assert!(matches!(IgnoreFile::load(&path), Err(SyncError::IgnoreFile { .. })));
    }

    #[test]
    fn local_predicate_matches_project_relative() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("public/debug.log");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"x").unwrap();
        let rules = IgnoreRules::from_file(&IgnoreFile {
            local: vec!["public/*.log".into()],
            remote: vec![],
        })
        .unwrap();
        let filters = rules.filters(dir.path());
        assert!((filters.local)(&file));
        assert!(!(filters.local)(&dir.path().join("public/index.html")));
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_are_never_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("target.log"), b"x").unwrap();
        let link = dir.path().join("link.log");
        std::os::unix::fs::symlink(dir.path().join("target.log"), &link).unwrap();
        let rules = IgnoreRules::from_file(&IgnoreFile {
            local: vec!["*.log".into()],
            remote: vec![],
        })
        .unwrap();
        let filters = rules.filters(dir.path());
        assert!(!(filters.local)(&link));
        assert!((filters.local)(&dir.path().join("target.log")));
    }

    #[test]
    fn remote_patterns_are_normalized() {
        let rules = IgnoreRules::from_file(&IgnoreFile {
            local: vec![],
            remote: vec!["./www//cgi-bin/".into()],
        })
        .unwrap();
        let filters = rules.filters(Path::new("."));
        assert!((filters.remote)("www/cgi-bin"));
        assert!(!(filters.remote)("www/index.html"));
    }

    #[test]
    fn compiled_rules_keep_their_patterns() {
        let rules = IgnoreRules::from_file(&IgnoreFile {
            local: vec!["public/*.log".into()],
            remote: vec!["www//cgi-bin/".into()],
        })
        .unwrap();
        assert_eq!(rules.local().patterns(), ["public/*.log"]);
        assert_eq!(rules.remote().patterns(), ["www/cgi-bin"]);
        assert!(IgnoreRules::none().local().is_empty());
        assert!(IgnoreRules::none().remote().is_empty());
    }

    #[test]
    fn no_filters_ignore_nothing() {
        let filters = Filters::none();
        assert!(!(filters.local)(Path::new("anything")));
        assert!(!(filters.remote)("anything"));
    }
}
