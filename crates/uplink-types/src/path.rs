use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A path relative to a tree root, using `/` as the separator.
///
/// This is the key type of the fingerprint store and the unit the
/// reconciliation engine recurses on. The empty path is the root itself.
/// Comparison is byte-wise: case and Unicode form are significant.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelPath(String);

impl RelPath {
    /// The root of a tree.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse a `/`-separated relative path, dropping empty and `.` segments.
    ///
    /// Absolute paths and `..` segments are rejected.
    pub fn new(path: &str) -> Result<Self, TypeError> {
        if path.starts_with('/') {
            return Err(TypeError::InvalidPath {
                path: path.to_string(),
                reason: "path is absolute",
            });
        }
        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    return Err(TypeError::InvalidPath {
                        path: path.to_string(),
                        reason: "parent segments are not allowed",
                    })
                }
                s => segments.push(s),
            }
        }
        Ok(Self(segments.join("/")))
    }

    /// Build from a native relative path (e.g. the result of `strip_prefix`).
    pub fn from_path(path: &Path) -> Result<Self, TypeError> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => {
                    let name = name.to_str().ok_or_else(|| TypeError::InvalidPath {
                        path: path.display().to_string(),
                        reason: "path is not valid UTF-8",
                    })?;
                    segments.push(name);
                }
                Component::CurDir => {}
                _ => {
                    return Err(TypeError::InvalidPath {
                        path: path.display().to_string(),
                        reason: "path must be relative and must not leave its root",
                    })
                }
            }
        }
        Ok(Self(segments.join("/")))
    }

    /// Append a single file or directory name.
    pub fn join(&self, name: &str) -> Self {
        if self.0.is_empty() {
            Self(name.to_string())
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// Append another relative path.
    pub fn concat(&self, other: &RelPath) -> Self {
        if other.is_root() {
            self.clone()
        } else {
            self.join(other.as_str())
        }
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// Iterate over the segments of this path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Resolve this path under a native base directory.
    pub fn to_native(&self, base: &Path) -> PathBuf {
        let mut out = base.to_path_buf();
        for segment in self.segments() {
            out.push(segment);
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelPath({:?})", self.0)
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str(".")
        } else {
            f.write_str(&self.0)
        }
    }
}

impl TryFrom<String> for RelPath {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<RelPath> for String {
    fn from(path: RelPath) -> Self {
        path.0
    }
}

impl AsRef<str> for RelPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
