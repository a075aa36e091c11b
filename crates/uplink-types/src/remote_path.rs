//! Textual path helpers for the remote tree.
//!
//! Remote paths are plain strings with `/` separators. `.` denotes the
//! session's starting directory; a leading `/` makes a path absolute.
//! Mapping between the local and remote trees is pure suffix substitution,
//! so these helpers never consult the remote side.

use crate::path::RelPath;

/// The session's starting directory.
pub const CURRENT: &str = ".";

/// Collapse redundant separators, `.` and resolvable `..` segments.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            s => parts.push(s),
        }
    }
    if absolute {
        format!("/{}", parts.join("/"))
    } else if parts.is_empty() {
        CURRENT.to_string()
    } else {
        parts.join("/")
    }
}

/// Join a single name onto a remote directory.
pub fn join(dir: &str, name: &str) -> String {
    if dir == CURRENT || dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// Map a relative path onto a remote root.
pub fn under(root: &str, rel: &RelPath) -> String {
    if rel.is_root() {
        root.to_string()
    } else {
        join(root, rel.as_str())
    }
}

/// The directory containing `path`.
pub fn parent(path: &str) -> String {
    match path.rsplit_once('/') {
        Some(("", _)) => "/".to_string(),
        Some((dir, _)) => dir.to_string(),
        None => CURRENT.to_string(),
    }
}

/// The final segment of `path`.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Split a normalized remote directory into the directory a walk starts
/// from (`/` or `.`) and the segments below it.
pub fn walk_segments(path: &str) -> (&'static str, Vec<&str>) {
    let start = if path.starts_with('/') { "/" } else { CURRENT };
    let segments = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != CURRENT)
        .collect();
    (start, segments)
}
