use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{SyncError, SyncResult};

/// Immediate children of a local directory, split by kind.
///
/// Names are sorted so that a pass visits the tree in a deterministic
/// order. Entries rejected by the ignore predicate are absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LocalListing {
    pub files: Vec<String>,
    pub dirs: Vec<String>,
}

impl LocalListing {
    pub fn file_names(&self) -> HashSet<&str> {
        self.files.iter().map(String::as_str).collect()
    }

    pub fn dir_names(&self) -> HashSet<&str> {
        self.dirs.iter().map(String::as_str).collect()
    }
}

/// List `dir`, dropping entries for which `ignored` returns `true`.
///
/// Entries are classified without following symbolic links, so every link
/// is listed as a file and recursion never enters a linked directory. Names
/// that are not valid UTF-8 cannot be mapped onto the remote tree and fail
/// the listing.
pub fn list_local(dir: &Path, ignored: &dyn Fn(&Path) -> bool) -> SyncResult<LocalListing> {
    let entries = fs::read_dir(dir).map_err(|e| SyncError::local_io(dir, e))?;
    let mut listing = LocalListing::default();
    for entry in entries {
        let entry = entry.map_err(|e| SyncError::local_io(dir, e))?;
        let path = entry.path();
        if ignored(&path) {
            continue;
        }
        let name = entry.file_name().into_string().map_err(|raw| {
            SyncError::local_io(
                &path,
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("file name {raw:?} is not valid UTF-8"),
                ),
            )
        })?;
        let file_type = entry.file_type().map_err(|e| SyncError::local_io(&path, e))?;
        if file_type.is_dir() {
            listing.dirs.push(name);
        } else {
            listing.files.push(name);
        }
    }
    listing.files.sort();
    listing.dirs.sort();
    Ok(listing)
}
