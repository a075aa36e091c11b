use serde::{Deserialize, Serialize};

/// Kind of a remote directory entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a listed remote directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Bare name, without the directory prefix.
    pub name: String,
    pub kind: EntryKind,
}

impl RemoteEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: EntryKind::File }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self { name: name.into(), kind: EntryKind::Directory }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}
