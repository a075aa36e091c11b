use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use uplink_types::remote_path;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::RemoteFs;
use crate::types::RemoteEntry;

/// Kind of a recorded remote operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    List,
    Put,
    Get,
    Delete,
    DeleteDir,
    MakeDir,
    Close,
}

/// One operation issued against an [`InMemoryRemote`], in call order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RemoteOp {
    List(String),
    Put(String),
    Get(String),
    Delete(String),
    DeleteDir(String),
    MakeDir(String),
    Close,
}

impl RemoteOp {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::List(_) => OpKind::List,
            Self::Put(_) => OpKind::Put,
            Self::Get(_) => OpKind::Get,
            Self::Delete(_) => OpKind::Delete,
            Self::DeleteDir(_) => OpKind::DeleteDir,
            Self::MakeDir(_) => OpKind::MakeDir,
            Self::Close => OpKind::Close,
        }
    }

    /// The path the operation targeted, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::List(p)
            | Self::Put(p)
            | Self::Get(p)
            | Self::Delete(p)
            | Self::DeleteDir(p)
            | Self::MakeDir(p) => Some(p),
            Self::Close => None,
        }
    }

    /// Whether the operation changes the remote tree.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self.kind(),
            OpKind::Put | OpKind::Delete | OpKind::DeleteDir | OpKind::MakeDir
        )
    }
}

#[derive(Debug)]
struct Fault {
    kind: OpKind,
    path: Option<String>,
    skip: usize,
}

/// In-memory remote tree.
///
/// Intended for tests. Enforces the rules a strict FTP server would: parents
/// must exist, directories are created once, only empty directories can be
/// removed, and listing a missing directory fails. Every call is appended to
/// an operation log before it is evaluated.
#[derive(Debug)]
pub struct InMemoryRemote {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    log: Vec<RemoteOp>,
    faults: Vec<Fault>,
    closes: usize,
}

impl InMemoryRemote {
    /// A remote containing only the starting directory and `/`.
    pub fn new() -> Self {
        let mut dirs = BTreeSet::new();
        dirs.insert(remote_path::CURRENT.to_string());
        dirs.insert("/".to_string());
        Self {
            dirs,
            files: BTreeMap::new(),
            log: Vec::new(),
            faults: Vec::new(),
            closes: 0,
        }
    }

    /// Seed a directory and all of its ancestors. Not logged.
    pub fn with_dir(mut self, path: &str) -> Self {
        self.seed_dir(&remote_path::normalize(path));
        self
    }

    /// Seed a file, creating its ancestors. Not logged.
    pub fn with_file(mut self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        let path = remote_path::normalize(path);
        self.seed_dir(&remote_path::parent(&path));
        self.files.insert(path, data.into());
        self
    }

    fn seed_dir(&mut self, path: &str) {
        let mut current = path.to_string();
        while self.dirs.insert(current.clone()) {
            current = remote_path::parent(&current);
        }
    }

    /// Fail the first operation of `kind` (optionally only on `path`).
    pub fn fail_on(&mut self, kind: OpKind, path: Option<&str>) {
        self.fail_nth(kind, path, 0);
    }

    /// Fail the operation of `kind` after `skip` matching calls succeed.
    pub fn fail_nth(&mut self, kind: OpKind, path: Option<&str>, skip: usize) {
        self.faults.push(Fault {
            kind,
            path: path.map(remote_path::normalize),
            skip,
        });
    }

    /// Contents of the file at `path`.
    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.files.get(&remote_path::normalize(path)).map(Vec::as_slice)
    }

    pub fn has_file(&self, path: &str) -> bool {
        self.files.contains_key(&remote_path::normalize(path))
    }

    pub fn has_dir(&self, path: &str) -> bool {
        self.dirs.contains(&remote_path::normalize(path))
    }

    /// All file paths, sorted.
    pub fn file_paths(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    /// Operations issued so far.
    pub fn ops(&self) -> &[RemoteOp] {
        &self.log
    }

    /// Operations of one kind, in call order.
    pub fn ops_of(&self, kind: OpKind) -> Vec<&RemoteOp> {
        self.log.iter().filter(|op| op.kind() == kind).collect()
    }

    /// Forget the operation log (e.g. between two passes).
    pub fn clear_ops(&mut self) {
        self.log.clear();
    }

    /// Number of times `close` was called.
    pub fn close_count(&self) -> usize {
        self.closes
    }

    fn begin(&mut self, op: RemoteOp) -> RemoteResult<String> {
        let path = op.path().map(remote_path::normalize).unwrap_or_default();
        let kind = op.kind();
        self.log.push(op);
        let hit = self.faults.iter_mut().position(|fault| {
            if fault.kind != kind || fault.path.as_ref().is_some_and(|p| *p != path) {
                return false;
            }
            if fault.skip > 0 {
                fault.skip -= 1;
                return false;
            }
            true
        });
        if let Some(index) = hit {
            self.faults.remove(index);
            return Err(RemoteError::Transport(format!(
                "injected failure on {kind:?} {path}"
            )));
        }
        Ok(path)
    }

    fn children_of<'a>(&'a self, dir: &'a str) -> impl Iterator<Item = RemoteEntry> + 'a {
        let dirs = self
            .dirs
            .iter()
            .filter(move |d| d.as_str() != dir && remote_path::parent(d) == dir)
            .map(|d| RemoteEntry::dir(remote_path::file_name(d)));
        let files = self
            .files
            .keys()
            .filter(move |f| remote_path::parent(f) == dir)
            .map(|f| RemoteEntry::file(remote_path::file_name(f)));
        dirs.chain(files)
    }

    fn exists(&self, path: &str) -> bool {
        self.dirs.contains(path) || self.files.contains_key(path)
    }
}

impl Default for InMemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteFs for InMemoryRemote {
    async fn list(&mut self, dir: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let dir = self.begin(RemoteOp::List(dir.to_string()))?;
        if !self.dirs.contains(&dir) {
            return Err(RemoteError::Transport(format!("cannot list {dir}: no such directory")));
        }
        Ok(self.children_of(&dir).collect())
    }

    async fn put(&mut self, path: &str, data: &[u8]) -> RemoteResult<()> {
        let path = self.begin(RemoteOp::Put(path.to_string()))?;
        if self.dirs.contains(&path) {
            return Err(RemoteError::Transport(format!("cannot write {path}: is a directory")));
        }
        if !self.dirs.contains(&remote_path::parent(&path)) {
            return Err(RemoteError::Transport(format!("cannot write {path}: no parent directory")));
        }
        self.files.insert(path, data.to_vec());
        Ok(())
    }

    async fn get(&mut self, path: &str) -> RemoteResult<Vec<u8>> {
        let path = self.begin(RemoteOp::Get(path.to_string()))?;
        self.files
            .get(&path)
            .cloned()
            .ok_or(RemoteError::NotFound(path))
    }

    async fn delete(&mut self, path: &str) -> RemoteResult<()> {
        let path = self.begin(RemoteOp::Delete(path.to_string()))?;
        match self.files.remove(&path) {
            Some(_) => Ok(()),
            None => Err(RemoteError::Transport(format!("cannot delete {path}: no such file"))),
        }
    }

    async fn delete_dir(&mut self, path: &str) -> RemoteResult<()> {
        let path = self.begin(RemoteOp::DeleteDir(path.to_string()))?;
        if !self.dirs.contains(&path) {
            return Err(RemoteError::Transport(format!("cannot remove {path}: no such directory")));
        }
        if self.children_of(&path).next().is_some() {
            return Err(RemoteError::Transport(format!("cannot remove {path}: directory not empty")));
        }
        self.dirs.remove(&path);
        Ok(())
    }

    async fn make_dir(&mut self, path: &str) -> RemoteResult<()> {
        let path = self.begin(RemoteOp::MakeDir(path.to_string()))?;
        if self.exists(&path) {
            return Err(RemoteError::Transport(format!("cannot create {path}: already exists")));
        }
        if !self.dirs.contains(&remote_path::parent(&path)) {
            return Err(RemoteError::Transport(format!("cannot create {path}: no parent directory")));
        }
        self.dirs.insert(path);
        Ok(())
    }

    async fn close(&mut self) -> RemoteResult<()> {
        self.begin(RemoteOp::Close)?;
        self.closes += 1;
        Ok(())
    }
}
