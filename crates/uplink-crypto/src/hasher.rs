use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use uplink_types::Digest;

/// BLAKE3 content hasher for file fingerprints.
///
/// Files are streamed through the hasher, so large uploads are not held in
/// memory just to be fingerprinted.
pub struct ContentHasher;

impl ContentHasher {
    /// Digest of an in-memory buffer.
    pub fn hash(data: &[u8]) -> Digest {
        Digest::from_hash(*blake3::hash(data).as_bytes())
    }

    /// Digest of everything a reader yields.
    pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<Digest> {
        let mut hasher = blake3::Hasher::new();
        io::copy(&mut reader, &mut hasher)?;
        Ok(Digest::from_hash(*hasher.finalize().as_bytes()))
    }

    /// Digest of a file's full contents.
    pub fn hash_file(path: &Path) -> Result<Digest, HasherError> {
        let file = File::open(path).map_err(|source| HasherError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::hash_reader(file).map_err(|source| HasherError::Read {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Verify that data produces the expected digest.
    pub fn verify(data: &[u8], expected: &Digest) -> bool {
        Self::hash(data) == *expected
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
