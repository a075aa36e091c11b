//! Content hashing for Uplink.
//!
//! Fingerprints are plain BLAKE3 digests over a file's full contents. All
//! crypto operations wrap the `blake3` crate; nothing here is custom.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError};
