//! Foundation types for Uplink.
//!
//! Every other Uplink crate depends on `uplink-types`.
//!
//! # Key Types
//!
//! - [`Digest`] — BLAKE3 content fingerprint of a file's bytes
//! - [`RelPath`] — canonical `/`-separated path relative to a tree root
//! - [`remote_path`] — textual helpers for paths on the remote side

pub mod digest;
pub mod error;
pub mod path;
pub mod remote_path;

pub use digest::Digest;
pub use error::TypeError;
pub use path::RelPath;
