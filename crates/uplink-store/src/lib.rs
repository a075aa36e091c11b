//! Content-fingerprint store for Uplink.
//!
//! The remote side of a sync has no usable change detection, so Uplink keeps
//! its own: one BLAKE3 digest per synced file, persisted as a JSON object on
//! the remote tree and reloaded at the start of every pass.
//!
//! # Types
//!
//! - [`FingerprintStore`] -- the in-pass store: freshness checks, recording,
//!   forgetting, and finalization to the visited set
//! - [`FingerprintState`] -- the persisted mapping and its JSON codec
//!
//! # Design Rules
//!
//! 1. A file's bytes are hashed at most once per pass.
//! 2. Every freshness check marks its path visited, whatever the answer.
//! 3. Finalization keeps only visited paths; the store is rebuilt each pass,
//!    never appended to.
//! 4. The caller persists a finalized state only after a fully successful
//!    pass. A partial state would drop fingerprints of unvisited files.

pub mod error;
pub mod fingerprint;
pub mod state;

pub use error::{StoreError, StoreResult};
pub use fingerprint::{Finalized, FingerprintStore};
pub use state::FingerprintState;
