//! One-way synchronization for Uplink.
//!
//! Mirrors a local directory onto a remote tree over a single sequential
//! connection. The remote side offers no change detection, so unchanged
//! files are recognized through content fingerprints persisted on the
//! remote tree itself.
//!
//! A pass is: load fingerprints, ensure the remote root exists, reconcile
//! the tree depth-first, persist fingerprints. Within a directory the order
//! is always upload, prune files, prune directories, create directories,
//! recurse. Any failure aborts the pass and nothing is persisted.

pub mod config;
pub mod engine;
pub mod error;
pub mod ignore;
pub mod local;
pub mod remote;
pub mod report;

pub use config::SyncConfig;
pub use engine::{run_pass, run_session, SyncEngine};
pub use error::{SyncError, SyncResult};
pub use ignore::{Filters, IgnoreFile, IgnoreRules, IgnoreSet, LocalPredicate, RemotePredicate};
pub use local::{list_local, LocalListing};
pub use remote::{RemoteListing, RemoteTree, Removal};
pub use report::SyncReport;
