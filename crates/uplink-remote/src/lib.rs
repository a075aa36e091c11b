//! Remote filesystem access for Uplink.
//!
//! The reconciliation engine talks to the remote tree only through the
//! [`RemoteFs`] trait. Every operation takes `&mut self`: the protocols this
//! targets allow one outstanding command per connection, and exclusive
//! borrows make overlapping requests impossible to express.
//!
//! # Backends
//!
//! - [`FtpRemote`] -- passive-mode FTP over a single control connection
//! - [`MountRemote`] -- a directory reachable through a local mount point
//! - [`InMemoryRemote`] -- recording, fault-injecting tree for tests
//! - [`DryRunRemote`] -- wraps any backend and skips every mutation

pub mod dry_run;
pub mod error;
pub mod ftp;
pub mod memory;
pub mod mount;
pub mod traits;
pub mod types;

pub use dry_run::DryRunRemote;
pub use error::{RemoteError, RemoteResult};
pub use ftp::{FtpConfig, FtpRemote};
pub use memory::{InMemoryRemote, OpKind, RemoteOp};
pub use mount::MountRemote;
pub use traits::RemoteFs;
pub use types::{EntryKind, RemoteEntry};
