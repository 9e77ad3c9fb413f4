//! Reversible filesystem mutations for integration tests.
//!
//! Every mutation has an `_undoable` form that snapshots whatever it is about to
//! overwrite or remove and hands back an [`UndoHandle`]. Releasing the handle puts
//! the filesystem back byte-for-byte and discards the snapshot.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use fixtura_fsops::{FsOps, Teardown};
//!
//! # fn main() -> fixtura_fsops::FsOpsResult<()> {
//! let fsops = FsOps::default();
//! let mut teardown = Teardown::new();
//! teardown.defer(fsops.ensure_dir_undoable(Path::new("target/fixture")))?;
//! teardown.defer(fsops.delete_undoable(Path::new("target/fixture/cache")))?;
//! // ... exercise the system under test ...
//! teardown.release_all()?;
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions, clippy::multiple_crate_versions)]

pub mod cwd;
pub mod error;
pub mod handle;
pub mod scope;
pub mod service;
pub mod staging;
pub mod teardown;
mod tree;

pub use error::{FsOpsError, FsOpsResult};
pub use handle::{UndoHandle, combine};
pub use scope::{ScopedError, scoped, scoped_async};
pub use service::FsOps;
pub use staging::{EntryKind, StagedSnapshot, StagingStore};
pub use teardown::Teardown;
