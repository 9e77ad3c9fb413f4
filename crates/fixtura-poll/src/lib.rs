//! Deadline-bounded polling for async integration tests.
//!
//! A [`PollSpec`] describes an operation, the predicate its result must satisfy,
//! the pause between attempts, and the overall deadline. Nothing runs until
//! [`PollSpec::execute`]; a failed attempt ends the poll at once, while results
//! that merely do not satisfy the predicate are retried until the deadline.
//!
//! ```no_run
//! use fixtura_poll::{PollPreset, probe};
//!
//! # async fn wait() -> fixtura_poll::PollResult<()> {
//! probe::file_exists("target/server.ready")
//!     .with_preset(PollPreset::Quick)
//!     .with_message("server never wrote its ready flag")
//!     .execute()
//!     .await?;
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

pub mod error;
pub mod operation;
pub mod presets;
pub mod probe;
pub mod race;
pub mod spec;
pub mod supervisor;

pub use error::{BoxError, PollError, PollResult};
pub use operation::{AttemptFuture, PollOperation};
pub use presets::PollPreset;
pub use race::race_all;
pub use spec::{DEFAULT_MESSAGE, PollSpec};
pub use supervisor::Supervisor;
