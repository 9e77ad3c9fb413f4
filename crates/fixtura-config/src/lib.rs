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
#![allow(clippy::module_name_repetitions)]

//! Configuration shared by the fixtura crates.
//! Layout: defaults.rs (compiled defaults and env keys), error.rs (`ConfigError`),
//! model.rs (typed settings), loader.rs (environment parsing).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;

pub use error::{ConfigError, ConfigResult};
pub use model::{FixturaConfig, LogFormatSetting, LoggingSettings, PollDefaults, StagingSettings};
