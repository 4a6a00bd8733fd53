//! # Screenpack
//!
//! Compacts a combined cinema showings dataset into small, content-addressed
//! JSON artifacts a client can fetch on demand.
//!
//! ## Usage
//!
//! ```bash
//! screenpack --dataset combined.json --out public/data \
//!     [--reviews rottenTomatoes=rt-matches.json ...] [--clean] [--verify]
//! ```
//!
//! ## Modules
//!
//! - `compact` - The pruning, URL prefix, chunking, packing and addressing stages
//! - `config` - Compaction tunables and input locations
//! - `error` - Error type and error code registry
//! - `input` - Loading the dataset and merging review matches
//! - `model` - Typed view of the dataset and the metadata record
//! - `output` - Atomic artifact writes, verification and stale-file cleanup
//! - `testing` - Dataset builders and fixtures for tests
pub mod compact;
pub mod config;
pub mod error;
pub mod input;
pub mod model;
pub mod output;

pub mod testing;

pub use compact::pipeline::{run_build, BuildReport, RunOptions};
pub use compact::{compact_dataset, BuildSummary, CompactedBuild};
pub use config::{CompactConfig, InputPaths};
pub use error::{Result, ScreenpackError};
