//! End-to-end build: read inputs, compact, write artifacts

use super::{compact_dataset, BuildSummary};
use crate::config::{CompactConfig, InputPaths};
use crate::error::Result;
use crate::input::{load_inputs, merge_reviews};
use crate::output::{clean_stale, verify, write_build, VerifyReport, WriteReport};
use std::path::PathBuf;
use tracing::info;

/// Optional steps around the write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Remove artifacts from earlier runs that this run did not produce
    pub clean: bool,
    /// Re-read and check the written artifacts
    pub verify: bool,
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub summary: BuildSummary,
    pub written: WriteReport,
    pub removed: Vec<PathBuf>,
    pub verified: Option<VerifyReport>,
}

/// Run the whole build against fixed input paths
///
/// Any error aborts the run; nothing is written before every input has been
/// read and every stage has completed in memory.
pub fn run_build(
    paths: &InputPaths,
    config: &CompactConfig,
    options: RunOptions,
) -> Result<BuildReport> {
    info!("Starting build from {}", paths.dataset.display());

    let inputs = load_inputs(paths)?;
    let dataset = merge_reviews(inputs.dataset, inputs.reviews);
    let build = compact_dataset(dataset, config)?;
    let written = write_build(&build, &paths.output_dir)?;

    let removed = if options.clean {
        clean_stale(&paths.output_dir, &written.file_names())?
    } else {
        Vec::new()
    };

    let verified = if options.verify {
        Some(verify(&paths.output_dir, &written.meta_file)?)
    } else {
        None
    };

    info!("Build complete: metadata at {}", written.meta_file);
    Ok(BuildReport {
        summary: build.summary,
        written,
        removed,
        verified,
    })
}
