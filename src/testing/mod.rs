//! Testing utilities and fixtures
//!
//! This module provides dataset builders and a temporary workspace for
//! writing input files, used by unit tests and the integration suite.

pub mod fixtures;

use crate::config::InputPaths;
use crate::input::ReviewMatches;
use crate::model::Dataset;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary directory holding input files and an output directory
pub struct TestContext {
    /// Temporary directory for test files
    pub temp_dir: TempDir,
}

impl TestContext {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
        })
    }

    /// Get the path to the temporary directory
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Directory a build writes its artifacts to
    pub fn output_dir(&self) -> PathBuf {
        self.temp_dir.path().join("out")
    }

    /// Create a test file in the temporary directory
    pub fn create_test_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let file_path = self.temp_dir.path().join(name);
        std::fs::write(&file_path, content)?;
        Ok(file_path)
    }

    /// Serialize `value` as JSON into the temporary directory
    pub fn write_json<T: serde::Serialize>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let content = serde_json::to_string_pretty(value)?;
        self.create_test_file(name, &content)
    }

    /// Write a dataset and review match files, returning paths for a build
    pub fn write_inputs(
        &self,
        dataset: &Dataset,
        reviews: &[(&str, ReviewMatches)],
    ) -> Result<InputPaths> {
        let mut paths = InputPaths::new(
            self.write_json("combined.json", dataset)?,
            self.output_dir(),
        );
        for (provider, matches) in reviews {
            let path = self.write_json(&format!("{}-matches.json", provider), matches)?;
            paths = paths.with_review(*provider, path);
        }
        Ok(paths)
    }
}
