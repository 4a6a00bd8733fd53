//! Tunables and input locations for a compaction run
//!
//! Defaults live in named constants. A TOML file may override them, and
//! `SCREENPACK_*` environment variables override the file.

use crate::error::{ErrorCode, Result, ScreenpackError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Shortest URL prefix worth a dictionary entry, in bytes
pub const DEFAULT_MIN_PREFIX_LEN: usize = 20;
/// Assumed size of a `{N}` token when scoring prefix savings
pub const DEFAULT_PLACEHOLDER_LEN: usize = 4;
/// Performance count a bucket may hold before a new one is opened
pub const DEFAULT_BUCKET_CEILING: usize = 1000;
/// Hex characters of the SHA-256 digest kept in artifact names
pub const DEFAULT_DIGEST_LEN: usize = 10;

/// Review providers merged into the dataset, in merge order
pub const REVIEW_PROVIDERS: [&str; 4] = ["imdb", "letterboxd", "metacritic", "rottenTomatoes"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompactConfig {
    pub min_prefix_len: usize,
    pub placeholder_len: usize,
    pub bucket_ceiling: usize,
    pub digest_len: usize,
}

impl Default for CompactConfig {
    fn default() -> Self {
        Self {
            min_prefix_len: DEFAULT_MIN_PREFIX_LEN,
            placeholder_len: DEFAULT_PLACEHOLDER_LEN,
            bucket_ceiling: DEFAULT_BUCKET_CEILING,
            digest_len: DEFAULT_DIGEST_LEN,
        }
    }
}

impl CompactConfig {
    /// Load configuration from an optional TOML file, then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.merge_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ScreenpackError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("Configuration file not found: {}", path.display()),
            ));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScreenpackError::config_with_code(
                ErrorCode::CONFIG_NOT_FOUND,
                format!("Failed to read {}", path.display()),
            )
            .with_source(e)
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            ScreenpackError::Config { message, source, .. } => ScreenpackError::Config {
                code: ErrorCode::CONFIG_PARSE_ERROR,
                message: format!("{}: {}", path.display(), message),
                source,
            },
            other => other,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ScreenpackError::config_with_code(ErrorCode::CONFIG_PARSE_ERROR, e.to_string())
        })
    }

    /// Apply `SCREENPACK_*` environment overrides
    pub fn merge_env_vars(&mut self) -> Result<()> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn merge_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let fields: [(&str, &mut usize); 4] = [
            ("SCREENPACK_MIN_PREFIX_LEN", &mut self.min_prefix_len),
            ("SCREENPACK_PLACEHOLDER_LEN", &mut self.placeholder_len),
            ("SCREENPACK_BUCKET_CEILING", &mut self.bucket_ceiling),
            ("SCREENPACK_DIGEST_LEN", &mut self.digest_len),
        ];
        for (key, slot) in fields {
            if let Some(raw) = lookup(key) {
                *slot = raw.trim().parse().map_err(|_| {
                    ScreenpackError::config_with_code(
                        ErrorCode::CONFIG_INVALID_VALUE,
                        format!("{} must be a non-negative integer, got '{}'", key, raw),
                    )
                })?;
                debug!("Config override from {}: {}", key, slot);
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> Result<()> {
            Err(ScreenpackError::config_with_code(
                ErrorCode::CONFIG_INVALID_VALUE,
                message,
            ))
        };
        if self.min_prefix_len == 0 {
            return invalid("min_prefix_len must be at least 1".to_string());
        }
        // `{N}` is never shorter than three bytes.
        if self.placeholder_len < 3 {
            return invalid(format!(
                "placeholder_len must be at least 3, got {}",
                self.placeholder_len
            ));
        }
        if self.bucket_ceiling == 0 {
            return invalid("bucket_ceiling must be at least 1".to_string());
        }
        if !(4..=64).contains(&self.digest_len) {
            return invalid(format!(
                "digest_len must be between 4 and 64, got {}",
                self.digest_len
            ));
        }
        Ok(())
    }
}

/// Files a run reads and the directory it writes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPaths {
    pub dataset: PathBuf,
    /// Review match file per provider name
    pub reviews: BTreeMap<String, PathBuf>,
    pub output_dir: PathBuf,
}

impl InputPaths {
    pub fn new(dataset: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            dataset: dataset.into(),
            reviews: BTreeMap::new(),
            output_dir: output_dir.into(),
        }
    }

    pub fn with_review(mut self, provider: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.reviews.insert(provider.into(), path.into());
        self
    }

    /// Every file that must exist before any transform runs
    ///
    /// Review files are optional per provider; only those named here are
    /// required.
    pub fn required_files(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.dataset.as_path()).chain(self.reviews.values().map(PathBuf::as_path))
    }

    /// Known providers with no review file, whose movies get no scores
    pub fn missing_providers(&self) -> Vec<&'static str> {
        REVIEW_PROVIDERS
            .iter()
            .copied()
            .filter(|provider| !self.reviews.contains_key(*provider))
            .collect()
    }
}

/// Parse a `provider=path` review argument
pub fn parse_review_arg(arg: &str) -> Result<(String, PathBuf)> {
    let (provider, path) = arg.split_once('=').ok_or_else(|| {
        ScreenpackError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("Expected PROVIDER=FILE, got '{}'", arg),
        )
    })?;
    if !REVIEW_PROVIDERS.contains(&provider) {
        return Err(ScreenpackError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!(
                "Unknown review provider '{}' (expected one of {})",
                provider,
                REVIEW_PROVIDERS.join(", ")
            ),
        ));
    }
    if path.is_empty() {
        return Err(ScreenpackError::config_with_code(
            ErrorCode::CONFIG_INVALID_VALUE,
            format!("Empty path for review provider '{}'", provider),
        ));
    }
    Ok((provider.to_string(), PathBuf::from(path)))
}
