//! Loading the combined dataset and review match files
//!
//! All reads happen before any transform runs. A missing file is reported
//! by name; a file that fails to parse is reported with serde's message.

use crate::config::InputPaths;
use crate::error::{ErrorCode, Result, ScreenpackError};
use crate::model::{Dataset, ReviewScore};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Review subrecords from one provider, keyed by movie id
pub type ReviewMatches = BTreeMap<String, ReviewScore>;

/// Everything a run reads from disk
#[derive(Debug, Clone)]
pub struct LoadedInputs {
    pub dataset: Dataset,
    /// Matches per provider name
    pub reviews: BTreeMap<String, ReviewMatches>,
}

/// Fail with `MissingInput` for the first required file that does not exist
pub fn ensure_inputs_exist(paths: &InputPaths) -> Result<()> {
    match paths.required_files().find(|path| !path.is_file()) {
        Some(missing) => Err(ScreenpackError::missing_input(missing)),
        None => Ok(()),
    }
}

/// Read the dataset and every review match file named in `paths`
///
/// Providers without a file are skipped with a warning.
pub fn load_inputs(paths: &InputPaths) -> Result<LoadedInputs> {
    ensure_inputs_exist(paths)?;

    for provider in paths.missing_providers() {
        warn!("No review file given for {}; its scores are left out", provider);
    }

    let dataset = load_dataset(&paths.dataset)?;
    let mut reviews = BTreeMap::new();
    for (provider, path) in &paths.reviews {
        reviews.insert(provider.clone(), load_review_matches(provider, path)?);
    }

    Ok(LoadedInputs { dataset, reviews })
}

pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let dataset: Dataset = read_json(path)?;
    info!(
        "Loaded dataset from {}: {} movies, {} showings, {} performances, {} venues",
        path.display(),
        dataset.movies.len(),
        dataset.showing_count(),
        dataset.performance_count(),
        dataset.venues.len()
    );
    Ok(dataset)
}

pub fn load_review_matches(provider: &str, path: &Path) -> Result<ReviewMatches> {
    let matches: ReviewMatches = read_json(path)?;
    debug!(
        "Loaded {} {} review matches from {}",
        matches.len(),
        provider,
        path.display()
    );
    Ok(matches)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ScreenpackError::missing_input(path)
        } else {
            ScreenpackError::malformed_with_code(
                ErrorCode::INPUT_UNREADABLE,
                path,
                "file could not be read",
            )
            .with_source(e)
        }
    })?;
    serde_json::from_slice(&content)
        .map_err(|e| ScreenpackError::malformed(path, e.to_string()).with_source(e))
}

/// Attach each provider's review subrecord to the matching movie
///
/// Matches for movie ids absent from the dataset are skipped.
pub fn merge_reviews(mut dataset: Dataset, reviews: BTreeMap<String, ReviewMatches>) -> Dataset {
    for (provider, matches) in reviews {
        let mut merged = 0usize;
        for (movie_id, score) in matches {
            match dataset.movies.get_mut(&movie_id) {
                Some(movie) => {
                    movie
                        .reviews
                        .get_or_insert_with(BTreeMap::new)
                        .insert(provider.clone(), score);
                    merged += 1;
                }
                None => debug!("Skipping {} match for unknown movie {}", provider, movie_id),
            }
        }
        info!("Merged {} {} review records", merged, provider);
    }
    dataset
}
