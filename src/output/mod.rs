//! Writing, verifying and cleaning artifact directories
//!
//! Each file is written to a temporary file in the output directory and
//! renamed into place. Buckets go first and the metadata last; if any write
//! fails, files created by this run are removed again so no metadata can
//! point at a bucket that was never written.

use crate::compact::address::{parse_artifact_name, short_digest};
use crate::compact::pack::unpack_slice;
use crate::compact::{Artifact, CompactedBuild};
use crate::error::{ErrorCode, Result, ScreenpackError};
use crate::model::{MetaRecord, Movie};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    pub file_name: String,
    pub path: PathBuf,
    pub size: usize,
    /// False when an identical file was already present
    pub created: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub output_dir: PathBuf,
    /// Buckets in order, then the metadata
    pub written: Vec<WrittenArtifact>,
    pub meta_file: String,
}

impl WriteReport {
    pub fn file_names(&self) -> BTreeSet<String> {
        self.written.iter().map(|w| w.file_name.clone()).collect()
    }
}

/// Write every artifact of a build into `dir`
pub fn write_build(build: &CompactedBuild, dir: &Path) -> Result<WriteReport> {
    std::fs::create_dir_all(dir).map_err(|e| {
        ScreenpackError::write_with_code(
            ErrorCode::OUTPUT_DIR_UNAVAILABLE,
            dir,
            "could not create output directory",
        )
        .with_source(e)
    })?;

    let mut written = Vec::new();
    for artifact in build.artifacts() {
        match write_artifact(dir, artifact) {
            Ok(entry) => written.push(entry),
            Err(err) => {
                rollback(&written);
                return Err(err);
            }
        }
    }

    info!(
        "Wrote {} artifacts to {}",
        written.len(),
        dir.display()
    );
    Ok(WriteReport {
        output_dir: dir.to_path_buf(),
        written,
        meta_file: build.meta.file_name.clone(),
    })
}

/// Atomically write one artifact
pub fn write_artifact(dir: &Path, artifact: &Artifact) -> Result<WrittenArtifact> {
    let path = dir.join(&artifact.file_name);
    let created = !path.exists();

    let write_err = |message: &str, source: std::io::Error| {
        ScreenpackError::write(&path, message.to_string()).with_source(source)
    };

    let mut temp = NamedTempFile::new_in(dir)
        .map_err(|e| write_err("could not create temporary file", e))?;
    temp.write_all(&artifact.bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| write_err("could not write artifact bytes", e))?;
    temp.persist(&path)
        .map_err(|e| write_err("could not move artifact into place", e.error))?;

    debug!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
    Ok(WrittenArtifact {
        file_name: artifact.file_name.clone(),
        path,
        size: artifact.bytes.len(),
        created,
    })
}

fn rollback(written: &[WrittenArtifact]) {
    for entry in written.iter().filter(|w| w.created) {
        if let Err(e) = std::fs::remove_file(&entry.path) {
            warn!("Failed to remove {} during rollback: {}", entry.path.display(), e);
        }
    }
}

/// Remove artifacts in `dir` that are not listed in `keep`
///
/// Only files named like `label.digest.json` are considered.
pub fn clean_stale(dir: &Path, keep: &BTreeSet<String>) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            ScreenpackError::write(dir, "could not list output directory").with_source(e)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        if parse_artifact_name(name).is_none() || keep.contains(name) {
            continue;
        }
        std::fs::remove_file(entry.path()).map_err(|e| {
            ScreenpackError::write(entry.path(), "could not remove stale artifact").with_source(e)
        })?;
        removed.push(entry.path().to_path_buf());
    }
    removed.sort();
    info!("Removed {} stale artifacts", removed.len());
    Ok(removed)
}

/// What [`verify`] checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub buckets: usize,
    pub movies: usize,
}

fn verify_failed(path: &Path, message: impl Into<String>) -> ScreenpackError {
    ScreenpackError::write_with_code(ErrorCode::OUTPUT_VERIFY_FAILED, path, message)
}

fn read_checked(path: &Path) -> Result<Vec<u8>> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| verify_failed(path, "not an artifact file name"))?;
    let (_, digest) =
        parse_artifact_name(name).ok_or_else(|| verify_failed(path, "not an artifact file name"))?;
    let bytes = std::fs::read(path)
        .map_err(|e| verify_failed(path, "artifact is missing or unreadable").with_source(e))?;
    if short_digest(&bytes, digest.len()) != digest {
        return Err(verify_failed(path, "content does not match digest in name"));
    }
    Ok(bytes)
}

/// Re-read a written build and check it is complete and consistent
///
/// Every file the metadata names must exist, match its digest, and hold
/// exactly the movies the metadata assigns to that bucket.
pub fn verify(dir: &Path, meta_file: &str) -> Result<VerifyReport> {
    let meta_path = dir.join(meta_file);
    let meta_value = unpack_slice(&read_checked(&meta_path)?)?;
    let meta: MetaRecord = serde_json::from_value(meta_value)
        .map_err(|e| verify_failed(&meta_path, e.to_string()).with_source(e))?;

    if !meta.lists_every_file() {
        return Err(verify_failed(
            &meta_path,
            format!(
                "{} files listed for {} buckets, expected one per bucket then {:?}",
                meta.files.len(),
                meta.buckets.len(),
                MetaRecord::SELF_ENTRY
            ),
        ));
    }

    let mut movies = 0;
    for (file, expected_ids) in meta.bucket_files().iter().zip(&meta.buckets) {
        let path = dir.join(file);
        let bucket: BTreeMap<String, Movie> =
            serde_json::from_value(unpack_slice(&read_checked(&path)?)?)
                .map_err(|e| verify_failed(&path, e.to_string()).with_source(e))?;
        let expected: BTreeSet<&str> = expected_ids.iter().map(String::as_str).collect();
        let actual: BTreeSet<&str> = bucket.keys().map(String::as_str).collect();
        if expected != actual {
            return Err(verify_failed(
                &path,
                "bucket movies differ from the metadata's bucket listing",
            ));
        }
        movies += bucket.len();
    }

    info!(
        "Verified {} with {} buckets and {} movies",
        meta_file,
        meta.buckets.len(),
        movies
    );
    Ok(VerifyReport {
        buckets: meta.buckets.len(),
        movies,
    })
}
