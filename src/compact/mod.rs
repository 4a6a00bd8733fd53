//! Compaction stages
//!
//! - `prune` - drop redundant or build-time-only fields
//! - `prefix` - URL prefix dictionary and token rewriting
//! - `chunk` - bucket planning and shared metadata
//! - `pack` - schema-agnostic structural packing
//! - `address` - content-addressed artifact naming
//! - `pipeline` - reading inputs and writing artifacts around the stages
//!
//! [`compact_dataset`] runs the in-memory stages in order. Each stage
//! consumes its input and returns a new value without touching the
//! filesystem. Reading inputs and writing artifacts live in [`pipeline`]
//! and [`crate::output`].

pub mod address;
pub mod chunk;
pub mod pack;
pub mod pipeline;
pub mod prefix;
pub mod prune;

pub use address::Artifact;
pub use chunk::{BucketPlan, Chunked};
pub use pack::{pack, unpack, PackedDocument};
pub use prefix::{PrefixOptions, UrlPrefixTable};
pub use prune::PruneStats;

use crate::config::CompactConfig;
use crate::error::{ErrorCode, Result, ScreenpackError};
use crate::model::{Dataset, MetaRecord};
use tracing::{debug, info};

/// Output of the in-memory stages, ready to be written
#[derive(Debug, Clone)]
pub struct CompactedBuild {
    /// One artifact per bucket, in bucket order
    pub buckets: Vec<Artifact>,
    pub meta: Artifact,
    /// The metadata as packed into `meta`
    pub meta_record: MetaRecord,
    pub summary: BuildSummary,
}

impl CompactedBuild {
    /// Every artifact, buckets first and metadata last
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.buckets.iter().chain(std::iter::once(&self.meta))
    }
}

/// Figures describing one compaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    pub movies: usize,
    pub performances: usize,
    pub url_prefixes: usize,
    pub buckets: usize,
    pub prune: PruneStats,
    /// Compact JSON size of the dataset before any stage ran
    pub input_bytes: usize,
    /// Total size of all artifacts
    pub output_bytes: usize,
}

/// Run prune, prefix, chunk, pack and address over a merged dataset
pub fn compact_dataset(dataset: Dataset, config: &CompactConfig) -> Result<CompactedBuild> {
    let input_bytes = serde_json::to_vec(&dataset)
        .map_err(|e| {
            ScreenpackError::encoding_with_code(ErrorCode::ENCODING_SERIALIZE, e.to_string())
                .with_source(e)
        })?
        .len();
    let movies = dataset.movies.len();
    let performances = dataset.performance_count();

    let (dataset, prune) = prune::prune_dataset(dataset);
    info!(
        "Pruned dataset: {} classifications and {} durations derived, {} ids dropped",
        prune.classifications_derived, prune.durations_derived, prune.ids_dropped
    );

    let (dataset, table) = prefix::tokenize_urls(
        dataset,
        PrefixOptions {
            min_prefix_len: config.min_prefix_len,
            placeholder_len: config.placeholder_len,
        },
    );
    let url_prefixes = table.len();

    let Chunked { buckets, mut meta } = chunk::chunk_dataset(dataset, table, config.bucket_ceiling);

    let bucket_artifacts = buckets
        .iter()
        .enumerate()
        .map(|(index, bucket)| {
            let doc = pack::pack_serializable(bucket)?;
            let artifact =
                Artifact::from_packed(&address::bucket_label(index), &doc, config.digest_len)?;
            debug!(
                "Bucket {}: {} movies, {} nodes, {} bytes -> {}",
                index,
                bucket.len(),
                doc.nodes.len(),
                artifact.bytes.len(),
                artifact.file_name
            );
            Ok(artifact)
        })
        .collect::<Result<Vec<_>>>()?;

    meta.files = bucket_artifacts
        .iter()
        .map(|a| a.file_name.clone())
        .chain(std::iter::once(MetaRecord::SELF_ENTRY.to_string()))
        .collect();
    let meta_doc = pack::pack_serializable(&meta)?;
    let meta_artifact = Artifact::from_packed(address::META_LABEL, &meta_doc, config.digest_len)?;

    let output_bytes = bucket_artifacts
        .iter()
        .map(|a| a.bytes.len())
        .sum::<usize>()
        + meta_artifact.bytes.len();

    let summary = BuildSummary {
        movies,
        performances,
        url_prefixes,
        buckets: bucket_artifacts.len(),
        prune,
        input_bytes,
        output_bytes,
    };
    info!(
        "Compacted {} bytes into {} bytes across {} artifacts",
        summary.input_bytes,
        summary.output_bytes,
        summary.buckets + 1
    );

    Ok(CompactedBuild {
        buckets: bucket_artifacts,
        meta: meta_artifact,
        meta_record: meta,
        summary,
    })
}
