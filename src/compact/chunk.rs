//! Bucket planning
//!
//! Movies are ordered by normalized title (then id) and packed into
//! consecutive buckets whose summed performance count stays within a
//! ceiling. A movie over the ceiling on its own gets a bucket to itself.

use crate::compact::prefix::UrlPrefixTable;
use crate::model::{Dataset, MetaRecord, Movie};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Movie ids assigned to one bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketPlan {
    pub movie_ids: Vec<String>,
    pub performance_count: usize,
    /// Holds a single movie whose own count exceeds the ceiling
    pub isolated: bool,
}

impl BucketPlan {
    fn accepts(&self, count: usize, ceiling: usize) -> bool {
        !self.isolated && count <= ceiling && self.performance_count + count <= ceiling
    }
}

/// Chunker output: per-bucket movie maps plus shared metadata
#[derive(Debug, Clone, PartialEq)]
pub struct Chunked {
    pub buckets: Vec<BTreeMap<String, Movie>>,
    /// Metadata with `files` still empty; names are assigned after packing
    /// the buckets
    pub meta: MetaRecord,
}

/// Movie ids in bucket order: normalized title, then id
pub fn sorted_movie_ids(movies: &BTreeMap<String, Movie>) -> Vec<&str> {
    let mut ids: Vec<&str> = movies.keys().map(String::as_str).collect();
    ids.sort_by(|a, b| {
        movies[*a]
            .normalized_title
            .cmp(&movies[*b].normalized_title)
            .then_with(|| a.cmp(b))
    });
    ids
}

/// Assign sorted movies to buckets
pub fn plan_buckets<'a, I>(movies: I, ceiling: usize) -> Vec<BucketPlan>
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    movies
        .into_iter()
        .fold(Vec::new(), |mut plans: Vec<BucketPlan>, (id, count)| {
            match plans.last_mut() {
                Some(current) if current.accepts(count, ceiling) => {
                    current.movie_ids.push(id.to_string());
                    current.performance_count += count;
                }
                _ => {
                    if let Some(closed) = plans.last() {
                        debug!(
                            "Closing bucket {} with {} movies, {} performances",
                            plans.len() - 1,
                            closed.movie_ids.len(),
                            closed.performance_count
                        );
                    }
                    plans.push(BucketPlan {
                        movie_ids: vec![id.to_string()],
                        performance_count: count,
                        isolated: count > ceiling,
                    });
                }
            }
            plans
        })
}

/// Split the dataset into buckets and build the shared metadata
pub fn chunk_dataset(dataset: Dataset, table: UrlPrefixTable, ceiling: usize) -> Chunked {
    let Dataset {
        generated_at,
        genres,
        people,
        venues,
        mut movies,
    } = dataset;

    let plans = {
        let order = sorted_movie_ids(&movies);
        plan_buckets(
            order
                .into_iter()
                .map(|id| (id, movies[id].performances.len())),
            ceiling,
        )
    };

    let buckets: Vec<BTreeMap<String, Movie>> = plans
        .iter()
        .map(|plan| {
            plan.movie_ids
                .iter()
                .filter_map(|id| movies.remove_entry(id))
                .collect()
        })
        .collect();

    info!(
        "Chunked {} movies into {} buckets (ceiling {})",
        buckets.iter().map(BTreeMap::len).sum::<usize>(),
        buckets.len(),
        ceiling
    );

    let meta = MetaRecord {
        generated_at,
        genres,
        people,
        venues,
        url_prefixes: table.into_vec(),
        buckets: plans.into_iter().map(|plan| plan.movie_ids).collect(),
        files: Vec::new(),
    };

    Chunked { buckets, meta }
}
