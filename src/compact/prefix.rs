//! URL prefix dictionary
//!
//! Finds leading URL substrings shared across the dataset and replaces each
//! with a positional `{i}` token. Candidates end on a boundary character,
//! are scored by net byte savings, and are accepted greedily so that no
//! accepted prefix is a prefix of another.

use crate::model::Dataset;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, trace};

/// Characters a candidate prefix may end on
pub const BOUNDARY_CHARS: [u8; 4] = [b'/', b'?', b'=', b'&'];

/// Ordered prefix dictionary; token `{i}` stands for entry `i`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlPrefixTable {
    prefixes: Vec<String>,
}

impl UrlPrefixTable {
    /// Build a table from prefixes, fixing their order lexicographically
    pub fn new(mut prefixes: Vec<String>) -> Self {
        prefixes.sort();
        prefixes.dedup();
        Self { prefixes }
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.prefixes
    }

    pub fn token(index: usize) -> String {
        format!("{{{}}}", index)
    }

    /// Replace the first occurrence of each prefix, in index order
    ///
    /// URLs containing `{` are returned untouched so a token can never be
    /// confused with literal URL text.
    pub fn compress(&self, url: &str) -> String {
        if url.contains('{') {
            return url.to_string();
        }
        let mut out = url.to_string();
        for (index, prefix) in self.prefixes.iter().enumerate() {
            if out.contains(prefix.as_str()) {
                out = out.replacen(prefix.as_str(), &Self::token(index), 1);
            }
        }
        out
    }

    /// Substitute every `{i}` token back with its prefix
    pub fn expand(&self, url: &str) -> String {
        let mut out = url.to_string();
        for (index, prefix) in self.prefixes.iter().enumerate() {
            let token = Self::token(index);
            if out.contains(&token) {
                out = out.replace(&token, prefix);
            }
        }
        out
    }
}

/// Tunables for prefix selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixOptions {
    pub min_prefix_len: usize,
    pub placeholder_len: usize,
}

/// A boundary-delimited prefix and its score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub prefix: String,
    /// URLs that start with this prefix
    pub count: usize,
    pub savings: i64,
}

/// Net bytes saved by tokenizing `count` occurrences of a prefix,
/// after paying for the dictionary entry itself
pub fn net_savings(prefix_len: usize, count: usize, placeholder_len: usize) -> i64 {
    let prefix_len = prefix_len as i64;
    (prefix_len - placeholder_len as i64) * count as i64 - prefix_len
}

/// Tally every boundary-ending prefix of at least `min_len` bytes
///
/// A prefix is counted once per URL it begins.
pub fn count_candidates<'a, I>(urls: I, min_len: usize) -> BTreeMap<&'a str, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    urls.into_iter()
        .filter(|url| !url.contains('{'))
        .fold(BTreeMap::new(), |mut counts, url| {
            for (i, byte) in url.bytes().enumerate() {
                if i + 1 >= min_len && BOUNDARY_CHARS.contains(&byte) {
                    *counts.entry(&url[..=i]).or_insert(0) += 1;
                }
            }
            counts
        })
}

/// Score candidates, dropping those seen once or not worth an entry
///
/// Sorted by descending savings, ties broken by ascending prefix.
pub fn rank_candidates(counts: &BTreeMap<&str, usize>, placeholder_len: usize) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = counts
        .iter()
        .filter(|(_, count)| **count >= 2)
        .map(|(prefix, &count)| Candidate {
            prefix: prefix.to_string(),
            count,
            savings: net_savings(prefix.len(), count, placeholder_len),
        })
        .filter(|c| c.savings > 0)
        .collect();
    ranked.sort_by(|a, b| match b.savings.cmp(&a.savings) {
        Ordering::Equal => a.prefix.cmp(&b.prefix),
        other => other,
    });
    ranked
}

/// Greedily accept candidates that neither extend nor are extended by an
/// already accepted prefix
pub fn select_prefixes(ranked: &[Candidate]) -> Vec<&Candidate> {
    ranked.iter().fold(Vec::new(), |mut accepted: Vec<&Candidate>, candidate| {
        let overlaps = accepted.iter().any(|a| {
            candidate.prefix.starts_with(a.prefix.as_str())
                || a.prefix.starts_with(candidate.prefix.as_str())
        });
        if overlaps {
            trace!("Skipping overlapping prefix {}", candidate.prefix);
        } else {
            debug!(
                "Accepted prefix {} (count {}, savings {})",
                candidate.prefix, candidate.count, candidate.savings
            );
            accepted.push(candidate);
        }
        accepted
    })
}

/// Compute the dictionary for a flat list of URLs
pub fn build_table<'a, I>(urls: I, options: PrefixOptions) -> UrlPrefixTable
where
    I: IntoIterator<Item = &'a str>,
{
    let counts = count_candidates(urls, options.min_prefix_len);
    let ranked = rank_candidates(&counts, options.placeholder_len);
    let accepted = select_prefixes(&ranked);
    debug!(
        "{} distinct candidates, {} net-positive, {} accepted",
        counts.len(),
        ranked.len(),
        accepted.len()
    );
    UrlPrefixTable::new(accepted.into_iter().map(|c| c.prefix.clone()).collect())
}

/// Every URL-bearing field: showing URLs, booking URLs, review URLs
pub fn collect_urls(dataset: &Dataset) -> Vec<&str> {
    let mut urls = Vec::new();
    for movie in dataset.movies.values() {
        urls.extend(movie.showings.values().map(|s| s.url.as_str()));
        urls.extend(movie.performances.iter().map(|p| p.booking_url.as_str()));
        if let Some(reviews) = &movie.reviews {
            urls.extend(reviews.values().filter_map(|r| r.url.as_deref()));
        }
    }
    urls
}

/// Apply `f` to every URL-bearing field, in the same order as [`collect_urls`]
pub fn for_each_url_mut(dataset: &mut Dataset, mut f: impl FnMut(&mut String)) {
    for movie in dataset.movies.values_mut() {
        for showing in movie.showings.values_mut() {
            f(&mut showing.url);
        }
        for performance in &mut movie.performances {
            f(&mut performance.booking_url);
        }
        if let Some(reviews) = &mut movie.reviews {
            for url in reviews.values_mut().filter_map(|r| r.url.as_mut()) {
                f(url);
            }
        }
    }
}

/// Build the dictionary for a dataset and rewrite its URLs with tokens
pub fn tokenize_urls(mut dataset: Dataset, options: PrefixOptions) -> (Dataset, UrlPrefixTable) {
    let table = build_table(collect_urls(&dataset), options);

    let mut before = 0usize;
    let mut after = 0usize;
    if !table.is_empty() {
        for_each_url_mut(&mut dataset, |url| {
            before += url.len();
            *url = table.compress(url);
            after += url.len();
        });
    }

    info!(
        "URL dictionary: {} prefixes, {} bytes of URLs saved",
        table.len(),
        before.saturating_sub(after)
    );
    (dataset, table)
}
