//! Typed view of the combined showings dataset
//!
//! Every entity keeps the fields it does not model in a flattened `extra`
//! map, so a compaction run never drops data it does not understand.
//! Keyed collections are `BTreeMap`s: iteration order is ascending key
//! order, which makes every order-dependent stage reproducible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fields the model does not name, preserved verbatim
pub type Extra = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub genres: BTreeMap<String, Genre>,
    #[serde(default)]
    pub people: BTreeMap<String, Person>,
    #[serde(default)]
    pub venues: BTreeMap<String, Venue>,
    pub movies: BTreeMap<String, Movie>,
}

impl Dataset {
    pub fn performance_count(&self) -> usize {
        self.movies.values().map(|m| m.performances.len()).sum()
    }

    pub fn showing_count(&self) -> usize {
        self.movies.values().map(|m| m.showings.len()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    /// Sort key used by the chunker
    pub normalized_title: String,
    pub showings: BTreeMap<String, Showing>,
    pub performances: Vec<Performance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Running time in minutes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people: Option<Vec<String>>,
    /// Review subrecords keyed by provider name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<BTreeMap<String, ReviewScore>>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Showing {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Venue id
    pub venue: String,
    pub category: String,
    pub url: String,
    /// Build-time only; removed by the pruner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<ShowingOverview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShowingOverview {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    /// Showing id within the owning movie
    pub showing: String,
    /// Scheduled start, unix epoch milliseconds
    pub time: i64,
    pub booking_url: String,
    /// Accessibility flags; a missing flag reads as `false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One provider's review data for a movie
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewScore {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(flatten)]
    pub fields: Extra,
}

/// Entities stored in a keyed map whose `id` may duplicate the key
pub trait Keyed {
    fn id_slot(&mut self) -> &mut Option<String>;
}

macro_rules! impl_keyed {
    ($($ty:ty),*) => {
        $(impl Keyed for $ty {
            fn id_slot(&mut self) -> &mut Option<String> {
                &mut self.id
            }
        })*
    };
}

impl_keyed!(Genre, Person, Venue, Movie, Showing);

/// Shared metadata artifact content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRecord {
    pub generated_at: DateTime<Utc>,
    pub genres: BTreeMap<String, Genre>,
    pub people: BTreeMap<String, Person>,
    pub venues: BTreeMap<String, Venue>,
    /// URL prefix dictionary; token `{i}` stands for `url_prefixes[i]`
    pub url_prefixes: Vec<String>,
    /// Movie ids per bucket, indexed by bucket number
    pub buckets: Vec<Vec<String>>,
    /// Bucket artifact file names indexed by bucket number, then the
    /// metadata label standing in for this record's own file
    pub files: Vec<String>,
}

impl MetaRecord {
    /// Entry closing `files`; the metadata name hashes these bytes, so only
    /// its label can be listed
    pub const SELF_ENTRY: &'static str = "meta";

    /// The bucket file names, without the trailing self entry
    pub fn bucket_files(&self) -> &[String] {
        match self.files.split_last() {
            Some((last, rest)) if last == Self::SELF_ENTRY => rest,
            _ => &self.files,
        }
    }

    /// Whether `files` holds one name per bucket plus the self entry
    pub fn lists_every_file(&self) -> bool {
        self.files.len() == self.buckets.len() + 1
            && self.files.last().map(String::as_str) == Some(Self::SELF_ENTRY)
    }
}
