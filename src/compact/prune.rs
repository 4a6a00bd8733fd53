//! Field pruning
//!
//! Drops information the client never needs or can rebuild: build-time
//! showing overviews (after lifting classification and duration onto the
//! movie), unread review sub-fields, false accessibility flags, and `id`
//! fields that repeat their map key. Total for any well-formed dataset.

use crate::model::{Dataset, Keyed, Movie, Performance, ReviewScore};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Classifications accepted when lifting from showing overviews
pub const CLASSIFICATIONS: [&str; 7] = ["U", "PG", "12", "12A", "15", "18", "R18"];

/// Provider whose subrecord carries fields nothing downstream reads
pub const TRIMMED_REVIEW_PROVIDER: &str = "rottenTomatoes";

/// Keys removed from the trimmed provider's subrecord at any depth
pub const TRIMMED_REVIEW_FIELDS: [&str; 4] = ["verified", "likes", "dislikes", "top"];

/// Counters describing what a prune pass removed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneStats {
    pub classifications_derived: usize,
    pub durations_derived: usize,
    pub overviews_dropped: usize,
    pub flags_dropped: usize,
    pub ids_dropped: usize,
}

/// Apply every pruning rule and return the smaller dataset
pub fn prune_dataset(mut dataset: Dataset) -> (Dataset, PruneStats) {
    let mut stats = PruneStats::default();

    for movie in dataset.movies.values_mut() {
        derive_movie_fields(movie, &mut stats);
        if let Some(reviews) = movie.reviews.as_mut() {
            if let Some(score) = reviews.get_mut(TRIMMED_REVIEW_PROVIDER) {
                trim_review(score);
            }
        }
        for performance in &mut movie.performances {
            stats.flags_dropped += prune_accessibility(performance);
        }
        stats.ids_dropped += drop_redundant_ids(&mut movie.showings);
    }

    stats.ids_dropped += drop_redundant_ids(&mut dataset.genres);
    stats.ids_dropped += drop_redundant_ids(&mut dataset.people);
    stats.ids_dropped += drop_redundant_ids(&mut dataset.venues);
    stats.ids_dropped += drop_redundant_ids(&mut dataset.movies);

    debug!("Prune stats: {:?}", stats);
    (dataset, stats)
}

/// Lift classification and duration from showing overviews, then drop them
///
/// Classification is set only when every showing that reports an
/// allow-listed value agrees. Duration comes from the first showing, in
/// ascending showing-id order, that reports one.
pub fn derive_movie_fields(movie: &mut Movie, stats: &mut PruneStats) {
    if movie.classification.is_none() {
        let reported: BTreeSet<String> = movie
            .showings
            .values()
            .filter_map(|s| s.overview.as_ref()?.classification.as_deref())
            .filter_map(normalize_classification)
            .collect();
        if reported.len() == 1 {
            movie.classification = reported.into_iter().next();
            stats.classifications_derived += 1;
        }
    }

    if movie.duration.is_none() {
        movie.duration = movie
            .showings
            .values()
            .find_map(|s| s.overview.as_ref()?.duration);
        if movie.duration.is_some() {
            stats.durations_derived += 1;
        }
    }

    for showing in movie.showings.values_mut() {
        if showing.overview.take().is_some() {
            stats.overviews_dropped += 1;
        }
    }
}

/// Upper-case an allow-listed classification; `None` for anything else
pub fn normalize_classification(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    CLASSIFICATIONS.contains(&upper.as_str()).then_some(upper)
}

pub fn trim_review(score: &mut ReviewScore) {
    for field in TRIMMED_REVIEW_FIELDS {
        score.fields.remove(field);
    }
    for value in score.fields.values_mut() {
        strip_keys(value, &TRIMMED_REVIEW_FIELDS);
    }
}

fn strip_keys(value: &mut Value, keys: &[&str]) {
    match value {
        Value::Object(map) => {
            for key in keys {
                map.remove(*key);
            }
            for child in map.values_mut() {
                strip_keys(child, keys);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_keys(item, keys);
            }
        }
        _ => {}
    }
}

/// Remove false flags; an emptied flag set is removed entirely
///
/// Returns the number of flags removed.
pub fn prune_accessibility(performance: &mut Performance) -> usize {
    let Some(flags) = performance.accessibility.as_mut() else {
        return 0;
    };
    let before = flags.len();
    flags.retain(|_, enabled| *enabled);
    let removed = before - flags.len();
    if flags.is_empty() {
        performance.accessibility = None;
    }
    removed
}

/// Clear `id` on every entity whose id equals its map key
pub fn drop_redundant_ids<T: Keyed>(entities: &mut BTreeMap<String, T>) -> usize {
    let mut dropped = 0;
    for (key, entity) in entities.iter_mut() {
        let slot = entity.id_slot();
        if slot.as_deref() == Some(key.as_str()) {
            *slot = None;
            dropped += 1;
        }
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Showing, ShowingOverview};
    use serde_json::json;

    fn showing(classification: Option<&str>, duration: Option<u32>) -> Showing {
        Showing {
            id: None,
            venue: "v1".to_string(),
            category: "movie".to_string(),
            url: "https://venue.example/film".to_string(),
            overview: Some(ShowingOverview {
                classification: classification.map(str::to_string),
                duration,
                extra: Default::default(),
            }),
            title: None,
            extra: Default::default(),
        }
    }

    fn movie(showings: Vec<(&str, Showing)>) -> Movie {
        Movie {
            id: Some("m1".to_string()),
            title: "Film".to_string(),
            normalized_title: "film".to_string(),
            showings: showings
                .into_iter()
                .map(|(id, s)| (id.to_string(), s))
                .collect(),
            performances: vec![],
            classification: None,
            duration: None,
            genres: None,
            people: None,
            reviews: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_agreeing_classifications_are_lifted() {
        let mut m = movie(vec![
            ("a", showing(Some("15"), None)),
            ("b", showing(None, None)),
            ("c", showing(Some("15 "), None)),
        ]);
        let mut stats = PruneStats::default();
        derive_movie_fields(&mut m, &mut stats);
        assert_eq!(m.classification.as_deref(), Some("15"));
        assert_eq!(stats.classifications_derived, 1);
        assert!(m.showings.values().all(|s| s.overview.is_none()));
        assert_eq!(stats.overviews_dropped, 3);
    }

    #[test]
    fn test_disagreeing_classifications_are_not_lifted() {
        let mut m = movie(vec![
            ("a", showing(Some("12A"), None)),
            ("b", showing(Some("15"), None)),
        ]);
        derive_movie_fields(&mut m, &mut PruneStats::default());
        assert_eq!(m.classification, None);
    }

    #[test]
    fn test_classification_case_normalized_and_allow_listed() {
        let mut m = movie(vec![
            ("a", showing(Some("pg"), None)),
            ("b", showing(Some("TBC"), None)),
            ("c", showing(Some(""), None)),
        ]);
        derive_movie_fields(&mut m, &mut PruneStats::default());
        assert_eq!(m.classification.as_deref(), Some("PG"));
    }

    #[test]
    fn test_existing_classification_kept() {
        let mut m = movie(vec![("a", showing(Some("18"), Some(90)))]);
        m.classification = Some("15".to_string());
        m.duration = Some(120);
        derive_movie_fields(&mut m, &mut PruneStats::default());
        assert_eq!(m.classification.as_deref(), Some("15"));
        assert_eq!(m.duration, Some(120));
    }

    #[test]
    fn test_duration_from_first_showing_by_id() {
        let mut m = movie(vec![
            ("zeta", showing(None, Some(95))),
            ("beta", showing(None, None)),
            ("alpha", showing(None, Some(101))),
        ]);
        derive_movie_fields(&mut m, &mut PruneStats::default());
        assert_eq!(m.duration, Some(101));
    }

    #[test]
    fn test_showing_without_overview_is_fine() {
        let mut plain = showing(None, None);
        plain.overview = None;
        let mut m = movie(vec![("a", plain)]);
        let mut stats = PruneStats::default();
        derive_movie_fields(&mut m, &mut stats);
        assert_eq!(stats, PruneStats::default());
    }

    #[test]
    fn test_trim_review_removes_unread_fields() {
        let mut score: ReviewScore = serde_json::from_value(json!({
            "url": "https://www.rottentomatoes.com/m/alien",
            "critics": {"score": 98, "likes": 120, "dislikes": 3, "top": ["a", "b"]},
            "audience": {"score": 94, "verified": true},
            "verified": false
        }))
        .unwrap();
        trim_review(&mut score);
        assert_eq!(
            serde_json::to_value(&score).unwrap(),
            json!({
                "url": "https://www.rottentomatoes.com/m/alien",
                "critics": {"score": 98},
                "audience": {"score": 94}
            })
        );
    }

    #[test]
    fn test_false_flags_removed() {
        let mut perf: Performance = serde_json::from_value(json!({
            "showing": "s1",
            "time": 0,
            "bookingUrl": "https://venue.example/book",
            "accessibility": {"subtitled": true, "audioDescribed": false, "relaxed": false}
        }))
        .unwrap();
        assert_eq!(prune_accessibility(&mut perf), 2);
        let flags = perf.accessibility.as_ref().unwrap();
        assert_eq!(flags.len(), 1);
        assert!(flags["subtitled"]);
    }

    #[test]
    fn test_all_false_flags_remove_the_set() {
        let mut perf: Performance = serde_json::from_value(json!({
            "showing": "s1",
            "time": 0,
            "bookingUrl": "https://venue.example/book",
            "accessibility": {"hardOfHearing": false}
        }))
        .unwrap();
        prune_accessibility(&mut perf);
        assert!(perf.accessibility.is_none());
    }

    #[test]
    fn test_redundant_ids_dropped_only_when_equal() {
        let mut showings: BTreeMap<String, Showing> = BTreeMap::new();
        let mut same = showing(None, None);
        same.id = Some("s1".to_string());
        let mut different = showing(None, None);
        different.id = Some("legacy-7".to_string());
        showings.insert("s1".to_string(), same);
        showings.insert("s2".to_string(), different);

        assert_eq!(drop_redundant_ids(&mut showings), 1);
        assert_eq!(showings["s1"].id, None);
        assert_eq!(showings["s2"].id.as_deref(), Some("legacy-7"));
    }
}
