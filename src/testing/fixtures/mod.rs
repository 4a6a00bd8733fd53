//! Test fixtures and data builders
//!
//! This module provides dataset builders and a small realistic week of
//! showings shared by unit and integration tests.

pub mod builders;

pub use builders::{DatasetBuilder, MovieBuilder, FIXTURE_EPOCH_MS};

use crate::input::ReviewMatches;
use crate::model::{Dataset, ReviewScore};
use serde_json::json;

pub const RIO_BOOKING: &str = "https://riocinema.org.uk/booking/performance?id=";
pub const PCC_BOOKING: &str = "https://princecharlescinema.com/tickets/checkout?perf=";

/// Common test fixtures
pub struct Fixtures;

impl Fixtures {
    /// Two venues, four movies and a few dozen performances
    ///
    /// Booking URLs share long per-venue prefixes so the prefix stage has
    /// something to select.
    pub fn small_week() -> Dataset {
        DatasetBuilder::new()
            .with_venue("rio", "Rio Cinema")
            .with_venue("pcc", "Prince Charles Cinema")
            .with_genre("horror", "Horror")
            .with_genre("scifi", "Science Fiction")
            .with_genre("drama", "Drama")
            .with_person("ridley-scott", "Ridley Scott")
            .with_person("michael-mann", "Michael Mann")
            .with_movie(
                MovieBuilder::new("alien", "Alien")
                    .genres(&["horror", "scifi"])
                    .people(&["ridley-scott"])
                    .showing("rio-alien", "rio", "https://riocinema.org.uk/whats-on/alien")
                    .overview("rio-alien", Some("15"), Some(117))
                    .showing("pcc-alien", "pcc", "https://princecharlescinema.com/film/alien")
                    .overview("pcc-alien", Some("18"), Some(120))
                    .performances("rio-alien", 6, RIO_BOOKING)
                    .performances("pcc-alien", 4, PCC_BOOKING)
                    .flags(&[("subtitled", true), ("audioDescribed", false)]),
            )
            .with_movie(
                MovieBuilder::new("heat", "Heat")
                    .genres(&["drama"])
                    .people(&["michael-mann"])
                    .showing("pcc-heat", "pcc", "https://princecharlescinema.com/film/heat")
                    .overview("pcc-heat", Some("18"), Some(170))
                    .performances("pcc-heat", 3, PCC_BOOKING),
            )
            .with_movie(
                MovieBuilder::new("persona", "Persona")
                    .genres(&["drama"])
                    .showing("rio-persona", "rio", "https://riocinema.org.uk/whats-on/persona")
                    .overview("rio-persona", Some("12a"), Some(83))
                    .performances("rio-persona", 2, RIO_BOOKING)
                    .flags(&[("relaxed", false)]),
            )
            .with_movie(
                MovieBuilder::new("stalker", "Stalker")
                    .genres(&["scifi", "drama"])
                    .showing("rio-stalker", "rio", "https://riocinema.org.uk/whats-on/stalker")
                    .performances("rio-stalker", 5, RIO_BOOKING),
            )
            .build()
    }

    /// Review matches for one provider, including one unknown movie id
    pub fn review_matches(provider: &str) -> ReviewMatches {
        let mut matches = ReviewMatches::new();
        matches.insert(
            "alien".to_string(),
            Self::review_score(provider, "alien", 98),
        );
        matches.insert(
            "heat".to_string(),
            Self::review_score(provider, "heat", 88),
        );
        matches.insert(
            "not-showing".to_string(),
            Self::review_score(provider, "not-showing", 10),
        );
        matches
    }

    fn review_score(provider: &str, slug: &str, score: u32) -> ReviewScore {
        let mut review = ReviewScore {
            url: Some(format!("https://{}.example/m/{}", provider.to_lowercase(), slug)),
            fields: Default::default(),
        };
        review.fields.insert("score".to_string(), json!(score));
        if provider == "rottenTomatoes" {
            review.fields.insert("verified".to_string(), json!(true));
            review.fields.insert("likes".to_string(), json!(1200));
            review.fields.insert("dislikes".to_string(), json!(40));
            review.fields.insert(
                "audience".to_string(),
                json!({"score": score - 5, "top": false, "likes": 300}),
            );
        }
        review
    }
}
