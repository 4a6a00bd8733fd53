//! Test data builders for datasets and movies

use crate::model::{
    Dataset, Genre, Movie, Performance, Person, ReviewScore, Showing, ShowingOverview, Venue,
};
use chrono::{TimeZone, Utc};
use std::collections::BTreeMap;

/// Start of the fixture week, unix epoch milliseconds
pub const FIXTURE_EPOCH_MS: i64 = 1_709_294_400_000;

/// Builder for creating test datasets
pub struct DatasetBuilder {
    dataset: Dataset,
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetBuilder {
    pub fn new() -> Self {
        Self {
            dataset: Dataset {
                generated_at: Utc
                    .timestamp_millis_opt(FIXTURE_EPOCH_MS)
                    .single()
                    .unwrap_or_default(),
                genres: BTreeMap::new(),
                people: BTreeMap::new(),
                venues: BTreeMap::new(),
                movies: BTreeMap::new(),
            },
        }
    }

    pub fn with_genre(mut self, id: &str, name: &str) -> Self {
        self.dataset.genres.insert(
            id.to_string(),
            Genre {
                id: Some(id.to_string()),
                name: name.to_string(),
                extra: Default::default(),
            },
        );
        self
    }

    pub fn with_person(mut self, id: &str, name: &str) -> Self {
        self.dataset.people.insert(
            id.to_string(),
            Person {
                id: Some(id.to_string()),
                name: name.to_string(),
                extra: Default::default(),
            },
        );
        self
    }

    pub fn with_venue(mut self, id: &str, name: &str) -> Self {
        self.dataset.venues.insert(
            id.to_string(),
            Venue {
                id: Some(id.to_string()),
                name: name.to_string(),
                extra: Default::default(),
            },
        );
        self
    }

    pub fn with_movie(mut self, movie: MovieBuilder) -> Self {
        let (id, movie) = movie.build();
        self.dataset.movies.insert(id, movie);
        self
    }

    pub fn build(self) -> Dataset {
        self.dataset
    }
}

/// Builder for creating a movie with showings and performances
pub struct MovieBuilder {
    key: String,
    movie: Movie,
}

impl MovieBuilder {
    /// A movie keyed by `id` whose `id` field repeats the key
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            key: id.to_string(),
            movie: Movie {
                id: Some(id.to_string()),
                title: title.to_string(),
                normalized_title: title.to_lowercase(),
                showings: BTreeMap::new(),
                performances: Vec::new(),
                classification: None,
                duration: None,
                genres: None,
                people: None,
                reviews: None,
                extra: Default::default(),
            },
        }
    }

    pub fn normalized_title(mut self, normalized: &str) -> Self {
        self.movie.normalized_title = normalized.to_string();
        self
    }

    pub fn genres(mut self, ids: &[&str]) -> Self {
        self.movie.genres = Some(ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn people(mut self, ids: &[&str]) -> Self {
        self.movie.people = Some(ids.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn showing(mut self, id: &str, venue: &str, url: &str) -> Self {
        self.movie.showings.insert(
            id.to_string(),
            Showing {
                id: Some(id.to_string()),
                venue: venue.to_string(),
                category: "movie".to_string(),
                url: url.to_string(),
                overview: None,
                title: None,
                extra: Default::default(),
            },
        );
        self
    }

    /// Attach a build-time overview to an existing showing
    pub fn overview(
        mut self,
        showing: &str,
        classification: Option<&str>,
        duration: Option<u32>,
    ) -> Self {
        if let Some(s) = self.movie.showings.get_mut(showing) {
            s.overview = Some(ShowingOverview {
                classification: classification.map(str::to_string),
                duration,
                extra: Default::default(),
            });
        }
        self
    }

    /// Add `count` hourly performances of `showing`, booking URLs `{base}{n}`
    pub fn performances(mut self, showing: &str, count: usize, booking_base: &str) -> Self {
        let start = self.movie.performances.len();
        for n in start..start + count {
            self.movie.performances.push(Performance {
                showing: showing.to_string(),
                time: FIXTURE_EPOCH_MS + n as i64 * 3_600_000,
                booking_url: format!("{}{}", booking_base, n),
                accessibility: None,
                notes: None,
                screen: None,
                status: None,
                extra: Default::default(),
            });
        }
        self
    }

    /// Set accessibility flags on the most recently added performance
    pub fn flags(mut self, flags: &[(&str, bool)]) -> Self {
        if let Some(p) = self.movie.performances.last_mut() {
            p.accessibility = Some(flags.iter().map(|(k, v)| (k.to_string(), *v)).collect());
        }
        self
    }

    pub fn review(mut self, provider: &str, score: ReviewScore) -> Self {
        self.movie
            .reviews
            .get_or_insert_with(BTreeMap::new)
            .insert(provider.to_string(), score);
        self
    }

    pub fn build(self) -> (String, Movie) {
        (self.key, self.movie)
    }
}
