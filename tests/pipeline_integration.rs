//! End-to-end tests of `run_build` against files on disk

use screenpack::compact::pack::unpack_slice;
use screenpack::compact::UrlPrefixTable;
use screenpack::config::REVIEW_PROVIDERS;
use screenpack::error::ErrorCode;
use screenpack::model::{MetaRecord, Movie};
use screenpack::testing::fixtures::{DatasetBuilder, Fixtures, MovieBuilder};
use screenpack::testing::TestContext;
use screenpack::{run_build, CompactConfig, RunOptions};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn read_meta(dir: &Path, meta_file: &str) -> MetaRecord {
    let bytes = fs::read(dir.join(meta_file)).unwrap();
    serde_json::from_value(unpack_slice(&bytes).unwrap()).unwrap()
}

fn read_bucket(dir: &Path, file: &str) -> BTreeMap<String, Movie> {
    let bytes = fs::read(dir.join(file)).unwrap();
    serde_json::from_value(unpack_slice(&bytes).unwrap()).unwrap()
}

fn all_providers() -> Vec<(&'static str, screenpack::input::ReviewMatches)> {
    REVIEW_PROVIDERS
        .iter()
        .map(|p| (*p, Fixtures::review_matches(p)))
        .collect()
}

#[test]
fn test_build_is_reproducible_across_runs() {
    let first = TestContext::new().unwrap();
    let second = TestContext::new().unwrap();
    let config = CompactConfig {
        bucket_ceiling: 6,
        ..CompactConfig::default()
    };

    let a = run_build(
        &first.write_inputs(&Fixtures::small_week(), &all_providers()).unwrap(),
        &config,
        RunOptions::default(),
    )
    .unwrap();
    let b = run_build(
        &second.write_inputs(&Fixtures::small_week(), &all_providers()).unwrap(),
        &config,
        RunOptions::default(),
    )
    .unwrap();

    assert_eq!(a.written.file_names(), b.written.file_names());
    assert_eq!(a.written.meta_file, b.written.meta_file);
    for name in a.written.file_names() {
        assert_eq!(
            fs::read(first.output_dir().join(&name)).unwrap(),
            fs::read(second.output_dir().join(&name)).unwrap()
        );
    }
}

#[test]
fn test_changed_movie_changes_only_its_bucket() {
    let ctx = TestContext::new().unwrap();
    let config = CompactConfig {
        bucket_ceiling: 6,
        ..CompactConfig::default()
    };
    let before = run_build(
        &ctx.write_inputs(&Fixtures::small_week(), &[]).unwrap(),
        &config,
        RunOptions::default(),
    )
    .unwrap();

    let mut dataset = Fixtures::small_week();
    if let Some(stalker) = dataset.movies.get_mut("stalker") {
        stalker.title = "Stalker (1979)".to_string();
    }
    let after = run_build(
        &ctx.write_inputs(&dataset, &[]).unwrap(),
        &config,
        RunOptions::default(),
    )
    .unwrap();

    let before_meta = read_meta(&ctx.output_dir(), &before.written.meta_file);
    let after_meta = read_meta(&ctx.output_dir(), &after.written.meta_file);
    assert_eq!(before_meta.files[0], after_meta.files[0]);
    assert_eq!(before_meta.files[1], after_meta.files[1]);
    assert_ne!(before_meta.files[2], after_meta.files[2]);
    assert_ne!(before.written.meta_file, after.written.meta_file);
}

#[test]
fn test_metadata_references_only_existing_files() {
    let ctx = TestContext::new().unwrap();
    let paths = ctx.write_inputs(&Fixtures::small_week(), &all_providers()).unwrap();
    let report = run_build(
        &paths,
        &CompactConfig {
            bucket_ceiling: 4,
            ..CompactConfig::default()
        },
        RunOptions {
            clean: false,
            verify: true,
        },
    )
    .unwrap();

    let meta = read_meta(&paths.output_dir, &report.written.meta_file);
    assert_eq!(meta.files.len(), meta.buckets.len() + 1);
    assert_eq!(meta.files.last().map(String::as_str), Some("meta"));
    assert!(report.written.meta_file.starts_with("meta."));
    for file in meta.bucket_files() {
        assert!(paths.output_dir.join(file).is_file());
    }
    assert_eq!(report.verified.map(|v| v.movies), Some(4));
}

#[test]
fn test_reviews_merged_trimmed_and_tokenized() {
    let ctx = TestContext::new().unwrap();
    let paths = ctx.write_inputs(&Fixtures::small_week(), &all_providers()).unwrap();
    let report = run_build(&paths, &CompactConfig::default(), RunOptions::default()).unwrap();

    let meta = read_meta(&paths.output_dir, &report.written.meta_file);
    let table = UrlPrefixTable::new(meta.url_prefixes.clone());
    let bucket = read_bucket(&paths.output_dir, &meta.files[0]);

    let alien_reviews = bucket["alien"].reviews.as_ref().unwrap();
    assert_eq!(alien_reviews.len(), REVIEW_PROVIDERS.len());
    assert_eq!(
        table.expand(alien_reviews["imdb"].url.as_deref().unwrap()),
        "https://imdb.example/m/alien"
    );
    assert!(!alien_reviews["rottenTomatoes"].fields.contains_key("likes"));
    assert!(bucket["persona"].reviews.is_none());
    assert!(!bucket.contains_key("not-showing"));
}

#[test]
fn test_unknown_fields_survive_compaction() {
    let ctx = TestContext::new().unwrap();
    let raw = json!({
        "generatedAt": "2024-03-01T12:00:00Z",
        "venues": {"rio": {"id": "rio", "name": "Rio", "postcode": "E8 2PB"}},
        "movies": {
            "m1": {
                "title": "Alien",
                "normalizedTitle": "alien",
                "year": 1979,
                "showings": {
                    "s1": {
                        "venue": "rio",
                        "category": "movie",
                        "url": "https://riocinema.org.uk/whats-on/alien",
                        "season": "Summer of Fear"
                    }
                },
                "performances": [
                    {"showing": "s1", "time": 1709294400000i64, "bookingUrl": "https://riocinema.org.uk/b/1", "isSoldOut": true}
                ]
            }
        }
    });
    let dataset = ctx.write_json("combined.json", &raw).unwrap();
    let paths = screenpack::InputPaths::new(dataset, ctx.output_dir());
    let report = run_build(&paths, &CompactConfig::default(), RunOptions::default()).unwrap();

    let meta = read_meta(&paths.output_dir, &report.written.meta_file);
    assert_eq!(meta.venues["rio"].extra["postcode"], json!("E8 2PB"));
    let table = UrlPrefixTable::new(meta.url_prefixes.clone());

    let bytes = fs::read(paths.output_dir.join(&meta.files[0])).unwrap();
    let bucket: Value = unpack_slice(&bytes).unwrap();
    let movie = &bucket["m1"];
    assert_eq!(movie["year"], json!(1979));
    assert_eq!(movie["showings"]["s1"]["season"], json!("Summer of Fear"));
    assert_eq!(movie["performances"][0]["isSoldOut"], json!(true));
    assert_eq!(
        table.expand(movie["performances"][0]["bookingUrl"].as_str().unwrap()),
        "https://riocinema.org.uk/b/1"
    );
}

#[test]
fn test_zero_movies_writes_only_metadata() {
    let ctx = TestContext::new().unwrap();
    let dataset = DatasetBuilder::new().with_venue("rio", "Rio Cinema").build();
    let paths = ctx.write_inputs(&dataset, &[]).unwrap();

    let report = run_build(
        &paths,
        &CompactConfig::default(),
        RunOptions {
            clean: false,
            verify: true,
        },
    )
    .unwrap();

    assert_eq!(report.written.written.len(), 1);
    assert!(report.written.meta_file.starts_with("meta."));
    let meta = read_meta(&paths.output_dir, &report.written.meta_file);
    assert!(meta.buckets.is_empty());
    assert_eq!(meta.files, vec!["meta"]);
    assert!(meta.bucket_files().is_empty());
    assert_eq!(report.verified.map(|v| v.buckets), Some(0));
}

#[test]
fn test_movies_without_performances_share_a_bucket() {
    let ctx = TestContext::new().unwrap();
    let dataset = DatasetBuilder::new()
        .with_venue("rio", "Rio Cinema")
        .with_movie(
            MovieBuilder::new("a", "A")
                .showing("s", "rio", "https://riocinema.org.uk/whats-on/a")
                .performances("s", 2, "https://riocinema.org.uk/booking?id="),
        )
        .with_movie(MovieBuilder::new("b", "B"))
        .with_movie(MovieBuilder::new("c", "C"))
        .build();
    let paths = ctx.write_inputs(&dataset, &[]).unwrap();

    let report = run_build(
        &paths,
        &CompactConfig {
            bucket_ceiling: 2,
            ..CompactConfig::default()
        },
        RunOptions::default(),
    )
    .unwrap();

    let meta = read_meta(&paths.output_dir, &report.written.meta_file);
    assert_eq!(meta.buckets, vec![vec!["a", "b", "c"]]);
}

#[test]
fn test_failed_input_leaves_output_untouched() {
    let ctx = TestContext::new().unwrap();
    let paths = ctx
        .write_inputs(&Fixtures::small_week(), &[])
        .unwrap()
        .with_review("letterboxd", ctx.temp_path().join("letterboxd.json"));

    let err = run_build(&paths, &CompactConfig::default(), RunOptions::default()).unwrap_err();

    assert_eq!(err.code(), ErrorCode::INPUT_MISSING);
    assert!(err.to_string().contains("letterboxd.json"));
    assert!(!paths.output_dir.exists());
}

#[test]
fn test_clean_after_rebuild() {
    let ctx = TestContext::new().unwrap();
    let paths = ctx.write_inputs(&Fixtures::small_week(), &[]).unwrap();
    run_build(
        &paths,
        &CompactConfig {
            bucket_ceiling: 6,
            ..CompactConfig::default()
        },
        RunOptions::default(),
    )
    .unwrap();

    let report = run_build(
        &paths,
        &CompactConfig::default(),
        RunOptions {
            clean: true,
            verify: true,
        },
    )
    .unwrap();

    assert_eq!(report.removed.len(), 4);
    let remaining = fs::read_dir(&paths.output_dir).unwrap().count();
    assert_eq!(remaining, report.written.written.len());
}

#[test]
fn test_null_extra_fields_survive_compaction() {
    let ctx = TestContext::new().unwrap();
    let raw = json!({
        "generatedAt": "2024-03-01T12:00:00Z",
        "venues": {"rio": {"name": "Rio", "closedUntil": null}},
        "movies": {
            "m1": {
                "title": "A",
                "normalizedTitle": "a",
                "year": null,
                "classification": null,
                "showings": {},
                "performances": []
            }
        }
    });
    let paths = screenpack::InputPaths::new(
        ctx.write_json("combined.json", &raw).unwrap(),
        ctx.output_dir(),
    );
    let report = run_build(&paths, &CompactConfig::default(), RunOptions::default()).unwrap();

    let meta = read_meta(&paths.output_dir, &report.written.meta_file);
    assert_eq!(meta.venues["rio"].extra.get("closedUntil"), Some(&Value::Null));

    let bytes = fs::read(paths.output_dir.join(&meta.files[0])).unwrap();
    let bucket: Value = unpack_slice(&bytes).unwrap();
    let movie = bucket["m1"].as_object().unwrap();
    assert_eq!(movie.get("year"), Some(&Value::Null));
    // A modeled optional field set to null reads as absent
    assert!(!movie.contains_key("classification"));
}
