use anyhow::{Context, Result};
use clap::Parser;
use screenpack::config::parse_review_arg;
use screenpack::{run_build, BuildReport, CompactConfig, InputPaths, RunOptions, ScreenpackError};
use std::path::PathBuf;
use tracing::{debug, error, trace};
use tracing_subscriber::EnvFilter;

/// Compact a cinema showings dataset into content-addressed artifacts
#[derive(Parser)]
#[command(name = "screenpack", version)]
#[command(about = "Compact showings data into small content-addressed files", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a TOML file overriding compaction settings
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Combined showings dataset (JSON)
    #[arg(long)]
    dataset: PathBuf,

    /// Directory the artifacts are written to
    #[arg(short = 'o', long)]
    out: PathBuf,

    /// Review match file for one provider, as PROVIDER=FILE (repeatable).
    /// Optional: providers without a file are skipped with a warning
    /// (imdb, letterboxd, metacritic, rottenTomatoes)
    #[arg(long = "reviews", value_name = "PROVIDER=FILE", value_parser = review_arg)]
    reviews: Vec<(String, PathBuf)>,

    /// Remove artifacts from earlier runs that this run did not produce
    #[arg(long)]
    clean: bool,

    /// Re-read the written artifacts and check their digests and contents
    #[arg(long)]
    verify: bool,
}

fn review_arg(arg: &str) -> std::result::Result<(String, PathBuf), String> {
    parse_review_arg(arg).map_err(|e| e.user_message())
}

fn init_tracing(verbose: u8) {
    let log_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("SCREENPACK_LOG")
        .ok()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    debug!("Screenpack started with verbosity level: {}", cli.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());

    match run(cli) {
        Ok(report) => print_summary(&report),
        Err(e) => {
            let failure = e.downcast_ref::<ScreenpackError>();
            error!(
                "Fatal error ({}): {:#}",
                failure.map_or("unclassified", ScreenpackError::description),
                e
            );
            eprintln!("Error: {e:#}");
            std::process::exit(failure.map_or(1, ScreenpackError::exit_code));
        }
    }
}

fn run(cli: Cli) -> Result<BuildReport> {
    let config = CompactConfig::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    debug!("Using configuration: {:?}", config);

    let paths = cli
        .reviews
        .into_iter()
        .fold(InputPaths::new(cli.dataset, cli.out), |paths, (provider, path)| {
            paths.with_review(provider, path)
        });
    let options = RunOptions {
        clean: cli.clean,
        verify: cli.verify,
    };

    run_build(&paths, &config, options)
        .with_context(|| format!("Build into {} failed", paths.output_dir.display()))
}

fn print_summary(report: &BuildReport) {
    let summary = &report.summary;
    println!(
        "Wrote {} artifacts to {}",
        report.written.written.len(),
        report.written.output_dir.display()
    );
    println!(
        "  {} movies, {} performances in {} buckets",
        summary.movies, summary.performances, summary.buckets
    );
    println!("  {} URL prefixes", summary.url_prefixes);
    println!(
        "  {} bytes -> {} bytes",
        summary.input_bytes, summary.output_bytes
    );
    println!("  metadata: {}", report.written.meta_file);
    if !report.removed.is_empty() {
        println!("  removed {} stale artifacts", report.removed.len());
    }
    if let Some(verified) = &report.verified {
        println!(
            "  verified {} buckets holding {} movies",
            verified.buckets, verified.movies
        );
    }
}
