//! huntpath-bench: CLI tool for route planning experiments and diagnostics.
//!
//! Plans a route through a JSON file of clue locations with configurable
//! parameters, printing per-stage diagnostics. Useful for:
//!
//! - Comparing ordering strategies (`christofides` vs `nearest-neighbor`)
//! - Comparing greedy and optimal odd-node matching
//! - Measuring per-stage durations on large clue sets
//! - Previewing the tree, matching and final route as SVG
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin huntpath-bench -- [OPTIONS] <POINTS_JSON>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{ArgAction, Parser, ValueEnum};
use huntpath_route::diagnostics::{Clock, PlanDiagnostics};
use huntpath_route::{MatchingStrategy, RouteConfig, RouteStrategy};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::SubscriberBuilder;

/// Route planning experiments and diagnostics for huntpath.
///
/// Reads a JSON array of `{"id", "lat", "long"}` records, plans a visiting
/// order and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "huntpath-bench", version)]
struct Cli {
    /// Path to the input JSON point list.
    points_json: PathBuf,

    /// Ordering strategy.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_STRATEGY)]
    strategy: Strategy,

    /// Odd-degree matching strategy for the Christofides tour.
    #[arg(long, value_enum, default_value_t = Matching::Greedy)]
    matching: Matching,

    /// Clue id the route must start from.
    #[arg(long)]
    start: Option<i64>,

    /// Keep the closed-tour rotation instead of dropping the longest leg.
    #[arg(long)]
    closed: bool,

    /// Write the route as a JSON response document.
    #[arg(long)]
    route_json: Option<PathBuf>,

    /// Write an SVG preview of the route.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write an SVG showing the spanning tree and matching under the route.
    #[arg(long)]
    diagnostic_svg: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full route config as a JSON string.
    ///
    /// When provided, the strategy, matching, start and closed flags are
    /// ignored. The JSON must be a valid `RouteConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,

    /// Log verbosity on stderr (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Ordering strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Strategy {
    /// Christofides-style tour from the spanning tree.
    Christofides,
    /// Greedy nearest unvisited clue.
    NearestNeighbor,
}

/// Matching strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Matching {
    /// Pair each node with its nearest unmatched partner.
    Greedy,
    /// Minimum-weight matching (DP for small sets, greedy fallback).
    Optimal,
}

const fn strategy_from_route(s: RouteStrategy) -> Strategy {
    match s {
        RouteStrategy::Christofides => Strategy::Christofides,
        RouteStrategy::NearestNeighbor => Strategy::NearestNeighbor,
    }
}

const CLI_DEFAULT_STRATEGY: Strategy = strategy_from_route(RouteConfig::DEFAULT_STRATEGY);

/// Build a [`RouteConfig`] from CLI arguments.
///
/// `--config-json` takes precedence over the individual flags.
fn config_from_cli(cli: &Cli) -> Result<RouteConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(RouteConfig {
        strategy: match cli.strategy {
            Strategy::Christofides => RouteStrategy::Christofides,
            Strategy::NearestNeighbor => RouteStrategy::NearestNeighbor,
        },
        matching: match cli.matching {
            Matching::Greedy => MatchingStrategy::Greedy,
            Matching::Optimal => MatchingStrategy::Optimal,
        },
        start: cli.start,
        open_route: !cli.closed,
    })
}

const fn level_from_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    SubscriberBuilder::default()
        .with_target(false)
        .with_max_level(level_from_verbosity(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let input = match std::fs::read_to_string(&cli.points_json) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.points_json.display());
            return ExitCode::FAILURE;
        }
    };

    let points = match huntpath_export::parse_points(&input) {
        Ok(points) => points,
        Err(e) => {
            eprintln!("Error parsing {}: {e}", cli.points_json.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!(
        "Points: {} ({} clues)",
        cli.points_json.display(),
        points.len(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match huntpath_route::diagnostics::plan_with_diagnostics(&points, &config, &StdClock) {
            Ok((staged, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write outputs on the first run only.
                if run == 0 && !write_outputs(&cli, &config, &staged) {
                    return ExitCode::FAILURE;
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Planning error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write the requested route JSON and SVG files. Returns `false` when the
/// route document cannot be serialized.
fn write_outputs(cli: &Cli, config: &RouteConfig, staged: &huntpath_route::StagedRoute) -> bool {
    if let Some(ref path) = cli.route_json {
        let metadata = huntpath_export::JsonMetadata {
            config: Some(config),
            pretty: true,
        };
        match huntpath_export::to_json(&staged.route, &metadata) {
            Ok(json) => write_file("Route JSON", path, &json),
            Err(e) => {
                eprintln!("Error serializing route: {e}");
                return false;
            }
        }
    }

    if cli.svg.is_none() && cli.diagnostic_svg.is_none() {
        return true;
    }

    let title = cli
        .points_json
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bench");
    let config_json = serde_json::to_string(config).ok();
    let metadata = huntpath_export::SvgMetadata {
        title: Some(title),
        description: None,
        config_json: config_json.as_deref(),
    };

    if let Some(ref path) = cli.svg {
        let svg = huntpath_export::to_svg(&staged.points, &staged.route, &metadata);
        write_file("SVG", path, &svg);
    }
    if let Some(ref path) = cli.diagnostic_svg {
        let svg = huntpath_export::to_diagnostic_svg(staged, &metadata);
        write_file("Diagnostic SVG", path, &svg);
    }
    true
}

fn write_file(label: &str, path: &std::path::Path, contents: &str) {
    match std::fs::write(path, contents) {
        Ok(()) => {
            eprintln!(
                "{label} written to {} ({} bytes)",
                path.display(),
                contents.len(),
            );
        }
        Err(e) => {
            eprintln!("Error writing {label} to {}: {e}", path.display());
        }
    }
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PlanDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PlanDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Validate", |d| d.validate.duration),
        ("Connect", |d| d.connect.duration),
        ("Span", |d| d.span.duration),
        ("Match", |d| d.matching.duration),
        ("Circuit", |d| d.circuit.duration),
        ("Order", |d| d.order.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
