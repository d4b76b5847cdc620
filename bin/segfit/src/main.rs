mod input;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use common::{Config, Point, PointSeries};
use segmentation::{Segmentation, Segmenter, TracingTrace};
use strategy::{DetectorFileConfig, DetectorRegistry, DetectorReport};

/// Piecewise-linear segmentation of point series.
#[derive(Debug, Parser)]
#[command(name = "segfit", version, about)]
struct Cli {
    /// Log every prefix sum, cost cell and DP decision at TRACE level.
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Segment `x y` points read from a file or stdin.
    Fit(FitArgs),
    /// Run the configured flag detectors over `symbol high low` bars.
    Flag(FlagArgs),
}

#[derive(Debug, Args)]
struct FitArgs {
    /// Cost of creating one segment [default: SEGMENT_COST or 4]
    #[arg(short, long, allow_negative_numbers = true)]
    cost: Option<f64>,

    /// Input file; stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Sort the points by x before segmenting.
    #[arg(long)]
    sort: bool,

    /// Threads for the cost table [default: SEGFIT_THREADS or 1]
    #[arg(long)]
    threads: Option<usize>,

    /// Print the result as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct FlagArgs {
    /// Detector definitions [default: DETECTOR_CONFIG_PATH or config/detectors.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bar file; stdin when omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Print the final reports as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging ──────────────────────────────────────────────────────────────
    let level = if cli.trace { "trace" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env().context("invalid environment configuration")?;

    match cli.command {
        Command::Fit(args) => run_fit(&cfg, args, cli.trace),
        Command::Flag(args) => run_flag(&cfg, args),
    }
}

fn run_fit(cfg: &Config, args: FitArgs, trace: bool) -> Result<()> {
    let text = input::read_input(args.input.as_deref()).context("failed to read points")?;
    let points = input::parse_points(&text)?;
    let series = if args.sort {
        PointSeries::sorted(points)?
    } else {
        PointSeries::new(points).context("points must be ordered by x (or pass --sort)")?
    };

    let segment_cost = args.cost.unwrap_or(cfg.segment_cost);
    anyhow::ensure!(segment_cost.is_finite(), "segment cost must be finite");
    let segmenter = Segmenter::new(segment_cost).with_threads(args.threads.unwrap_or(cfg.threads));
    info!(
        points = series.len(),
        segment_cost,
        threads = segmenter.threads(),
        "Segmenting"
    );

    let result = if trace {
        segmenter.segment_traced(&series, &mut TracingTrace)
    } else {
        segmenter.segment(&series)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_segmentation(&series, &result);
    }
    Ok(())
}

fn print_segmentation(points: &[Point], result: &Segmentation) {
    println!("Cost of the optimal solution: {:.6}", result.total_cost);
    println!("An optimal solution:");
    for segment in &result.segments {
        let covered = segment.points(points);
        let (first, last) = (covered[0], covered[covered.len() - 1]);
        println!(
            "Segment (y = {:.6} * x + {:.6}) from point #{}: {} {} to point #{}: {} {} with square error {:.6}",
            segment.slope,
            segment.intercept,
            segment.start,
            first.x,
            first.y,
            segment.end,
            last.x,
            last.y,
            segment.sqerr
        );
    }
}

fn run_flag(cfg: &Config, args: FlagArgs) -> Result<()> {
    let path = args
        .config
        .unwrap_or_else(|| PathBuf::from(&cfg.detector_config_path));
    let file_cfg = DetectorFileConfig::load(&path)
        .with_context(|| format!("failed to load detector config '{}'", path.display()))?;
    let mut registry = DetectorRegistry::from_config(&file_cfg)?;
    anyhow::ensure!(!registry.is_empty(), "no detectors defined in '{}'", path.display());

    let text = input::read_input(args.input.as_deref()).context("failed to read bars")?;
    let bars = input::parse_bars(&text)?;
    info!(bars = bars.len(), detectors = registry.len(), "Running detectors");

    // Latest report per detector; ordered by name for stable output.
    let mut latest: BTreeMap<String, DetectorReport> = BTreeMap::new();
    for bar in &bars {
        for report in registry.process(bar) {
            latest.insert(report.detector.clone(), report);
        }
    }

    let reports: Vec<&DetectorReport> = latest.values().collect();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in reports {
            println!("{} [{}]: {}", report.detector, report.symbol, report.verdict);
        }
    }
    Ok(())
}
