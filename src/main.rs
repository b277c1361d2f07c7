// src/main.rs
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use sweep_stats::sweep::{ErrorPolicy, PassStrategy};
use sweep_stats::RunConfig;

#[derive(Parser)]
#[command(name = "sweep-stats")]
#[command(about = "Per-bin mean, standard deviation and peak power across spectrum captures", long_about = None)]
#[command(version)]
struct Cli {
    /// Capture files to aggregate (default: discover output<N>.txt in --dir)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory searched for capture files
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Output table
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write mean/std/peak PNG plots into this directory
    #[arg(long)]
    plot_dir: Option<PathBuf>,

    /// First bin frequency in Hz
    #[arg(long)]
    start_hz: Option<f64>,

    /// Last bin frequency in Hz
    #[arg(long)]
    stop_hz: Option<f64>,

    /// Bin spacing in Hz
    #[arg(long)]
    step_hz: Option<f64>,

    /// Spans per capture file
    #[arg(long)]
    segments: Option<usize>,

    /// Trace points per span
    #[arg(long)]
    points_per_segment: Option<usize>,

    /// Header lines before each span
    #[arg(long)]
    header_lines: Option<usize>,

    /// Leading points of each later span that repeat the previous span's end
    #[arg(long)]
    overlap_points: Option<usize>,

    /// Keep parsed captures in memory instead of reading them twice
    #[arg(long)]
    buffered: bool,

    /// Leave broken captures out instead of aborting
    #[arg(long)]
    exclude_bad: bool,

    /// Parse captures on all cores
    #[arg(long)]
    parallel: bool,

    /// Check each line's frequency against its bin within this many Hz
    #[arg(long, value_name = "HZ")]
    freq_tolerance: Option<f64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let config = effective_config(&cli)?;
    if cli.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let summary = sweep_stats::run(&config, &cli.files).context("aggregation failed")?;
    info!(
        "{} rows from {} captures ({} left out) written to {}",
        summary.rows,
        summary.report.accepted.len(),
        summary.report.rejected.len(),
        summary.output.display()
    );
    for plot in &summary.plots {
        info!("plot written to {}", plot.display());
    }
    Ok(())
}

fn effective_config(cli: &Cli) -> Result<RunConfig> {
    let mut config = match &cli.config {
        Some(path) => RunConfig::load(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => RunConfig::default(),
    };
    if let Some(dir) = &cli.dir {
        config.input_dir = dir.clone();
    }
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    if let Some(plot_dir) = &cli.plot_dir {
        config.plot_dir = Some(plot_dir.clone());
    }
    if let Some(v) = cli.start_hz {
        config.grid.start_hz = v;
    }
    if let Some(v) = cli.stop_hz {
        config.grid.stop_hz = v;
    }
    if let Some(v) = cli.step_hz {
        config.grid.step_hz = v;
    }
    if let Some(v) = cli.segments {
        config.layout.segments = v;
    }
    if let Some(v) = cli.points_per_segment {
        config.layout.points_per_segment = v;
    }
    if let Some(v) = cli.header_lines {
        config.layout.header_lines = v;
    }
    if let Some(v) = cli.overlap_points {
        config.layout.overlap_points = v;
    }
    if cli.buffered {
        config.strategy = PassStrategy::Buffered;
    }
    if cli.exclude_bad {
        config.error_policy = ErrorPolicy::Exclude;
    }
    if cli.parallel {
        config.parallel = true;
    }
    if cli.freq_tolerance.is_some() {
        config.frequency_tolerance_hz = cli.freq_tolerance;
    }
    config.validate().context("invalid configuration")?;
    Ok(config)
}
