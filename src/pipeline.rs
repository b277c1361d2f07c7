// src/pipeline.rs
use std::path::PathBuf;

use log::{info, warn};

use crate::config::RunConfig;
use crate::discovery::discover_captures;
use crate::export::write_results_file;
use crate::sweep::{write_plots, AggregateReport, Aggregator, CaptureParser, FileCapture, PlotStyle, SweepError};

/// What a run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub report: AggregateReport,
    pub output: PathBuf,
    pub rows: usize,
    pub plots: Vec<PathBuf>,
}

/// Aggregates `files`, or the captures discovered in the configured directory when
/// `files` is empty, then writes the table and optional plots.
pub fn run(config: &RunConfig, files: &[PathBuf]) -> Result<RunSummary, SweepError> {
    let grid = config.validate()?;
    let paths = if files.is_empty() {
        discover_captures(&config.input_dir, &config.file_prefix, &config.file_suffix)?
    } else {
        files.to_vec()
    };
    info!(
        "aggregating {} captures over {} bins ({} Hz to {} Hz, step {} Hz)",
        paths.len(),
        grid.len(),
        grid.start_hz(),
        grid.end_hz(),
        grid.step_hz()
    );
    let captures: Vec<FileCapture> = paths.into_iter().map(FileCapture::new).collect();
    let parser = CaptureParser::new(&grid, config.layout)?
        .with_frequency_tolerance(config.frequency_tolerance_hz);
    let report = Aggregator::new(parser, config.aggregate_options()).aggregate(&captures)?;
    for rejected in &report.rejected {
        warn!("{} left out of the statistics: {}", rejected.name, rejected.error);
    }
    let rows = write_results_file(&report.stats, &config.output)?;
    let plots = match &config.plot_dir {
        Some(dir) => write_plots(&report.stats, dir, &PlotStyle::default())?,
        None => Vec::new(),
    };
    Ok(RunSummary {
        report,
        output: config.output.clone(),
        rows,
        plots,
    })
}
