// src/config.rs
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::sweep::{AggregateOptions, ErrorPolicy, FrequencyGrid, PassStrategy, SegmentLayout, SweepError};

// 扫频范围: 698 MHz 到 818 MHz, 分辨率带宽 10 kHz
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub start_hz: f64,
    pub stop_hz: f64,
    pub step_hz: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            start_hz: 698_000_000.0,
            stop_hz: 818_000_000.0,
            step_hz: 10_000.0,
        }
    }
}

/// Everything a run needs. Missing JSON keys fall back to the defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub grid: GridConfig,
    pub layout: SegmentLayout,
    pub strategy: PassStrategy,
    pub error_policy: ErrorPolicy,
    pub parallel: bool,
    /// Reject captures whose frequency column strays further than this from the grid.
    pub frequency_tolerance_hz: Option<f64>,
    pub input_dir: PathBuf,
    pub file_prefix: String,
    pub file_suffix: String,
    pub output: PathBuf,
    pub plot_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            layout: SegmentLayout::default(),
            strategy: PassStrategy::default(),
            error_policy: ErrorPolicy::default(),
            parallel: false,
            frequency_tolerance_hz: None,
            input_dir: PathBuf::from("."),
            file_prefix: "output".to_owned(),
            file_suffix: ".txt".to_owned(),
            output: PathBuf::from("msp.csv"),
            plot_dir: None,
        }
    }
}

impl RunConfig {
    pub fn from_json_str(text: &str) -> Result<Self, SweepError> {
        serde_json::from_str(text).map_err(|e| SweepError::Configuration(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, SweepError> {
        let text = fs::read_to_string(path).map_err(|e| SweepError::io(path.display().to_string(), e))?;
        serde_json::from_str(&text)
            .map_err(|e| SweepError::Configuration(format!("{}: {e}", path.display())))
    }

    pub fn to_json(&self) -> Result<String, SweepError> {
        serde_json::to_string_pretty(self).map_err(|e| SweepError::Configuration(e.to_string()))
    }

    /// Builds the grid and checks that the rest of the configuration fits it.
    pub fn validate(&self) -> Result<FrequencyGrid, SweepError> {
        let grid = FrequencyGrid::new(self.grid.start_hz, self.grid.stop_hz, self.grid.step_hz)?;
        self.layout.validate_for(&grid)?;
        if let Some(tolerance) = self.frequency_tolerance_hz {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(SweepError::Configuration(format!(
                    "frequency tolerance must be a non-negative number, got {tolerance}"
                )));
            }
        }
        if self.file_prefix.is_empty() && self.file_suffix.is_empty() {
            return Err(SweepError::Configuration(
                "capture file prefix and suffix cannot both be empty".into(),
            ));
        }
        Ok(grid)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            strategy: self.strategy,
            policy: self.error_policy,
            parallel: self.parallel,
        }
    }
}
