use ndarray::Array1;
use crate::sweep::{FrequencyGrid, SweepError};
/// dBm to linear power (mW).
pub fn db_to_linear(power_dbm: f64) -> f64 {
    10f64.powf(power_dbm / 10.0)
}
/// Linear power (mW) to dBm.
pub fn linear_to_db(power_mw: f64) -> f64 {
    10.0 * power_mw.log10()
}
/// One output line: a bin and its finalized statistics.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResultRow {
    pub frequency_hz: f64,
    pub mean_dbm: f64,
    pub std_db: f64,
    pub peak_dbm: f64,
}
/// Finalized per-bin statistics; every array is indexed like the grid.
#[derive(Clone, Debug)]
pub struct BinStatistics {
    grid: FrequencyGrid,
    mean_dbm: Array1<f64>,
    std_db: Array1<f64>,
    peak_dbm: Array1<f64>,
    file_count: usize,
}
impl BinStatistics {
    pub fn new(
        grid: FrequencyGrid,
        mean_dbm: Array1<f64>,
        std_db: Array1<f64>,
        peak_dbm: Array1<f64>,
        file_count: usize,
    ) -> Result<Self, SweepError> {
        let n = grid.len();
        if mean_dbm.len() != n || std_db.len() != n || peak_dbm.len() != n {
            return Err(SweepError::Configuration(format!(
                "statistics arrays ({}, {}, {}) do not match the {n}-bin grid",
                mean_dbm.len(),
                std_db.len(),
                peak_dbm.len()
            )));
        }
        Ok(Self {
            grid,
            mean_dbm,
            std_db,
            peak_dbm,
            file_count,
        })
    }
    pub fn grid(&self) -> &FrequencyGrid {
        &self.grid
    }
    pub fn frequencies(&self) -> &Array1<f64> {
        self.grid.frequencies()
    }
    pub fn mean_dbm(&self) -> &Array1<f64> {
        &self.mean_dbm
    }
    pub fn std_db(&self) -> &Array1<f64> {
        &self.std_db
    }
    pub fn peak_dbm(&self) -> &Array1<f64> {
        &self.peak_dbm
    }
    /// Number of captures the statistics were computed from.
    pub fn file_count(&self) -> usize {
        self.file_count
    }
    pub fn len(&self) -> usize {
        self.grid.len()
    }
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty()
    }
    pub fn row(&self, bin: usize) -> Option<ResultRow> {
        Some(ResultRow {
            frequency_hz: self.grid.frequency(bin)?,
            mean_dbm: self.mean_dbm[bin],
            std_db: self.std_db[bin],
            peak_dbm: self.peak_dbm[bin],
        })
    }
    /// Rows in ascending frequency order.
    pub fn rows(&self) -> impl Iterator<Item = ResultRow> + '_ {
        (0..self.len()).filter_map(|bin| self.row(bin))
    }
}
