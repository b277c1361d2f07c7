use std::fmt::Write as _;
use serde::{Deserialize, Serialize};
use crate::sweep::{FrequencyGrid, SweepError};
/// Upper bound on the lines one capture layout may describe.
pub const MAX_LINES: usize = 100_000_000;
/// Line layout of one capture file.
///
/// The acquisition tool writes `segments` spans back to back. Every span starts with
/// `header_lines` header lines followed by `points_per_segment` `freq|power` lines. Adjacent
/// spans share their boundary frequency, so the first `overlap_points` data lines of every
/// span after the first repeat bins already seen and are skipped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentLayout {
    pub segments: usize,
    pub points_per_segment: usize,
    pub header_lines: usize,
    pub overlap_points: usize,
}
impl Default for SegmentLayout {
    fn default() -> Self {
        // Three 40 MHz spans of 4001 trace points covering 698-818 MHz.
        Self {
            segments: 3,
            points_per_segment: 4001,
            header_lines: 1,
            overlap_points: 1,
        }
    }
}
impl SegmentLayout {
    fn block_len(&self) -> usize {
        self.header_lines + self.points_per_segment
    }
    /// Number of distinct bins one capture contributes.
    pub fn sample_count(&self) -> usize {
        self.segments * self.points_per_segment
            - self.segments.saturating_sub(1) * self.overlap_points
    }
    /// Number of lines carrying layout content; anything after is ignored.
    pub fn line_count(&self) -> usize {
        self.segments * self.block_len()
    }
    /// Whether the 0-based line `index` is a header or a repeated boundary point.
    pub fn is_skipped(&self, index: usize) -> bool {
        let segment = index / self.block_len();
        let offset = index % self.block_len();
        if offset < self.header_lines {
            return true;
        }
        segment > 0 && offset - self.header_lines < self.overlap_points
    }
    /// Skipped line indices within the layout, ascending.
    pub fn skipped_lines(&self) -> Vec<usize> {
        (0..self.line_count()).filter(|&i| self.is_skipped(i)).collect()
    }
    /// Rejects empty or oversized layouts. The counting helpers assume this passed.
    pub fn validate(&self) -> Result<(), SweepError> {
        if self.segments == 0 || self.points_per_segment == 0 {
            return Err(SweepError::Configuration(
                "layout needs at least one segment with one point".into(),
            ));
        }
        if self.overlap_points >= self.points_per_segment {
            return Err(SweepError::Configuration(format!(
                "overlap of {} points leaves nothing of a {}-point segment",
                self.overlap_points, self.points_per_segment
            )));
        }
        // Bounds line_count, and sample_count never exceeds it.
        let lines = self
            .header_lines
            .checked_add(self.points_per_segment)
            .and_then(|block| block.checked_mul(self.segments))
            .filter(|&lines| lines <= MAX_LINES);
        if lines.is_none() {
            return Err(SweepError::Configuration(format!(
                "layout of {} segments with {} header and {} data lines each exceeds {MAX_LINES} lines",
                self.segments, self.header_lines, self.points_per_segment
            )));
        }
        Ok(())
    }
    /// Checks the layout on its own and against the bin count of `grid`.
    pub fn validate_for(&self, grid: &FrequencyGrid) -> Result<(), SweepError> {
        self.validate()?;
        if self.sample_count() != grid.len() {
            return Err(SweepError::Configuration(format!(
                "layout yields {} samples per capture but the grid has {} bins",
                self.sample_count(),
                grid.len()
            )));
        }
        Ok(())
    }
    /// Renders a capture in the acquisition tool's text format.
    ///
    /// `power_dbm` is called with the bin index of every written data line, including the
    /// repeated boundary points.
    pub fn render(
        &self,
        grid: &FrequencyGrid,
        label: &str,
        mut power_dbm: impl FnMut(usize) -> f64,
    ) -> String {
        let stride = self.points_per_segment - self.overlap_points;
        let mut out = String::with_capacity(self.line_count() * 24);
        for segment in 0..self.segments {
            for _ in 0..self.header_lines {
                writeln!(out, "Frequency|Power(dBm) for timestamp:{label}").ok();
            }
            for point in 0..self.points_per_segment {
                let bin = segment * stride + point;
                let freq = grid
                    .frequency(bin)
                    .unwrap_or_else(|| grid.start_hz() + bin as f64 * grid.step_hz());
                writeln!(out, "{freq}|{}", power_dbm(bin)).ok();
            }
        }
        out
    }
}
