use ndarray::Array1;
use crate::sweep::SweepError;
/// Upper bound on the number of bins a grid may hold.
pub const MAX_BINS: usize = 10_000_000;
/// Fixed-step frequency axis shared by every per-bin array.
#[derive(Clone, Debug, PartialEq)]
pub struct FrequencyGrid {
    start_hz: f64,
    step_hz: f64,
    frequencies: Array1<f64>,
}
impl FrequencyGrid {
    /// Builds `start, start + step, ...` up to the first value at or past `end`.
    ///
    /// The length is derived analytically and each bin is `start + i * step`, so no
    /// running sum is compared against `end`.
    pub fn new(start_hz: f64, end_hz: f64, step_hz: f64) -> Result<Self, SweepError> {
        if !(start_hz.is_finite() && end_hz.is_finite() && step_hz.is_finite()) {
            return Err(SweepError::Configuration(format!(
                "grid parameters must be finite (start={start_hz}, end={end_hz}, step={step_hz})"
            )));
        }
        if step_hz <= 0.0 {
            return Err(SweepError::Configuration(format!(
                "grid step must be positive, got {step_hz}"
            )));
        }
        if end_hz <= start_hz {
            return Err(SweepError::Configuration(format!(
                "grid end {end_hz} must be greater than start {start_hz}"
            )));
        }
        let spans = ((end_hz - start_hz) / step_hz).round();
        if spans >= MAX_BINS as f64 {
            return Err(SweepError::Configuration(format!(
                "grid would hold more than {MAX_BINS} bins"
            )));
        }
        let mut len = spans as usize + 1;
        // Rounding down may leave the last bin short of `end`; one more bin covers it.
        let last = start_hz + (len - 1) as f64 * step_hz;
        let slack = (start_hz.abs().max(end_hz.abs()) * f64::EPSILON * 4.0).max(step_hz * 1e-9);
        if last + slack < end_hz {
            len += 1;
        }
        let frequencies = Array1::from_shape_fn(len, |i| start_hz + i as f64 * step_hz);
        Ok(Self {
            start_hz,
            step_hz,
            frequencies,
        })
    }
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
    pub fn start_hz(&self) -> f64 {
        self.start_hz
    }
    pub fn step_hz(&self) -> f64 {
        self.step_hz
    }
    /// Frequency of the last bin; never below the requested end.
    pub fn end_hz(&self) -> f64 {
        self.frequencies[self.len() - 1]
    }
    pub fn frequency(&self, bin: usize) -> Option<f64> {
        self.frequencies.get(bin).copied()
    }
    pub fn frequencies(&self) -> &Array1<f64> {
        &self.frequencies
    }
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.frequencies.iter().copied()
    }
}
