use std::io::BufRead;
use ndarray::Array1;
use crate::sweep::{FrequencyGrid, SegmentLayout, SweepError};
/// One data line mapped onto the grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub bin: usize,
    pub power_dbm: f64,
}
/// Turns capture text into `(bin, power)` samples according to a [`SegmentLayout`].
#[derive(Clone, Debug)]
pub struct CaptureParser<'g> {
    grid: &'g FrequencyGrid,
    layout: SegmentLayout,
    frequency_tolerance_hz: Option<f64>,
}
impl<'g> CaptureParser<'g> {
    pub fn new(grid: &'g FrequencyGrid, layout: SegmentLayout) -> Result<Self, SweepError> {
        layout.validate_for(grid)?;
        Ok(Self {
            grid,
            layout,
            frequency_tolerance_hz: None,
        })
    }
    /// Also require the frequency column to sit within `tolerance_hz` of its bin.
    pub fn with_frequency_tolerance(mut self, tolerance_hz: Option<f64>) -> Self {
        self.frequency_tolerance_hz = tolerance_hz;
        self
    }
    pub fn grid(&self) -> &'g FrequencyGrid {
        self.grid
    }
    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }
    /// Number of samples every capture must yield.
    pub fn expected_samples(&self) -> usize {
        self.grid.len()
    }
    pub fn parse<R: BufRead>(&self, file: impl Into<String>, reader: R) -> CaptureSamples<'_, 'g, R> {
        CaptureSamples {
            parser: self,
            file: file.into(),
            reader,
            line: Vec::new(),
            line_index: 0,
            produced: 0,
            done: false,
        }
    }
    /// Drains a capture into one power value per bin.
    pub fn collect_powers<R: BufRead>(
        &self,
        file: impl Into<String>,
        reader: R,
    ) -> Result<Array1<f64>, SweepError> {
        let mut powers = Vec::with_capacity(self.expected_samples());
        for sample in self.parse(file, reader) {
            powers.push(sample?.power_dbm);
        }
        Ok(Array1::from_vec(powers))
    }
    fn parse_line(&self, file: &str, index: usize, bin: usize, line: &str) -> Result<Sample, SweepError> {
        let malformed = |reason: String| SweepError::MalformedLine {
            file: file.to_owned(),
            line: index + 1,
            reason,
        };
        let line = line.trim_end_matches(['\n', '\r']);
        let mut fields = line.split('|');
        let freq_field = fields.next().unwrap_or_default();
        let power_field = fields
            .next()
            .ok_or_else(|| malformed(format!("expected `frequency|power`, got `{line}`")))?;
        let power_dbm: f64 = power_field
            .trim()
            .parse()
            .map_err(|_| malformed(format!("power `{}` is not a number", power_field.trim())))?;
        if !power_dbm.is_finite() {
            return Err(malformed(format!("power `{}` is not finite", power_field.trim())));
        }
        if let Some(tolerance) = self.frequency_tolerance_hz {
            let found: f64 = freq_field
                .trim()
                .parse()
                .map_err(|_| malformed(format!("frequency `{}` is not a number", freq_field.trim())))?;
            let expected = self.grid.frequencies()[bin];
            if (found - expected).abs() > tolerance {
                return Err(SweepError::FrequencyMismatch {
                    file: file.to_owned(),
                    line: index + 1,
                    bin,
                    expected,
                    found,
                });
            }
        }
        Ok(Sample { bin, power_dbm })
    }
}
/// Lazy sample stream over one capture. Fused after the first error.
pub struct CaptureSamples<'p, 'g, R> {
    parser: &'p CaptureParser<'g>,
    file: String,
    reader: R,
    line: Vec<u8>,
    line_index: usize,
    produced: usize,
    done: bool,
}
impl<R> CaptureSamples<'_, '_, R> {
    pub fn file(&self) -> &str {
        &self.file
    }
    fn fail(&mut self, err: SweepError) -> Option<Result<Sample, SweepError>> {
        self.done = true;
        Some(Err(err))
    }
}
impl<R: BufRead> Iterator for CaptureSamples<'_, '_, R> {
    type Item = Result<Sample, SweepError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.produced == self.parser.expected_samples() {
            self.done = true;
            return None;
        }
        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    let err = SweepError::IncompleteCapture {
                        file: self.file.clone(),
                        expected: self.parser.expected_samples(),
                        found: self.produced,
                    };
                    return self.fail(err);
                }
                Ok(_) => {}
                Err(e) => {
                    let err = SweepError::io(self.file.clone(), e);
                    return self.fail(err);
                }
            }
            let index = self.line_index;
            self.line_index += 1;
            if self.parser.layout.is_skipped(index) {
                continue;
            }
            // Skipped lines are never decoded, so stray bytes in a header are harmless.
            let parsed = match std::str::from_utf8(&self.line) {
                Ok(text) => self.parser.parse_line(&self.file, index, self.produced, text),
                Err(_) => Err(SweepError::MalformedLine {
                    file: self.file.clone(),
                    line: index + 1,
                    reason: "line is not valid UTF-8".into(),
                }),
            };
            return match parsed {
                Ok(sample) => {
                    self.produced += 1;
                    Some(Ok(sample))
                }
                Err(err) => self.fail(err),
            };
        }
    }
}
