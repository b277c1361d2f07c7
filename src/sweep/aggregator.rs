use log::{debug, error, info, warn};
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::sweep::stats::{db_to_linear, linear_to_db};
use crate::sweep::{BinStatistics, CaptureParser, CaptureSource, SweepError};
/// How the second pass gets at each capture's samples again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassStrategy {
    /// Parse every capture again; memory stays at a few arrays per bin.
    #[default]
    Reread,
    /// Keep each capture's powers from the first pass and replay them.
    Buffered,
}
/// What to do with a capture that fails to parse during the first pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Stop the run with the capture's error.
    #[default]
    Abort,
    /// Drop the capture from both passes and from the divisor.
    Exclude,
}
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub strategy: PassStrategy,
    pub policy: ErrorPolicy,
    /// Parse captures on the rayon pool, one batch of pool width at a time.
    ///
    /// Results are still folded in input order, and at most one batch of parsed captures is
    /// held in memory, so `Reread` keeps its bounded footprint.
    pub parallel: bool,
}
#[derive(Debug)]
pub struct RejectedCapture {
    pub name: String,
    pub error: SweepError,
}
#[derive(Debug)]
pub struct AggregateReport {
    pub stats: BinStatistics,
    /// Names of the captures that contributed, in input order.
    pub accepted: Vec<String>,
    pub rejected: Vec<RejectedCapture>,
}
/// Two-pass mean / standard deviation / peak over a set of captures.
///
/// Pass 1 sums `10^(p/10)` and tracks the maximum per bin, then fixes the mean as
/// `10 log10(sum / files)`. Pass 2 sums `(p - mean)^2` per bin. The mean for every bin is
/// final before pass 2 reads its first sample.
pub struct Aggregator<'g> {
    parser: CaptureParser<'g>,
    options: AggregateOptions,
}
impl<'g> Aggregator<'g> {
    pub fn new(parser: CaptureParser<'g>, options: AggregateOptions) -> Self {
        Self { parser, options }
    }
    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }
    pub fn aggregate<S>(&self, captures: &[S]) -> Result<AggregateReport, SweepError>
    where
        S: CaptureSource + Sync,
    {
        if captures.is_empty() {
            return Err(SweepError::Configuration(
                "no capture files to aggregate".into(),
            ));
        }
        let grid = self.parser.grid();
        let n = grid.len();
        let buffered = self.options.strategy == PassStrategy::Buffered;
        let mut linear_sum = Array1::<f64>::zeros(n);
        let mut peak = Array1::from_elem(n, f64::NEG_INFINITY);
        let mut accepted = Vec::with_capacity(captures.len());
        let mut rejected = Vec::new();
        let mut replay = Vec::new();
        info!(
            "pass 1: {} captures, {} bins ({:?}, {:?})",
            captures.len(),
            n,
            self.options.strategy,
            self.options.policy
        );
        self.in_input_order(
            captures,
            |capture| self.read_powers(capture),
            |index, result: Result<Array1<f64>, SweepError>| match result {
                Ok(powers) => {
                    linear_sum.zip_mut_with(&powers, |acc, &p| *acc += db_to_linear(p));
                    peak.zip_mut_with(&powers, |acc, &p| *acc = acc.max(p));
                    accepted.push(index);
                    if buffered {
                        replay.push(powers);
                    }
                    Ok(())
                }
                Err(err) => match self.options.policy {
                    ErrorPolicy::Abort => Err(err),
                    ErrorPolicy::Exclude => {
                        warn!("excluding {}: {err}", captures[index].name());
                        rejected.push(RejectedCapture {
                            name: captures[index].name().to_owned(),
                            error: err,
                        });
                        Ok(())
                    }
                },
            },
        )?;
        if accepted.is_empty() {
            return Err(SweepError::Configuration(format!(
                "all {} captures were rejected",
                captures.len()
            )));
        }
        let file_count = accepted.len() as f64;
        let mean = linear_sum.mapv(|sum| linear_to_db(sum / file_count));
        info!("pass 1 done: mean fixed from {} captures", accepted.len());
        let mut sq_dev_sum = Array1::<f64>::zeros(n);
        if buffered {
            for powers in &replay {
                accumulate_sq_dev(&mut sq_dev_sum, powers, &mean);
            }
        } else {
            let kept: Vec<&S> = accepted.iter().map(|&i| &captures[i]).collect();
            self.in_input_order(
                &kept,
                |capture| self.read_powers(capture),
                |index, result: Result<Array1<f64>, SweepError>| {
                    // The capture already shaped the mean, so it cannot be dropped any more.
                    let powers = result.map_err(|err| {
                        error!("{} failed on re-read: {err}", kept[index].name());
                        err
                    })?;
                    accumulate_sq_dev(&mut sq_dev_sum, &powers, &mean);
                    Ok(())
                },
            )?;
        }
        let std = sq_dev_sum.mapv(|sum| (sum / file_count).sqrt());
        info!("pass 2 done");
        let stats = BinStatistics::new(grid.clone(), mean, std, peak, accepted.len())?;
        Ok(AggregateReport {
            stats,
            accepted: accepted
                .iter()
                .map(|&i| captures[i].name().to_owned())
                .collect(),
            rejected,
        })
    }
    fn read_powers<S: CaptureSource>(&self, capture: &S) -> Result<Array1<f64>, SweepError> {
        let reader = capture.open()?;
        let powers = self.parser.collect_powers(capture.name(), reader)?;
        debug!("read {} samples from {}", powers.len(), capture.name());
        Ok(powers)
    }
    /// Runs `work` over every capture, possibly in parallel, and hands the results to `sink`
    /// strictly in input order so floating-point sums never depend on scheduling.
    fn in_input_order<S, T, W, F>(&self, captures: &[S], work: W, mut sink: F) -> Result<(), SweepError>
    where
        S: Sync,
        T: Send,
        W: Fn(&S) -> T + Sync,
        F: FnMut(usize, T) -> Result<(), SweepError>,
    {
        if self.options.parallel {
            // One chunk per pool width bounds how many capture arrays are alive at once.
            let chunk = rayon::current_num_threads().max(1);
            for (n, batch) in captures.chunks(chunk).enumerate() {
                let results: Vec<T> = batch.par_iter().map(&work).collect();
                for (offset, result) in results.into_iter().enumerate() {
                    sink(n * chunk + offset, result)?;
                }
            }
        } else {
            for (index, capture) in captures.iter().enumerate() {
                sink(index, work(capture))?;
            }
        }
        Ok(())
    }
}
fn accumulate_sq_dev(sq_dev_sum: &mut Array1<f64>, powers: &Array1<f64>, mean: &Array1<f64>) {
    ndarray::Zip::from(sq_dev_sum)
        .and(powers)
        .and(mean)
        .for_each(|acc, &p, &m| *acc += (p - m).powi(2));
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::{FrequencyGrid, MemoryCapture, SegmentLayout};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    fn small() -> (FrequencyGrid, SegmentLayout) {
        let layout = SegmentLayout {
            segments: 3,
            points_per_segment: 5,
            header_lines: 1,
            overlap_points: 1,
        };
        let grid = FrequencyGrid::new(2000.0, 2012.0, 1.0).unwrap();
        (grid, layout)
    }
    fn constant(grid: &FrequencyGrid, layout: &SegmentLayout, name: &str, p: f64) -> MemoryCapture {
        MemoryCapture::new(name, layout.render(grid, name, |_| p))
    }
    fn run(
        grid: &FrequencyGrid,
        layout: SegmentLayout,
        options: AggregateOptions,
        captures: &[MemoryCapture],
    ) -> Result<AggregateReport, SweepError> {
        let parser = CaptureParser::new(grid, layout)?;
        Aggregator::new(parser, options).aggregate(captures)
    }
    #[test]
    fn single_constant_capture() {
        let (grid, layout) = small();
        let captures = [constant(&grid, &layout, "a", -42.5)];
        let report = run(&grid, layout, AggregateOptions::default(), &captures).unwrap();
        for row in report.stats.rows() {
            assert_relative_eq!(row.mean_dbm, -42.5, epsilon = 1e-9);
            assert_eq!(row.peak_dbm, -42.5);
            assert_relative_eq!(row.std_db, 0.0, epsilon = 1e-6);
        }
        assert_eq!(report.accepted, vec!["a".to_string()]);
    }
    #[test]
    fn mean_is_averaged_in_linear_domain() {
        let (grid, layout) = small();
        let levels = [-40.0, -50.0, -70.0];
        let captures: Vec<MemoryCapture> = levels
            .iter()
            .enumerate()
            .map(|(i, &p)| constant(&grid, &layout, &format!("c{i}"), p))
            .collect();
        let report = run(&grid, layout, AggregateOptions::default(), &captures).unwrap();
        let expected =
            linear_to_db(levels.iter().map(|&p| db_to_linear(p)).sum::<f64>() / levels.len() as f64);
        let naive = levels.iter().sum::<f64>() / levels.len() as f64;
        let mean = report.stats.mean_dbm()[3];
        assert_relative_eq!(mean, expected, epsilon = 1e-9);
        assert!((mean - naive).abs() > 1.0);
        let expected_std = (levels.iter().map(|p| (p - expected).powi(2)).sum::<f64>()
            / levels.len() as f64)
            .sqrt();
        assert_relative_eq!(report.stats.std_db()[3], expected_std, epsilon = 1e-9);
        assert_eq!(report.stats.peak_dbm()[3], -40.0);
    }
    fn noisy_captures(grid: &FrequencyGrid, layout: &SegmentLayout, count: usize) -> Vec<MemoryCapture> {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        (0..count)
            .map(|i| {
                let name = format!("output{i}.txt");
                let text = layout.render(grid, &name, |_| rng.gen_range(-95.0..-20.0));
                MemoryCapture::new(name, text)
            })
            .collect()
    }
    #[test]
    fn statistics_match_direct_per_bin_formulas() {
        let (grid, layout) = small();
        let captures = noisy_captures(&grid, &layout, 6);
        let parser = CaptureParser::new(&grid, layout).unwrap();
        let per_file: Vec<Array1<f64>> = captures
            .iter()
            .map(|c| parser.collect_powers(c.name(), c.open().unwrap()).unwrap())
            .collect();
        let report = run(&grid, layout, AggregateOptions::default(), &captures).unwrap();
        for bin in 0..grid.len() {
            let values: Vec<f64> = per_file.iter().map(|p| p[bin]).collect();
            let mean = linear_to_db(values.iter().map(|&p| db_to_linear(p)).sum::<f64>() / 6.0);
            let std = (values.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / 6.0).sqrt();
            let peak = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            assert_relative_eq!(report.stats.mean_dbm()[bin], mean, epsilon = 1e-9);
            assert_relative_eq!(report.stats.std_db()[bin], std, epsilon = 1e-9);
            assert_eq!(report.stats.peak_dbm()[bin], peak);
        }
    }
    #[test]
    fn file_order_does_not_change_results() {
        let (grid, layout) = small();
        let captures = noisy_captures(&grid, &layout, 5);
        let mut reversed = captures.clone();
        reversed.reverse();
        reversed.swap(0, 2);
        let a = run(&grid, layout, AggregateOptions::default(), &captures).unwrap();
        let b = run(&grid, layout, AggregateOptions::default(), &reversed).unwrap();
        assert_eq!(a.stats.peak_dbm(), b.stats.peak_dbm());
        for bin in 0..grid.len() {
            assert_relative_eq!(a.stats.mean_dbm()[bin], b.stats.mean_dbm()[bin], epsilon = 1e-9);
            assert_relative_eq!(a.stats.std_db()[bin], b.stats.std_db()[bin], epsilon = 1e-9);
        }
    }
    #[test]
    fn strategies_and_parallelism_agree_exactly() {
        let (grid, layout) = small();
        let captures = noisy_captures(&grid, &layout, 7);
        let base = run(&grid, layout, AggregateOptions::default(), &captures).unwrap();
        for (strategy, parallel) in [
            (PassStrategy::Buffered, false),
            (PassStrategy::Reread, true),
            (PassStrategy::Buffered, true),
        ] {
            let options = AggregateOptions {
                strategy,
                parallel,
                ..AggregateOptions::default()
            };
            let other = run(&grid, layout, options, &captures).unwrap();
            assert_eq!(base.stats.mean_dbm(), other.stats.mean_dbm());
            assert_eq!(base.stats.std_db(), other.stats.std_db());
            assert_eq!(base.stats.peak_dbm(), other.stats.peak_dbm());
            assert_eq!(base.accepted, other.accepted);
        }
    }
    #[test]
    fn parallel_batches_keep_input_order() {
        let (grid, layout) = small();
        let count = rayon::current_num_threads() * 3 + 2;
        let mut captures = noisy_captures(&grid, &layout, count);
        let full = layout.render(&grid, "cut", |_| -50.0);
        let lines: Vec<&str> = full.lines().collect();
        captures[count - 2] = MemoryCapture::new("cut", lines[..lines.len() - 1].join("\n"));
        let serial = AggregateOptions {
            strategy: PassStrategy::Reread,
            policy: ErrorPolicy::Exclude,
            parallel: false,
        };
        let parallel = AggregateOptions {
            parallel: true,
            ..serial
        };
        let a = run(&grid, layout, serial, &captures).unwrap();
        let b = run(&grid, layout, parallel, &captures).unwrap();
        assert_eq!(a.accepted, b.accepted);
        assert_eq!(b.accepted.len(), count - 1);
        assert_eq!(b.rejected[0].name, "cut");
        assert_eq!(a.stats.mean_dbm(), b.stats.mean_dbm());
        assert_eq!(a.stats.std_db(), b.stats.std_db());
        assert_eq!(a.stats.peak_dbm(), b.stats.peak_dbm());
    }
    fn with_truncated(grid: &FrequencyGrid, layout: &SegmentLayout) -> Vec<MemoryCapture> {
        let good_a = constant(grid, layout, "a", -30.0);
        let good_b = constant(grid, layout, "b", -60.0);
        let full = layout.render(grid, "bad", |_| 0.0);
        let lines: Vec<&str> = full.lines().collect();
        let bad = MemoryCapture::new("bad", lines[..lines.len() - 1].join("\n"));
        vec![good_a, bad, good_b]
    }
    #[test]
    fn abort_policy_surfaces_incomplete_capture() {
        let (grid, layout) = small();
        let captures = with_truncated(&grid, &layout);
        let err = run(&grid, layout, AggregateOptions::default(), &captures).unwrap_err();
        assert!(matches!(err, SweepError::IncompleteCapture { ref file, .. } if file == "bad"));
    }
    #[test]
    fn exclude_policy_drops_capture_from_divisor() {
        let (grid, layout) = small();
        let captures = with_truncated(&grid, &layout);
        for parallel in [false, true] {
            let options = AggregateOptions {
                policy: ErrorPolicy::Exclude,
                parallel,
                ..AggregateOptions::default()
            };
            let report = run(&grid, layout, options, &captures).unwrap();
            assert_eq!(report.accepted, vec!["a".to_string(), "b".to_string()]);
            assert_eq!(report.rejected.len(), 1);
            assert_eq!(report.rejected[0].name, "bad");
            assert_eq!(report.stats.file_count(), 2);
            let expected = linear_to_db((db_to_linear(-30.0) + db_to_linear(-60.0)) / 2.0);
            assert_relative_eq!(report.stats.mean_dbm()[0], expected, epsilon = 1e-9);
            assert_eq!(report.stats.peak_dbm()[0], -30.0);
        }
    }
    #[test]
    fn nothing_to_aggregate_is_a_configuration_error() {
        let (grid, layout) = small();
        let err = run(&grid, layout, AggregateOptions::default(), &[]).unwrap_err();
        assert!(matches!(err, SweepError::Configuration(_)));
        let only_bad = vec![MemoryCapture::new("empty", "")];
        let options = AggregateOptions {
            policy: ErrorPolicy::Exclude,
            ..AggregateOptions::default()
        };
        let err = run(&grid, layout, options, &only_bad).unwrap_err();
        assert!(matches!(err, SweepError::Configuration(_)));
    }
    #[test]
    fn full_band_constant_scenario() {
        let grid = FrequencyGrid::new(698_000_000.0, 818_000_000.0, 10_000.0).unwrap();
        let layout = SegmentLayout::default();
        let captures = vec![
            constant(&grid, &layout, "output1.txt", -50.0),
            constant(&grid, &layout, "output2.txt", -50.0),
        ];
        let report = run(&grid, layout, AggregateOptions::default(), &captures).unwrap();
        assert_eq!(report.stats.len(), 12001);
        for (bin, row) in report.stats.rows().enumerate() {
            assert_eq!(row.frequency_hz, 698_000_000.0 + bin as f64 * 10_000.0);
            assert_relative_eq!(row.mean_dbm, -50.0, epsilon = 1e-9);
            assert_relative_eq!(row.std_db, 0.0, epsilon = 1e-6);
            assert_eq!(row.peak_dbm, -50.0);
        }
    }
}
