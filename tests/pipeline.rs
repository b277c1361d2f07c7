use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use sweep_stats::export::read_results_file;
use sweep_stats::sweep::{db_to_linear, linear_to_db, ErrorPolicy, FrequencyGrid, SweepError};
use sweep_stats::RunConfig;

fn write_capture(dir: &Path, name: &str, config: &RunConfig, power: impl FnMut(usize) -> f64) {
    let grid = config.validate().unwrap();
    let text = config.layout.render(&grid, name, power);
    fs::write(dir.join(name), text).unwrap();
}

fn config_in(dir: &Path) -> RunConfig {
    RunConfig {
        input_dir: dir.to_path_buf(),
        output: dir.join("msp.csv"),
        ..RunConfig::default()
    }
}

#[test]
fn constant_captures_produce_flat_table() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_capture(dir.path(), "output1.txt", &config, |_| -50.0);
    write_capture(dir.path(), "output2.txt", &config, |_| -50.0);

    let summary = sweep_stats::run(&config, &[]).unwrap();
    assert_eq!(summary.rows, 12001);
    assert_eq!(summary.report.accepted.len(), 2);

    let rows = read_results_file(&config.output).unwrap();
    let grid = FrequencyGrid::new(698_000_000.0, 818_000_000.0, 10_000.0).unwrap();
    assert_eq!(rows.len(), grid.len());
    for (row, freq) in rows.iter().zip(grid.iter()) {
        assert_eq!(row.frequency_hz, freq);
        assert_relative_eq!(row.mean_dbm, -50.0, epsilon = 1e-9);
        assert_relative_eq!(row.std_db, 0.0, epsilon = 1e-6);
        assert_eq!(row.peak_dbm, -50.0);
    }
}

#[test]
fn exported_table_matches_in_memory_statistics() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        parallel: true,
        ..config_in(dir.path())
    };
    for (i, offset) in [0.0, 3.0, -7.5].iter().enumerate() {
        write_capture(dir.path(), &format!("output{i}.txt"), &config, |bin| {
            -80.0 + offset + (bin % 97) as f64 * 0.25
        });
    }
    let summary = sweep_stats::run(&config, &[]).unwrap();
    let rows = read_results_file(&config.output).unwrap();
    let expected: Vec<_> = summary.report.stats.rows().collect();
    assert_eq!(rows, expected);

    let bin = 500;
    let levels: Vec<f64> = [0.0, 3.0, -7.5]
        .iter()
        .map(|o| -80.0 + o + (bin % 97) as f64 * 0.25)
        .collect();
    let mean = linear_to_db(levels.iter().map(|&p| db_to_linear(p)).sum::<f64>() / 3.0);
    assert_relative_eq!(rows[bin].mean_dbm, mean, epsilon = 1e-9);
    assert_eq!(rows[bin].peak_dbm, levels[1]);
}

#[test]
fn explicit_file_list_overrides_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_capture(dir.path(), "output1.txt", &config, |_| -40.0);
    write_capture(dir.path(), "output2.txt", &config, |_| -60.0);
    let summary = sweep_stats::run(&config, &[dir.path().join("output2.txt")]).unwrap();
    assert_eq!(summary.report.accepted.len(), 1);
    assert_eq!(summary.report.stats.peak_dbm()[0], -60.0);
}

#[test]
fn truncated_capture_aborts_or_is_excluded() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    write_capture(dir.path(), "output1.txt", &config, |_| -45.0);
    write_capture(dir.path(), "output2.txt", &config, |_| -45.0);
    let text = fs::read_to_string(dir.path().join("output2.txt")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    fs::write(dir.path().join("output2.txt"), lines[..lines.len() - 1].join("\n")).unwrap();

    let err = sweep_stats::run(&config, &[]).unwrap_err();
    match err {
        SweepError::IncompleteCapture { file, expected, found } => {
            assert!(file.ends_with("output2.txt"));
            assert_eq!(expected, 12001);
            assert_eq!(found, 12000);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.output.exists());

    let config = RunConfig {
        error_policy: ErrorPolicy::Exclude,
        ..config
    };
    let summary = sweep_stats::run(&config, &[]).unwrap();
    assert_eq!(summary.report.accepted.len(), 1);
    assert_eq!(summary.report.rejected.len(), 1);
    assert_eq!(summary.report.stats.file_count(), 1);
}

#[test]
fn empty_directory_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = sweep_stats::run(&config_in(dir.path()), &[]).unwrap_err();
    assert!(matches!(err, SweepError::Configuration(_)));
}
