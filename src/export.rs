// src/export.rs
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::info;

use crate::sweep::{BinStatistics, ResultRow, SweepError};

/// Writes `frequency,mean,std,peak` rows, no header, ascending frequency.
///
/// Floats use the shortest representation that parses back to the same value.
pub fn write_results<W: Write>(stats: &BinStatistics, writer: W) -> std::io::Result<usize> {
    let mut w = BufWriter::new(writer);
    let mut rows = 0;
    for row in stats.rows() {
        writeln!(
            w,
            "{},{},{},{}",
            row.frequency_hz, row.mean_dbm, row.std_db, row.peak_dbm
        )?;
        rows += 1;
    }
    w.flush()?;
    Ok(rows)
}

pub fn write_results_file(stats: &BinStatistics, path: &Path) -> Result<usize, SweepError> {
    let name = path.display().to_string();
    let file = File::create(path).map_err(|e| SweepError::io(&name, e))?;
    let rows = write_results(stats, file).map_err(|e| SweepError::io(&name, e))?;
    info!("wrote {rows} rows to {name}");
    Ok(rows)
}

/// Parses a table produced by [`write_results`]. Blank lines are ignored.
pub fn read_results<R: BufRead>(name: &str, reader: R) -> Result<Vec<ResultRow>, SweepError> {
    let mut rows = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SweepError::io(name, e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let malformed = |reason: String| SweepError::MalformedLine {
            file: name.to_owned(),
            line: index + 1,
            reason,
        };
        let values = line
            .split(',')
            .map(|field| {
                field
                    .trim()
                    .parse::<f64>()
                    .map_err(|_| malformed(format!("`{}` is not a number", field.trim())))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        let &[frequency_hz, mean_dbm, std_db, peak_dbm] = values.as_slice() else {
            return Err(malformed(format!("expected 4 columns, found {}", values.len())));
        };
        rows.push(ResultRow {
            frequency_hz,
            mean_dbm,
            std_db,
            peak_dbm,
        });
    }
    Ok(rows)
}

pub fn read_results_file(path: &Path) -> Result<Vec<ResultRow>, SweepError> {
    let name = path.display().to_string();
    let file = File::open(path).map_err(|e| SweepError::io(&name, e))?;
    read_results(&name, BufReader::new(file))
}
