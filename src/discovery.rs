// src/discovery.rs
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::sweep::SweepError;

/// Lists `<prefix><N><suffix>` files in `dir`.
///
/// Numbered captures come first in numeric order (`output2` before `output10`); names
/// whose middle part is not a number follow, sorted by name.
pub fn discover_captures(dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<PathBuf>, SweepError> {
    let dir_name = dir.display().to_string();
    let entries = fs::read_dir(dir).map_err(|e| SweepError::io(&dir_name, e))?;
    let mut found: Vec<(Option<u64>, String, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| SweepError::io(&dir_name, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            continue;
        };
        let Some(middle) = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
        else {
            continue;
        };
        let number = middle.parse::<u64>().ok();
        found.push((number, name, path));
    }
    found.sort_by(|a, b| match (a.0, b.0) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.1.cmp(&b.1)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.1.cmp(&b.1),
    });
    debug!("discovered {} captures in {dir_name}", found.len());
    Ok(found.into_iter().map(|(_, _, path)| path).collect())
}
