//! CSV persistence for scraped records.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::record::ProductRecord;

/// Resolve where an output file lands: absolute paths and relative paths
/// with a subdirectory are kept as-is; a bare filename goes under the
/// configured output directory.
pub fn resolve_output_path(output_dir: &str, filename: &str) -> PathBuf {
    let candidate = Path::new(filename);
    if candidate.is_absolute() {
        return candidate.to_path_buf();
    }
    match candidate.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => candidate.to_path_buf(),
        _ => Path::new(output_dir).join(filename),
    }
}

/// Write records as UTF-8 CSV: a header row, then one row per record.
/// Intermediate directories are created as needed.
pub fn save_to_csv(records: &[ProductRecord], output_dir: &str, filename: &str) -> Result<PathBuf> {
    let path = resolve_output_path(output_dir, filename);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }
    }

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to open {} for writing", path.display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = records.len(), "wrote product records");
    Ok(path)
}
