//! CSV export of measurement records.
//!
//! Exports are written to `<data_dir>/export/`, one file per target:
//! `export_<Component>.csv` for a single component and `export_all.csv`
//! for the aggregate. Each file starts with the header
//! `Component,Temperature,Timestamp` followed by one row per record.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::error::{ExportError, Result};
use crate::measurement::{Measurement, Target};

/// Name of the export directory inside the data directory.
pub const EXPORT_DIR: &str = "export";

/// Header row written at the top of every export.
pub const CSV_HEADER: [&str; 3] = ["Component", "Temperature", "Timestamp"];

/// Result of a completed export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    /// Path of the written CSV file.
    pub path: PathBuf,
    /// Number of records written, excluding the header.
    pub records: usize,
}

/// Returns the export file name for `target`.
pub fn file_name(target: &Target) -> String {
    match target {
        Target::All => "export_all.csv".to_string(),
        Target::Component(name) => format!("export_{name}.csv"),
    }
}

/// Writes `records` to `path` as CSV, creating the parent directory if needed.
///
/// The header row is always written, even for an empty record list.
///
/// # Errors
///
/// Returns [`ExportError::Create`] if the directory or file cannot be created,
/// or [`ExportError::Csv`] if a row cannot be written.
pub fn write_csv(path: &Path, records: &[Measurement]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ExportError::Create {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let file = File::create(path).map_err(|e| ExportError::Create {
        path: path.to_path_buf(),
        source: e,
    })?;

    let csv_error = |e| ExportError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for record in records {
        writer.serialize(record).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| ExportError::Create {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
