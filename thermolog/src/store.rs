//! Record store: per-component and aggregate JSON files plus the timestamp index.
//!
//! Every record is written twice: once to the aggregate file and once to the
//! file of its component. The [`TimestampIndex`] tracks which timestamps exist
//! in each component file and is updated on every append and delete.
//!
//! # File Layout
//!
//! ```text
//! data_dir/
//! ├── all_measurements.json      <- Every record, insertion order
//! ├── CPU.json                   <- Records of one component
//! ├── GPU.json
//! ├── Motherboard.json
//! ├── index.json                 <- Component -> ascending timestamps
//! └── export/
//!     ├── export_CPU.csv
//!     └── export_all.csv
//! ```
//!
//! # Consistency
//!
//! The two writes of an append are not atomic; a crash between them leaves the
//! aggregate and the component file out of step. Deletes update their primary
//! target first and then clean up the secondary file on a best-effort basis:
//! failures there are logged and do not fail the delete.
//!
//! The store holds no record data in memory. Each operation reads, mutates and
//! rewrites the files it touches.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use thermolog::{Measurement, Selection, Store, Target};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut store = Store::open("./data");
//!
//! store.append(&Measurement::new("CPU", 45.0, 1_700_000_000))?;
//!
//! let latest = store.read(&Target::component("CPU"), Selection::last(10))?;
//! for m in &latest {
//!     println!("{} {} {}", m.component, m.temperature, m.timestamp);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::export::{self, EXPORT_DIR, ExportSummary};
use crate::index::{INDEX_FILE, TimestampIndex};
use crate::measurement::{Measurement, Selection, Target};

/// Name of the aggregate file in the data directory.
pub const AGGREGATE_FILE: &str = "all_measurements.json";

/// JSON record store rooted at a data directory.
///
/// # Thread Safety
///
/// The store is designed for single-threaded access. Mutating operations take
/// `&mut self`; separate processes must not share a data directory.
#[derive(Debug)]
pub struct Store {
    /// Path to the data directory.
    dir: PathBuf,
    /// Timestamp index loaded from `index.json`.
    index: TimestampIndex,
}

impl Store {
    /// Opens the store rooted at `dir` and loads its timestamp index.
    ///
    /// The directory is not created until the first append.
    pub fn open<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let index = TimestampIndex::load(dir.join(INDEX_FILE));
        Self { dir, index }
    }

    /// Returns the timestamp index.
    pub fn index(&self) -> &TimestampIndex {
        &self.index
    }

    /// Returns the path of the aggregate file.
    pub fn aggregate_path(&self) -> PathBuf {
        self.dir.join(AGGREGATE_FILE)
    }

    /// Returns the path of a component's record file.
    pub fn component_path(&self, component: &str) -> PathBuf {
        self.dir.join(format!("{component}.json"))
    }

    fn target_path(&self, target: &Target) -> Result<PathBuf> {
        match target {
            Target::All => Ok(self.aggregate_path()),
            Target::Component(name) => {
                validate_component_name(name)?;
                Ok(self.component_path(name))
            }
        }
    }

    /// Appends a record to the aggregate file and to its component file, then
    /// indexes its timestamp.
    ///
    /// A file that exists but does not hold a JSON array of records is
    /// replaced by a fresh array.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidComponent`] if the component name cannot be used
    ///   as a file name
    /// - [`StoreError::InvalidTemperature`] if the temperature is NaN or
    ///   infinite
    /// - [`StoreError::Io`] if the data directory or a file cannot be written
    pub fn append(&mut self, record: &Measurement) -> Result<()> {
        validate_component_name(&record.component)?;
        if !record.temperature.is_finite() {
            return Err(StoreError::InvalidTemperature {
                component: record.component.clone(),
                temperature: record.temperature,
            }
            .into());
        }

        fs::create_dir_all(&self.dir).map_err(|e| StoreError::Io {
            path: self.dir.clone(),
            source: e,
        })?;

        for path in [self.aggregate_path(), self.component_path(&record.component)] {
            let mut records = load_or_empty(&path);
            records.push(record.clone());
            write_records(&path, &records)?;
        }

        self.index.add(&record.component, record.timestamp)?;

        info!(
            "saved {} record ({:.1} °C at {})",
            record.component, record.temperature, record.timestamp
        );
        Ok(())
    }

    /// Reads the selected records of `target` in file order.
    ///
    /// [`Target::All`] reads the aggregate file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the file is absent, unparseable,
    /// empty, or not a JSON array.
    pub fn read(&self, target: &Target, selection: Selection) -> Result<Vec<Measurement>> {
        let path = self.target_path(target)?;
        let mut records = load_records(&path)?;
        let range = selection.range(records.len());
        Ok(records.drain(range).collect())
    }

    /// Deletes the selected records of `target` and returns them.
    ///
    /// For a single component the component file is trimmed, its index entry
    /// updated, and matching records are then removed from the aggregate.
    /// For [`Target::All`] the aggregate file is trimmed and the removed
    /// records are then cleaned out of each affected component file and the
    /// index. The secondary cleanup is best-effort.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the target file has no records
    /// - [`StoreError::Io`] if the target file cannot be rewritten
    pub fn delete(&mut self, target: &Target, selection: Selection) -> Result<Vec<Measurement>> {
        let path = self.target_path(target)?;
        let mut records = load_records(&path)?;
        let range = selection.range(records.len());
        let removed: Vec<Measurement> = records.drain(range).collect();
        write_records(&path, &records)?;

        match target {
            Target::Component(component) => {
                let timestamps: HashSet<i64> = removed.iter().map(|m| m.timestamp).collect();
                self.index.delete(component, &timestamps)?;

                let aggregate = self.aggregate_path();
                if let Err(e) = remove_matching(&aggregate, component, &timestamps) {
                    warn!("failed to update {}: {e}", aggregate.display());
                }
            }
            Target::All => {
                let mut by_component: BTreeMap<&str, HashSet<i64>> = BTreeMap::new();
                for m in &removed {
                    by_component
                        .entry(m.component.as_str())
                        .or_default()
                        .insert(m.timestamp);
                }

                for (component, timestamps) in by_component {
                    if let Err(e) = self.cleanup_component(component, &timestamps) {
                        warn!("failed to update records of {component}: {e}");
                    }
                }
            }
        }

        info!("deleted {} record(s) from {target}", removed.len());
        Ok(removed)
    }

    /// Removes `timestamps` from a component's file and index entry.
    fn cleanup_component(&mut self, component: &str, timestamps: &HashSet<i64>) -> Result<()> {
        validate_component_name(component)?;
        let path = self.component_path(component);
        let file_result = remove_matching(&path, component, timestamps);
        self.index.delete(component, timestamps)?;
        file_result
    }

    /// Exports the selected records of `target` to CSV.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the target file has no records
    /// - [`crate::error::ExportError`] if the CSV file cannot be written
    pub fn export_csv(&self, target: &Target, selection: Selection) -> Result<ExportSummary> {
        let records = self.read(target, selection)?;
        let path = self.dir.join(EXPORT_DIR).join(export::file_name(target));
        export::write_csv(&path, &records)?;

        info!("exported {} record(s) to {}", records.len(), path.display());
        Ok(ExportSummary {
            path,
            records: records.len(),
        })
    }

    /// Lists the components that have a record file, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the data directory exists but cannot be
    /// listed.
    pub fn components(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source: e,
                }
                .into());
            }
        };

        let mut components: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter(|path| {
                path.file_name()
                    .is_some_and(|name| name != AGGREGATE_FILE && name != INDEX_FILE)
            })
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        components.sort();
        Ok(components)
    }
}

/// Rejects component names that cannot be used as a file stem or CSV field.
fn validate_component_name(name: &str) -> Result<()> {
    let reason = if name.trim().is_empty() {
        "name is empty"
    } else if name.contains(['/', '\\']) || name == "." || name == ".." {
        "name must not contain path separators"
    } else if name.contains(',') {
        "name must not contain commas"
    } else if name == "all_measurements" || name == "index" {
        "name is reserved"
    } else {
        return Ok(());
    };

    Err(StoreError::InvalidComponent {
        name: name.to_string(),
        reason,
    }
    .into())
}

/// Loads the records of `path`, failing if there are none.
fn load_records(path: &Path) -> Result<Vec<Measurement>> {
    let not_found = |reason: String| StoreError::NotFound {
        path: path.to_path_buf(),
        reason,
    };

    let data = fs::read_to_string(path).map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            not_found("file does not exist".to_string())
        } else {
            not_found(format!("cannot read file: {e}"))
        }
    })?;

    let records: Vec<Measurement> =
        serde_json::from_str(&data).map_err(|e| not_found(format!("failed to parse: {e}")))?;

    if records.is_empty() {
        return Err(not_found("no records".to_string()).into());
    }
    Ok(records)
}

/// Loads the records of `path`, treating a missing or corrupt file as empty.
fn load_or_empty(path: &Path) -> Vec<Measurement> {
    let Ok(data) = fs::read_to_string(path) else {
        return Vec::new();
    };
    serde_json::from_str(&data).unwrap_or_else(|e| {
        debug!("discarding unreadable {}: {e}", path.display());
        Vec::new()
    })
}

/// Rewrites `path` with `records` as a pretty-printed JSON array.
fn write_records(path: &Path, records: &[Measurement]) -> Result<()> {
    let mut data = serde_json::to_string_pretty(records).map_err(StoreError::Serialize)?;
    data.push('\n');
    fs::write(path, data).map_err(|e| StoreError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Removes every record of `component` whose timestamp is in `timestamps`.
///
/// A missing file is left alone.
fn remove_matching(path: &Path, component: &str, timestamps: &HashSet<i64>) -> Result<()> {
    if !path.exists() {
        debug!("{} does not exist, nothing to clean up", path.display());
        return Ok(());
    }

    let mut records = load_records(path)?;
    let before = records.len();
    records.retain(|m| !(m.component == component && timestamps.contains(&m.timestamp)));
    if records.len() != before {
        write_records(path, &records)?;
    }
    Ok(())
}
