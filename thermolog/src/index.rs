//! Timestamp index for recorded measurements.
//!
//! The index keeps, per component, the ascending list of timestamps that are
//! present in that component's record file. It is persisted in `index.json`
//! as a single JSON object:
//!
//! ```text
//! {
//!   "CPU": [1000, 1010],
//!   "GPU": [1005]
//! }
//! ```
//!
//! Every mutating call rewrites the whole file before returning. Loading never
//! fails: a missing or unparseable file yields an empty index.
//!
//! Duplicate timestamps are kept. Two readings taken within the same second
//! produce two identical entries, and deleting that timestamp removes both.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{IndexError, Result};

/// Name of the index file in the data directory.
pub const INDEX_FILE: &str = "index.json";

/// Per-component ascending timestamp lists with write-through persistence.
#[derive(Debug)]
pub struct TimestampIndex {
    /// File path for persistence.
    path: PathBuf,
    /// Component name -> ascending timestamps.
    entries: BTreeMap<String, Vec<i64>>,
}

impl TimestampIndex {
    /// Loads the index from `path`, or starts empty if the file is missing
    /// or cannot be parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str::<BTreeMap<String, Vec<i64>>>(&data).ok())
            .unwrap_or_default();

        Self { path, entries }
    }

    /// Records `timestamp` for `component` and persists the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the index file cannot be written.
    pub fn add(&mut self, component: &str, timestamp: i64) -> Result<()> {
        let timestamps = self.entries.entry(component.to_string()).or_default();
        timestamps.push(timestamp);
        timestamps.sort_unstable();
        self.save()
    }

    /// Returns every timestamp for `component` in ascending order.
    ///
    /// Unknown components yield an empty slice.
    pub fn timestamps(&self, component: &str) -> &[i64] {
        self.entries
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns the `count` largest timestamps for `component`, ascending.
    pub fn latest(&self, component: &str, count: usize) -> &[i64] {
        let timestamps = self.timestamps(component);
        &timestamps[timestamps.len().saturating_sub(count)..]
    }

    /// Returns the `count` smallest timestamps for `component`, ascending.
    pub fn oldest(&self, component: &str, count: usize) -> &[i64] {
        let timestamps = self.timestamps(component);
        &timestamps[..count.min(timestamps.len())]
    }

    /// Returns the number of indexed timestamps for `component`.
    pub fn len(&self, component: &str) -> usize {
        self.timestamps(component).len()
    }

    /// Returns the indexed component names in sorted order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Removes every occurrence of the given timestamps from `component`.
    ///
    /// The index is persisted only when the component is known; deleting
    /// from an unknown component is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the index file cannot be written.
    pub fn delete(&mut self, component: &str, timestamps: &HashSet<i64>) -> Result<()> {
        let Some(entry) = self.entries.get_mut(component) else {
            return Ok(());
        };
        entry.retain(|ts| !timestamps.contains(ts));
        self.save()
    }

    /// Writes the full index to its file.
    fn save(&self) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| IndexError::Serialize { source: e })?;
        fs::write(&self.path, data).map_err(|e| IndexError::Save {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }
}
