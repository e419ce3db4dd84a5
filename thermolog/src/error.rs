//! Error types for the thermolog measurement recorder.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for all thermolog operations.
///
/// Each variant wraps the error enum of one area of the crate, so callers can
/// match on the area first and the concrete failure second.
#[derive(Error, Debug)]
pub enum ThermoError {
    /// Error reading or writing the JSON record files.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Error persisting the timestamp index.
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    /// Error writing a CSV export.
    #[error("export error: {0}")]
    Export(#[from] ExportError),

    /// Error acquiring a measurement from a data source.
    #[error("acquisition error: {0}")]
    Acquisition(#[from] AcquisitionError),

    /// Error loading or validating the configuration file.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid monitoring parameters.
    #[error("monitor error: {0}")]
    Monitor(#[from] MonitorError),

    /// Error in the SQLite record store.
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] SqliteError),
}

impl ThermoError {
    /// Returns `true` if this error means the requested records do not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(StoreError::NotFound { .. }))
    }
}

/// Errors that can occur while reading or rewriting record files.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The target file is absent, empty, not a JSON array, or unparseable.
    #[error("no records found in '{}': {reason}", path.display())]
    NotFound {
        /// The file that was looked up.
        path: PathBuf,
        /// Why the file yielded no records.
        reason: String,
    },

    /// The component name cannot be used as a record file name.
    #[error("invalid component name '{name}': {reason}")]
    InvalidComponent {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// The temperature is NaN or infinite and cannot be stored as JSON.
    #[error("invalid temperature {temperature} for {component}")]
    InvalidTemperature {
        /// The component of the rejected record.
        component: String,
        /// The rejected value.
        temperature: f64,
    },

    /// A directory could not be created or a file could not be written.
    #[error("failed to write '{}': {source}", path.display())]
    Io {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Records could not be serialized to JSON.
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors that can occur while persisting the timestamp index.
///
/// Loading never fails: a missing or corrupt index file yields an empty index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The index file could not be written.
    #[error("failed to save index to '{}': {source}", path.display())]
    Save {
        /// The index file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The index could not be serialized to JSON.
    #[error("failed to serialize index: {source}")]
    Serialize {
        /// The underlying JSON serialization error.
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while writing CSV exports.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The export directory or file could not be created.
    #[error("failed to create export file '{}': {source}", path.display())]
    Create {
        /// The export path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing a CSV row failed.
    #[error("failed to write CSV to '{}': {source}", path.display())]
    Csv {
        /// The export path.
        path: PathBuf,
        /// The underlying CSV error.
        #[source]
        source: csv::Error,
    },
}

/// Errors that can occur while acquiring measurements.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// The HTTP client could not be created.
    #[error("failed to create HTTP client: {source}")]
    ClientCreate {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP request to the sensor endpoint failed.
    #[error("request to '{endpoint}' failed: {source}")]
    Request {
        /// The endpoint URL.
        endpoint: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The sensor endpoint returned an empty body.
    #[error("empty response from '{endpoint}'")]
    EmptyResponse {
        /// The endpoint URL.
        endpoint: String,
    },

    /// The sensor payload was not valid sensor-tree JSON.
    #[error("failed to parse sensor data: {source}")]
    Parse {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The requested component is not present in the sensor payload.
    #[error("temperature data not found for {component}")]
    ComponentNotFound {
        /// The component that was looked up.
        component: String,
    },

    /// A sensor value could not be parsed as a temperature.
    #[error("invalid sensor value '{value}' for {component}")]
    InvalidValue {
        /// The component the sensor belongs to.
        component: String,
        /// The raw sensor value.
        value: String,
    },

    /// A replay source has no more stored records for the component.
    #[error("no more stored records to replay for {component}")]
    Exhausted {
        /// The component being replayed.
        component: String,
    },

    /// The data source does not support the requested operation.
    #[error("{source_name} does not support {operation}")]
    UnsupportedOperation {
        /// Name of the data source.
        source_name: &'static str,
        /// The operation that was attempted.
        operation: &'static str,
    },
}

/// Errors that can occur while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot open config file '{}': {source}", path.display())]
    Read {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// One or more mandatory keys are missing or empty.
    #[error("missing or empty values: {}", keys.join(", "))]
    Missing {
        /// The keys that must be filled in.
        keys: Vec<&'static str>,
    },

    /// A non-comment line has no `=` separator.
    #[error("line {line}: expected KEY=VALUE, found '{content}'")]
    InvalidLine {
        /// 1-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },
}

/// Errors that can occur when starting a monitoring run.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// The interval between iterations is zero.
    #[error("monitoring interval must be greater than zero")]
    ZeroInterval,
}

/// Errors that can occur in the SQLite record store.
#[cfg(feature = "sqlite")]
#[derive(Error, Debug)]
pub enum SqliteError {
    /// The database file could not be opened or its schema created.
    #[error("cannot open SQLite database '{}': {source}", path.display())]
    Open {
        /// The database path.
        path: PathBuf,
        /// The underlying rusqlite error.
        #[source]
        source: rusqlite::Error,
    },

    /// A statement failed to execute.
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Type alias for `Result<T, ThermoError>`.
pub type Result<T> = std::result::Result<T, ThermoError>;
