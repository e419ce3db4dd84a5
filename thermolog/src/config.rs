//! Sensor configuration loaded from a `KEY=VALUE` file.
//!
//! The file maps component roles to the substrings that identify their nodes
//! in the sensor tree:
//!
//! ```text
//! # Hardware identifiers
//! CPU=Intel Core i7
//! GPU=NVIDIA
//! MOTHERBOARD=ASUS
//! CHIP=Nuvoton
//! URL=http://192.168.1.10:8085/data.json
//! ```
//!
//! `CPU`, `GPU`, `MOTHERBOARD` and `CHIP` are mandatory and must be non-empty.
//! `URL` is optional and defaults to [`DEFAULT_ENDPOINT`]. Blank lines and
//! lines starting with `#` are ignored; unknown keys are kept but unused.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Result};

/// Default sensor endpoint of a local Open Hardware Monitor web server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8085/data.json";

/// Keys that must be present and non-empty.
pub const REQUIRED_KEYS: [&str; 4] = ["CPU", "GPU", "MOTHERBOARD", "CHIP"];

/// Substrings that locate each component in the sensor tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorIdentifiers {
    /// Identifier of the CPU hardware node.
    pub cpu: String,
    /// Identifier of the GPU hardware node.
    pub gpu: String,
    /// Identifier of the motherboard hardware node.
    pub motherboard: String,
    /// Identifier of the Super-I/O chip node below the motherboard.
    pub chip: String,
}

/// Validated configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sensor tree identifiers.
    pub sensors: SensorIdentifiers,
    /// URL of the sensor data endpoint.
    pub endpoint: String,
}

impl Config {
    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Read`] if the file cannot be read
    /// - [`ConfigError::InvalidLine`] if a line has no `=`
    /// - [`ConfigError::Missing`] if a mandatory key is missing or empty
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidLine`] or [`ConfigError::Missing`].
    pub fn parse(content: &str) -> Result<Self> {
        let mut values = HashMap::new();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::InvalidLine {
                    line: number + 1,
                    content: line.to_string(),
                }
                .into());
            };
            values.insert(key.trim().to_string(), value.trim().to_string());
        }

        let missing: Vec<&'static str> = REQUIRED_KEYS
            .into_iter()
            .filter(|key| values.get(*key).is_none_or(String::is_empty))
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::Missing { keys: missing }.into());
        }

        let mut take = |key: &str| values.remove(key).unwrap_or_default();
        let sensors = SensorIdentifiers {
            cpu: take("CPU"),
            gpu: take("GPU"),
            motherboard: take("MOTHERBOARD"),
            chip: take("CHIP"),
        };
        let endpoint = values
            .remove("URL")
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Ok(Self { sensors, endpoint })
    }
}
