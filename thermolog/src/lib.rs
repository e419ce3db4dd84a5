//! # thermolog
//!
//! Hardware temperature recorder.
//!
//! thermolog polls an Open Hardware Monitor web server for CPU, GPU and
//! motherboard temperatures and keeps the readings in plain JSON files: one
//! file per component, one aggregate file with every record, and a timestamp
//! index. Stored readings can be listed, exported to CSV, and deleted by
//! range while keeping all three in step.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use thermolog::{Component, Config, LiveSource, Selection, Store, Target};
//! use thermolog::monitor;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("thermolog.conf")?;
//! let mut source = LiveSource::new(&config)?;
//! let mut store = Store::open("./data");
//!
//! // Take one reading of every component
//! for (component, outcome) in monitor::record_all(&mut source, &mut store, &Component::ALL) {
//!     match outcome {
//!         Ok(m) => println!("{component}: {} °C", m.temperature),
//!         Err(e) => eprintln!("{component}: {e}"),
//!     }
//! }
//!
//! // Export the ten newest CPU readings
//! let summary = store.export_csv(&Target::from(Component::Cpu), Selection::last(10))?;
//! println!("wrote {}", summary.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`Store`]: Owns the data directory and the timestamp index
//! - [`TimestampIndex`]: Per-component ascending timestamps in `index.json`
//! - [`DataSource`]: Where measurements come from ([`LiveSource`], [`FileReplay`])
//! - [`Config`]: Sensor identifiers and endpoint
//!
//! ## Modules
//!
//! - [`store`]: Append, read, delete and export of record files
//! - [`index`]: Timestamp index
//! - [`measurement`]: Measurement, component, target and selection types
//! - [`export`]: CSV writer
//! - [`sensors`]: Sensor tree model and temperature lookup
//! - [`source`]: Data sources
//! - [`monitor`]: Batch recording and the monitoring loop
//! - [`config`]: Configuration file
//! - `sqlite`: SQLite store (feature `sqlite`)
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod export;
pub mod index;
pub mod measurement;
pub mod monitor;
pub mod sensors;
pub mod source;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod store;

// Re-export primary API types at crate root for convenience.
pub use config::Config;
pub use error::{Result, ThermoError};
pub use export::ExportSummary;
pub use index::TimestampIndex;
pub use measurement::{ALL_COMPONENTS, Component, Direction, Measurement, Selection, Target};
pub use monitor::{MonitorConfig, MonitorSummary};
pub use source::{DataSource, FileReplay, LiveSource};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
pub use store::Store;
