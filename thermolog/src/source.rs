//! Data sources that produce measurements.
//!
//! [`DataSource`] abstracts where readings come from:
//!
//! - [`LiveSource`] fetches the sensor tree over HTTP on every call.
//! - [`FileReplay`] replays records that were previously stored, and is the
//!   only source that can delete them.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::config::{Config, SensorIdentifiers};
use crate::error::{AcquisitionError, Result};
use crate::measurement::{Component, Measurement, Selection, Target};
use crate::sensors::SensorNode;
use crate::store::Store;

/// A producer of temperature measurements.
pub trait DataSource {
    /// Short name used in error messages.
    fn name(&self) -> &'static str;

    /// Acquires one measurement for `component`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError`] if no reading can be produced.
    fn measurement(&mut self, component: Component) -> Result<Measurement>;

    /// Deletes the selected records of `target` and returns them.
    ///
    /// Sources that do not own stored records fail with
    /// [`AcquisitionError::UnsupportedOperation`].
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot delete records or the store
    /// rejects the delete.
    fn delete_measurements(
        &mut self,
        _target: &Target,
        _selection: Selection,
    ) -> Result<Vec<Measurement>> {
        Err(AcquisitionError::UnsupportedOperation {
            source_name: self.name(),
            operation: "deleting measurements",
        }
        .into())
    }
}

/// Returns the current Unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}

/// Reads live temperatures from an Open Hardware Monitor web server.
///
/// Every call performs one blocking HTTP GET. Requests are not retried.
#[derive(Debug)]
pub struct LiveSource {
    endpoint: String,
    identifiers: SensorIdentifiers,
    client: reqwest::blocking::Client,
}

impl LiveSource {
    /// Creates a live source for the endpoint and identifiers in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::ClientCreate`] if the HTTP client cannot
    /// be built.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| AcquisitionError::ClientCreate { source: e })?;

        Ok(Self {
            endpoint: config.endpoint.clone(),
            identifiers: config.sensors.clone(),
            client,
        })
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches the raw sensor JSON.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::Request`] if the request fails or the
    /// server answers with an error status, and
    /// [`AcquisitionError::EmptyResponse`] if the body is empty.
    pub fn fetch(&self) -> Result<String> {
        let request_error = |e| AcquisitionError::Request {
            endpoint: self.endpoint.clone(),
            source: e,
        };

        let body = self
            .client
            .get(&self.endpoint)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .map_err(request_error)?;

        if body.trim().is_empty() {
            return Err(AcquisitionError::EmptyResponse {
                endpoint: self.endpoint.clone(),
            }
            .into());
        }
        debug!("fetched {} bytes from {}", body.len(), self.endpoint);
        Ok(body)
    }

    /// Fetches and parses the sensor tree.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`LiveSource::fetch`], or
    /// [`AcquisitionError::Parse`] if the body is not a sensor tree.
    pub fn fetch_tree(&self) -> Result<SensorNode> {
        let body = self.fetch()?;
        Ok(SensorNode::from_json(&body)?)
    }
}

impl DataSource for LiveSource {
    fn name(&self) -> &'static str {
        "live source"
    }

    fn measurement(&mut self, component: Component) -> Result<Measurement> {
        let tree = self.fetch_tree()?;
        let temperature = tree.temperature(component, &self.identifiers)?;
        Ok(Measurement::new(component.as_str(), temperature, unix_now()))
    }
}

/// Replays stored measurements from a [`Store`] in file order.
///
/// Each call to [`DataSource::measurement`] returns the next stored record of
/// the component; once all have been returned the source reports
/// [`AcquisitionError::Exhausted`].
#[derive(Debug)]
pub struct FileReplay<'a> {
    store: &'a mut Store,
    positions: HashMap<Component, usize>,
}

impl<'a> FileReplay<'a> {
    /// Creates a replay source over `store`.
    pub fn new(store: &'a mut Store) -> Self {
        Self {
            store,
            positions: HashMap::new(),
        }
    }

    /// Restarts replay of every component from its first record.
    pub fn rewind(&mut self) {
        self.positions.clear();
    }
}

impl DataSource for FileReplay<'_> {
    fn name(&self) -> &'static str {
        "file replay"
    }

    fn measurement(&mut self, component: Component) -> Result<Measurement> {
        let exhausted = || AcquisitionError::Exhausted {
            component: component.to_string(),
        };

        let records = match self.store.read(&component.into(), Selection::all()) {
            Ok(records) => records,
            Err(e) if e.is_not_found() => return Err(exhausted().into()),
            Err(e) => return Err(e),
        };

        let position = self.positions.entry(component).or_insert(0);
        let record = records.into_iter().nth(*position).ok_or_else(exhausted)?;
        *position += 1;
        Ok(record)
    }

    fn delete_measurements(
        &mut self,
        target: &Target,
        selection: Selection,
    ) -> Result<Vec<Measurement>> {
        let removed = self.store.delete(target, selection)?;
        self.rewind();
        Ok(removed)
    }
}
