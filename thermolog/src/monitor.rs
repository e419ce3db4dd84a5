//! Periodic measurement recording.
//!
//! The monitor runs on the calling thread: each iteration acquires one
//! measurement per component, appends it to the store, and then sleeps for
//! the interval. A bounded run ends once the accumulated interval reaches the
//! duration; a continuous run ends when the stop trigger fires. The trigger is
//! polled once per iteration, after the sleep.

use std::time::Duration;

use tracing::{info, warn};

use crate::error::{MonitorError, Result};
use crate::measurement::{Component, Measurement};
use crate::source::DataSource;
use crate::store::Store;

/// Timing of a monitoring run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Total run time, or `None` to run until stopped.
    pub duration: Option<Duration>,
    /// Time between iterations.
    pub interval: Duration,
}

impl MonitorConfig {
    /// Creates a bounded run of `duration` with one iteration per `interval`.
    pub fn bounded(duration: Duration, interval: Duration) -> Self {
        Self {
            duration: Some(duration),
            interval,
        }
    }

    /// Creates a run that continues until the stop trigger fires.
    pub fn continuous(interval: Duration) -> Self {
        Self {
            duration: None,
            interval,
        }
    }
}

/// Counters reported at the end of a monitoring run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Number of iterations performed.
    pub iterations: u64,
    /// Number of measurements stored.
    pub recorded: u64,
    /// Number of component acquisitions or appends that failed.
    pub failed: u64,
}

/// Outcome of recording one component.
pub type RecordOutcome = (Component, Result<Measurement>);

/// Acquires and stores one measurement for `component`.
///
/// # Errors
///
/// Returns the acquisition or store error.
pub fn record(
    source: &mut dyn DataSource,
    store: &mut Store,
    component: Component,
) -> Result<Measurement> {
    let measurement = source.measurement(component)?;
    store.append(&measurement)?;
    Ok(measurement)
}

/// Records every component in `components`.
///
/// A failing component is logged and reported in its outcome; it does not
/// prevent the others from being recorded.
pub fn record_all(
    source: &mut dyn DataSource,
    store: &mut Store,
    components: &[Component],
) -> Vec<RecordOutcome> {
    components
        .iter()
        .map(|&component| {
            let outcome = record(source, store, component);
            if let Err(e) = &outcome {
                warn!("skipping {component}: {e}");
            }
            (component, outcome)
        })
        .collect()
}

/// Runs the monitoring loop over `components`.
///
/// `on_record` is called with every outcome as it happens, and `should_stop`
/// is polled after each sleep of a continuous run.
///
/// # Errors
///
/// Returns [`MonitorError::ZeroInterval`] before recording anything if the
/// interval is zero. Acquisition and store failures do not end the run.
pub fn run<S, F>(
    source: &mut dyn DataSource,
    store: &mut Store,
    components: &[Component],
    config: MonitorConfig,
    mut should_stop: S,
    mut on_record: F,
) -> Result<MonitorSummary>
where
    S: FnMut() -> bool,
    F: FnMut(&RecordOutcome),
{
    if config.interval.is_zero() {
        return Err(MonitorError::ZeroInterval.into());
    }

    let mut summary = MonitorSummary::default();
    let mut elapsed = Duration::ZERO;

    info!(
        "monitoring {} component(s) every {:?}",
        components.len(),
        config.interval
    );

    loop {
        for outcome in record_all(source, store, components) {
            match &outcome.1 {
                Ok(_) => summary.recorded += 1,
                Err(_) => summary.failed += 1,
            }
            on_record(&outcome);
        }
        summary.iterations += 1;

        if let Some(duration) = config.duration {
            elapsed += config.interval;
            if elapsed >= duration {
                break;
            }
        }

        std::thread::sleep(config.interval);

        if config.duration.is_none() && should_stop() {
            break;
        }
    }

    info!(
        "monitoring finished: {} iteration(s), {} recorded, {} failed",
        summary.iterations, summary.recorded, summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AcquisitionError;
    use tempfile::tempdir;

    /// Source producing a rising temperature, failing for the GPU.
    struct FakeSource {
        next_timestamp: i64,
    }

    impl DataSource for FakeSource {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn measurement(&mut self, component: Component) -> Result<Measurement> {
            if component == Component::Gpu {
                return Err(AcquisitionError::ComponentNotFound {
                    component: component.to_string(),
                }
                .into());
            }
            self.next_timestamp += 1;
            Ok(Measurement::new(
                component.as_str(),
                40.0,
                self.next_timestamp,
            ))
        }
    }

    #[test]
    fn test_record_all_isolates_failures() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());
        let mut source = FakeSource { next_timestamp: 0 };

        let outcomes = record_all(&mut source, &mut store, &Component::ALL);

        assert_eq!(outcomes.len(), 3);
        assert!(outcomes[0].1.is_err());
        assert!(outcomes[1].1.is_ok());
        assert!(outcomes[2].1.is_ok());
        assert_eq!(store.index().timestamps("CPU"), &[1]);
        assert_eq!(store.index().timestamps("Motherboard"), &[2]);
    }

    #[test]
    fn test_bounded_run_iteration_count() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());
        let mut source = FakeSource { next_timestamp: 0 };

        let config = MonitorConfig::bounded(Duration::from_millis(3), Duration::from_millis(1));
        let summary = run(
            &mut source,
            &mut store,
            &[Component::Cpu],
            config,
            || panic!("bounded runs do not poll the stop trigger"),
            |_| {},
        )
        .unwrap();

        assert_eq!(summary.iterations, 3);
        assert_eq!(summary.recorded, 3);
        assert_eq!(store.index().len("CPU"), 3);
    }

    #[test]
    fn test_continuous_run_stops_on_trigger() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());
        let mut source = FakeSource { next_timestamp: 0 };

        let mut polls = 0;
        let mut seen = Vec::new();
        let summary = run(
            &mut source,
            &mut store,
            &[Component::Cpu, Component::Gpu],
            MonitorConfig::continuous(Duration::from_millis(1)),
            || {
                polls += 1;
                polls == 2
            },
            |(component, outcome)| seen.push((*component, outcome.is_ok())),
        )
        .unwrap();

        assert_eq!(summary.iterations, 2);
        assert_eq!(summary.recorded, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(
            seen,
            vec![
                (Component::Cpu, true),
                (Component::Gpu, false),
                (Component::Cpu, true),
                (Component::Gpu, false),
            ]
        );
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let temp_dir = tempdir().unwrap();
        let mut store = Store::open(temp_dir.path());
        let mut source = FakeSource { next_timestamp: 0 };

        for config in [
            MonitorConfig::bounded(Duration::from_secs(1), Duration::ZERO),
            MonitorConfig::continuous(Duration::ZERO),
        ] {
            let err = run(
                &mut source,
                &mut store,
                &[Component::Cpu],
                config,
                || true,
                |_| {},
            )
            .unwrap_err();
            assert!(matches!(
                err,
                crate::ThermoError::Monitor(MonitorError::ZeroInterval)
            ));
        }
        assert_eq!(store.index().len("CPU"), 0);
    }
}
