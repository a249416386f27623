//! The sampling loop.
//!
//! Cycles use a fixed delay, not a fixed rate: the wait starts after the
//! cycle's work, so the true period is the interval plus however long the
//! work took. Simplicity is preferred over timing precision here.

use std::time::Duration;

use chrono::Local;
use thiserror::Error;
use tracing::{error, info};

use crate::history::HistoryStore;
use crate::sampler;
use crate::sensor::SensorPort;
use crate::shutdown::Shutdown;

/// Settings for one run of the sampling loop.
pub struct Config {
    /// Maximum number of retained samples.
    pub max_count: usize,
    /// Delay between the end of one cycle and the start of the next.
    pub interval: Duration,
}

/// Reasons a single cycle is skipped. None of these stop the loop; the
/// on-disk document is untouched when a cycle fails.
#[derive(Error, Debug)]
pub enum CycleError {
    /// Loading or saving the document failed.
    #[error("history error: {0}")]
    History(#[from] crate::history::Error),

    /// The sensor could not produce a reading.
    #[error("sensor error: {0}")]
    Sensor(#[from] crate::sensor::SensorError),

    /// The sensor produced out-of-domain values.
    #[error("sample error: {0}")]
    Sample(#[from] sampler::Error),
}

/// Drives load → sample → append → save cycles until shutdown.
pub struct Scheduler<S> {
    store: HistoryStore,
    sensor: S,
    config: Config,
    shutdown: Shutdown,
}

impl<S: SensorPort> Scheduler<S> {
    /// A scheduler ready to run.
    pub const fn new(store: HistoryStore, sensor: S, config: Config, shutdown: Shutdown) -> Self {
        Self {
            store,
            sensor,
            config,
            shutdown,
        }
    }

    /// Run cycles forever, until a shutdown is requested.
    ///
    /// Cancellation is cooperative and checked once per cycle, at the
    /// wait boundary; an in-flight cycle always completes.
    pub async fn run(mut self) {
        info!(
            "sampling every {:?}, keeping up to {} samples in {}",
            self.config.interval,
            self.config.max_count,
            self.store.path().display()
        );

        loop {
            if let Err(err) = self.cycle() {
                error!("cycle skipped: {err}");
            }

            let interval = self.config.interval;
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = self.shutdown.requested() => {
                    info!("shutdown acknowledged, leaving sampling loop");
                    break;
                }
            }
        }
    }

    /// One cycle: load the document fresh from disk, take a sample,
    /// append it and persist.
    ///
    /// The document is deliberately re-read every cycle rather than kept
    /// in memory, so out-of-band edits by an operator survive. The
    /// atomic save is the only guard against a concurrent writer.
    fn cycle(&mut self) -> Result<(), CycleError> {
        let mut doc = self.store.load()?;
        let raw = self.sensor.read_raw()?;
        info!(
            "read temperature {:.2} °C, relative humidity {:.2} %RH",
            raw.temperature_celsius, raw.relative_humidity
        );

        let reading = sampler::sample(raw.temperature_celsius, raw.relative_humidity, Local::now())?;
        doc.append(reading, self.config.max_count);
        self.store.save(&doc)?;
        info!("saved {} samples", doc.count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::sensor::{RawSample, SensorError};
    use crate::shutdown;
    use std::path::PathBuf;

    struct FixedSensor;

    impl SensorPort for FixedSensor {
        fn read_raw(&mut self) -> Result<RawSample, SensorError> {
            Ok(RawSample {
                temperature_celsius: 21.5,
                relative_humidity: 55.0,
            })
        }
    }

    struct BrokenSensor;

    impl SensorPort for BrokenSensor {
        fn read_raw(&mut self) -> Result<RawSample, SensorError> {
            Err(SensorError::ReadFailure("bus timeout".to_string()))
        }
    }

    fn test_store(path: PathBuf) -> HistoryStore {
        HistoryStore::new(path, 1).unwrap()
    }

    #[tokio::test]
    async fn loop_appends_within_bounds_and_stops_on_shutdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let (tx, shutdown) = shutdown::channel();
        let scheduler = Scheduler::new(
            test_store(path.clone()),
            FixedSensor,
            Config {
                max_count: 3,
                interval: Duration::from_millis(5),
            },
            shutdown,
        );

        let handle = tokio::spawn(scheduler.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        let doc = test_store(path).load().unwrap();
        assert!(doc.count >= 1);
        assert!(doc.count <= 3);
        assert_eq!(doc.count, doc.data.len());
    }

    #[tokio::test]
    async fn sensor_failure_skips_the_cycle_without_stopping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let (tx, shutdown) = shutdown::channel();
        let scheduler = Scheduler::new(
            test_store(path.clone()),
            BrokenSensor,
            Config {
                max_count: 3,
                interval: Duration::from_millis(5),
            },
            shutdown,
        );

        let handle = tokio::spawn(scheduler.run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        // The loop must still be alive to acknowledge the shutdown.
        handle.await.unwrap();

        // No fabricated sample was ever written.
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn corrupt_document_fails_the_cycle_but_keeps_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (tx, shutdown) = shutdown::channel();
        let scheduler = Scheduler::new(
            test_store(path.clone()),
            FixedSensor,
            Config {
                max_count: 3,
                interval: Duration::from_millis(5),
            },
            shutdown,
        );

        let handle = tokio::spawn(scheduler.run());
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();

        // The unparsable history is left for the operator, not replaced.
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
