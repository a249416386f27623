//! Main entry point for the sampling daemon.

#![warn(missing_docs)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod history;
mod sampler;
mod scheduler;
mod sensor;
mod shutdown;

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::history::HistoryStore;
use crate::scheduler::Scheduler;
use crate::sensor::SimulatedSensor;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    color_backtrace::install();

    let env = config::Environment::load().context("Error loading environment")?;

    let store = HistoryStore::new(env.history_file.clone(), env.interval)
        .context("Error opening history store")?;

    // Administrative reinitialization: `hygrolog reset` rewrites the
    // document to its base form, then sampling continues as normal.
    if std::env::args().nth(1).as_deref() == Some("reset") {
        info!("reset requested, writing base document");
        store.reset().context("Error resetting history")?;
    }

    let shutdown = shutdown::install().context("Error installing signal handlers")?;

    let scheduler = Scheduler::new(
        store,
        SimulatedSensor::new(),
        scheduler::Config {
            max_count: env.max_count,
            interval: Duration::from_secs(env.interval),
        },
        shutdown,
    );
    scheduler.run().await;

    info!("exiting");
    Ok(())
}
