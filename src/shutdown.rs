//! Cooperative shutdown on process termination signals.
//!
//! SIGINT and SIGTERM set a flag; the scheduler observes it at its wait
//! boundary only, so an in-flight cycle always finishes its save.

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;

/// Handle observed by the scheduler.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Wait until a shutdown has been requested.
    pub async fn requested(&mut self) {
        while !*self.rx.borrow() {
            if self.rx.changed().await.is_err() {
                // Controller gone; treat as a shutdown request.
                break;
            }
        }
    }

    /// Has a shutdown been requested already?
    #[must_use]
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }
}

/// A flag/handle pair for driving a [`Shutdown`] by hand.
#[must_use]
pub fn channel() -> (watch::Sender<bool>, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (tx, Shutdown { rx })
}

/// Install SIGINT/SIGTERM handlers and return the [`Shutdown`] handle
/// they drive.
///
/// # Errors
///
/// Returns an error if the signal handlers cannot be registered.
pub fn install() -> std::io::Result<Shutdown> {
    let (tx, shutdown) = channel();
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("interrupt received, shutting down"),
            _ = terminate.recv() => info!("termination requested, shutting down"),
        }
        // Receivers keep the last value after the sender drops, so a
        // send failure here only means nobody is listening any more.
        let _ = tx.send(true);
    });

    Ok(shutdown)
}
