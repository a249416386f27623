//! The durable, bounded history of readings.
//!
//! The document is a plain JSON file shared with an external reporting
//! reader. There is no locking between the two processes; saves go to a
//! temporary file and are renamed into place, so the reader can never
//! observe a partially written document.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sampler::Reading;

/// Errors that can occur when loading or saving the history document.
#[derive(Error, Debug)]
pub enum Error {
    /// An IO error occurred.
    #[error("IO error file {0}: {1}")]
    Io(String, std::io::Error),

    /// The file exists but could not be parsed. History is never
    /// silently discarded; the caller decides what to do.
    #[error("JSON error file {0}: {1}")]
    Json(String, serde_json::Error),
}

/// Timestamps of the most recent successful persistence.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Updated {
    /// ISO-8601 local timestamp.
    pub timestamp: String,
    /// Seconds since the Unix epoch, same instant as `timestamp`.
    pub timestamp_epoch: i64,
}

/// The persisted aggregate of recent readings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HistoryDocument {
    /// Readings in insertion order, which is chronological order.
    pub data: Vec<Reading>,
    /// Always equals `data.len()`.
    pub count: usize,
    /// Seconds between samples when the document was created.
    pub interval: u64,
    /// When the document was last persisted.
    pub updated: Updated,
}

impl HistoryDocument {
    /// An empty document seeded with the configured interval.
    #[must_use]
    pub fn base(interval: u64, now: DateTime<Local>) -> Self {
        Self {
            data: Vec::new(),
            count: 0,
            interval,
            updated: Updated {
                timestamp: now.to_rfc3339(),
                timestamp_epoch: now.timestamp(),
            },
        }
    }

    /// Append a reading, evicting the oldest entries while the document
    /// holds more than `max_count`.
    ///
    /// `updated` takes the reading's own timestamps, so it always
    /// describes the same cycle as the data it sits beside.
    pub fn append(&mut self, reading: Reading, max_count: usize) {
        self.updated = Updated {
            timestamp: reading.timestamp.clone(),
            timestamp_epoch: reading.timestamp_epoch,
        };
        self.data.push(reading);
        while self.data.len() > max_count {
            self.data.remove(0);
        }
        self.count = self.data.len();
    }
}

/// Loads and saves the history document.
pub struct HistoryStore {
    path: PathBuf,
    interval: u64,
}

impl HistoryStore {
    /// Create a store for `path`, creating the parent directory if needed.
    ///
    /// `interval` seeds freshly constructed base documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory does not exist and
    /// cannot be created. This is the one fatal configuration error;
    /// everything else the store reports is recoverable per cycle.
    pub fn new(path: PathBuf, interval: u64) -> Result<Self, Error> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Io(parent.to_string_lossy().to_string(), e))?;
            }
        }
        Ok(Self { path, interval })
    }

    /// Load the document from disk.
    ///
    /// A missing file is not an error: the loop may never have run on
    /// this host, so a base document is returned instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<HistoryDocument, Error> {
        let file = match std::fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Ok(HistoryDocument::base(self.interval, Local::now()));
            }
            Err(e) => return Err(Error::Io(self.path.to_string_lossy().to_string(), e)),
        };
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .map_err(|e| Error::Json(self.path.to_string_lossy().to_string(), e))
    }

    /// Save the document, overwriting prior state.
    ///
    /// The document is written to a temporary file and renamed into
    /// place. A crash mid-save leaves either the old or the new complete
    /// document on disk, never a torn one.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be serialized or the file
    /// cannot be written or renamed. The prior on-disk state is intact
    /// in that case.
    pub fn save(&self, doc: &HistoryDocument) -> Result<(), Error> {
        let tmp_file = self.path.with_extension("tmp");

        let file = std::fs::File::create(&tmp_file)
            .map_err(|e| Error::Io(tmp_file.to_string_lossy().to_string(), e))?;

        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer(&mut writer, doc)
            .map_err(|e| Error::Json(tmp_file.to_string_lossy().to_string(), e))?;

        writer
            .flush()
            .map_err(|e| Error::Io(tmp_file.to_string_lossy().to_string(), e))?;

        std::fs::rename(&tmp_file, &self.path)
            .map_err(|e| Error::Io(self.path.to_string_lossy().to_string(), e))?;

        Ok(())
    }

    /// Rewrite the document to its empty base form and return it.
    ///
    /// Used for administrative reinitialization before the loop starts;
    /// the normal cycle never calls this.
    ///
    /// # Errors
    ///
    /// Returns an error if the base document cannot be persisted.
    pub fn reset(&self) -> Result<HistoryDocument, Error> {
        let doc = HistoryDocument::base(self.interval, Local::now());
        self.save(&doc)?;
        Ok(doc)
    }

    /// Path of the persisted document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
