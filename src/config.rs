//! Process configuration from environment variables.

use std::path::PathBuf;

use envconfig::Envconfig;

/// Environment-variable configuration, with defaults suitable for a
/// single-device deployment.
#[derive(Envconfig)]
pub struct Environment {
    /// Path of the persisted history document.
    #[envconfig(from = "HISTORY_FILE", default = "history.json")]
    pub history_file: PathBuf,

    /// Maximum number of samples retained in the document.
    #[envconfig(from = "API_HISTORY_MAX", default = "1440")]
    pub max_count: usize,

    /// Seconds between samples.
    #[envconfig(from = "API_HISTORY_DURATION", default = "60")]
    pub interval: u64,
}

impl Environment {
    /// Load the configuration from the environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is present but cannot be parsed.
    pub fn load() -> Result<Self, envconfig::Error> {
        Self::init_from_env()
    }
}
