//! Service configuration.

use std::path::PathBuf;

/// Default database directory.
pub const DEFAULT_DATA_PATH: &str = "./data";

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Path to the database storage directory.
    pub data_path: PathBuf,

    /// Flush sled to disk after every committed mutation.
    pub flush_on_mutation: bool,
}

impl ServiceConfig {
    /// Create a configuration with the given data path.
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            flush_on_mutation: false,
        }
    }

    /// Flush to disk after every mutation.
    pub fn with_flush_on_mutation(mut self) -> Self {
        self.flush_on_mutation = true;
        self
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_PATH)
    }
}
