//! Service error types.

use thiserror::Error;

/// Service errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Core catalog or lifecycle error.
    #[error(transparent)]
    Core(#[from] topodb_core::Error),

    /// The authorization gateway denied the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The permission registry could not be synced after a committed
    /// mutation. The mutation itself stands.
    #[error("permission registry sync failed: {0}")]
    RegistrySync(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
