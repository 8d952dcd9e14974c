//! Error types for the server core.

use crate::registry::RegistryError;
use palisade_event_system::RegistrationError;

/// Main error type for server construction, boot, and shutdown.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration is invalid or could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// The logging subsystem could not be initialized.
    #[error("logging setup failed: {0}")]
    Logging(String),

    /// Entity registry population failed.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A listener declared an invalid subscription.
    #[error("event registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// IO error, typically from spawning a worker thread.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
