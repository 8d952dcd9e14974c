//! Server core configuration.
//!
//! These are the settings the core consumes directly. The binary crate owns
//! the TOML application config and converts it into a [`ServerConfig`] after
//! validation.

use crate::types::Location;
use serde::{Deserialize, Serialize};

/// Configuration for one server instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Message of the day shown to connecting clients.
    pub motd: String,
    /// Maximum number of concurrently online players.
    pub max_players: u32,
    /// Initial spawn location.
    pub spawn: Location,
    /// Capacity of each network frame queue.
    pub frame_queue_capacity: usize,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            motd: "A Palisade server".to_string(),
            max_players: 20,
            spawn: Location::new("overworld", 0.5, 64.0, 0.5),
            frame_queue_capacity: 1024,
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging settings consumed by [`setup_logging`](crate::logging::setup_logging).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    pub level: String,
    /// Whether to emit JSON instead of human-readable lines.
    pub json_format: bool,
    /// Optional log file path; `None` means stdout only.
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}
