//! Configuration management for the Palisade server.
//!
//! Loads the TOML application config, validates it, and converts it into the
//! [`ServerConfig`] the server core consumes.

use game_server::{Location, LoggingConfig, ServerConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

fn default_motd() -> String {
    "A Palisade server".to_string()
}

fn default_max_players() -> u32 {
    20
}

fn default_frame_queue_capacity() -> usize {
    1024
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server settings.
    pub server: ServerSettings,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-level settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Message of the day shown to connecting clients.
    #[serde(default = "default_motd")]
    pub motd: String,
    /// Maximum number of concurrently online players.
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    /// Spawn location new players start at.
    pub spawn: SpawnSettings,
    /// Capacity of each network frame queue.
    #[serde(default = "default_frame_queue_capacity")]
    pub frame_queue_capacity: usize,
}

/// Spawn location settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnSettings {
    /// Name of the spawn world.
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json_format: bool,
    /// Optional file path for log output (None means stdout only).
    #[serde(default)]
    pub file_path: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
            file_path: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                motd: default_motd(),
                max_players: default_max_players(),
                spawn: SpawnSettings {
                    world: "overworld".to_string(),
                    x: 0.5,
                    y: 64.0,
                    z: 0.5,
                },
                frame_queue_capacity: default_frame_queue_capacity(),
            },
            logging: LoggingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file does not exist, writes a default configuration there and
    /// returns the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            std::fs::write(path, toml_content)?;
            info!("created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Validates the configuration for consistency.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.motd.trim().is_empty() {
            return Err("motd cannot be empty".to_string());
        }
        if self.server.max_players == 0 {
            return Err("max_players must be greater than 0".to_string());
        }
        if self.server.spawn.world.trim().is_empty() {
            return Err("spawn world name cannot be empty".to_string());
        }
        if self.server.frame_queue_capacity == 0 {
            return Err("frame_queue_capacity must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }

    /// Converts the application configuration into the server core's
    /// configuration type.
    pub fn to_server_config(&self) -> ServerConfig {
        ServerConfig {
            motd: self.server.motd.clone(),
            max_players: self.server.max_players,
            spawn: Location::new(
                self.server.spawn.world.clone(),
                self.server.spawn.x,
                self.server.spawn.y,
                self.server.spawn.z,
            ),
            frame_queue_capacity: self.server.frame_queue_capacity,
            logging: LoggingConfig {
                level: self.logging.level.clone(),
                json_format: self.logging.json_format,
                file_path: self.logging.file_path.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.server.motd, "A Palisade server");
        assert_eq!(config.server.max_players, 20);
        assert_eq!(config.server.spawn.world, "overworld");
        assert_eq!(config.server.frame_queue_capacity, 1024);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
        assert!(config.logging.file_path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_missing_file_creates_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.server.max_players, 20);
        assert!(path.exists());

        // The written file parses back to the same settings.
        let reloaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(reloaded.server.motd, config.server.motd);
    }

    #[test]
    fn test_load_from_existing_file() {
        let toml_content = r#"
[server]
motd = "welcome to the arena"
max_players = 200

[server.spawn]
world = "lobby"
x = 16.0
y = 80.0
z = -16.0

[logging]
level = "debug"
json_format = true
file_path = "/tmp/palisade.log"
"#;
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), toml_content).unwrap();

        let config = AppConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.server.motd, "welcome to the arena");
        assert_eq!(config.server.max_players, 200);
        // Missing field falls back to its serde default.
        assert_eq!(config.server.frame_queue_capacity, 1024);
        assert_eq!(config.server.spawn.world, "lobby");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
        assert_eq!(
            config.logging.file_path,
            Some("/tmp/palisade.log".to_string())
        );
    }

    #[test]
    fn test_validation_rejects_bad_settings() {
        let mut config = AppConfig::default();
        config.server.max_players = 0;
        assert!(config.validate().unwrap_err().contains("max_players"));

        let mut config = AppConfig::default();
        config.server.motd = "  ".to_string();
        assert!(config.validate().unwrap_err().contains("motd"));

        let mut config = AppConfig::default();
        config.server.spawn.world = "".to_string();
        assert!(config.validate().unwrap_err().contains("spawn world"));

        let mut config = AppConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().unwrap_err().contains("log level"));
    }

    #[test]
    fn test_to_server_config_conversion() {
        let mut config = AppConfig::default();
        config.server.motd = "converted".to_string();
        config.server.max_players = 64;
        config.server.spawn.world = "nether".to_string();

        let server_config = config.to_server_config();
        assert_eq!(server_config.motd, "converted");
        assert_eq!(server_config.max_players, 64);
        assert_eq!(server_config.spawn.world, "nether");
        assert_eq!(server_config.logging.level, "info");
    }
}
