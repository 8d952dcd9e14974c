//! Command-line interface for the Palisade server.
//!
//! Argument parsing with `clap`; every option overrides the corresponding
//! setting from the configuration file.

use clap::{Arg, Command};
use std::path::PathBuf;

/// Parsed command-line options.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file.
    pub config_path: PathBuf,
    /// Optional override for the message of the day.
    pub motd: Option<String>,
    /// Optional override for the player cap.
    pub max_players: Option<u32>,
    /// Optional override for the log level.
    pub log_level: Option<String>,
    /// Whether to force JSON log output.
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses the process arguments.
    pub fn parse() -> Self {
        let matches = Command::new("Palisade Server")
            .version(env!("CARGO_PKG_VERSION"))
            .about("Multiplayer game server built around a typed event bus")
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .default_value("config.toml"),
            )
            .arg(
                Arg::new("motd")
                    .long("motd")
                    .value_name("TEXT")
                    .help("Message of the day"),
            )
            .arg(
                Arg::new("max-players")
                    .long("max-players")
                    .value_name("COUNT")
                    .value_parser(clap::value_parser!(u32))
                    .help("Maximum number of online players"),
            )
            .arg(
                Arg::new("log-level")
                    .short('l')
                    .long("log-level")
                    .value_name("LEVEL")
                    .help("Log level (trace, debug, info, warn, error)"),
            )
            .arg(
                Arg::new("json-logs")
                    .long("json-logs")
                    .help("Output logs in JSON format")
                    .action(clap::ArgAction::SetTrue),
            )
            .get_matches();

        Self {
            config_path: PathBuf::from(
                matches
                    .get_one::<String>("config")
                    .expect("default config path should always be set"),
            ),
            motd: matches.get_one::<String>("motd").cloned(),
            max_players: matches.get_one::<u32>("max-players").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }
}
