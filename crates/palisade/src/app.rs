//! Main application logic and lifecycle management.
//!
//! The [`Application`] wires the whole server together: configuration,
//! logging, the event bus, the server context, boot-time registrations, the
//! worker threads and the shutdown hook.

use crate::cli::CliArgs;
use crate::config::AppConfig;
use game_server::listeners::{CapacityGuard, ConnectionAnnouncer};
use game_server::registry;
use game_server::{
    setup_logging, DiscardSink, Lifecycle, NetQueues, ServerContext, World,
};
use palisade_event_system::create_event_bus;
use std::sync::Arc;
use tracing::info;

/// Fully wired server application.
pub struct Application {
    context: Arc<ServerContext>,
    lifecycle: Lifecycle,
}

impl Application {
    /// Loads configuration, initializes logging, and wires the server.
    ///
    /// Boot order matters: the entity registry is populated and listeners
    /// are registered before any worker thread starts, so the first event a
    /// worker posts already finds every handler in place.
    pub fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = AppConfig::load_from_file(&args.config_path)?;
        apply_overrides(&mut config, &args);
        config
            .validate()
            .map_err(|err| format!("configuration validation failed: {err}"))?;

        let server_config = config.to_server_config();
        let log_guard = setup_logging(&server_config.logging)?;
        display_banner();
        info!(
            "📂 config: {} | motd: \"{}\" | max players: {}",
            args.config_path.display(),
            server_config.motd,
            server_config.max_players
        );

        let events = create_event_bus();
        let context = Arc::new(ServerContext::from_config(Arc::clone(&events), &server_config));

        // Boot-time registrations, before any worker runs.
        registry::register_builtin(context.entities())?;
        context.register_world(Arc::new(World::new(server_config.spawn.world.clone())));
        events.register_listener(CapacityGuard::new(&context))?;
        events.register_listener(ConnectionAnnouncer::new(&context))?;
        info!(
            "📝 boot complete: {} entity kinds, {} handlers",
            context.entities().len(),
            events.handler_count()
        );

        let queues = NetQueues::bounded(server_config.frame_queue_capacity);
        let lifecycle = Lifecycle::new(
            Arc::clone(&context),
            queues,
            Arc::new(DiscardSink),
            Some(log_guard),
        );

        Ok(Self { context, lifecycle })
    }

    /// Starts the workers and blocks until a shutdown signal arrives, then
    /// runs the shutdown sequence.
    pub fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.lifecycle.start_all()?;
        info!(
            "✅ Palisade server is running (motd: \"{}\"), press Ctrl+C to stop",
            self.context.motd()
        );

        wait_for_shutdown_signal()?;
        info!("📡 received shutdown signal, stopping");

        self.lifecycle.shutdown();
        Ok(())
    }
}

/// Applies command-line overrides on top of the loaded configuration.
fn apply_overrides(config: &mut AppConfig, args: &CliArgs) {
    if let Some(motd) = &args.motd {
        config.server.motd = motd.clone();
    }
    if let Some(max_players) = args.max_players {
        config.server.max_players = max_players;
    }
    if let Some(log_level) = &args.log_level {
        config.logging.level = log_level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
}

/// Blocks the calling thread until SIGINT or SIGTERM is delivered.
fn wait_for_shutdown_signal() -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = crossbeam::channel::bounded(1);
    ctrlc::set_handler(move || {
        let _ = tx.try_send(());
    })?;
    rx.recv()?;
    Ok(())
}

/// Shows the startup banner through the logging pipeline.
fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("UNK");
    info!("╔══════════════════════════════════════════╗");
    info!("║            PALISADE SERVER               ║");
    info!("║                v{version}                    ║");
    info!("║                                          ║");
    info!("║  Typed event bus, cooperative shutdown   ║");
    info!("╚══════════════════════════════════════════╝");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args_with(motd: Option<&str>, max_players: Option<u32>) -> CliArgs {
        CliArgs {
            config_path: PathBuf::from("config.toml"),
            motd: motd.map(str::to_string),
            max_players,
            log_level: Some("debug".to_string()),
            json_logs: true,
        }
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let mut config = AppConfig::default();
        apply_overrides(&mut config, &args_with(Some("override"), Some(7)));

        assert_eq!(config.server.motd, "override");
        assert_eq!(config.server.max_players, 7);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_absent_overrides_keep_file_settings() {
        let mut config = AppConfig::default();
        config.server.motd = "from file".to_string();
        let args = CliArgs {
            config_path: PathBuf::from("config.toml"),
            motd: None,
            max_players: None,
            log_level: None,
            json_logs: false,
        };
        apply_overrides(&mut config, &args);

        assert_eq!(config.server.motd, "from file");
        assert_eq!(config.server.max_players, 20);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
    }
}

