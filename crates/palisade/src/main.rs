//! # Palisade Server - Main Entry Point
//!
//! Multiplayer game server built around a typed, priority-ordered event bus.
//! This entry point handles CLI parsing, configuration loading, and the
//! application lifecycle.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (creates config.toml if missing)
//! palisade
//!
//! # Specify custom configuration and overrides
//! palisade --config production.toml --max-players 200 --log-level debug
//!
//! # JSON logging for production
//! palisade --json-logs
//! ```
//!
//! ## Signal Handling
//!
//! The server shuts down gracefully on SIGINT (Ctrl+C) and SIGTERM: workers
//! are asked to stop cooperatively, joined with a bounded wait, and forcibly
//! abandoned if they do not comply.

mod app;
mod cli;
mod config;

use app::Application;
use cli::CliArgs;
use tracing::error;

fn main() {
    let args = CliArgs::parse();

    let application = match Application::new(args) {
        Ok(application) => application,
        Err(err) => {
            // Logging may not be up yet, report on stderr too.
            eprintln!("failed to start: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = application.run() {
        error!("server error: {err}");
        std::process::exit(1);
    }
}
