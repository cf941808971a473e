//! Subscription service CLI server
//!
//! Headless REST service for tracking user subscriptions and their
//! aggregated cost.
//!
//! ```sh
//! # Run with default config (~/.config/subtrack/config.toml)
//! subscription-service
//!
//! # Custom config path
//! subscription-service --config /etc/subtrack/config.toml
//!
//! # Override the port
//! subscription-service --port 9090
//!
//! # Validate config without starting
//! subscription-service --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};

use subtrack::config::{default_config_path, AppConfig, CONFIG_ENV};
use subtrack::infrastructure::database::redact_url;
use subtrack::server::{init_tracing, ServerHandle, ServerOptions};

/// Subscription tracker with per-period cost aggregation.
#[derive(Parser, Debug)]
#[command(
    name = "subscription-service",
    version,
    about = "REST service for user subscriptions and their aggregated cost",
    long_about = "Subscription tracker: CRUD over user subscriptions plus total \
                  cost over a month-granular period.\n\n\
                  Default config: ~/.config/subtrack/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            if cli.check {
                return Err(e.into());
            }
            error!("Using default configuration.");
        }
    }

    config.validate()?;

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("Configuration is valid");
        println!("   Config file     : {}", config_path.display());
        println!("   API address     : {}", config.server.address());
        println!("   Request timeout : {}s", config.server.request_timeout_secs);
        println!("   Database        : {}", redact_url(&config.database.url));
        println!("   Log level       : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let mut options = ServerOptions::new(config);
    if cli.no_migrate {
        options.auto_migrate = false;
    }
    let handle = ServerHandle::start(options).await?;

    handle.install_signal_handler();
    info!("Press Ctrl+C to shutdown gracefully.");

    handle.wait().await;

    Ok(())
}
