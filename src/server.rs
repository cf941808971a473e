//! Reusable subscription service runtime.
//!
//! [`ServerHandle`] owns the whole lifecycle: storage selection, migrations,
//! the REST API listener and graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::redact_url;
use crate::infrastructure::{
    init_database, run_migrations, InMemoryRepositoryProvider, SeaOrmRepositoryProvider,
};
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::errors::InfraError;
use crate::shared::shutdown::{listen_for_shutdown_signals, ShutdownSignal};

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the subscription service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup. Ignored for in-memory storage.
    pub auto_migrate: bool,
}

impl ServerOptions {
    pub fn new(config: AppConfig) -> Self {
        let auto_migrate = config.database.auto_migrate;
        Self {
            config,
            auto_migrate,
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running subscription service.
///
/// ```rust,no_run
/// use subtrack::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Repository provider backing the API.
    pub repos: Arc<dyn RepositoryProvider>,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Address the REST API is bound to.
    pub local_addr: SocketAddr,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownSignal,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the service with the given options.
    ///
    /// Selects storage from `database.url`, applies migrations when enabled,
    /// wires the application services and starts serving the REST API.
    pub async fn start(opts: ServerOptions) -> Result<Self, InfraError> {
        let app_cfg = opts.config;

        info!("Starting subscription service...");

        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            if app_cfg.database.is_in_memory() {
                warn!("Using in-memory storage, data is lost on shutdown");
                (Arc::new(InMemoryRepositoryProvider::new()), None)
            } else {
                let db = init_database(&app_cfg.database).await?;
                if opts.auto_migrate {
                    info!("Running database migrations...");
                    run_migrations(&db).await?;
                } else {
                    info!(
                        url = %redact_url(&app_cfg.database.url),
                        "Skipping database migrations"
                    );
                }
                (
                    Arc::new(SeaOrmRepositoryProvider::new(db.clone())),
                    Some(db),
                )
            };

        let state = ApiState::new(repos.clone(), app_cfg.server.request_timeout());
        let api_router = create_api_router(state);

        let listener = tokio::net::TcpListener::bind(app_cfg.server.address()).await?;
        let local_addr = listener.local_addr()?;
        info!("REST API server listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let shutdown = ShutdownSignal::new();
        let api_shutdown = shutdown.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            repos,
            config: app_cfg,
            local_addr,
            db,
            shutdown,
            api_task,
        })
    }

    /// Port the REST API is listening on.
    pub fn api_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.clone()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        tokio::spawn(listen_for_shutdown_signals(self.shutdown.clone()));
    }

    /// Trigger graceful shutdown without waiting for it to finish.
    pub fn trigger_shutdown(&self) {
        self.shutdown.trigger();
    }

    /// Wait for the server to stop, then close the database pool.
    ///
    /// In-flight requests get `server.shutdown_timeout_secs` to drain once
    /// shutdown has been triggered.
    pub async fn wait(self) {
        let mut api_task = self.api_task;
        let exited_early = tokio::select! {
            _ = self.shutdown.wait() => None,
            result = &mut api_task => Some(result),
        };

        info!("Waiting for server tasks to complete...");
        let grace = self.config.server.shutdown_timeout();
        let outcome = match exited_early {
            Some(result) => Ok(result),
            None => tokio::time::timeout(grace, &mut api_task).await,
        };
        match outcome {
            Ok(Ok(())) => info!("REST API server stopped"),
            Ok(Err(e)) => error!("REST API server task panicked: {}", e),
            Err(_) => {
                warn!(
                    timeout_secs = grace.as_secs(),
                    "REST API server did not drain in time, aborting"
                );
                api_task.abort();
            }
        }

        if let Some(db) = self.db {
            match db.close().await {
                Ok(()) => info!("Database connection closed"),
                Err(e) => warn!("Error closing database connection: {}", e),
            }
        }

        info!("Subscription service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down subscription service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the application config. `RUST_LOG` takes
/// precedence over `logging.level`.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = if config.logging.is_json() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}
