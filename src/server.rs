//! Server runtime
//!
//! [`ServerHandle`] owns the full lifecycle: metrics recorder, database and
//! migrations, service wiring, the REST API, and graceful shutdown.
//! [`open_database`] is the same bootstrap without the HTTP listener, for
//! one-shot admin commands.

use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::infrastructure::database::migrator::Migrator;
use crate::interfaces::http::modules::metrics::prometheus_handle;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::{create_api_router, init_database, AppServices, DatabaseConfig};

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

/// Connect to the configured database, migrating it first when asked.
pub async fn open_database(
    config: &AppConfig,
    auto_migrate: bool,
) -> Result<DatabaseConnection, Box<dyn std::error::Error>> {
    let db = init_database(&DatabaseConfig::from(&config.database)).await?;
    if auto_migrate {
        info!("Running database migrations...");
        Migrator::up(&db, None).await?;
        info!("Migrations completed");
    }
    Ok(db)
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running booking server.
///
/// ```rust,no_run
/// use garage_booking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.shutdown_signal().wait().await;
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// Services shared with the HTTP layer.
    pub services: AppServices,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// Port actually bound (differs from the configured one when that was 0).
    pub port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let config = opts.config;
        info!("Starting garage booking service...");

        let metrics = prometheus_handle()?;
        info!("📊 Prometheus metrics recorder ready");

        let db = open_database(&config, opts.auto_migrate).await?;

        // Fails on an inconsistent calendar before anything listens
        let services = AppServices::new(
            db.clone(),
            config.calendar.clone(),
            config.booking.transaction_timeout(),
            metrics,
        )?;

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let api_shutdown = shutdown.signal();

        let router = create_api_router(services.clone());
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();
        info!("🚀 REST API listening on http://{}:{}", config.server.host, port);
        info!("Swagger UI available at http://{}:{}/docs/", config.server.host, port);

        let api_server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("🛑 REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            services,
            config,
            port,
            db,
            shutdown,
            api_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown without waiting for it.
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for in-flight requests to drain (bounded by
    /// `server.shutdown_timeout`), then close the database.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            ..
        } = self;

        info!("⏳ Waiting for in-flight requests to complete...");
        let abort = api_task.abort_handle();
        let drained = shutdown
            .drain(async move {
                match api_task.await {
                    Ok(()) => info!("REST API server stopped"),
                    Err(e) => error!("REST API server task panicked: {}", e),
                }
            })
            .await;
        if !drained {
            abort.abort();
        }

        if let Err(e) = db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("✅ Database connection closed");
        }
        info!("👋 Garage booking service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("🛑 Shutting down garage booking service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the application config.
///
/// `RUST_LOG` wins over `logging.level`. Records emitted through the `log`
/// facade are forwarded to the same subscriber.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let result = match config.logging.format.to_lowercase().as_str() {
        "json" => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init(),
    };
    if let Err(e) = result {
        eprintln!("tracing already initialized: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn memory_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 0;
        config.server.shutdown_timeout = 5;
        config.database.url = Some("sqlite::memory:".to_string());
        config.database.pool.max_connections = 1;
        config.database.pool.min_connections = 1;
        config
    }

    #[tokio::test]
    async fn starts_on_an_ephemeral_port_and_shuts_down() {
        let handle = ServerHandle::start(ServerOptions {
            config: memory_config(),
            auto_migrate: true,
        })
        .await
        .unwrap();

        assert_ne!(handle.port, 0);
        assert!(handle.is_running());
        assert!(handle.services.slots.list(false).await.unwrap().is_empty());

        tokio::time::timeout(Duration::from_secs(10), handle.shutdown())
            .await
            .expect("shutdown completes");
    }

    #[tokio::test]
    async fn inconsistent_calendar_refuses_to_start() {
        let mut config = memory_config();
        config.calendar.slot_capacity = 0;
        let result = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: true,
        })
        .await;
        assert!(result.is_err());
    }
}
