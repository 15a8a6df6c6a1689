pub mod entities;
pub mod migrator;
pub mod repositories;

use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::{DatabaseSection, PoolConfig};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database URL (e.g., "sqlite://./garage-booking.db?mode=rwc")
    pub url: String,
    pub pool: PoolConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::from(&DatabaseSection::default())
    }
}

impl From<&DatabaseSection> for DatabaseConfig {
    fn from(section: &DatabaseSection) -> Self {
        Self {
            url: section.connection_url(),
            pool: section.pool.clone(),
        }
    }
}

impl DatabaseConfig {
    /// Create config for SQLite
    pub fn sqlite(path: &str) -> Self {
        Self {
            url: format!("sqlite://{}?mode=rwc", path),
            pool: PoolConfig::default(),
        }
    }
}

/// Initialize database connection pool
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, sea_orm::DbErr> {
    info!("Connecting to database: {}", config.url);

    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.pool.max_connections)
        .min_connections(config.pool.min_connections)
        .connect_timeout(Duration::from_secs(config.pool.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.pool.acquire_timeout_secs))
        .sqlx_logging(false);

    let db = Database::connect(options).await?;
    info!("Database connected successfully");
    Ok(db)
}

/// Fresh migrated in-memory database on a single connection.
#[cfg(test)]
pub(crate) async fn memory_db() -> DatabaseConnection {
    use sea_orm_migration::MigratorTrait;

    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    migrator::Migrator::up(&db, None).await.unwrap();
    db
}

/// Migrated SQLite file in the temp dir, removed on drop.
#[cfg(test)]
pub(crate) struct TempDatabase {
    pub db: DatabaseConnection,
    path: std::path::PathBuf,
}

#[cfg(test)]
impl TempDatabase {
    /// Pooled like production: several connections contend for the write lock.
    pub(crate) async fn pooled(max_connections: u32) -> Self {
        use sea_orm_migration::MigratorTrait;

        let path = std::env::temp_dir()
            .join(format!("garage-booking-{}.db", uuid::Uuid::new_v4()));
        let mut config = DatabaseConfig::sqlite(&path.to_string_lossy());
        config.pool.max_connections = max_connections;
        config.pool.min_connections = 1;

        let db = init_database(&config).await.unwrap();
        migrator::Migrator::up(&db, None).await.unwrap();
        Self { db, path }
    }
}

#[cfg(test)]
impl Drop for TempDatabase {
    fn drop(&mut self) {
        for suffix in ["", "-journal", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
