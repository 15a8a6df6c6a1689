//! Infrastructure layer: persistence adapters

pub mod database;

pub use database::repositories::SeaOrmRepositoryProvider;
pub use database::{init_database, DatabaseConfig};
