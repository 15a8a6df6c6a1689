//! # Garage Booking
//!
//! Appointment slot and booking engine for a vehicle service garage.
//!
//! - **domain**: slots, bookings, calendar policy, repository traits
//! - **application**: slot, booking and calendar generation services
//! - **infrastructure**: SeaORM entities, migrations and repositories
//! - **interfaces**: REST API with Swagger documentation
//! - **server**: runtime bootstrap and graceful shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

pub use infrastructure::{init_database, DatabaseConfig, SeaOrmRepositoryProvider};

pub use interfaces::http::{create_api_router, ApiDoc, AppServices};
