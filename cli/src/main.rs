//! Garage booking service: CLI server and admin tasks
//!
//! ```sh
//! # Run with default config (~/.config/garage-booking/config.toml)
//! garage-booking
//!
//! # Custom config path and port
//! garage-booking --config /etc/garage-booking/config.toml --port 9090
//!
//! # Validate config without starting
//! garage-booking --check
//!
//! # One-shot calendar maintenance
//! garage-booking generate-month --year 2025 --month 9
//! garage-booking generate-season summer-2025
//! garage-booking clean-future
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use garage_booking::application::SlotGenerationService;
use garage_booking::config::AppConfig;
use garage_booking::domain::RepositoryProvider;
use garage_booking::server::{init_tracing, open_database, ServerHandle, ServerOptions};
use garage_booking::SeaOrmRepositoryProvider;

#[derive(Parser, Debug)]
#[command(
    name = "garage-booking",
    version,
    about = "Appointment slots and bookings for a vehicle service garage",
    long_about = "REST API server for garage appointment slots and bookings, \
                  plus one-shot calendar maintenance commands.\n\n\
                  Default config: ~/.config/garage-booking/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "GARAGE_BOOKING_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(long)]
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

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST API server (default).
    Serve,
    /// Generate slots for every working day of a month.
    GenerateMonth {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },
    /// Generate slots for a season defined in the config file.
    GenerateSeason { name: String },
    /// Delete future slots that never had a booking.
    CleanFuture,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(garage_booking::default_config_path);

    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }

    if cli.check {
        let policy = config.calendar.policy()?;
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}:{}", config.server.host, config.server.port);
        println!("   Database    : {}", config.database.connection_url());
        println!("   Log level   : {}", config.logging.level);
        println!("   Slot length : {} min", policy.slot_length().num_minutes());
        println!("   Seasons     : {}", config.calendar.seasons.len());
        return Ok(());
    }

    let auto_migrate = !cli.no_migrate;
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, auto_migrate).await,
        Command::GenerateMonth { year, month } => {
            let generation = generation_service(&config, auto_migrate).await?;
            let report = generation.generate_for_month(year, month).await?;
            info!(
                "📅 Generated {} slots over {} days ({} closed)",
                report.created, report.days_generated, report.days_skipped
            );
            Ok(())
        }
        Command::GenerateSeason { name } => {
            let generation = generation_service(&config, auto_migrate).await?;
            let report = generation.generate_for_season(&name).await?;
            info!(
                "📅 Season {}: generated {} slots over {} days ({} closed)",
                name, report.created, report.days_generated, report.days_skipped
            );
            Ok(())
        }
        Command::CleanFuture => {
            let generation = generation_service(&config, auto_migrate).await?;
            let deleted = generation.clean_future_unbooked().await?;
            info!("🧹 Deleted {} future slots without bookings", deleted);
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, auto_migrate: bool) -> Result<(), Box<dyn std::error::Error>> {
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate,
    })
    .await?;

    handle.install_signal_handler();
    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;
    Ok(())
}

async fn generation_service(
    config: &AppConfig,
    auto_migrate: bool,
) -> Result<SlotGenerationService, Box<dyn std::error::Error>> {
    let db = open_database(config, auto_migrate).await?;
    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db));
    Ok(SlotGenerationService::new(
        repos,
        config.calendar.clone(),
        config.booking.transaction_timeout(),
    )?)
}
