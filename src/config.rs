//! Application configuration
//!
//! Loaded from a TOML file (default `~/.config/garage-booking/config.toml`).
//! Every section and field has a default, so an empty or partial file is valid.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [calendar]
//! opening_time = "08:00:00"
//! closing_time = "18:00:00"
//! closed_weekdays = ["Sun"]
//! holidays = ["2025-07-14", "2025-08-15"]
//!
//! [[calendar.seasons]]
//! name = "summer-2025"
//! start = "2025-07-01"
//! end = "2025-08-31"
//! ```

use std::path::{Path, PathBuf};

use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CalendarPolicy, DomainError, DomainResult};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("garage-booking")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
    pub booking: BookingConfig,
    pub calendar: CalendarConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

// ── Server ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds allowed for in-flight requests to drain on shutdown.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout: 30,
        }
    }
}

// ── Database ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Full connection URL. Takes precedence over `sqlite_path`.
    pub url: Option<String>,
    pub sqlite_path: String,
    pub pool: PoolConfig,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: None,
            sqlite_path: "./garage-booking.db".to_string(),
            pool: PoolConfig::default(),
        }
    }
}

impl DatabaseSection {
    pub fn connection_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}?mode=rwc", self.sqlite_path),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            acquire_timeout_secs: 10,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `garage_booking=debug,sea_orm=warn`.
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

// ── Booking ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingConfig {
    /// Upper bound for one booking transaction, connection acquisition included.
    pub transaction_timeout_ms: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            transaction_timeout_ms: 5_000,
        }
    }
}

impl BookingConfig {
    pub fn transaction_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.transaction_timeout_ms)
    }
}

// ── Calendar ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    pub opening_time: NaiveTime,
    pub closing_time: NaiveTime,
    /// No slot is generated entirely inside `[break_start, break_end)`.
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub slot_minutes: u32,
    /// Capacity given to every generated slot.
    pub slot_capacity: i32,
    pub closed_weekdays: Vec<Weekday>,
    pub holidays: Vec<NaiveDate>,
    /// Accepted year window for month generation.
    pub min_year: i32,
    pub max_year: i32,
    /// Longest date range a single generation call may cover.
    pub max_range_days: u32,
    pub seasons: Vec<SeasonConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonConfig {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl CalendarConfig {
    /// Build the calendar policy, rejecting inconsistent hours.
    pub fn policy(&self) -> DomainResult<CalendarPolicy> {
        let mut policy = CalendarPolicy::new(
            self.opening_time,
            self.closing_time,
            Duration::minutes(i64::from(self.slot_minutes)),
        )?
        .with_closed_weekdays(self.closed_weekdays.iter().copied())
        .with_holidays(self.holidays.iter().copied());

        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => policy = policy.with_break(start, end)?,
            (None, None) => {}
            _ => {
                return Err(DomainError::Validation(
                    "break_start and break_end must be set together".to_string(),
                ))
            }
        }
        Ok(policy)
    }

    pub fn season(&self, name: &str) -> Option<&SeasonConfig> {
        self.seasons.iter().find(|s| s.name == name)
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or(NaiveDate::MIN)
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            opening_time: hm(8, 0),
            closing_time: hm(18, 0),
            break_start: Some(hm(12, 0)),
            break_end: Some(hm(14, 0)),
            slot_minutes: 60,
            slot_capacity: 2,
            closed_weekdays: vec![Weekday::Sun],
            // Fixed public holidays (France, 2025)
            holidays: vec![
                ymd(2025, 1, 1),
                ymd(2025, 5, 1),
                ymd(2025, 5, 8),
                ymd(2025, 7, 14),
                ymd(2025, 8, 15),
                ymd(2025, 11, 1),
                ymd(2025, 11, 11),
                ymd(2025, 12, 25),
            ],
            min_year: 2024,
            max_year: 2030,
            max_range_days: 366,
            seasons: vec![SeasonConfig {
                name: "summer-2025".to_string(),
                start: ymd(2025, 7, 1),
                end: ymd(2025, 8, 31),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = AppConfig::from_toml("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.calendar.slot_capacity, 2);
        assert_eq!(cfg.calendar.closed_weekdays, vec![Weekday::Sun]);
        assert_eq!(cfg.calendar.holidays.len(), 8);
        assert_eq!(cfg.booking.transaction_timeout_ms, 5_000);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = AppConfig::from_toml(
            r#"
            [server]
            port = 9090

            [calendar]
            opening_time = "07:30:00"
            closed_weekdays = ["Sat", "Sun"]
            holidays = ["2026-01-01"]

            [[calendar.seasons]]
            name = "winter-2026"
            start = "2026-01-05"
            end = "2026-02-28"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.calendar.opening_time, hm(7, 30));
        assert_eq!(cfg.calendar.closing_time, hm(18, 0));
        assert_eq!(
            cfg.calendar.closed_weekdays,
            vec![Weekday::Sat, Weekday::Sun]
        );
        assert_eq!(cfg.calendar.holidays, vec![ymd(2026, 1, 1)]);
        assert_eq!(cfg.calendar.seasons[0].name, "winter-2026");
    }

    #[test]
    fn connection_url_prefers_explicit_url() {
        let mut db = DatabaseSection::default();
        assert_eq!(db.connection_url(), "sqlite://./garage-booking.db?mode=rwc");

        db.url = Some("sqlite::memory:".to_string());
        assert_eq!(db.connection_url(), "sqlite::memory:");
    }

    #[test]
    fn default_calendar_builds_a_policy() {
        let cfg = CalendarConfig::default();
        let policy = cfg.policy().unwrap();
        // Tuesday 2025-07-08
        assert_eq!(policy.daily_windows(ymd(2025, 7, 8)).len(), 8);
        assert!(!policy.is_working_day(ymd(2025, 7, 14)));
        assert!(cfg.season("summer-2025").is_some());
        assert!(cfg.season("winter").is_none());
    }

    #[test]
    fn half_configured_break_is_rejected() {
        let cfg = CalendarConfig {
            break_end: None,
            ..CalendarConfig::default()
        };
        assert!(matches!(cfg.policy(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/garage-booking.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
