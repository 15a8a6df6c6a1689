//! Calendar-driven slot generation

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use log::info;

use super::bounded;
use crate::config::CalendarConfig;
use crate::domain::{CalendarPolicy, DomainError, DomainResult, NewSlot, RepositoryProvider};
use crate::shared::time::last_day_of_month;

/// Outcome of one generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Slots committed
    pub created: usize,
    pub days_generated: u32,
    /// Closed weekdays and holidays in the range
    pub days_skipped: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub deleted: u64,
    pub generation: GenerationReport,
}

/// Materializes the calendar policy into slot rows.
///
/// Each call writes one batch: the whole range commits or nothing does.
/// Generating a range twice without cleaning first creates duplicate slots.
pub struct SlotGenerationService {
    repos: Arc<dyn RepositoryProvider>,
    calendar: CalendarConfig,
    policy: CalendarPolicy,
    timeout: Duration,
}

impl SlotGenerationService {
    pub fn new(
        repos: Arc<dyn RepositoryProvider>,
        calendar: CalendarConfig,
        timeout: Duration,
    ) -> DomainResult<Self> {
        if calendar.slot_capacity <= 0 {
            return Err(DomainError::Validation(format!(
                "slot_capacity must be positive, got {}",
                calendar.slot_capacity
            )));
        }
        let policy = calendar.policy()?;
        Ok(Self {
            repos,
            calendar,
            policy,
            timeout,
        })
    }

    pub async fn generate_for_day(&self, date: NaiveDate) -> DomainResult<GenerationReport> {
        self.generate_for_range(date, date).await
    }

    /// Every working day in `[start, end]`, both ends inclusive.
    pub async fn generate_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DomainResult<GenerationReport> {
        if start > end {
            return Err(DomainError::Validation(format!(
                "range start {} is after range end {}",
                start, end
            )));
        }
        let days = (end - start).num_days() + 1;
        if days > i64::from(self.calendar.max_range_days) {
            return Err(DomainError::Validation(format!(
                "range of {} days exceeds the limit of {}",
                days, self.calendar.max_range_days
            )));
        }

        let mut report = GenerationReport::default();
        let mut batch = Vec::new();
        for date in start.iter_days().take_while(|d| *d <= end) {
            let windows = self.policy.daily_windows(date);
            if windows.is_empty() {
                report.days_skipped += 1;
                continue;
            }
            report.days_generated += 1;
            for w in windows {
                batch.push(NewSlot::new(w.start, w.end, self.calendar.slot_capacity)?);
            }
        }

        let created = bounded(
            self.timeout,
            "slot generation",
            self.repos.slots().insert_batch(batch),
        )
        .await?;
        report.created = created.len();

        info!(
            "Generated {} slots from {} to {} ({} days, {} skipped)",
            report.created, start, end, report.days_generated, report.days_skipped
        );
        metrics::counter!("slots_generated_total").increment(report.created as u64);
        Ok(report)
    }

    pub async fn generate_for_month(&self, year: i32, month: u32) -> DomainResult<GenerationReport> {
        if !(self.calendar.min_year..=self.calendar.max_year).contains(&year) {
            return Err(DomainError::Validation(format!(
                "year {} outside {}..={}",
                year, self.calendar.min_year, self.calendar.max_year
            )));
        }
        let last = last_day_of_month(year, month).ok_or_else(|| {
            DomainError::Validation(format!("month must be within 1..=12, got {}", month))
        })?;
        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(last);
        self.generate_for_range(first, last).await
    }

    /// Generate the configured season called `name`.
    pub async fn generate_for_season(&self, name: &str) -> DomainResult<GenerationReport> {
        let season = self
            .calendar
            .season(name)
            .ok_or_else(|| DomainError::NotFound {
                entity: "Season",
                field: "name",
                value: name.to_string(),
            })?
            .clone();
        self.generate_for_range(season.start, season.end).await
    }

    /// Delete future slots with no booking rows at all; cancelled bookings
    /// still keep their slot.
    pub async fn clean_future_unbooked(&self) -> DomainResult<u64> {
        let deleted = bounded(
            self.timeout,
            "slot cleanup",
            self.repos.slots().delete_future_unbooked(Utc::now()),
        )
        .await?;
        info!("Cleaned {} future slots without bookings", deleted);
        metrics::counter!("slots_cleaned_total").increment(deleted);
        Ok(deleted)
    }

    /// Clean, then regenerate the season.
    pub async fn reset_season(&self, name: &str) -> DomainResult<ResetReport> {
        if self.calendar.season(name).is_none() {
            return Err(DomainError::NotFound {
                entity: "Season",
                field: "name",
                value: name.to_string(),
            });
        }
        let deleted = self.clean_future_unbooked().await?;
        let generation = self.generate_for_season(name).await?;
        Ok(ResetReport {
            deleted,
            generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeasonConfig;
    use crate::domain::{NewBooking, VehicleType};
    use crate::infrastructure::database::memory_db;
    use crate::infrastructure::SeaOrmRepositoryProvider;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calendar() -> CalendarConfig {
        CalendarConfig {
            holidays: vec![date(2030, 3, 8)],
            seasons: vec![SeasonConfig {
                name: "spring-2030".to_string(),
                start: date(2030, 3, 4),
                end: date(2030, 3, 10),
            }],
            ..CalendarConfig::default()
        }
    }

    async fn service() -> (SlotGenerationService, Arc<dyn RepositoryProvider>) {
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(memory_db().await));
        let svc =
            SlotGenerationService::new(repos.clone(), calendar(), Duration::from_secs(5)).unwrap();
        (svc, repos)
    }

    #[tokio::test]
    async fn working_day_gets_eight_slots() {
        let (svc, repos) = service().await;
        let report = svc.generate_for_day(date(2030, 3, 5)).await.unwrap();
        assert_eq!(
            report,
            GenerationReport {
                created: 8,
                days_generated: 1,
                days_skipped: 0
            }
        );
        let slots = repos.slots().find_all().await.unwrap();
        assert!(slots.iter().all(|s| s.capacity == 2 && s.is_open));
    }

    #[tokio::test]
    async fn closed_days_are_skipped_not_errors() {
        let (svc, _) = service().await;
        let sunday = svc.generate_for_day(date(2030, 3, 10)).await.unwrap();
        assert_eq!(sunday.created, 0);
        assert_eq!(sunday.days_skipped, 1);

        let holiday = svc.generate_for_day(date(2030, 3, 8)).await.unwrap();
        assert_eq!(holiday.created, 0);
    }

    #[tokio::test]
    async fn season_week_skips_holiday_and_sunday() {
        let (svc, _) = service().await;
        let report = svc.generate_for_season("spring-2030").await.unwrap();
        assert_eq!(report.days_generated, 5);
        assert_eq!(report.days_skipped, 2);
        assert_eq!(report.created, 40);
    }

    #[tokio::test]
    async fn repeated_generation_duplicates() {
        let (svc, repos) = service().await;
        svc.generate_for_day(date(2030, 3, 5)).await.unwrap();
        svc.generate_for_day(date(2030, 3, 5)).await.unwrap();
        assert_eq!(repos.slots().find_all().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn month_bounds_are_validated() {
        let (svc, _) = service().await;
        assert!(matches!(
            svc.generate_for_month(2030, 13).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            svc.generate_for_month(2031, 1).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            svc.generate_for_month(2023, 12).await,
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn february_month_generation() {
        let (svc, _) = service().await;
        // February 2030: 28 days, 4 Sundays
        let report = svc.generate_for_month(2030, 2).await.unwrap();
        assert_eq!(report.days_generated, 24);
        assert_eq!(report.days_skipped, 4);
        assert_eq!(report.created, 24 * 8);
    }

    #[tokio::test]
    async fn bad_ranges_and_unknown_seasons() {
        let (svc, _) = service().await;
        assert!(matches!(
            svc.generate_for_range(date(2030, 3, 5), date(2030, 3, 4)).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            svc.generate_for_range(date(2030, 1, 1), date(2031, 6, 1)).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            svc.generate_for_season("winter").await,
            Err(DomainError::NotFound { entity: "Season", .. })
        ));
        assert!(matches!(
            svc.reset_season("winter").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn clean_then_regenerate_reproduces_the_calendar() {
        let (svc, repos) = service().await;
        let fresh = svc.generate_for_season("spring-2030").await.unwrap();

        let reset = svc.reset_season("spring-2030").await.unwrap();
        assert_eq!(reset.deleted, fresh.created as u64);
        assert_eq!(reset.generation.created, fresh.created);
        assert_eq!(repos.slots().find_all().await.unwrap().len(), fresh.created);
    }

    #[tokio::test]
    async fn clean_keeps_booked_slots() {
        let (svc, repos) = service().await;
        svc.generate_for_day(date(2030, 3, 5)).await.unwrap();
        let target = repos.slots().find_all().await.unwrap()[0].id;
        repos
            .bookings()
            .create_guarded(NewBooking {
                slot_id: target,
                plate: "CD-456-EF".to_string(),
                mileage: 5_000,
                vehicle_type: VehicleType::Car,
                heavy_vehicle: true,
                phone: "0102030405".to_string(),
                email: None,
            })
            .await
            .unwrap();

        assert_eq!(svc.clean_future_unbooked().await.unwrap(), 7);
        let left = repos.slots().find_all().await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].id, target);
    }

    #[tokio::test]
    async fn invalid_calendar_is_rejected() {
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(memory_db().await));
        let bad = CalendarConfig {
            slot_capacity: 0,
            ..calendar()
        };
        assert!(SlotGenerationService::new(repos, bad, Duration::from_secs(1)).is_err());
    }
}
