//! Booking transaction manager
//!
//! Owns the booking write path. Every write runs as one bounded storage
//! transaction; a Conflict or Timeout is returned to the caller as is,
//! nothing is retried here.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};

use super::{bounded, ensure_ordered};
use crate::domain::{
    BookingStatus, BookingWithSlot, DomainError, DomainResult, NewBooking, RepositoryProvider,
};
use crate::shared::time::{day_bounds, week_bounds};

pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
    timeout: Duration,
}

/// Trim free-text fields; a blank email counts as none.
fn normalize(mut new: NewBooking) -> NewBooking {
    new.plate = new.plate.trim().to_string();
    new.phone = new.phone.trim().to_string();
    new.email = new
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    new
}

fn record_outcome<T>(result: &DomainResult<T>) {
    if let Err(e) = result {
        if e.is_retryable() {
            metrics::counter!("booking_conflicts_total").increment(1);
        }
    }
}

impl BookingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, timeout: Duration) -> Self {
        Self { repos, timeout }
    }

    /// Book one unit of the slot's capacity. The new booking is `Reserved`.
    pub async fn create(&self, new: NewBooking) -> DomainResult<BookingWithSlot> {
        let new = normalize(new);
        new.validate()?;
        let slot_id = new.slot_id;

        let result = bounded(
            self.timeout,
            "booking creation",
            self.repos.bookings().create_guarded(new),
        )
        .await;
        record_outcome(&result);

        match &result {
            Ok(created) => {
                info!(
                    "Booking {} created on slot {} ({}/{} taken)",
                    created.booking.id,
                    slot_id,
                    created.slot.active_bookings,
                    created.slot.capacity
                );
                metrics::counter!("bookings_created_total").increment(1);
            }
            Err(e) if e.is_retryable() => warn!("Booking on slot {} refused: {}", slot_id, e),
            Err(_) => {}
        }
        result
    }

    pub async fn update_status(
        &self,
        id: i32,
        status: BookingStatus,
    ) -> DomainResult<BookingWithSlot> {
        let result = bounded(
            self.timeout,
            "booking status update",
            self.repos.bookings().update_status(id, status),
        )
        .await;
        record_outcome(&result);

        if result.is_ok() {
            info!("Booking {} is now {}", id, status);
        }
        result
    }

    pub async fn confirm(&self, id: i32) -> DomainResult<BookingWithSlot> {
        self.update_status(id, BookingStatus::Confirmed).await
    }

    pub async fn cancel(&self, id: i32) -> DomainResult<BookingWithSlot> {
        self.update_status(id, BookingStatus::Cancelled).await
    }

    pub async fn complete(&self, id: i32) -> DomainResult<BookingWithSlot> {
        self.update_status(id, BookingStatus::Completed).await
    }

    pub async fn delete(&self, id: i32) -> DomainResult<()> {
        bounded(
            self.timeout,
            "booking deletion",
            self.repos.bookings().delete(id),
        )
        .await?;
        info!("Booking {} deleted", id);
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────

    pub async fn get(&self, id: i32) -> DomainResult<BookingWithSlot> {
        self.repos
            .bookings()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", id))
    }

    pub async fn list(&self) -> DomainResult<Vec<BookingWithSlot>> {
        self.repos.bookings().find_all().await
    }

    pub async fn by_plate(&self, plate: &str) -> DomainResult<Vec<BookingWithSlot>> {
        self.repos.bookings().find_by_plate(plate.trim()).await
    }

    pub async fn by_phone(&self, phone: &str) -> DomainResult<Vec<BookingWithSlot>> {
        self.repos.bookings().find_by_phone(phone.trim()).await
    }

    pub async fn for_day(&self, date: NaiveDate) -> DomainResult<Vec<BookingWithSlot>> {
        let (from, to) = day_bounds(date);
        self.repos.bookings().find_starting_between(from, to).await
    }

    pub async fn for_week(&self, date: NaiveDate) -> DomainResult<Vec<BookingWithSlot>> {
        let (from, to) = week_bounds(date);
        self.repos.bookings().find_starting_between(from, to).await
    }

    pub async fn in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<BookingWithSlot>> {
        ensure_ordered(from, to)?;
        self.repos.bookings().find_within(from, to).await
    }

    pub async fn future(&self) -> DomainResult<Vec<BookingWithSlot>> {
        self.repos.bookings().find_starting_after(Utc::now()).await
    }

    pub async fn past(&self) -> DomainResult<Vec<BookingWithSlot>> {
        self.repos.bookings().find_ended_before(Utc::now()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewSlot, VehicleType};
    use crate::infrastructure::database::{memory_db, TempDatabase};
    use crate::infrastructure::SeaOrmRepositoryProvider;
    use chrono::{Duration as Span, TimeZone};

    async fn setup(capacity: i32) -> (Arc<BookingService>, Arc<dyn RepositoryProvider>, i32) {
        seed(memory_db().await, capacity).await
    }

    async fn seed(
        db: sea_orm::DatabaseConnection,
        capacity: i32,
    ) -> (Arc<BookingService>, Arc<dyn RepositoryProvider>, i32) {
        let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db));
        let start = Utc.with_ymd_and_hms(2030, 3, 5, 10, 0, 0).unwrap();
        let slot = repos
            .slots()
            .insert_batch(vec![NewSlot::new(start, start + Span::hours(1), capacity).unwrap()])
            .await
            .unwrap()
            .remove(0);
        let svc = Arc::new(BookingService::new(repos.clone(), Duration::from_secs(5)));
        (svc, repos, slot.id)
    }

    fn request(slot_id: i32, plate: &str) -> NewBooking {
        NewBooking {
            slot_id,
            plate: plate.to_string(),
            mileage: 87_000,
            vehicle_type: VehicleType::Car,
            heavy_vehicle: false,
            phone: "+33 6 11 22 33 44".to_string(),
            email: Some("driver@example.com".to_string()),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_never_exceed_capacity() {
        const CAPACITY: i32 = 3;
        const ATTEMPTS: usize = 12;
        let (svc, repos, slot_id) = setup(CAPACITY).await;

        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.create(request(slot_id, &format!("PL-{:03}", i))).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(e) => assert!(e.is_retryable(), "unexpected failure: {}", e),
            }
        }

        assert_eq!(accepted, CAPACITY as usize);
        let slot = repos.slots().find_by_id(slot_id).await.unwrap().unwrap();
        assert_eq!(slot.active_bookings, CAPACITY);
        assert!(!slot.is_available());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn pooled_writers_queue_instead_of_failing() {
        const CAPACITY: i32 = 3;
        const ATTEMPTS: usize = 12;
        let temp = TempDatabase::pooled(8).await;
        let (svc, repos, slot_id) = seed(temp.db.clone(), CAPACITY).await;

        let start = Arc::new(tokio::sync::Barrier::new(ATTEMPTS));
        let handles: Vec<_> = (0..ATTEMPTS)
            .map(|i| {
                let svc = svc.clone();
                let start = start.clone();
                tokio::spawn(async move {
                    start.wait().await;
                    svc.create(request(slot_id, &format!("PL-{:03}", i))).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DomainError::Conflict(msg)) => {
                    assert!(msg.contains("is full"), "lost to lock contention: {}", msg)
                }
                Err(e) => panic!("unexpected failure: {}", e),
            }
        }

        assert_eq!(accepted, CAPACITY as usize);
        let slot = repos.slots().find_by_id(slot_id).await.unwrap().unwrap();
        assert_eq!(slot.active_bookings, CAPACITY);

        // Cancels and reactivations on separate connections keep the count exact
        let bookings = svc.list().await.unwrap();
        let ids: Vec<i32> = bookings.iter().map(|b| b.booking.id).collect();
        let handles: Vec<_> = ids
            .iter()
            .map(|&id| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.cancel(id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let slot = repos.slots().find_by_id(slot_id).await.unwrap().unwrap();
        assert_eq!(slot.active_bookings, 0);
    }

    #[tokio::test]
    async fn status_round_trip_restores_occupancy() {
        let (svc, _, slot_id) = setup(2).await;
        let created = svc.create(request(slot_id, "AB-123-CD")).await.unwrap();
        let id = created.booking.id;
        assert_eq!(created.slot.active_bookings, 1);

        let cancelled = svc.cancel(id).await.unwrap();
        assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.slot.active_bookings, 0);

        let back = svc.update_status(id, BookingStatus::Reserved).await.unwrap();
        assert_eq!(back.slot.active_bookings, 1);

        let confirmed = svc.confirm(id).await.unwrap();
        assert_eq!(confirmed.slot.active_bookings, 1);
        let completed = svc.complete(id).await.unwrap();
        assert_eq!(completed.booking.status, BookingStatus::Completed);
        assert_eq!(completed.slot.active_bookings, 1);
        assert!(completed.booking.updated_at >= completed.booking.created_at);
    }

    #[tokio::test]
    async fn input_is_trimmed_and_validated() {
        let (svc, _, slot_id) = setup(2).await;
        let mut req = request(slot_id, "  AB-123-CD  ");
        req.email = Some("   ".to_string());
        let created = svc.create(req).await.unwrap();
        assert_eq!(created.booking.plate, "AB-123-CD");
        assert_eq!(created.booking.email, None);

        assert_eq!(svc.by_plate("AB-123-CD").await.unwrap().len(), 1);

        let mut bad = request(slot_id, "EF-456-GH");
        bad.mileage = -5;
        assert!(matches!(svc.create(bad).await, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn deleted_booking_is_gone_and_capacity_freed() {
        let (svc, repos, slot_id) = setup(1).await;
        let created = svc.create(request(slot_id, "AB-123-CD")).await.unwrap();

        svc.delete(created.booking.id).await.unwrap();
        assert!(matches!(
            svc.get(created.booking.id).await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(repos.slots().find_by_id(slot_id).await.unwrap().unwrap().is_available());
        assert!(matches!(
            svc.delete(created.booking.id).await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn calendar_views() {
        let (svc, _, slot_id) = setup(2).await;
        svc.create(request(slot_id, "AB-123-CD")).await.unwrap();

        let tuesday = NaiveDate::from_ymd_opt(2030, 3, 5).unwrap();
        assert_eq!(svc.for_day(tuesday).await.unwrap().len(), 1);
        assert!(svc.for_day(tuesday.succ_opt().unwrap()).await.unwrap().is_empty());
        assert_eq!(
            svc.for_week(NaiveDate::from_ymd_opt(2030, 3, 9).unwrap())
                .await
                .unwrap()
                .len(),
            1
        );
        assert_eq!(svc.by_phone("+33 6 11 22 33 44").await.unwrap().len(), 1);
        assert_eq!(svc.future().await.unwrap().len(), 1);
        assert!(svc.past().await.unwrap().is_empty());

        let from = Utc.with_ymd_and_hms(2030, 3, 5, 0, 0, 0).unwrap();
        assert!(matches!(
            svc.in_range(from, from - Span::hours(1)).await,
            Err(DomainError::Validation(_))
        ));
        assert_eq!(svc.in_range(from, from + Span::days(1)).await.unwrap().len(), 1);
    }
}
