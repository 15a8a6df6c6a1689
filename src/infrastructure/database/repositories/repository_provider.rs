//! SeaORM implementation of RepositoryProvider

use sea_orm::DatabaseConnection;

use crate::domain::booking::BookingRepository;
use crate::domain::repositories::RepositoryProvider;
use crate::domain::slot::SlotRepository;

use super::booking_repository::SeaOrmBookingRepository;
use super::slot_repository::SeaOrmSlotRepository;

/// Unified repository provider backed by SeaORM.
///
/// ```ignore
/// let repos = SeaOrmRepositoryProvider::new(db.clone());
/// let slot = repos.slots().find_by_id(42).await?;
/// let booked = repos.bookings().find_by_plate("AB-123-CD").await?;
/// ```
pub struct SeaOrmRepositoryProvider {
    slots: SeaOrmSlotRepository,
    bookings: SeaOrmBookingRepository,
}

impl SeaOrmRepositoryProvider {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            slots: SeaOrmSlotRepository::new(db.clone()),
            bookings: SeaOrmBookingRepository::new(db),
        }
    }
}

impl RepositoryProvider for SeaOrmRepositoryProvider {
    fn slots(&self) -> &dyn SlotRepository {
        &self.slots
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }
}
