//! Booking repository interface
//!
//! The mutating methods are atomic: each one reads the slot's current
//! occupancy and writes inside a single transaction, claiming the slot row so
//! that two concurrent writers cannot both pass the capacity check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{BookingStatus, BookingWithSlot, NewBooking};
use crate::domain::DomainResult;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Insert a `Reserved` booking if the slot exists, is bookable, and holds
    /// no active booking for the same plate.
    ///
    /// NotFound when the slot is absent, Conflict when the slot is closed or
    /// full, when the plate is already booked there, or when another writer
    /// claimed the slot first.
    async fn create_guarded(&self, booking: NewBooking) -> DomainResult<BookingWithSlot>;

    /// Set the status and bump `updated_at`. Moving a cancelled booking back
    /// to an active status re-checks capacity (Conflict if the slot is full).
    async fn update_status(&self, id: i32, status: BookingStatus) -> DomainResult<BookingWithSlot>;

    /// Hard delete. NotFound if absent.
    async fn delete(&self, id: i32) -> DomainResult<()>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<BookingWithSlot>>;

    async fn find_all(&self) -> DomainResult<Vec<BookingWithSlot>>;

    async fn find_by_plate(&self, plate: &str) -> DomainResult<Vec<BookingWithSlot>>;

    async fn find_by_phone(&self, phone: &str) -> DomainResult<Vec<BookingWithSlot>>;

    /// Bookings whose slot starts in `[from, to)`, ordered by slot start
    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<BookingWithSlot>>;

    /// Bookings whose slot lies fully inside `[from, to]`, ordered by slot start
    async fn find_within(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<BookingWithSlot>>;

    /// Bookings whose slot starts strictly after `instant`
    async fn find_starting_after(&self, instant: DateTime<Utc>)
        -> DomainResult<Vec<BookingWithSlot>>;

    /// Bookings whose slot ended strictly before `instant`, most recent first
    async fn find_ended_before(&self, instant: DateTime<Utc>) -> DomainResult<Vec<BookingWithSlot>>;
}
