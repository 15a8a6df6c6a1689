//! Slot repository interface

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::{NewSlot, Slot};
use crate::domain::DomainResult;

/// Every returned [`Slot`] carries its active-booking count as of the read.
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Insert all slots in one transaction: either every row commits or none does.
    async fn insert_batch(&self, slots: Vec<NewSlot>) -> DomainResult<Vec<Slot>>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Slot>>;

    /// All slots ordered by start time
    async fn find_all(&self) -> DomainResult<Vec<Slot>>;

    /// Slots whose start lies in `[from, to)`, ordered by start time
    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Slot>>;

    /// Slots fully contained in `[from, to]`, ordered by start time
    async fn find_within(&self, from: DateTime<Utc>, to: DateTime<Utc>)
        -> DomainResult<Vec<Slot>>;

    /// Slots starting strictly after `instant`
    async fn find_starting_after(&self, instant: DateTime<Utc>) -> DomainResult<Vec<Slot>>;

    /// Slots that ended strictly before `instant`, most recent first
    async fn find_ended_before(&self, instant: DateTime<Utc>) -> DomainResult<Vec<Slot>>;

    /// Set the operator override flag
    async fn set_open(&self, id: i32, is_open: bool) -> DomainResult<Slot>;

    /// Delete slots starting after `instant` that have no booking rows at all
    /// (cancelled bookings included). Returns the number of deleted slots.
    async fn delete_future_unbooked(&self, instant: DateTime<Utc>) -> DomainResult<u64>;
}
