//! Slot queries and direct slot operations

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use log::info;

use super::{bounded, ensure_ordered};
use crate::domain::{DomainError, DomainResult, NewSlot, RepositoryProvider, Slot};
use crate::shared::time::{day_bounds, week_bounds};

/// Capacity of slots created without an explicit one
pub const DEFAULT_DIRECT_CAPACITY: i32 = 1;

/// Most slots one `generate_between` call may create
pub const MAX_GENERATED_SLOTS: usize = 10_000;

/// Read side of the calendar plus operator actions on single slots.
///
/// `available_only` filters use [`Slot::is_available`], the same predicate
/// the booking path enforces.
pub struct SlotService {
    repos: Arc<dyn RepositoryProvider>,
    timeout: Duration,
}

fn keep(slots: Vec<Slot>, available_only: bool) -> Vec<Slot> {
    if available_only {
        slots.into_iter().filter(Slot::is_available).collect()
    } else {
        slots
    }
}

impl SlotService {
    pub fn new(repos: Arc<dyn RepositoryProvider>, timeout: Duration) -> Self {
        Self { repos, timeout }
    }

    pub async fn list(&self, available_only: bool) -> DomainResult<Vec<Slot>> {
        let slots = self.repos.slots().find_all().await?;
        Ok(keep(slots, available_only))
    }

    pub async fn get(&self, id: i32) -> DomainResult<Slot> {
        self.repos
            .slots()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Slot", id))
    }

    pub async fn is_available(&self, id: i32) -> DomainResult<bool> {
        Ok(self.get(id).await?.is_available())
    }

    /// Slots starting on `date` (UTC)
    pub async fn for_day(&self, date: NaiveDate, available_only: bool) -> DomainResult<Vec<Slot>> {
        let (from, to) = day_bounds(date);
        let slots = self.repos.slots().find_starting_between(from, to).await?;
        Ok(keep(slots, available_only))
    }

    /// Slots starting in the Monday-based week containing `date`
    pub async fn for_week(&self, date: NaiveDate, available_only: bool) -> DomainResult<Vec<Slot>> {
        let (from, to) = week_bounds(date);
        let slots = self.repos.slots().find_starting_between(from, to).await?;
        Ok(keep(slots, available_only))
    }

    /// Slots lying entirely inside `[from, to]`
    pub async fn in_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        available_only: bool,
    ) -> DomainResult<Vec<Slot>> {
        ensure_ordered(from, to)?;
        let slots = self.repos.slots().find_within(from, to).await?;
        Ok(keep(slots, available_only))
    }

    pub async fn future(&self) -> DomainResult<Vec<Slot>> {
        self.repos.slots().find_starting_after(Utc::now()).await
    }

    pub async fn past(&self) -> DomainResult<Vec<Slot>> {
        self.repos.slots().find_ended_before(Utc::now()).await
    }

    pub async fn create_slot(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        capacity: Option<i32>,
    ) -> DomainResult<Slot> {
        let new = NewSlot::new(start, end, capacity.unwrap_or(DEFAULT_DIRECT_CAPACITY))?;
        let created = bounded(self.timeout, "create slot", self.repos.slots().insert_batch(vec![new]))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::Internal("slot insert returned no row".to_string()))?;

        info!(
            "Slot {} created: {} -> {} (capacity {})",
            created.id, created.start_time, created.end_time, created.capacity
        );
        metrics::counter!("slots_generated_total").increment(1);
        Ok(created)
    }

    /// Contiguous `length` slots of capacity 1 from `start`; the last one
    /// must end by `end`. All or nothing, and at most
    /// [`MAX_GENERATED_SLOTS`] slots.
    pub async fn generate_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        length: chrono::Duration,
    ) -> DomainResult<Vec<Slot>> {
        if length <= chrono::Duration::zero() {
            return Err(DomainError::Validation(
                "slot duration must be positive".to_string(),
            ));
        }
        ensure_ordered(start, end)?;

        let mut batch = Vec::new();
        let mut cursor = start;
        while let Some(next) = cursor.checked_add_signed(length).filter(|n| *n <= end) {
            if batch.len() == MAX_GENERATED_SLOTS {
                return Err(DomainError::Validation(format!(
                    "{} to {} in steps of {} min exceeds the limit of {} slots",
                    start,
                    end,
                    length.num_minutes(),
                    MAX_GENERATED_SLOTS
                )));
            }
            batch.push(NewSlot::new(cursor, next, DEFAULT_DIRECT_CAPACITY)?);
            cursor = next;
        }

        let created = bounded(self.timeout, "generate slots", self.repos.slots().insert_batch(batch))
            .await?;
        info!("Generated {} slots between {} and {}", created.len(), start, end);
        metrics::counter!("slots_generated_total").increment(created.len() as u64);
        Ok(created)
    }

    pub async fn set_open(&self, id: i32, is_open: bool) -> DomainResult<Slot> {
        let slot = bounded(self.timeout, "set slot open", self.repos.slots().set_open(id, is_open))
            .await?;
        info!("Slot {} is now {}", id, if is_open { "open" } else { "closed" });
        Ok(slot)
    }
}
