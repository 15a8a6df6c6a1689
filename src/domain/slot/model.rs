//! Slot domain entity

use chrono::{DateTime, Utc};

use super::availability;
use crate::domain::{DomainError, DomainResult};

/// Bookable time window as read from storage.
///
/// `active_bookings` is counted from the booking table at read time; it is
/// never stored on the slot row.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Operator override. A closed slot accepts nothing whatever its capacity.
    pub is_open: bool,
    pub capacity: i32,
    pub active_bookings: i32,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    pub fn is_available(&self) -> bool {
        availability::is_available(self.is_open, self.capacity, self.active_bookings)
    }

    pub fn remaining_capacity(&self) -> i32 {
        availability::remaining_capacity(self.capacity, self.active_bookings)
    }

    /// Conflict unless another booking may be taken right now.
    pub fn ensure_bookable(&self) -> DomainResult<()> {
        if !self.is_open {
            return Err(DomainError::Conflict(format!(
                "slot {} is closed for booking",
                self.id
            )));
        }
        self.ensure_capacity_left()
    }

    /// Conflict when every unit of capacity is held by an active booking.
    pub fn ensure_capacity_left(&self) -> DomainResult<()> {
        if self.remaining_capacity() == 0 {
            return Err(DomainError::Conflict(format!(
                "slot {} is full ({}/{})",
                self.id, self.active_bookings, self.capacity
            )));
        }
        Ok(())
    }

    pub fn with_active_bookings(mut self, active_bookings: i32) -> Self {
        self.active_bookings = active_bookings;
        self
    }
}

/// Slot about to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub capacity: i32,
}

impl NewSlot {
    pub fn new(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        capacity: i32,
    ) -> DomainResult<Self> {
        if end_time <= start_time {
            return Err(DomainError::Validation(format!(
                "slot end {} must be after start {}",
                end_time.to_rfc3339(),
                start_time.to_rfc3339()
            )));
        }
        if capacity <= 0 {
            return Err(DomainError::Validation(format!(
                "slot capacity must be positive, got {}",
                capacity
            )));
        }
        Ok(Self {
            start_time,
            end_time,
            capacity,
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────
