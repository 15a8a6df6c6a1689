//! Slot DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::domain::Slot;

/// Slot with its availability as of the read
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotDto {
    pub id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Operator override; a closed slot accepts no booking
    pub is_open: bool,
    pub capacity: i32,
    /// Bookings in any status but Cancelled
    pub active_bookings: i32,
    pub remaining_capacity: i32,
    pub available: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Slot> for SlotDto {
    fn from(s: Slot) -> Self {
        Self {
            available: s.is_available(),
            remaining_capacity: s.remaining_capacity(),
            id: s.id,
            start_time: s.start_time,
            end_time: s.end_time,
            is_open: s.is_open,
            capacity: s.capacity,
            active_bookings: s.active_bookings,
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SlotAvailabilityDto {
    pub slot_id: i32,
    pub available: bool,
    pub remaining_capacity: i32,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityFilter {
    /// Only slots that would accept a booking right now
    #[serde(default)]
    pub available_only: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SlotRangeParams {
    /// Inclusive lower bound on slot start (RFC 3339)
    pub from: DateTime<Utc>,
    /// Inclusive upper bound on slot end (RFC 3339)
    pub to: DateTime<Utc>,
    #[serde(default)]
    pub available_only: bool,
}

/// Create one slot directly
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSlotRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Defaults to 1
    #[validate(range(min = 1, max = 100))]
    pub capacity: Option<i32>,
}

/// Slice `[start_time, end_time]` into back-to-back slots of capacity 1
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct GenerateSlotsRequest {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(range(min = 5, max = 1440))]
    pub duration_minutes: i64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SetOpenRequest {
    pub is_open: bool,
}
