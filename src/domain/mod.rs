//! Domain layer: entities, business rules, and repository contracts

pub mod booking;
pub mod calendar;
pub mod repositories;
pub mod slot;

pub use booking::{Booking, BookingStatus, BookingWithSlot, NewBooking, VehicleType};
pub use calendar::{CalendarPolicy, TimeWindow};
pub use repositories::{DomainResult, RepositoryProvider};
pub use slot::{NewSlot, Slot};

pub use crate::shared::errors::DomainError;
