//! Slot aggregate
//!
//! A fixed time window with a finite vehicle capacity, plus the rules that
//! decide whether it accepts another booking.

pub mod availability;
pub mod model;
pub mod repository;

pub use model::{NewSlot, Slot};
pub use repository::SlotRepository;
