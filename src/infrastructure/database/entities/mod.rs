//! Database entities module

pub mod booking;
pub mod slot;

pub use booking::Entity as Booking;
pub use slot::Entity as Slot;
