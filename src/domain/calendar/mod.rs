//! Business calendar
//!
//! Decides which dates the garage is open and which time windows are
//! offered on those dates.

pub mod policy;

pub use policy::{CalendarPolicy, TimeWindow};
