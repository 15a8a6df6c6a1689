//! Slot routes: calendar queries, direct creation, operator override

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
