//! Admin routes: calendar generation and cleanup

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
