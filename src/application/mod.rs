//! Application layer: use-case services over the domain repositories

pub mod services;

pub use services::{
    BookingService, GenerationReport, ResetReport, SlotGenerationService, SlotService,
};
