//! Repository access for the domain layer
//!
//! Contains:
//! - `RepositoryProvider`: unified access to the per-aggregate repositories
//! - `DomainResult`: standard result type for domain operations

use super::booking::BookingRepository;
use super::slot::SlotRepository;
use crate::shared::errors::DomainError;

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Provides access to all domain repositories.
///
/// ```ignore
/// async fn handle(repos: &dyn RepositoryProvider) {
///     let slot = repos.slots().find_by_id(1).await?;
///     let bookings = repos.bookings().find_by_plate("AB-123-CD").await?;
/// }
/// ```
pub trait RepositoryProvider: Send + Sync {
    fn slots(&self) -> &dyn SlotRepository;
    fn bookings(&self) -> &dyn BookingRepository;
}
