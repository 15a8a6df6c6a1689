//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories + unified RepositoryProvider, and the
//! occupancy helpers both repositories share.

pub mod booking_repository;
pub mod repository_provider;
pub mod slot_repository;

pub use booking_repository::SeaOrmBookingRepository;
pub use repository_provider::SeaOrmRepositoryProvider;
pub use slot_repository::SeaOrmSlotRepository;

use std::collections::HashMap;

use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect,
};

use crate::domain::{BookingStatus, DomainError, DomainResult, Slot};
use crate::infrastructure::database::entities::{booking, slot};

// ── Conversion helpers ──────────────────────────────────────────

pub(crate) fn db_err(e: DbErr) -> DomainError {
    let message = e.to_string();
    if is_contention(&message) {
        DomainError::Conflict(format!("storage busy, retry the request: {}", message))
    } else {
        DomainError::Internal(format!("Database error: {}", message))
    }
}

/// Lock or serialization failures raised by the store under write contention.
fn is_contention(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("database is locked")
        || lower.contains("database is busy")
        || lower.contains("could not serialize access")
}

pub(crate) fn slot_to_domain(m: slot::Model, active_bookings: i32) -> Slot {
    Slot {
        id: m.id,
        start_time: m.start_time,
        end_time: m.end_time,
        is_open: m.is_open,
        capacity: m.capacity,
        active_bookings,
        created_at: m.created_at,
    }
}

// ── Occupancy ───────────────────────────────────────────────────

/// Bookings holding capacity on one slot (everything but `Cancelled`).
pub(crate) async fn active_count<C: ConnectionTrait>(conn: &C, slot_id: i32) -> DomainResult<i32> {
    let n = booking::Entity::find()
        .filter(booking::Column::SlotId.eq(slot_id))
        .filter(booking::Column::Status.ne(BookingStatus::Cancelled.as_str()))
        .count(conn)
        .await
        .map_err(db_err)?;
    Ok(i32::try_from(n).unwrap_or(i32::MAX))
}

/// Active booking counts for many slots in one grouped query.
/// Slots without active bookings are absent from the map.
pub(crate) async fn active_counts<C: ConnectionTrait>(
    conn: &C,
    slot_ids: &[i32],
) -> DomainResult<HashMap<i32, i32>> {
    if slot_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i32, i64)> = booking::Entity::find()
        .select_only()
        .column(booking::Column::SlotId)
        .column_as(Expr::col(booking::Column::Id).count(), "active")
        .filter(booking::Column::SlotId.is_in(slot_ids.iter().copied()))
        .filter(booking::Column::Status.ne(BookingStatus::Cancelled.as_str()))
        .group_by(booking::Column::SlotId)
        .into_tuple()
        .all(conn)
        .await
        .map_err(db_err)?;

    Ok(rows
        .into_iter()
        .map(|(slot_id, n)| (slot_id, i32::try_from(n).unwrap_or(i32::MAX)))
        .collect())
}

/// Convert slot rows, attaching the active-booking count of each.
pub(crate) async fn with_occupancy<C: ConnectionTrait>(
    conn: &C,
    models: Vec<slot::Model>,
) -> DomainResult<Vec<Slot>> {
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let counts = active_counts(conn, &ids).await?;
    Ok(models
        .into_iter()
        .map(|m| {
            let active = counts.get(&m.id).copied().unwrap_or(0);
            slot_to_domain(m, active)
        })
        .collect())
}

/// Open a write transaction on a slot: bump its `version`, then load it.
///
/// Must be the first statement of the transaction. A deferred SQLite
/// transaction that reads first holds a shared lock it cannot upgrade while
/// another connection is writing, and fails with `database is locked`
/// without waiting on the busy timeout. Writing first queues behind the
/// current writer instead.
pub(crate) async fn lock_slot<C: ConnectionTrait>(conn: &C, id: i32) -> DomainResult<slot::Model> {
    let result = slot::Entity::update_many()
        .col_expr(slot::Column::Version, Expr::col(slot::Column::Version).add(1))
        .filter(slot::Column::Id.eq(id))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        return Err(DomainError::not_found("Slot", id));
    }
    require_slot(conn, id).await
}

/// [`lock_slot`] for the slot a booking belongs to.
pub(crate) async fn lock_slot_of_booking<C: ConnectionTrait>(
    conn: &C,
    booking_id: i32,
) -> DomainResult<slot::Model> {
    let owner = Query::select()
        .column(booking::Column::SlotId)
        .from(booking::Entity)
        .and_where(booking::Column::Id.eq(booking_id))
        .to_owned();

    let result = slot::Entity::update_many()
        .col_expr(slot::Column::Version, Expr::col(slot::Column::Version).add(1))
        .filter(slot::Column::Id.in_subquery(owner))
        .exec(conn)
        .await
        .map_err(db_err)?;

    if result.rows_affected == 0 {
        return Err(DomainError::not_found("Booking", booking_id));
    }

    let (_, row) = booking::Entity::find_by_id(booking_id)
        .find_also_related(slot::Entity)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Booking", booking_id))?;
    row.ok_or_else(|| {
        DomainError::Internal(format!("booking {} references a missing slot", booking_id))
    })
}

/// Load a slot row or fail with NotFound.
pub(crate) async fn require_slot<C: ConnectionTrait>(conn: &C, id: i32) -> DomainResult<slot::Model> {
    slot::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Slot", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_errors_become_conflicts() {
        let err = db_err(DbErr::Custom("error returned from database: database is locked".into()));
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn other_errors_are_internal() {
        let err = db_err(DbErr::Custom("no such table: slots".into()));
        assert!(matches!(err, DomainError::Internal(_)));
    }
}
