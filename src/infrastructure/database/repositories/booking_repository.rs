//! SeaORM implementation of BookingRepository
//!
//! Every write runs in one transaction whose first statement locks the slot
//! row (see [`lock_slot`]). Active bookings are re-read, availability is
//! checked and only then is the booking written.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, SelectTwo, Set, TransactionTrait,
};

use super::{
    active_count, active_counts, db_err, lock_slot, lock_slot_of_booking, slot_to_domain,
};
use crate::domain::booking::{
    Booking, BookingRepository, BookingStatus, BookingWithSlot, NewBooking, VehicleType,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, slot};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn joined() -> SelectTwo<booking::Entity, slot::Entity> {
        booking::Entity::find().find_also_related(slot::Entity)
    }

    async fn load(
        &self,
        query: SelectTwo<booking::Entity, slot::Entity>,
    ) -> DomainResult<Vec<BookingWithSlot>> {
        let rows = query.all(&self.db).await.map_err(db_err)?;

        let slot_ids: Vec<i32> = rows
            .iter()
            .map(|(b, _)| b.slot_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let counts = active_counts(&self.db, &slot_ids).await?;

        rows.into_iter()
            .map(|(b, s)| {
                let s = s.ok_or_else(|| {
                    DomainError::Internal(format!("booking {} references a missing slot", b.id))
                })?;
                let active = counts.get(&s.id).copied().unwrap_or(0);
                Ok(BookingWithSlot {
                    booking: model_to_domain(b)?,
                    slot: slot_to_domain(s, active),
                })
            })
            .collect()
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let status = m.status.parse::<BookingStatus>().map_err(|_| {
        DomainError::Internal(format!("booking {} has unknown status '{}'", m.id, m.status))
    })?;
    let vehicle_type = m.vehicle_type.parse::<VehicleType>().map_err(|_| {
        DomainError::Internal(format!(
            "booking {} has unknown vehicle type '{}'",
            m.id, m.vehicle_type
        ))
    })?;

    Ok(Booking {
        id: m.id,
        slot_id: m.slot_id,
        plate: m.plate,
        mileage: m.mileage,
        vehicle_type,
        heavy_vehicle: m.heavy_vehicle,
        phone: m.phone,
        email: m.email,
        status,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

/// Conflict if another active booking on `slot_id` carries the same plate.
async fn ensure_plate_free<C: ConnectionTrait>(
    conn: &C,
    slot_id: i32,
    plate: &str,
    except: Option<i32>,
) -> DomainResult<()> {
    let mut query = booking::Entity::find()
        .filter(booking::Column::SlotId.eq(slot_id))
        .filter(booking::Column::Plate.eq(plate))
        .filter(booking::Column::Status.ne(BookingStatus::Cancelled.as_str()));
    if let Some(id) = except {
        query = query.filter(booking::Column::Id.ne(id));
    }

    let duplicates = query.count(conn).await.map_err(db_err)?;
    if duplicates > 0 {
        return Err(DomainError::Conflict(format!(
            "vehicle {} already holds a booking on slot {}",
            plate, slot_id
        )));
    }
    Ok(())
}

async fn require_booking<C: ConnectionTrait>(conn: &C, id: i32) -> DomainResult<booking::Model> {
    booking::Entity::find_by_id(id)
        .one(conn)
        .await
        .map_err(db_err)?
        .ok_or_else(|| DomainError::not_found("Booking", id))
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn create_guarded(&self, new: NewBooking) -> DomainResult<BookingWithSlot> {
        debug!("Booking slot {} for plate {}", new.slot_id, new.plate);

        let txn = self.db.begin().await.map_err(db_err)?;
        let row = lock_slot(&txn, new.slot_id).await?;

        let active = active_count(&txn, row.id).await?;
        let slot = slot_to_domain(row, active);
        slot.ensure_bookable()?;
        ensure_plate_free(&txn, slot.id, &new.plate, None).await?;

        let now = Utc::now();
        let model = booking::ActiveModel {
            slot_id: Set(slot.id),
            plate: Set(new.plate),
            mileage: Set(new.mileage),
            vehicle_type: Set(new.vehicle_type.as_str().to_string()),
            heavy_vehicle: Set(new.heavy_vehicle),
            phone: Set(new.phone),
            email: Set(new.email),
            status: Set(BookingStatus::Reserved.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let inserted = model.insert(&txn).await.map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        Ok(BookingWithSlot {
            booking: model_to_domain(inserted)?,
            slot: slot.with_active_bookings(active + 1),
        })
    }

    async fn update_status(&self, id: i32, status: BookingStatus) -> DomainResult<BookingWithSlot> {
        debug!("Setting booking {} status to {}", id, status);

        let txn = self.db.begin().await.map_err(db_err)?;
        let row = lock_slot_of_booking(&txn, id).await?;
        let existing = require_booking(&txn, id).await?;
        let current = model_to_domain(existing.clone())?.status;

        let mut active = active_count(&txn, row.id).await?;
        if current.reactivates(status) {
            slot_to_domain(row.clone(), active).ensure_capacity_left()?;
            ensure_plate_free(&txn, row.id, &existing.plate, Some(id)).await?;
        }

        let mut active_model: booking::ActiveModel = existing.into();
        active_model.status = Set(status.as_str().to_string());
        active_model.updated_at = Set(Utc::now());
        let updated = active_model.update(&txn).await.map_err(db_err)?;

        if current.crosses_capacity_boundary(status) {
            active = active_count(&txn, row.id).await?;
        }
        txn.commit().await.map_err(db_err)?;

        Ok(BookingWithSlot {
            booking: model_to_domain(updated)?,
            slot: slot_to_domain(row, active),
        })
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        debug!("Deleting booking {}", id);

        let txn = self.db.begin().await.map_err(db_err)?;
        lock_slot_of_booking(&txn, id).await?;

        booking::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<BookingWithSlot>> {
        let found = self
            .load(Self::joined().filter(booking::Column::Id.eq(id)))
            .await?;
        Ok(found.into_iter().next())
    }

    async fn find_all(&self) -> DomainResult<Vec<BookingWithSlot>> {
        self.load(
            Self::joined()
                .order_by_asc(slot::Column::StartTime)
                .order_by_asc(booking::Column::Id),
        )
        .await
    }

    async fn find_by_plate(&self, plate: &str) -> DomainResult<Vec<BookingWithSlot>> {
        self.load(
            Self::joined()
                .filter(booking::Column::Plate.eq(plate))
                .order_by_asc(slot::Column::StartTime)
                .order_by_asc(booking::Column::Id),
        )
        .await
    }

    async fn find_by_phone(&self, phone: &str) -> DomainResult<Vec<BookingWithSlot>> {
        self.load(
            Self::joined()
                .filter(booking::Column::Phone.eq(phone))
                .order_by_asc(slot::Column::StartTime)
                .order_by_asc(booking::Column::Id),
        )
        .await
    }

    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<BookingWithSlot>> {
        self.load(
            Self::joined()
                .filter(slot::Column::StartTime.gte(from))
                .filter(slot::Column::StartTime.lt(to))
                .order_by_asc(slot::Column::StartTime)
                .order_by_asc(booking::Column::Id),
        )
        .await
    }

    async fn find_within(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<BookingWithSlot>> {
        self.load(
            Self::joined()
                .filter(slot::Column::StartTime.gte(from))
                .filter(slot::Column::EndTime.lte(to))
                .order_by_asc(slot::Column::StartTime)
                .order_by_asc(booking::Column::Id),
        )
        .await
    }

    async fn find_starting_after(&self, instant: DateTime<Utc>) -> DomainResult<Vec<BookingWithSlot>> {
        self.load(
            Self::joined()
                .filter(slot::Column::StartTime.gt(instant))
                .order_by_asc(slot::Column::StartTime)
                .order_by_asc(booking::Column::Id),
        )
        .await
    }

    async fn find_ended_before(&self, instant: DateTime<Utc>) -> DomainResult<Vec<BookingWithSlot>> {
        self.load(
            Self::joined()
                .filter(slot::Column::EndTime.lt(instant))
                .order_by_desc(slot::Column::StartTime)
                .order_by_desc(booking::Column::Id),
        )
        .await
    }
}
