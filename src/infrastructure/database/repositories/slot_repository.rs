//! SeaORM implementation of SlotRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::{active_count, db_err, lock_slot, slot_to_domain, with_occupancy};
use crate::domain::slot::{NewSlot, Slot, SlotRepository};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{booking, slot};

pub struct SeaOrmSlotRepository {
    db: DatabaseConnection,
}

impl SeaOrmSlotRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SlotRepository for SeaOrmSlotRepository {
    async fn insert_batch(&self, slots: Vec<NewSlot>) -> DomainResult<Vec<Slot>> {
        debug!("Inserting {} slots", slots.len());
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        let txn = self.db.begin().await.map_err(db_err)?;
        let now = Utc::now();
        let mut created = Vec::with_capacity(slots.len());
        for s in slots {
            let model = slot::ActiveModel {
                start_time: Set(s.start_time),
                end_time: Set(s.end_time),
                is_open: Set(true),
                capacity: Set(s.capacity),
                version: Set(0),
                created_at: Set(now),
                ..Default::default()
            };
            let inserted = model.insert(&txn).await.map_err(db_err)?;
            created.push(slot_to_domain(inserted, 0));
        }
        txn.commit().await.map_err(db_err)?;
        Ok(created)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Slot>> {
        let Some(model) = slot::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };
        let active = active_count(&self.db, model.id).await?;
        Ok(Some(slot_to_domain(model, active)))
    }

    async fn find_all(&self) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .order_by_asc(slot::Column::StartTime)
            .order_by_asc(slot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        with_occupancy(&self.db, models).await
    }

    async fn find_starting_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .filter(slot::Column::StartTime.gte(from))
            .filter(slot::Column::StartTime.lt(to))
            .order_by_asc(slot::Column::StartTime)
            .order_by_asc(slot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        with_occupancy(&self.db, models).await
    }

    async fn find_within(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .filter(slot::Column::StartTime.gte(from))
            .filter(slot::Column::EndTime.lte(to))
            .order_by_asc(slot::Column::StartTime)
            .order_by_asc(slot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        with_occupancy(&self.db, models).await
    }

    async fn find_starting_after(&self, instant: DateTime<Utc>) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .filter(slot::Column::StartTime.gt(instant))
            .order_by_asc(slot::Column::StartTime)
            .order_by_asc(slot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        with_occupancy(&self.db, models).await
    }

    async fn find_ended_before(&self, instant: DateTime<Utc>) -> DomainResult<Vec<Slot>> {
        let models = slot::Entity::find()
            .filter(slot::Column::EndTime.lt(instant))
            .order_by_desc(slot::Column::StartTime)
            .order_by_desc(slot::Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        with_occupancy(&self.db, models).await
    }

    async fn set_open(&self, id: i32, is_open: bool) -> DomainResult<Slot> {
        debug!("Setting slot {} open={}", id, is_open);

        let txn = self.db.begin().await.map_err(db_err)?;
        let row = lock_slot(&txn, id).await?;

        let mut active: slot::ActiveModel = row.into();
        active.is_open = Set(is_open);
        let updated = active.update(&txn).await.map_err(db_err)?;

        let count = active_count(&txn, id).await?;
        txn.commit().await.map_err(db_err)?;
        Ok(slot_to_domain(updated, count))
    }

    async fn delete_future_unbooked(&self, instant: DateTime<Utc>) -> DomainResult<u64> {
        let booked = Query::select()
            .distinct()
            .column(booking::Column::SlotId)
            .from(booking::Entity)
            .to_owned();

        let result = slot::Entity::delete_many()
            .filter(slot::Column::StartTime.gt(instant))
            .filter(slot::Column::Id.not_in_subquery(booked))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        debug!("Deleted {} future slots without bookings", result.rows_affected);
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::memory_db;
    use chrono::{Duration, TimeZone};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 3, day, hour, 0, 0).unwrap()
    }

    fn hour_slot(day: u32, hour: u32) -> NewSlot {
        NewSlot::new(at(day, hour), at(day, hour) + Duration::hours(1), 2).unwrap()
    }

    #[tokio::test]
    async fn batch_insert_assigns_ids_and_defaults() {
        let repo = SeaOrmSlotRepository::new(memory_db().await);
        let created = repo
            .insert_batch(vec![hour_slot(4, 8), hour_slot(4, 9)])
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_ne!(created[0].id, created[1].id);
        assert!(created.iter().all(|s| s.is_open && s.active_bookings == 0));

        let found = repo.find_by_id(created[1].id).await.unwrap().unwrap();
        assert_eq!(found.start_time, at(4, 9));
        assert_eq!(found.capacity, 2);
        assert!(repo.find_by_id(9_999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn range_queries_differ_on_boundaries() {
        let repo = SeaOrmSlotRepository::new(memory_db().await);
        repo.insert_batch(vec![hour_slot(4, 8), hour_slot(4, 17), hour_slot(5, 8)])
            .await
            .unwrap();

        // [04 08:00, 04 17:30): the 17:00 slot starts inside but ends outside
        let starting = repo
            .find_starting_between(at(4, 8), at(4, 17) + Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(starting.len(), 2);

        let within = repo
            .find_within(at(4, 8), at(4, 17) + Duration::minutes(30))
            .await
            .unwrap();
        assert_eq!(within.len(), 1);
        assert_eq!(within[0].start_time, at(4, 8));
    }

    #[tokio::test]
    async fn future_ascending_past_descending() {
        let repo = SeaOrmSlotRepository::new(memory_db().await);
        repo.insert_batch(vec![hour_slot(5, 8), hour_slot(4, 8), hour_slot(6, 8)])
            .await
            .unwrap();

        let future = repo.find_starting_after(at(4, 8)).await.unwrap();
        let starts: Vec<_> = future.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![at(5, 8), at(6, 8)]);

        let past = repo.find_ended_before(at(7, 0)).await.unwrap();
        let starts: Vec<_> = past.iter().map(|s| s.start_time).collect();
        assert_eq!(starts, vec![at(6, 8), at(5, 8), at(4, 8)]);
    }

    #[tokio::test]
    async fn set_open_toggles_flag() {
        let repo = SeaOrmSlotRepository::new(memory_db().await);
        let id = repo.insert_batch(vec![hour_slot(4, 8)]).await.unwrap()[0].id;

        let closed = repo.set_open(id, false).await.unwrap();
        assert!(!closed.is_open);
        assert!(!closed.is_available());

        let reopened = repo.set_open(id, true).await.unwrap();
        assert!(reopened.is_available());

        assert!(matches!(
            repo.set_open(9_999, false).await,
            Err(crate::domain::DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn clean_only_removes_future_rows() {
        let repo = SeaOrmSlotRepository::new(memory_db().await);
        repo.insert_batch(vec![hour_slot(4, 8), hour_slot(5, 8), hour_slot(6, 8)])
            .await
            .unwrap();

        let deleted = repo.delete_future_unbooked(at(4, 12)).await.unwrap();
        assert_eq!(deleted, 2);
        assert_eq!(repo.find_all().await.unwrap().len(), 1);
    }
}
