//! Create bookings table
//!
//! A slot with booking rows cannot be deleted; cancelled rows still count.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_slots::Slots;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bookings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bookings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bookings::SlotId).integer().not_null())
                    .col(ColumnDef::new(Bookings::Plate).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Bookings::Mileage)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Bookings::VehicleType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::HeavyVehicle)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Bookings::Phone).string_len(20).not_null())
                    .col(ColumnDef::new(Bookings::Email).string_len(100))
                    .col(
                        ColumnDef::new(Bookings::Status)
                            .string_len(20)
                            .not_null()
                            .default("Reserved"),
                    )
                    .col(
                        ColumnDef::new(Bookings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bookings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookings_slot")
                            .from(Bookings::Table, Bookings::SlotId)
                            .to(Slots::Table, Slots::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_bookings_slot", Bookings::SlotId),
            ("idx_bookings_plate", Bookings::Plate),
            ("idx_bookings_phone", Bookings::Phone),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Bookings::Table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bookings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Bookings {
    Table,
    Id,
    SlotId,
    Plate,
    Mileage,
    VehicleType,
    HeavyVehicle,
    Phone,
    Email,
    Status,
    CreatedAt,
    UpdatedAt,
}
