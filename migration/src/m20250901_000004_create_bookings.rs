use sea_orm_migration::{prelude::*, schema::*};

use super::m20250901_000001_create_users::User;
use super::m20250901_000003_create_rides::Ride;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(uuid(Booking::RideId).not_null())
                    .col(uuid(Booking::RiderId).not_null())
                    .col(text(Booking::PickupPointName).not_null())
                    .col(double_null(Booking::PickupPointLat))
                    .col(double_null(Booking::PickupPointLng))
                    // 'requested' | 'confirmed' | 'cancelled_by_rider' | 'completed'
                    .col(string_len(Booking::Status, 20).not_null().default("confirmed"))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_ride")
                            .from(Booking::Table, Booking::RideId)
                            .to(Ride::Table, Ride::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_rider")
                            .from(Booking::Table, Booking::RiderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_booking_ride_rider")
                    .table(Booking::Table)
                    .col(Booking::RideId)
                    .col(Booking::RiderId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    RideId,
    RiderId,
    PickupPointName,
    PickupPointLat,
    PickupPointLng,
    Status,
    CreatedAt,
}
