use sea_orm_migration::{prelude::*, schema::*};

use super::m20250901_000001_create_users::User;
use super::m20250901_000002_create_recurring_rides::RecurringRide;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Ride::Table)
                    .if_not_exists()
                    .col(uuid(Ride::Id).primary_key())
                    .col(uuid(Ride::DriverId).not_null())
                    .col(text(Ride::OriginName).not_null())
                    .col(double_null(Ride::OriginLat))
                    .col(double_null(Ride::OriginLng))
                    .col(text(Ride::DestinationName).not_null())
                    .col(double_null(Ride::DestinationLat))
                    .col(double_null(Ride::DestinationLng))
                    .col(timestamp_with_time_zone(Ride::DepartureTime).not_null())
                    .col(integer(Ride::TotalSeats).not_null())
                    .col(integer(Ride::AvailableSeats).not_null())
                    // 'scheduled' | 'in_progress' | 'completed' | 'cancelled'
                    .col(string_len(Ride::Status, 20).not_null().default("scheduled"))
                    .col(boolean(Ride::IsRecurring).not_null().default(false))
                    .col(uuid_null(Ride::RecurringId))
                    .col(
                        timestamp_with_time_zone(Ride::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Ride::AvailableSeats).gte(0))
                    .check(Expr::col(Ride::AvailableSeats).lte(Expr::col(Ride::TotalSeats)))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_driver")
                            .from(Ride::Table, Ride::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ride_recurring")
                            .from(Ride::Table, Ride::RecurringId)
                            .to(RecurringRide::Table, RecurringRide::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ride_status_departure")
                    .table(Ride::Table)
                    .col(Ride::Status)
                    .col(Ride::DepartureTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Ride::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Ride {
    Table,
    Id,
    DriverId,
    OriginName,
    OriginLat,
    OriginLng,
    DestinationName,
    DestinationLat,
    DestinationLng,
    DepartureTime,
    TotalSeats,
    AvailableSeats,
    Status,
    IsRecurring,
    RecurringId,
    CreatedAt,
}
