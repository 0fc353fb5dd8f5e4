use sea_orm_migration::{prelude::*, schema::*};

use super::m20250901_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecurringRide::Table)
                    .if_not_exists()
                    .col(uuid(RecurringRide::Id).primary_key())
                    .col(uuid(RecurringRide::DriverId).not_null())
                    .col(text(RecurringRide::OriginName).not_null())
                    .col(double_null(RecurringRide::OriginLat))
                    .col(double_null(RecurringRide::OriginLng))
                    .col(text(RecurringRide::DestinationName).not_null())
                    .col(double_null(RecurringRide::DestinationLat))
                    .col(double_null(RecurringRide::DestinationLng))
                    .col(time(RecurringRide::DepartureTimeOfDay).not_null())
                    // Comma-separated weekdays, 0 = Monday: "0,1,2,3,4"
                    .col(string_len(RecurringRide::DaysOfWeek, 15).not_null())
                    .col(integer(RecurringRide::TotalSeats).not_null())
                    .col(boolean(RecurringRide::IsActive).not_null().default(true))
                    .col(
                        timestamp_with_time_zone(RecurringRide::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_recurring_ride_driver")
                            .from(RecurringRide::Table, RecurringRide::DriverId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecurringRide::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum RecurringRide {
    Table,
    Id,
    DriverId,
    OriginName,
    OriginLat,
    OriginLng,
    DestinationName,
    DestinationLat,
    DestinationLng,
    DepartureTimeOfDay,
    DaysOfWeek,
    TotalSeats,
    IsActive,
    CreatedAt,
}
