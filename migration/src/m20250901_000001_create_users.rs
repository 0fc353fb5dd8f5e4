use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Role is stored as text: 'driver' | 'rider' | 'both'
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Email, 255).not_null().unique_key())
                    .col(string_len(User::PasswordHash, 255).not_null())
                    .col(string_len(User::FullName, 100).not_null())
                    .col(string_len_null(User::Major, 100))
                    .col(integer_null(User::Year))
                    .col(string_len_null(User::PhoneNumber, 30))
                    .col(string_len(User::Role, 10).not_null().default("rider"))
                    .col(double_null(User::CurrentLat))
                    .col(double_null(User::CurrentLng))
                    .col(timestamp_with_time_zone_null(User::LastLocationUpdate))
                    .col(double(User::AvgDriverRating).not_null().default(5.0))
                    .col(integer(User::DriverRatingCount).not_null().default(0))
                    .col(double(User::AvgRiderRating).not_null().default(5.0))
                    .col(integer(User::RiderRatingCount).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(User::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum User {
    Table,
    Id,
    Email,
    PasswordHash,
    FullName,
    Major,
    Year,
    PhoneNumber,
    Role,
    CurrentLat,
    CurrentLng,
    LastLocationUpdate,
    AvgDriverRating,
    DriverRatingCount,
    AvgRiderRating,
    RiderRatingCount,
    CreatedAt,
}
