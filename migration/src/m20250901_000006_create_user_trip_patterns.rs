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
                    .table(UserTripPattern::Table)
                    .if_not_exists()
                    // Serial id doubles as the tie-break for equal trip counts
                    .col(pk_auto(UserTripPattern::Id))
                    .col(uuid(UserTripPattern::UserId).not_null())
                    .col(text(UserTripPattern::OriginName).not_null())
                    .col(text(UserTripPattern::DestinationName).not_null())
                    .col(integer(UserTripPattern::TripCount).not_null().default(1))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_pattern_user")
                            .from(UserTripPattern::Table, UserTripPattern::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_trip_pattern_user_route")
                    .table(UserTripPattern::Table)
                    .col(UserTripPattern::UserId)
                    .col(UserTripPattern::OriginName)
                    .col(UserTripPattern::DestinationName)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserTripPattern::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum UserTripPattern {
    Table,
    Id,
    UserId,
    OriginName,
    DestinationName,
    TripCount,
}
