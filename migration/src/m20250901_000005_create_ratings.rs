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
                    .table(Rating::Table)
                    .if_not_exists()
                    .col(uuid(Rating::Id).primary_key())
                    .col(uuid(Rating::RideId).not_null())
                    // NULL reviewer marks a system penalty
                    .col(uuid_null(Rating::ReviewerId))
                    .col(uuid(Rating::RevieweeId).not_null())
                    .col(string_len(Rating::RatingType, 20).not_null())
                    .col(integer(Rating::RatingValue).not_null())
                    .col(text_null(Rating::ReviewText))
                    .col(
                        timestamp_with_time_zone(Rating::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(
                        Expr::col(Rating::RatingValue)
                            .gte(1)
                            .and(Expr::col(Rating::RatingValue).lte(5)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_ride")
                            .from(Rating::Table, Rating::RideId)
                            .to(Ride::Table, Ride::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_reviewer")
                            .from(Rating::Table, Rating::ReviewerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rating_reviewee")
                            .from(Rating::Table, Rating::RevieweeId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // NULL reviewers are distinct, so penalties never collide here
        manager
            .create_index(
                Index::create()
                    .name("uq_rating_ride_reviewer_reviewee")
                    .table(Rating::Table)
                    .col(Rating::RideId)
                    .col(Rating::ReviewerId)
                    .col(Rating::RevieweeId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rating::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Rating {
    Table,
    Id,
    RideId,
    ReviewerId,
    RevieweeId,
    RatingType,
    RatingValue,
    ReviewText,
    CreatedAt,
}
