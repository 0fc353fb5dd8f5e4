use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ColumnTrait, ConnectionTrait, EntityTrait, NotSet, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::booking::{self, BookingStatus};
use crate::entities::ride::{self, RideStatus};
use crate::entities::{trip_pattern, user};
use crate::error::AppResult;

pub const DEFAULT_PATTERN_LIMIT: u64 = 3;
pub const RIDES_PER_PATTERN: u64 = 2;

/// Bump the (user, origin, destination) counter for the driver and every
/// confirmed rider of a ride that is being completed. Returns how many
/// participants were recorded.
pub async fn record_completion<C: ConnectionTrait>(conn: &C, ride: &ride::Model) -> AppResult<usize> {
    let mut participants = vec![ride.driver_id];
    let confirmed = booking::Entity::find()
        .filter(booking::Column::RideId.eq(ride.id))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .all(conn)
        .await?;
    for b in confirmed {
        if !participants.contains(&b.rider_id) {
            participants.push(b.rider_id);
        }
    }

    let known: Vec<Uuid> = user::Entity::find()
        .filter(user::Column::Id.is_in(participants.clone()))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| u.id)
        .collect();

    let mut recorded = 0;
    for user_id in participants {
        if !known.contains(&user_id) {
            tracing::warn!(user_id = %user_id, ride_id = %ride.id, "skipping trip pattern for unknown user");
            continue;
        }
        bump_pattern(conn, user_id, &ride.origin_name, &ride.destination_name).await?;
        recorded += 1;
    }

    tracing::debug!(ride_id = %ride.id, recorded, "trip patterns recorded");
    Ok(recorded)
}

/// Count one trip on a route. A single insert-or-increment, so two rides
/// completing together for the same first-time participant both land.
pub async fn bump_pattern<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    origin_name: &str,
    destination_name: &str,
) -> AppResult<()> {
    let pattern = trip_pattern::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        origin_name: Set(origin_name.to_string()),
        destination_name: Set(destination_name.to_string()),
        trip_count: Set(1),
    };

    trip_pattern::Entity::insert(pattern)
        .on_conflict(
            OnConflict::columns([
                trip_pattern::Column::UserId,
                trip_pattern::Column::OriginName,
                trip_pattern::Column::DestinationName,
            ])
            .value(
                trip_pattern::Column::TripCount,
                Expr::col(trip_pattern::Column::TripCount).add(1),
            )
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub id: Uuid,
    pub origin_name: String,
    pub destination_name: String,
    pub departure_time: DateTime<Utc>,
    pub available_seats: i32,
    pub reason: String,
}

/// Upcoming rides along the user's most frequent routes.
///
/// Patterns are ranked by trip count, ties broken by creation order. Each
/// pattern contributes at most [`RIDES_PER_PATTERN`] scheduled rides, soonest
/// first, never ones the user drives.
pub async fn recommend_rides<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    pattern_limit: u64,
) -> AppResult<Vec<Recommendation>> {
    let patterns = trip_pattern::Entity::find()
        .filter(trip_pattern::Column::UserId.eq(user_id))
        .order_by_desc(trip_pattern::Column::TripCount)
        .order_by_asc(trip_pattern::Column::Id)
        .limit(pattern_limit)
        .all(conn)
        .await?;

    let mut recommendations = Vec::new();
    for pattern in patterns {
        let rides = ride::Entity::find()
            .filter(ride::Column::OriginName.eq(pattern.origin_name.as_str()))
            .filter(ride::Column::DestinationName.eq(pattern.destination_name.as_str()))
            .filter(ride::Column::Status.eq(RideStatus::Scheduled))
            .filter(ride::Column::DriverId.ne(user_id))
            .order_by_asc(ride::Column::DepartureTime)
            .limit(RIDES_PER_PATTERN)
            .all(conn)
            .await?;

        recommendations.extend(rides.into_iter().map(|r| Recommendation {
            id: r.id,
            origin_name: r.origin_name,
            destination_name: r.destination_name,
            departure_time: r.departure_time.with_timezone(&Utc),
            available_seats: r.available_seats,
            reason: format!(
                "Matches your frequent trip from {} to {}",
                pattern.origin_name, pattern.destination_name
            ),
        }));
    }

    Ok(recommendations)
}
