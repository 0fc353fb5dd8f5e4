use chrono::{DateTime, FixedOffset, Timelike, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::guards::{ensure_can_drive, ensure_seat_count, find_user};
use super::ratings::{apply_penalty, RIDE_CANCELLATION_PENALTY};
use super::{trip_patterns, Place};
use crate::entities::booking::{self, BookingStatus};
use crate::entities::rating::{self, RatingType};
use crate::entities::ride::{self, RideStatus};
use crate::entities::user;
use crate::error::{AppError, AppResult};

pub const EARLIEST_DEPARTURE_HOUR: u32 = 6;
pub const LATEST_DEPARTURE_HOUR: u32 = 22;

#[derive(Debug, Clone)]
pub struct NewRide {
    pub origin: Place,
    pub destination: Place,
    /// Kept in the offset the driver gave it in; the hour check uses that wall clock.
    pub departure_time: DateTime<FixedOffset>,
    pub total_seats: i32,
}

/// Rides may only depart between 06:00 and 22:59 local time.
pub fn check_departure_hour(departure_time: &DateTime<FixedOffset>) -> AppResult<()> {
    let hour = departure_time.hour();
    if (EARLIEST_DEPARTURE_HOUR..=LATEST_DEPARTURE_HOUR).contains(&hour) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Rides can only be scheduled between 6:00 AM and 10:00 PM.".to_string(),
        ))
    }
}

pub async fn create_ride(
    db: &DatabaseConnection,
    driver_id: Uuid,
    input: NewRide,
) -> AppResult<ride::Model> {
    check_departure_hour(&input.departure_time)?;
    ensure_seat_count(input.total_seats)?;
    let origin = input.origin.validated("origin_name")?;
    let destination = input.destination.validated("destination_name")?;

    let driver = find_user(db, driver_id).await?;
    ensure_can_drive(&driver)?;

    let ride = ride::ActiveModel {
        id: Set(Uuid::new_v4()),
        driver_id: Set(driver_id),
        origin_name: Set(origin.name),
        origin_lat: Set(origin.lat),
        origin_lng: Set(origin.lng),
        destination_name: Set(destination.name),
        destination_lat: Set(destination.lat),
        destination_lng: Set(destination.lng),
        departure_time: Set(input.departure_time.with_timezone(&Utc).into()),
        total_seats: Set(input.total_seats),
        available_seats: Set(input.total_seats),
        status: Set(RideStatus::Scheduled),
        is_recurring: Set(false),
        recurring_id: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(db)
    .await?;

    tracing::info!(ride_id = %ride.id, driver_id = %driver_id, "ride created");
    Ok(ride)
}

/// Move a ride forward through its lifecycle. Completing a ride records trip
/// patterns for everyone on board and completes their bookings.
pub async fn update_ride_status(
    db: &DatabaseConnection,
    ride_id: Uuid,
    actor_id: Uuid,
    new_status: RideStatus,
) -> AppResult<ride::Model> {
    let txn = db.begin().await?;

    let ride = ride::Entity::find_by_id(ride_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    if ride.driver_id != actor_id {
        return Err(AppError::Forbidden(
            "You are not the driver of this ride".to_string(),
        ));
    }

    let previous = ride.status;
    if previous.is_terminal() {
        return Err(AppError::InvalidTransition(format!(
            "Cannot change status from '{}'",
            previous
        )));
    }
    if !previous.can_advance_to(new_status) {
        return Err(AppError::InvalidTransition(format!(
            "Cannot change status from '{}' to '{}'",
            previous, new_status
        )));
    }

    if new_status == RideStatus::Completed {
        trip_patterns::record_completion(&txn, &ride).await?;

        booking::Entity::update_many()
            .col_expr(
                booking::Column::Status,
                Expr::value(BookingStatus::Completed),
            )
            .filter(booking::Column::RideId.eq(ride.id))
            .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
            .exec(&txn)
            .await?;
    }

    let mut active: ride::ActiveModel = ride.into();
    active.status = Set(new_status);
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        ride_id = %ride_id,
        from = %previous,
        to = %new_status,
        "ride status updated"
    );
    Ok(updated)
}

/// Cancel a scheduled ride. The driver takes a fixed one-star penalty.
pub async fn cancel_ride(
    db: &DatabaseConnection,
    ride_id: Uuid,
    actor_id: Uuid,
) -> AppResult<ride::Model> {
    let txn = db.begin().await?;

    let ride = ride::Entity::find_by_id(ride_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    if ride.driver_id != actor_id {
        return Err(AppError::Forbidden(
            "You are not the driver of this ride".to_string(),
        ));
    }

    if ride.status != RideStatus::Scheduled {
        return Err(AppError::InvalidState(
            "Only scheduled rides can be cancelled.".to_string(),
        ));
    }

    let driver_id = ride.driver_id;
    let mut active: ride::ActiveModel = ride.into();
    active.status = Set(RideStatus::Cancelled);
    let cancelled = active.update(&txn).await?;

    apply_penalty(
        &txn,
        driver_id,
        ride_id,
        RIDE_CANCELLATION_PENALTY,
        RatingType::DriverRating,
        "Automatic 1-star rating for cancelling a ride.",
    )
    .await?;

    txn.commit().await?;

    tracing::info!(ride_id = %ride_id, driver_id = %driver_id, "ride cancelled");
    Ok(cancelled)
}

#[derive(Debug)]
pub struct RideDetails {
    pub ride: ride::Model,
    pub driver: user::Model,
    /// Bookings in creation order, with the rider when the account still exists.
    pub bookings: Vec<(booking::Model, Option<user::Model>)>,
    /// Users the viewer has already rated on this ride.
    pub rated_by_viewer: Vec<Uuid>,
}

pub async fn ride_details<C: ConnectionTrait>(
    conn: &C,
    ride_id: Uuid,
    viewer_id: Option<Uuid>,
) -> AppResult<RideDetails> {
    let (ride, driver) = ride::Entity::find_by_id(ride_id)
        .find_also_related(user::Entity)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;
    let driver = driver.ok_or_else(|| AppError::Internal("Ride has no driver".to_string()))?;

    let bookings = booking::Entity::find()
        .filter(booking::Column::RideId.eq(ride_id))
        .order_by_asc(booking::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(conn)
        .await?;

    let rated_by_viewer = match viewer_id {
        Some(viewer_id) => rating::Entity::find()
            .filter(rating::Column::RideId.eq(ride_id))
            .filter(rating::Column::ReviewerId.eq(viewer_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|r| r.reviewee_id)
            .collect(),
        None => Vec::new(),
    };

    Ok(RideDetails {
        ride,
        driver,
        bookings,
        rated_by_viewer,
    })
}
