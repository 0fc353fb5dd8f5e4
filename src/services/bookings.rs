use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::guards::{ensure_can_ride, find_user};
use super::ratings::{apply_penalty, LATE_CANCELLATION_PENALTY};
use super::Place;
use crate::entities::booking::{self, BookingStatus};
use crate::entities::rating::RatingType;
use crate::entities::ride::{self, RideStatus};
use crate::error::{is_unique_violation, AppError, AppResult};

/// Cancelling closer than this to departure earns a rider penalty.
pub fn late_cancellation_window() -> Duration {
    Duration::hours(1)
}

pub fn is_late_cancellation(departure_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    departure_time - now < late_cancellation_window()
}

/// Reserve one seat on a ride for `rider_id`.
///
/// The seat is taken with a conditional `available_seats > 0` update, so of
/// two requests racing for the last seat exactly one succeeds.
pub async fn book_seat(
    db: &DatabaseConnection,
    ride_id: Uuid,
    rider_id: Uuid,
    pickup: Place,
) -> AppResult<booking::Model> {
    let pickup = pickup.validated("pickup_point_name")?;

    let txn = db.begin().await?;

    let ride = ride::Entity::find_by_id(ride_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    if ride.driver_id == rider_id {
        return Err(AppError::Forbidden(
            "Driver cannot book their own ride".to_string(),
        ));
    }

    let rider = find_user(&txn, rider_id).await?;
    ensure_can_ride(&rider)?;

    if ride.status.is_terminal() {
        return Err(AppError::InvalidState(format!(
            "Cannot book a ride that is {}",
            ride.status
        )));
    }

    if ride.available_seats <= 0 {
        return Err(AppError::NoSeatsAvailable);
    }

    let existing = booking::Entity::find()
        .filter(booking::Column::RideId.eq(ride_id))
        .filter(booking::Column::RiderId.eq(rider_id))
        .one(&txn)
        .await?;

    if existing.is_some() {
        return Err(AppError::DuplicateBooking);
    }

    take_seat(&txn, ride_id).await?;

    let booking = booking::ActiveModel {
        id: Set(Uuid::new_v4()),
        ride_id: Set(ride_id),
        rider_id: Set(rider_id),
        pickup_point_name: Set(pickup.name),
        pickup_point_lat: Set(pickup.lat),
        pickup_point_lng: Set(pickup.lng),
        status: Set(BookingStatus::Confirmed),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::DuplicateBooking
        } else {
            AppError::Database(e)
        }
    })?;

    txn.commit().await?;

    tracing::info!(booking_id = %booking.id, ride_id = %ride_id, rider_id = %rider_id, "seat booked");
    Ok(booking)
}

/// Decrement `available_seats` only while it is still positive. A request that
/// lost the race for the last seat updates no row and gets `NoSeatsAvailable`.
pub async fn take_seat<C: ConnectionTrait>(conn: &C, ride_id: Uuid) -> AppResult<()> {
    let taken = ride::Entity::update_many()
        .col_expr(
            ride::Column::AvailableSeats,
            Expr::col(ride::Column::AvailableSeats).sub(1),
        )
        .filter(ride::Column::Id.eq(ride_id))
        .filter(ride::Column::AvailableSeats.gt(0))
        .exec(conn)
        .await?;

    if taken.rows_affected == 0 {
        return Err(AppError::NoSeatsAvailable);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CancelledBooking {
    pub booking: booking::Model,
    pub penalized: bool,
}

impl CancelledBooking {
    pub fn message(&self) -> &'static str {
        if self.penalized {
            "Booking cancelled with penalty for late cancellation"
        } else {
            "Booking cancelled"
        }
    }
}

/// Cancel a rider's booking and release the seat. A cancellation less than
/// an hour before departure also applies a two-star rider penalty.
pub async fn cancel_booking(
    db: &DatabaseConnection,
    booking_id: Uuid,
    actor_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<CancelledBooking> {
    let txn = db.begin().await?;

    let booking = booking::Entity::find_by_id(booking_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

    if booking.rider_id != actor_id {
        return Err(AppError::Forbidden(
            "You cannot cancel this booking".to_string(),
        ));
    }

    let ride = ride::Entity::find_by_id(booking.ride_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    if ride.status != RideStatus::Scheduled {
        return Err(AppError::InvalidState(
            "Cannot cancel a booking for a ride that is not scheduled.".to_string(),
        ));
    }

    if booking.status != BookingStatus::Confirmed {
        return Err(AppError::InvalidState(
            "Only confirmed bookings can be cancelled.".to_string(),
        ));
    }

    let penalized = is_late_cancellation(ride.departure_time.with_timezone(&Utc), now);
    if penalized {
        apply_penalty(
            &txn,
            actor_id,
            ride.id,
            LATE_CANCELLATION_PENALTY,
            RatingType::RiderRating,
            "Automatic 2-star rating for late cancellation (<1 hour before departure).",
        )
        .await?;
    }

    let mut active: booking::ActiveModel = booking.into();
    active.status = Set(BookingStatus::CancelledByRider);
    let cancelled = active.update(&txn).await?;

    let released = ride::Entity::update_many()
        .col_expr(
            ride::Column::AvailableSeats,
            Expr::col(ride::Column::AvailableSeats).add(1),
        )
        .filter(ride::Column::Id.eq(ride.id))
        .filter(Expr::col(ride::Column::AvailableSeats).lt(Expr::col(ride::Column::TotalSeats)))
        .exec(&txn)
        .await?;

    if released.rows_affected == 0 {
        return Err(AppError::Internal(format!(
            "Ride {} already has every seat available",
            ride.id
        )));
    }

    txn.commit().await?;

    tracing::info!(
        booking_id = %booking_id,
        ride_id = %ride.id,
        penalized,
        "booking cancelled"
    );
    Ok(CancelledBooking {
        booking: cancelled,
        penalized,
    })
}
