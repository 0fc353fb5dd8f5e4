mod support;

use carpool_backend::entities::booking::BookingStatus;
use carpool_backend::entities::rating::{self, RatingType};
use carpool_backend::entities::ride::RideStatus;
use carpool_backend::entities::user::UserRole;
use carpool_backend::error::AppError;
use carpool_backend::services::bookings::{book_seat, cancel_booking, take_seat};
use carpool_backend::services::Place;
use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use support::*;
use uuid::Uuid;

fn pickup() -> Place {
    Place::new("Main Gate")
}

async fn ratings_of(db: &sea_orm::DatabaseConnection, user_id: Uuid) -> Vec<rating::Model> {
    rating::Entity::find()
        .filter(rating::Column::RevieweeId.eq(user_id))
        .all(db)
        .await
        .expect("load ratings")
}

#[tokio::test]
async fn book_then_cancel_restores_seats() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Ayesha").await;
    let ride = campus_ride(&db, driver.id, 5, 3).await;

    let booking = book_seat(&db, ride.id, rider.id, pickup()).await.expect("book");
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 2);

    let cancelled = cancel_booking(&db, booking.id, rider.id, Utc::now())
        .await
        .expect("cancel");
    assert!(!cancelled.penalized);
    assert_eq!(cancelled.booking.status, BookingStatus::CancelledByRider);
    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 3);
}

#[tokio::test]
async fn seats_never_leave_bounds() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let ride = campus_ride(&db, driver.id, 5, 2).await;

    let mut outcomes = Vec::new();
    for name in ["Ali", "Bilal", "Hina"] {
        let rider = seed_rider(&db, name).await;
        outcomes.push(book_seat(&db, ride.id, rider.id, pickup()).await);

        let current = reload_ride(&db, ride.id).await;
        assert!(current.available_seats >= 0);
        assert!(current.available_seats <= current.total_seats);
    }

    assert!(outcomes[0].is_ok());
    assert!(outcomes[1].is_ok());
    assert!(matches!(outcomes[2], Err(AppError::NoSeatsAvailable)));
    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_bookings_for_last_seat() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let first = seed_rider(&db, "First").await;
    let second = seed_rider(&db, "Second").await;
    let ride = campus_ride(&db, driver.id, 5, 1).await;

    let ride_id = ride.id;
    let tasks: Vec<_> = [first.id, second.id]
        .into_iter()
        .map(|rider_id| {
            let db = db.clone();
            tokio::spawn(async move { book_seat(&db, ride_id, rider_id, pickup()).await })
        })
        .collect();

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.expect("task panicked"));
    }

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AppError::NoSeatsAvailable)))
            .count(),
        1
    );
    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 0);
}

#[tokio::test]
async fn seat_taken_after_a_stale_read_is_refused() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let ride = campus_ride(&db, driver.id, 5, 1).await;

    // Both requests saw one free seat before either wrote
    let seen = reload_ride(&db, ride.id).await;
    assert_eq!(seen.available_seats, 1);

    take_seat(&db, ride.id).await.expect("first request takes the seat");
    let late = take_seat(&db, ride.id).await;

    assert!(matches!(late, Err(AppError::NoSeatsAvailable)));
    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 0);
}

#[tokio::test]
async fn booking_is_refused_for_driver_and_non_riders() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let other_driver = seed_user(&db, "Kamran", UserRole::Driver).await;
    let ride = campus_ride(&db, driver.id, 5, 3).await;

    let own = book_seat(&db, ride.id, driver.id, pickup()).await;
    assert!(matches!(own, Err(AppError::Forbidden(_))));

    let wrong_role = book_seat(&db, ride.id, other_driver.id, pickup()).await;
    assert!(matches!(wrong_role, Err(AppError::ForbiddenRole(_))));

    let missing = book_seat(&db, Uuid::new_v4(), other_driver.id, pickup()).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 3);
}

#[tokio::test]
async fn second_booking_on_same_ride_is_duplicate() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_user(&db, "Sana", UserRole::Both).await;
    let ride = campus_ride(&db, driver.id, 5, 3).await;

    let booking = book_seat(&db, ride.id, rider.id, pickup()).await.expect("book");
    let again = book_seat(&db, ride.id, rider.id, pickup()).await;
    assert!(matches!(again, Err(AppError::DuplicateBooking)));

    // A cancelled booking still occupies the (ride, rider) pair
    cancel_booking(&db, booking.id, rider.id, Utc::now()).await.expect("cancel");
    let rebook = book_seat(&db, ride.id, rider.id, pickup()).await;
    assert!(matches!(rebook, Err(AppError::DuplicateBooking)));

    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 3);
}

#[tokio::test]
async fn in_progress_rides_accept_bookings_but_finished_ones_do_not() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Usman").await;

    let moving = campus_ride(&db, driver.id, 0, 2).await;
    let moving = set_ride_status(&db, moving, RideStatus::InProgress).await;
    book_seat(&db, moving.id, rider.id, pickup())
        .await
        .expect("in-progress ride is bookable");

    let done = campus_ride(&db, driver.id, 1, 2).await;
    let done = set_ride_status(&db, done, RideStatus::Completed).await;
    let result = book_seat(&db, done.id, rider.id, pickup()).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));

    let blank = book_seat(&db, moving.id, rider.id, Place::new("   ")).await;
    assert!(matches!(blank, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn late_cancellation_costs_two_stars() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Zara").await;
    let ride = seed_ride(
        &db,
        driver.id,
        Place::new("FCCU"),
        Place::new("Gulberg"),
        Utc::now() + Duration::minutes(30),
        2,
    )
    .await;

    let booking = book_seat(&db, ride.id, rider.id, pickup()).await.expect("book");
    let cancelled = cancel_booking(&db, booking.id, rider.id, Utc::now())
        .await
        .expect("cancel");

    assert!(cancelled.penalized);
    assert_eq!(
        cancelled.message(),
        "Booking cancelled with penalty for late cancellation"
    );

    let penalties = ratings_of(&db, rider.id).await;
    assert_eq!(penalties.len(), 1);
    assert_eq!(penalties[0].rating_value, 2);
    assert_eq!(penalties[0].rating_type, RatingType::RiderRating);
    assert_eq!(penalties[0].reviewer_id, None);

    let rider = reload_user(&db, rider.id).await;
    assert_eq!(rider.rider_rating_count, 1);
    assert!((rider.avg_rider_rating - 2.0).abs() < 1e-9);
    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 2);
}

#[tokio::test]
async fn early_cancellation_is_free() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Omar").await;
    let ride = campus_ride(&db, driver.id, 2, 2).await;

    let booking = book_seat(&db, ride.id, rider.id, pickup()).await.expect("book");
    let cancelled = cancel_booking(&db, booking.id, rider.id, Utc::now())
        .await
        .expect("cancel");

    assert!(!cancelled.penalized);
    assert_eq!(cancelled.message(), "Booking cancelled");
    assert!(ratings_of(&db, rider.id).await.is_empty());

    let rider = reload_user(&db, rider.id).await;
    assert_eq!(rider.rider_rating_count, 0);
    assert!((rider.avg_rider_rating - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn only_the_rider_can_cancel_a_confirmed_booking_once() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Fatima").await;
    let stranger = seed_rider(&db, "Stranger").await;
    let ride = campus_ride(&db, driver.id, 4, 2).await;

    let booking = book_seat(&db, ride.id, rider.id, pickup()).await.expect("book");

    let by_stranger = cancel_booking(&db, booking.id, stranger.id, Utc::now()).await;
    assert!(matches!(by_stranger, Err(AppError::Forbidden(_))));

    cancel_booking(&db, booking.id, rider.id, Utc::now()).await.expect("cancel");
    let twice = cancel_booking(&db, booking.id, rider.id, Utc::now()).await;
    assert!(matches!(twice, Err(AppError::InvalidState(_))));

    // The second attempt must not hand the seat back again
    assert_eq!(reload_ride(&db, ride.id).await.available_seats, 2);

    let unknown = cancel_booking(&db, Uuid::new_v4(), rider.id, Utc::now()).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn bookings_on_started_rides_cannot_be_cancelled() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Hamza").await;
    let ride = campus_ride(&db, driver.id, 3, 2).await;

    let booking = book_seat(&db, ride.id, rider.id, pickup()).await.expect("book");
    let ride = reload_ride(&db, ride.id).await;
    set_ride_status(&db, ride, RideStatus::InProgress).await;

    let result = cancel_booking(&db, booking.id, rider.id, Utc::now()).await;
    assert!(matches!(result, Err(AppError::InvalidState(_))));
    assert_eq!(reload_ride(&db, booking.ride_id).await.available_seats, 1);
}
