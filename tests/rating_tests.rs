mod support;

use carpool_backend::entities::rating::RatingType;
use carpool_backend::error::AppError;
use carpool_backend::services::ratings::{submit_rating, SubmitRating};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use support::*;
use uuid::Uuid;

fn rating(ride_id: Uuid, reviewee_id: Uuid, value: i64) -> SubmitRating {
    SubmitRating {
        ride_id: Some(ride_id),
        reviewee_id: Some(reviewee_id),
        rating_value: Some(value),
        review_text: Some("Smooth ride".to_string()),
    }
}

#[tokio::test]
async fn rating_type_follows_the_reviewee() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Saad").await;
    let ride = campus_ride(&db, driver.id, 2, 2).await;

    let of_driver = submit_rating(&db, rider.id, rating(ride.id, driver.id, 4))
        .await
        .expect("rate driver");
    assert_eq!(of_driver.rating_type, RatingType::DriverRating);
    assert_eq!(of_driver.reviewer_id, Some(rider.id));

    let of_rider = submit_rating(&db, driver.id, rating(ride.id, rider.id, 3))
        .await
        .expect("rate rider");
    assert_eq!(of_rider.rating_type, RatingType::RiderRating);

    let driver = reload_user(&db, driver.id).await;
    assert_eq!(driver.driver_rating_count, 1);
    assert!((driver.avg_driver_rating - 4.0).abs() < 1e-9);
    // The other aggregate is untouched
    assert_eq!(driver.rider_rating_count, 0);
    assert!((driver.avg_rider_rating - 5.0).abs() < 1e-9);

    let rider = reload_user(&db, rider.id).await;
    assert_eq!(rider.rider_rating_count, 1);
    assert!((rider.avg_rider_rating - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn duplicate_rating_is_rejected() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Amna").await;
    let ride = campus_ride(&db, driver.id, 2, 2).await;

    submit_rating(&db, rider.id, rating(ride.id, driver.id, 5))
        .await
        .expect("first rating");
    let second = submit_rating(&db, rider.id, rating(ride.id, driver.id, 1)).await;
    assert!(matches!(second, Err(AppError::DuplicateRating)));

    let driver = reload_user(&db, driver.id).await;
    assert_eq!(driver.driver_rating_count, 1);
    assert!((driver.avg_driver_rating - 5.0).abs() < 1e-9);
}

#[tokio::test]
async fn invalid_ratings_are_rejected() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let rider = seed_rider(&db, "Taha").await;
    let ride = campus_ride(&db, driver.id, 2, 2).await;

    let missing = submit_rating(
        &db,
        rider.id,
        SubmitRating {
            ride_id: Some(ride.id),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(missing, Err(AppError::Validation(_))));

    for value in [0, 6, -3] {
        let out_of_range = submit_rating(&db, rider.id, rating(ride.id, driver.id, value)).await;
        assert!(matches!(out_of_range, Err(AppError::Validation(_))));
    }

    let unknown_user = submit_rating(&db, rider.id, rating(ride.id, Uuid::new_v4(), 3)).await;
    assert!(matches!(unknown_user, Err(AppError::NotFound(_))));

    let unknown_ride = submit_rating(&db, rider.id, rating(Uuid::new_v4(), driver.id, 3)).await;
    assert!(matches!(unknown_ride, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn averages_equal_the_mean_of_submitted_values() {
    let db = test_db().await;
    let driver = seed_driver(&db).await;
    let passenger = seed_rider(&db, "Passenger").await;
    let ride = campus_ride(&db, driver.id, 2, 2).await;
    let mut rng = StdRng::seed_from_u64(42);

    let mut driver_values = Vec::new();
    let mut rider_values = Vec::new();
    for i in 0..15 {
        let reviewer = seed_rider(&db, &format!("Reviewer{}", i)).await;

        let value = rng.gen_range(1..=5);
        submit_rating(&db, reviewer.id, rating(ride.id, driver.id, value))
            .await
            .expect("rate driver");
        driver_values.push(value as f64);

        let value = rng.gen_range(1..=5);
        submit_rating(&db, reviewer.id, rating(ride.id, passenger.id, value))
            .await
            .expect("rate passenger");
        rider_values.push(value as f64);
    }

    let mean = |values: &[f64]| values.iter().sum::<f64>() / values.len() as f64;

    let driver = reload_user(&db, driver.id).await;
    assert_eq!(driver.driver_rating_count, 15);
    assert!((driver.avg_driver_rating - mean(&driver_values)).abs() < 1e-9);

    let passenger = reload_user(&db, passenger.id).await;
    assert_eq!(passenger.rider_rating_count, 15);
    assert!((passenger.avg_rider_rating - mean(&rider_values)).abs() < 1e-9);
}
