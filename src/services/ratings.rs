use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::rating::{self, RatingType};
use crate::entities::{ride, user};
use crate::error::{is_unique_violation, AppError, AppResult};

/// Penalty applied to a driver who cancels a scheduled ride.
pub const RIDE_CANCELLATION_PENALTY: i32 = 1;
/// Penalty applied to a rider who cancels less than an hour before departure.
pub const LATE_CANCELLATION_PENALTY: i32 = 2;

/// Rolling mean after one more rating. The old total is taken from the old
/// average and old count before the count is bumped.
pub fn rolled_average(old_average: f64, old_count: i32, value: i32) -> f64 {
    let old_total = old_average * f64::from(old_count);
    (old_total + f64::from(value)) / f64::from(old_count + 1)
}

pub fn ensure_rating_value(value: i64) -> AppResult<i32> {
    if (1..=5).contains(&value) {
        Ok(value as i32)
    } else {
        Err(AppError::Validation(
            "rating_value must be an integer between 1 and 5".to_string(),
        ))
    }
}

/// Record a rating event and fold it into the reviewee's aggregate.
///
/// The reviewee row is locked for the rest of the enclosing transaction so
/// concurrent ratings of the same user are applied one after another.
async fn record_rating<C: ConnectionTrait>(
    conn: &C,
    ride_id: Uuid,
    reviewer_id: Option<Uuid>,
    reviewee_id: Uuid,
    rating_type: RatingType,
    value: i32,
    review_text: Option<String>,
) -> AppResult<rating::Model> {
    let reviewee = user::Entity::find_by_id(reviewee_id)
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let event = rating::ActiveModel {
        id: Set(Uuid::new_v4()),
        ride_id: Set(ride_id),
        reviewer_id: Set(reviewer_id),
        reviewee_id: Set(reviewee_id),
        rating_type: Set(rating_type),
        rating_value: Set(value),
        review_text: Set(review_text),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::DuplicateRating
        } else {
            AppError::Database(e)
        }
    })?;

    let (old_average, old_count) = reviewee.rating_aggregate(rating_type);
    let new_average = rolled_average(old_average, old_count, value);

    let mut active: user::ActiveModel = reviewee.into();
    match rating_type {
        RatingType::DriverRating => {
            active.avg_driver_rating = Set(new_average);
            active.driver_rating_count = Set(old_count + 1);
        }
        RatingType::RiderRating => {
            active.avg_rider_rating = Set(new_average);
            active.rider_rating_count = Set(old_count + 1);
        }
    }
    active.update(conn).await?;

    Ok(event)
}

/// Apply a system-generated rating. Must run inside the caller's transaction.
pub async fn apply_penalty<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    ride_id: Uuid,
    value: i32,
    rating_type: RatingType,
    reason: &str,
) -> AppResult<rating::Model> {
    let event = record_rating(
        conn,
        ride_id,
        None,
        user_id,
        rating_type,
        value,
        Some(reason.to_string()),
    )
    .await?;

    tracing::info!(
        user_id = %user_id,
        ride_id = %ride_id,
        value,
        rating_type = ?rating_type,
        "penalty rating applied"
    );
    Ok(event)
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct SubmitRating {
    pub ride_id: Option<Uuid>,
    pub reviewee_id: Option<Uuid>,
    pub rating_value: Option<i64>,
    pub review_text: Option<String>,
}

/// Submit a user rating for another participant of a ride.
pub async fn submit_rating(
    db: &DatabaseConnection,
    reviewer_id: Uuid,
    input: SubmitRating,
) -> AppResult<rating::Model> {
    let (Some(ride_id), Some(reviewee_id), Some(raw_value)) =
        (input.ride_id, input.reviewee_id, input.rating_value)
    else {
        return Err(AppError::Validation("Missing required fields".to_string()));
    };
    let value = ensure_rating_value(raw_value)?;

    let txn = db.begin().await?;

    user::Entity::find_by_id(reviewee_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let ride = ride::Entity::find_by_id(ride_id)
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let existing = rating::Entity::find()
        .filter(rating::Column::RideId.eq(ride_id))
        .filter(rating::Column::ReviewerId.eq(reviewer_id))
        .filter(rating::Column::RevieweeId.eq(reviewee_id))
        .one(&txn)
        .await?;

    if existing.is_some() {
        return Err(AppError::DuplicateRating);
    }

    let rating_type = if ride.driver_id == reviewee_id {
        RatingType::DriverRating
    } else {
        RatingType::RiderRating
    };

    let event = record_rating(
        &txn,
        ride_id,
        Some(reviewer_id),
        reviewee_id,
        rating_type,
        value,
        input.review_text,
    )
    .await?;

    txn.commit().await?;

    tracing::info!(
        ride_id = %ride_id,
        reviewer_id = %reviewer_id,
        reviewee_id = %reviewee_id,
        value,
        "rating submitted"
    );
    Ok(event)
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    #[test]
    fn test_first_rating_replaces_default() {
        // Aggregates start at 5.0 with count 0
        assert_eq!(rolled_average(5.0, 0, 3), 3.0);
    }

    #[test]
    fn test_rolled_average_matches_formula() {
        // (4.0 * 2 + 1) / 3
        assert!((rolled_average(4.0, 2, 1) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rolled_average_equals_mean_of_random_sequences() {
        let mut rng = rand::thread_rng();

        for _ in 0..200 {
            let len = rng.gen_range(1..=40);
            let values: Vec<i32> = (0..len).map(|_| rng.gen_range(1..=5)).collect();

            let (mut average, mut count) = (5.0, 0);
            for &v in &values {
                average = rolled_average(average, count, v);
                count += 1;
            }

            let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64;
            assert_eq!(count as usize, values.len());
            assert!((average - mean).abs() < 1e-9, "{} != {}", average, mean);
        }
    }

    #[test]
    fn test_rating_value_bounds() {
        assert_eq!(ensure_rating_value(1).unwrap(), 1);
        assert_eq!(ensure_rating_value(5).unwrap(), 5);
        assert!(matches!(ensure_rating_value(0), Err(AppError::Validation(_))));
        assert!(matches!(ensure_rating_value(6), Err(AppError::Validation(_))));
    }
}
