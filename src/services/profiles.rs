use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use uuid::Uuid;

use super::guards::{ensure_can_drive, find_user};
use crate::entities::booking::{self, BookingStatus};
use crate::entities::ride::{self, RideStatus};
use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};

/// Fields a user may change on their own profile. Absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub major: Option<String>,
    pub year: Option<i32>,
    pub phone_number: Option<String>,
    pub role: Option<UserRole>,
}

pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: Uuid,
    update: ProfileUpdate,
) -> AppResult<user::Model> {
    let user = find_user(db, user_id).await?;
    let previous_role = user.role;
    let mut active: user::ActiveModel = user.into();

    if let Some(full_name) = update.full_name {
        let full_name = full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(AppError::Validation("full_name cannot be empty".to_string()));
        }
        active.full_name = Set(full_name);
    }
    if let Some(year) = update.year {
        if year < 1 {
            return Err(AppError::Validation("year must be positive".to_string()));
        }
        active.year = Set(Some(year));
    }
    if let Some(major) = update.major {
        active.major = Set(Some(major));
    }
    if let Some(phone_number) = update.phone_number {
        active.phone_number = Set(Some(phone_number));
    }
    if let Some(role) = update.role {
        active.role = Set(role);
    }

    let updated = active.update(db).await?;
    if updated.role != previous_role {
        tracing::info!(user_id = %user_id, role = ?updated.role, "role changed");
    }
    Ok(updated)
}

/// Record where a driver currently is.
pub async fn update_location(
    db: &DatabaseConnection,
    user_id: Uuid,
    lat: f64,
    lng: f64,
    now: DateTime<Utc>,
) -> AppResult<user::Model> {
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::Validation(
            "Latitude must be within [-90, 90] and longitude within [-180, 180]".to_string(),
        ));
    }

    let user = find_user(db, user_id).await?;
    ensure_can_drive(&user)?;

    let mut active: user::ActiveModel = user.into();
    active.current_lat = Set(Some(lat));
    active.current_lng = Set(Some(lng));
    active.last_location_update = Set(Some(now.into()));

    Ok(active.update(db).await?)
}

#[derive(Debug)]
pub struct MyRides {
    pub driving: Vec<ride::Model>,
    pub riding: Vec<ride::Model>,
}

/// Active rides the user drives, and active rides they hold a confirmed seat on.
pub async fn my_rides<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<MyRides> {
    let driving = ride::Entity::find()
        .filter(ride::Column::DriverId.eq(user_id))
        .filter(ride::Column::Status.is_in(RideStatus::searchable()))
        .order_by_asc(ride::Column::DepartureTime)
        .all(conn)
        .await?;

    let booked_ride_ids: Vec<Uuid> = booking::Entity::find()
        .filter(booking::Column::RiderId.eq(user_id))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .all(conn)
        .await?
        .into_iter()
        .map(|b| b.ride_id)
        .collect();

    let riding = if booked_ride_ids.is_empty() {
        Vec::new()
    } else {
        ride::Entity::find()
            .filter(ride::Column::Id.is_in(booked_ride_ids))
            .filter(ride::Column::Status.is_in(RideStatus::searchable()))
            .order_by_asc(ride::Column::DepartureTime)
            .all(conn)
            .await?
    };

    Ok(MyRides { driving, riding })
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverLocation {
    pub driver_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Live driver position, visible only to confirmed riders while the ride is under way.
pub async fn driver_location<C: ConnectionTrait>(
    conn: &C,
    ride_id: Uuid,
    requester_id: Uuid,
) -> AppResult<DriverLocation> {
    let ride = ride::Entity::find_by_id(ride_id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Ride not found".to_string()))?;

    let confirmed = booking::Entity::find()
        .filter(booking::Column::RideId.eq(ride_id))
        .filter(booking::Column::RiderId.eq(requester_id))
        .filter(booking::Column::Status.eq(BookingStatus::Confirmed))
        .one(conn)
        .await?;

    if confirmed.is_none() {
        return Err(AppError::Forbidden(
            "You are not a confirmed passenger on this ride".to_string(),
        ));
    }

    if ride.status != RideStatus::InProgress {
        return Err(AppError::NotFound("Ride is not in progress".to_string()));
    }

    let driver = find_user(conn, ride.driver_id).await?;
    let (Some(lat), Some(lng)) = (driver.current_lat, driver.current_lng) else {
        return Err(AppError::NotFound(
            "Driver location is not available yet".to_string(),
        ));
    };

    Ok(DriverLocation {
        driver_id: driver.id,
        lat,
        lng,
        updated_at: driver.last_location_update.map(|t| t.with_timezone(&Utc)),
    })
}
