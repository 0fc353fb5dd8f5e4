use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{ride, user::{self, UserRole}};
use crate::error::{AppError, AppResult};
use crate::handlers::extract::AppJson;
use crate::handlers::{rides::RideSummary, UserSummary};
use crate::services::guards::find_user;
use crate::services::profiles::{self, ProfileUpdate};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub major: Option<String>,
    pub year: Option<i32>,
    pub phone_number: Option<String>,
    pub role: UserRole,
    pub avg_driver_rating: f64,
    pub driver_rating_count: i32,
    pub avg_rider_rating: f64,
    pub rider_rating_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for ProfileResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            major: user.major,
            year: user.year,
            phone_number: user.phone_number,
            role: user.role,
            avg_driver_rating: user.avg_driver_rating,
            driver_rating_count: user.driver_rating_count,
            avg_rider_rating: user.avg_rider_rating,
            rider_rating_count: user.rider_rating_count,
            created_at: user.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub lat: f64,
    pub lng: f64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MyRidesResponse {
    pub driving: Vec<RideSummary>,
    pub riding: Vec<RideSummary>,
}

pub async fn get_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<ProfileResponse>> {
    let user = find_user(&state.db, claims.sub).await?;
    Ok(Json(user.into()))
}

pub async fn update_my_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<ProfileUpdate>,
) -> AppResult<Json<ProfileResponse>> {
    let user = profiles::update_profile(&state.db, claims.sub, payload).await?;
    Ok(Json(user.into()))
}

/// Drivers push their position while a ride is under way
pub async fn update_my_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<LocationRequest>,
) -> AppResult<Json<LocationResponse>> {
    let (Some(lat), Some(lng)) = (payload.lat, payload.lng) else {
        return Err(AppError::Validation("lat and lng are required".to_string()));
    };

    let now = Utc::now();
    profiles::update_location(&state.db, claims.sub, lat, lng, now).await?;

    Ok(Json(LocationResponse {
        lat,
        lng,
        updated_at: now,
    }))
}

pub async fn my_rides(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<MyRidesResponse>> {
    let rides = profiles::my_rides(&state.db, claims.sub).await?;

    let summarize = |rides: Vec<ride::Model>| -> Vec<RideSummary> {
        rides.into_iter().map(RideSummary::from).collect()
    };
    Ok(Json(MyRidesResponse {
        driving: summarize(rides.driving),
        riding: summarize(rides.riding),
    }))
}

/// Public view of another user
pub async fn get_user_profile(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<UserSummary>> {
    let user = find_user(&state.db, user_id).await?;
    Ok(Json(user.into()))
}
