use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking::BookingStatus;
use crate::entities::ride::{self, RideStatus};
use crate::error::{AppError, AppResult};
use crate::handlers::extract::{AppJson, AppQuery};
use crate::handlers::{MessageResponse, UserSummary};
use crate::middleware::auth::MaybeClaims;
use crate::services::search::{search_rides, RideQuery, SearchFilters};
use crate::services::{bookings, profiles, recurring, rides, Place};
use crate::utils::jwt::Claims;
use crate::utils::time::parse_timestamp;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub origin_name: String,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub destination_name: String,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub departure_time: String,
    pub total_seats: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateRecurringRequest {
    pub origin_name: String,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub destination_name: String,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub departure_time_of_day: String,
    pub days_of_week: Vec<i64>,
    pub total_seats: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRideRequest {
    pub status: Option<RideStatus>,
}

#[derive(Debug, Deserialize)]
pub struct BookSeatRequest {
    pub pickup_point_name: String,
    pub pickup_point_lat: Option<f64>,
    pub pickup_point_lng: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct CreatedRideResponse {
    pub message: String,
    pub ride_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CreatedRecurringResponse {
    pub message: String,
    pub recurring_ride_id: Uuid,
    pub generated_rides_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CreatedBookingResponse {
    pub message: String,
    pub booking_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RideSummary {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub origin_name: String,
    pub destination_name: String,
    pub departure_time: DateTime<Utc>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub status: RideStatus,
    pub is_recurring: bool,
}

impl From<ride::Model> for RideSummary {
    fn from(ride: ride::Model) -> Self {
        Self {
            id: ride.id,
            driver_id: ride.driver_id,
            origin_name: ride.origin_name,
            destination_name: ride.destination_name,
            departure_time: ride.departure_time.with_timezone(&Utc),
            total_seats: ride.total_seats,
            available_seats: ride.available_seats,
            status: ride.status,
            is_recurring: ride.is_recurring,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResult {
    #[serde(flatten)]
    pub ride: RideSummary,
    pub driver_rating: f64,
}

#[derive(Debug, Serialize)]
pub struct BookingView {
    pub id: Uuid,
    pub pickup_point_name: String,
    pub status: BookingStatus,
    pub rider: Option<UserSummary>,
}

#[derive(Debug, Serialize)]
pub struct RideDetailsResponse {
    #[serde(flatten)]
    pub ride: RideSummary,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub driver: UserSummary,
    pub bookings: Vec<BookingView>,
    pub ratings_given_by_me: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct DriverLocationResponse {
    pub driver_id: Uuid,
    pub lat: f64,
    pub lng: f64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Offer a one-off ride
pub async fn create_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateRideRequest>,
) -> AppResult<(StatusCode, Json<CreatedRideResponse>)> {
    let departure_time = parse_timestamp(&payload.departure_time, state.config.service_offset)?;

    let ride = rides::create_ride(
        &state.db,
        claims.sub,
        rides::NewRide {
            origin: place(payload.origin_name, payload.origin_lat, payload.origin_lng),
            destination: place(
                payload.destination_name,
                payload.destination_lat,
                payload.destination_lng,
            ),
            departure_time,
            total_seats: payload.total_seats,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRideResponse {
            message: "Ride created successfully".to_string(),
            ride_id: ride.id,
        }),
    ))
}

/// Offer a ride on fixed weekdays; the coming week is materialized right away
pub async fn create_recurring_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateRecurringRequest>,
) -> AppResult<(StatusCode, Json<CreatedRecurringResponse>)> {
    let expanded = recurring::create_template(
        &state.db,
        claims.sub,
        recurring::NewTemplate {
            origin: place(payload.origin_name, payload.origin_lat, payload.origin_lng),
            destination: place(
                payload.destination_name,
                payload.destination_lat,
                payload.destination_lng,
            ),
            departure_time_of_day: payload.departure_time_of_day,
            days_of_week: payload.days_of_week,
            total_seats: payload.total_seats,
        },
        Utc::now(),
        state.config.service_offset,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedRecurringResponse {
            message: "Recurring ride created successfully".to_string(),
            recurring_ride_id: expanded.template.id,
            generated_rides_count: expanded.rides.len(),
        }),
    ))
}

/// Search bookable rides
pub async fn search(
    State(state): State<AppState>,
    AppQuery(filters): AppQuery<SearchFilters>,
) -> AppResult<Json<Vec<SearchResult>>> {
    let query = RideQuery::from_filters(&filters, state.config.service_offset)?;
    let hits = search_rides(&state.db, &query).await?;

    Ok(Json(
        hits.into_iter()
            .map(|hit| SearchResult {
                ride: hit.ride.into(),
                driver_rating: hit.driver_rating,
            })
            .collect(),
    ))
}

/// Ride details; signed-in callers also get the users they already rated on it
pub async fn get_ride(
    State(state): State<AppState>,
    Extension(MaybeClaims(claims)): Extension<MaybeClaims>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<RideDetailsResponse>> {
    let viewer = claims.map(|c| c.sub);
    let details = rides::ride_details(&state.db, ride_id, viewer).await?;
    let ride = details.ride;

    Ok(Json(RideDetailsResponse {
        origin_lat: ride.origin_lat,
        origin_lng: ride.origin_lng,
        destination_lat: ride.destination_lat,
        destination_lng: ride.destination_lng,
        ride: ride.into(),
        driver: details.driver.into(),
        bookings: details
            .bookings
            .into_iter()
            .map(|(booking, rider)| BookingView {
                id: booking.id,
                pickup_point_name: booking.pickup_point_name,
                status: booking.status,
                rider: rider.map(UserSummary::from),
            })
            .collect(),
        ratings_given_by_me: details.rated_by_viewer,
    }))
}

/// Driver moves the ride forward (in_progress, completed)
pub async fn update_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
    AppJson(payload): AppJson<UpdateRideRequest>,
) -> AppResult<Json<RideSummary>> {
    let status = payload
        .status
        .ok_or_else(|| AppError::Validation("status is required".to_string()))?;

    let ride = rides::update_ride_status(&state.db, ride_id, claims.sub, status).await?;
    Ok(Json(ride.into()))
}

pub async fn cancel_ride(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    rides::cancel_ride(&state.db, ride_id, claims.sub).await?;
    Ok(Json(MessageResponse::new(
        "Ride cancelled. A 1-star rating has been applied to your driver profile.",
    )))
}

pub async fn book_seat(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
    AppJson(payload): AppJson<BookSeatRequest>,
) -> AppResult<(StatusCode, Json<CreatedBookingResponse>)> {
    let pickup = place(
        payload.pickup_point_name,
        payload.pickup_point_lat,
        payload.pickup_point_lng,
    );
    let booking = bookings::book_seat(&state.db, ride_id, claims.sub, pickup).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedBookingResponse {
            message: "Seat booked successfully".to_string(),
            booking_id: booking.id,
        }),
    ))
}

pub async fn driver_location(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(ride_id): Path<Uuid>,
) -> AppResult<Json<DriverLocationResponse>> {
    let location = profiles::driver_location(&state.db, ride_id, claims.sub).await?;

    Ok(Json(DriverLocationResponse {
        driver_id: location.driver_id,
        lat: location.lat,
        lng: location.lng,
        updated_at: location.updated_at,
    }))
}

fn place(name: String, lat: Option<f64>, lng: Option<f64>) -> Place {
    Place { name, lat, lng }
}
