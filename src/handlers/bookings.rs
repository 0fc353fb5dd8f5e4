use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::MessageResponse;
use crate::services::bookings;
use crate::utils::jwt::Claims;
use crate::AppState;

/// Rider gives up their seat; within an hour of departure this costs a rating penalty
pub async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(booking_id): Path<Uuid>,
) -> AppResult<Json<MessageResponse>> {
    let cancelled = bookings::cancel_booking(&state.db, booking_id, claims.sub, Utc::now()).await?;
    Ok(Json(MessageResponse::new(cancelled.message())))
}
