use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::entities::rating::RatingType;
use crate::error::AppResult;
use crate::handlers::extract::AppJson;
use crate::services::ratings::{self, SubmitRating};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub message: String,
    pub rating_id: Uuid,
    pub rating_type: RatingType,
}

pub async fn submit_rating(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<SubmitRating>,
) -> AppResult<(StatusCode, Json<RatingResponse>)> {
    let rating = ratings::submit_rating(&state.db, claims.sub, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(RatingResponse {
            message: "Rating submitted successfully".to_string(),
            rating_id: rating.id,
            rating_type: rating.rating_type,
        }),
    ))
}
