use axum::{extract::State, Extension, Json};

use crate::error::AppResult;
use crate::services::trip_patterns::{recommend_rides, Recommendation, DEFAULT_PATTERN_LIMIT};
use crate::utils::jwt::Claims;
use crate::AppState;

/// Upcoming rides on the routes the caller travels most
pub async fn pattern_recommendations(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<Recommendation>>> {
    let recommendations = recommend_rides(&state.db, claims.sub, DEFAULT_PATTERN_LIMIT).await?;
    Ok(Json(recommendations))
}
