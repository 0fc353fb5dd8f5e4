use axum::{extract::State, http::StatusCode, Extension, Json};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::user::{self, UserRole};
use crate::error::{AppError, AppResult};
use crate::handlers::extract::AppJson;
use crate::handlers::MessageResponse;
use crate::services::guards::find_user;
use crate::utils::jwt::{create_token, Claims, TokenKind};
use crate::utils::password::{check_strength, email_domain_allowed, hash_password, verify_password};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "fullName")]
    pub full_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn access_token(state: &AppState, user_id: Uuid, role: UserRole) -> AppResult<String> {
    create_token(
        user_id,
        role,
        TokenKind::Access,
        &state.config.jwt_secret,
        Duration::minutes(state.config.access_token_minutes),
    )
}

/// Register a new account. Everyone starts as a rider.
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let (Some(email), Some(password), Some(full_name)) = (
        required(payload.email),
        payload.password.filter(|p| !p.is_empty()),
        required(payload.full_name),
    ) else {
        return Err(AppError::Validation(
            "Email, password, and full name are required".to_string(),
        ));
    };
    let email = email.to_lowercase();

    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    if !email_domain_allowed(&email, &state.config.allowed_email_domains) {
        return Err(AppError::Validation(
            "Registration is limited to university email addresses".to_string(),
        ));
    }
    check_strength(&password)?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let new_user = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&password)?),
        full_name: Set(full_name),
        major: Set(None),
        year: Set(None),
        phone_number: Set(None),
        role: Set(UserRole::Rider),
        current_lat: Set(None),
        current_lng: Set(None),
        last_location_update: Set(None),
        avg_driver_rating: Set(5.0),
        driver_rating_count: Set(0),
        avg_rider_rating: Set(5.0),
        rider_rating_count: Set(0),
        created_at: Set(Utc::now().into()),
    };

    let user = new_user.insert(&state.db).await?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let (Some(email), Some(password)) = (required(payload.email), payload.password) else {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    };

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(email.to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let access_token = access_token(&state, user.id, user.role)?;
    let refresh_token = create_token(
        user.id,
        user.role,
        TokenKind::Refresh,
        &state.config.jwt_secret,
        Duration::days(state.config.refresh_token_days),
    )?;

    Ok(Json(AuthResponse {
        access_token,
        refresh_token,
        user: UserInfo {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            role: user.role,
        },
    }))
}

/// Exchange a refresh token for a new access token carrying the current role
pub async fn refresh(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<RefreshResponse>> {
    let user = find_user(&state.db, claims.sub)
        .await
        .map_err(|e| match e {
            AppError::NotFound(_) => AppError::Unauthorized("Account no longer exists".to_string()),
            other => other,
        })?;

    Ok(Json(RefreshResponse {
        access_token: access_token(&state, user.id, user.role)?,
    }))
}

/// Revoke the access token used for this request
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Json<MessageResponse> {
    state.blocklist.revoke(claims.jti, claims.exp);
    tracing::debug!(user_id = %claims.sub, revoked = state.blocklist.len(), "token revoked");

    Json(MessageResponse::new("Access token has been revoked"))
}
