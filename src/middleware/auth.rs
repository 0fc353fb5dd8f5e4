use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::{AppError, AppResult};
use crate::utils::jwt::{verify_token, Claims, TokenKind};
use crate::AppState;

/// Claims of the caller on routes where authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeClaims(pub Option<Claims>);

fn authenticate(state: &AppState, token: &str, kind: TokenKind) -> AppResult<Claims> {
    let claims = verify_token(token, &state.config.jwt_secret)?;

    if claims.kind != kind {
        return Err(AppError::Unauthorized("Wrong token type".to_string()));
    }

    if state.blocklist.is_revoked(&claims.jti) {
        return Err(AppError::Unauthorized("Token has been revoked".to_string()));
    }

    Ok(claims)
}

fn missing_token() -> AppError {
    AppError::Unauthorized("Missing bearer token".to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Extract and validate an access token from the Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(auth) = auth.ok_or_else(missing_token)?;
    let claims = authenticate(&state, auth.token(), TokenKind::Access)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Same as [`auth_middleware`] but only accepts refresh tokens
pub async fn refresh_auth_middleware(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let TypedHeader(auth) = auth.ok_or_else(missing_token)?;
    let claims = authenticate(&state, auth.token(), TokenKind::Refresh)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Attach the caller's claims when a valid access token is present; anonymous otherwise
pub async fn optional_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let claims = bearer_token(request.headers())
        .and_then(|token| authenticate(&state, token, TokenKind::Access).ok());
    request.extensions_mut().insert(MaybeClaims(claims));
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic Zm9v"));
        assert_eq!(bearer_token(&headers), None);
    }
}
