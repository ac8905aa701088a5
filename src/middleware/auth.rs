// SPDX-License-Identifier: MIT

//! JWT authentication middleware.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::PublicUser;
use crate::AppState;

/// Sanitized identity attached to authenticated requests.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

/// Middleware that requires a valid access token.
///
/// Verification is stateless except for the existence check: a token for a
/// user that no longer exists is rejected, but logout does not revoke
/// still-unexpired access tokens.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Try cookie first, then header
    let token = if let Some(cookie) = jar.get("accessToken") {
        cookie.value().to_string()
    } else {
        let auth_header = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        match auth_header {
            Some(h) if h.starts_with("Bearer ") => h[7..].to_string(),
            _ => return Err(AppError::Unauthenticated),
        }
    };

    let claims = state.tokens.verify_access(&token)?;
    let user_id: Uuid = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;

    let user = state
        .store
        .find_by_id(user_id)
        .ok_or(AppError::InvalidToken)?;

    request
        .extensions_mut()
        .insert(CurrentUser(PublicUser::from(&user)));

    Ok(next.run(request).await)
}
