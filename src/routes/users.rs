// SPDX-License-Identifier: MIT

//! User account routes: registration, login, token refresh, logout,
//! password change and current-user lookup.

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::config::Config;
use crate::db::NewUser;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{normalize_identifier, PublicUser};
use crate::response::ApiResponse;
use crate::services::password::hash_password;
use crate::services::TokenPair;
use crate::AppState;

/// Routes that need no prior authentication.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
}

/// Routes guarded by the auth middleware (applied in routes/mod.rs).
pub fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/me", get(me))
}

// ─── Registration ────────────────────────────────────────────

/// Text fields of the registration form.
#[derive(Debug, Validate)]
struct RegisterFields {
    #[validate(length(min = 1, message = "Username is required"))]
    username: String,
    #[validate(email(message = "Email must be a valid address"))]
    email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    password: String,
    #[validate(length(min = 1, message = "Full name is required"))]
    full_name: String,
}

/// One uploaded file: original name (for the extension) plus content.
struct Upload {
    file_name: Option<String>,
    bytes: Vec<u8>,
}

/// Register a new user from a multipart form.
///
/// Field order in the form does not matter; everything is collected first,
/// then validated, then written. Media files are only stored once the text
/// fields have passed validation.
async fn register(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut username = None;
    let mut email = None;
    let mut password = None;
    let mut full_name = None;
    let mut avatar: Option<Upload> = None;
    let mut cover_image: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::Validation("Malformed multipart request".to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "username" => username = Some(read_text(field).await?),
            "email" => email = Some(read_text(field).await?),
            "password" => password = Some(read_text(field).await?),
            "fullName" => full_name = Some(read_text(field).await?),
            "avatar" => avatar = Some(read_file(field).await?),
            "coverImage" => cover_image = Some(read_file(field).await?),
            _ => {} // unknown parts are ignored
        }
    }

    let fields = RegisterFields {
        username: normalize_identifier(&username.unwrap_or_default()),
        email: normalize_identifier(&email.unwrap_or_default()),
        password: password.unwrap_or_default(),
        full_name: full_name.map(|s| s.trim().to_string()).unwrap_or_default(),
    };
    fields
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let avatar = avatar.ok_or_else(|| AppError::Validation("Avatar file is required".to_string()))?;

    let avatar_ref = state
        .media
        .save(avatar.file_name.as_deref(), &avatar.bytes)
        .await?;
    let cover_ref = match cover_image {
        Some(upload) => Some(state.media.save(upload.file_name.as_deref(), &upload.bytes).await?),
        None => None,
    };

    let password_hash = hash_password(&fields.password)?;
    let user = state.store.create_user(NewUser {
        username: fields.username,
        email: fields.email,
        password_hash,
        full_name: fields.full_name,
        avatar: avatar_ref,
        cover_image: cover_ref,
    })?;

    tracing::info!(username = %user.username, "User registered");

    Ok(ApiResponse::created(
        PublicUser::from(&user),
        "User registered successfully",
    ))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|_| AppError::Validation("Malformed multipart field".to_string()))
}

async fn read_file(field: axum::extract::multipart::Field<'_>) -> Result<Upload> {
    let file_name = field.file_name().map(str::to_string);
    let bytes = field
        .bytes()
        .await
        .map_err(|_| AppError::Validation("Malformed multipart file".to_string()))?;
    Ok(Upload {
        file_name,
        bytes: bytes.to_vec(),
    })
}

// ─── Login / Refresh ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    email: Option<String>,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    user: PublicUser,
    access_token: String,
    refresh_token: String,
}

/// Log in with username or email plus password. Sets both token cookies.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let session = state.sessions.login(
        body.username.as_deref(),
        body.email.as_deref(),
        &body.password,
    )?;

    let jar = add_token_cookies(jar, &state.config, &session.tokens);
    let body = LoginResponse {
        user: session.user,
        access_token: session.tokens.access_token,
        refresh_token: session.tokens.refresh_token,
    };

    Ok((jar, ApiResponse::ok(body, "User logged in successfully")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
    refresh_token: String,
}

/// Exchange a refresh token for a new pair. The token comes from the
/// `refreshToken` cookie or the JSON body, in that preference order.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse> {
    // The body is optional, so it is parsed leniently rather than through
    // the Json extractor (which rejects empty bodies outright).
    let presented = jar
        .get("refreshToken")
        .map(|cookie| cookie.value().to_string())
        .or_else(|| {
            serde_json::from_slice::<RefreshRequest>(&body)
                .ok()
                .and_then(|b| b.refresh_token)
        })
        .ok_or(AppError::Unauthenticated)?;

    let pair = state.sessions.refresh(&presented)?;

    let jar = add_token_cookies(jar, &state.config, &pair);
    let body = RefreshResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    };

    Ok((jar, ApiResponse::ok(body, "Access token refreshed")))
}

// ─── Logout / Password / Profile ─────────────────────────────

/// Log out: clear the stored refresh token and both cookies.
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse> {
    state.sessions.logout(user.id)?;

    let jar = jar
        .remove(Cookie::build(("accessToken", "")).path("/").build())
        .remove(Cookie::build(("refreshToken", "")).path("/").build());

    Ok((jar, ApiResponse::ok((), "User logged out successfully")))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Old password is required"))]
    old_password: String,
    #[validate(length(min = 1, message = "New password is required"))]
    new_password: String,
}

/// Change the current user's password.
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse> {
    body.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    match state
        .sessions
        .change_password(user.id, &body.old_password, &body.new_password)
    {
        // The HTTP contract reports a wrong old password as a 400.
        Err(AppError::Unauthenticated) => Err(AppError::Validation(
            "Old password is incorrect".to_string(),
        )),
        other => other,
    }?;

    Ok(ApiResponse::ok((), "Password changed successfully"))
}

/// Current authenticated user's sanitized profile.
async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Result<impl IntoResponse> {
    Ok(ApiResponse::ok(user, "Current user fetched successfully"))
}

// ─── Cookies ─────────────────────────────────────────────────

/// Attach both token cookies with the standard attributes.
fn add_token_cookies(jar: CookieJar, config: &Config, pair: &TokenPair) -> CookieJar {
    jar.add(auth_cookie(
        "accessToken",
        pair.access_token.clone(),
        config.access_token_ttl_secs,
        config.cookie_secure,
    ))
    .add(auth_cookie(
        "refreshToken",
        pair.refresh_token.clone(),
        config.refresh_token_ttl_secs,
        config.cookie_secure,
    ))
}

fn auth_cookie(
    name: &'static str,
    value: String,
    max_age_secs: i64,
    secure: bool,
) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(time::Duration::seconds(max_age_secs));
    cookie
}
