/// Authentication endpoints
///
/// Password signup/login share one endpoint dispatched on `action`; the
/// remaining endpoints work on whatever session the request carries.
///
/// # Endpoints
///
/// - `POST /v1/auth` - `{"action": "signup" | "login", ...}`
/// - `POST /v1/auth/refresh` - Exchange a refresh token for a new access token
/// - `GET /v1/auth/session` - Reconciled session view
/// - `POST /v1/auth/logout` - Drop the federated session cookie

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::{session_cookie_removal, Session},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use planora_shared::{
    accounts::{LoginRequest, SignupRequest},
    auth::{
        authorization::require_identity,
        identity::{AuthenticatedIdentity, IdentitySource},
        jwt::TokenType,
        session::{ClearTarget, SessionView},
    },
    models::user::{Role, User},
};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::info;
use uuid::Uuid;
use validator::{Validate, ValidationError};

const MAX_USERNAME_LEN: usize = 64;

/// Usernames are limited to `[a-z0-9_.-]` (case-insensitive, stored lowercased)
fn validate_username(username: &str) -> Result<(), ValidationError> {
    let username = username.trim();
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(Cow::Borrowed(
            "Username must be 1-64 characters of a-z, 0-9, '_', '.', '-'",
        )))
    }
}

/// Body of `POST /v1/auth`
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum AuthRequest {
    Signup(SignupBody),
    Login(LoginBody),
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(custom(function = "validate_username"))]
    pub username: String,

    #[validate(length(min = 1, max = 1024, message = "Password must be 1-1024 characters"))]
    pub password: String,

    /// Display name; defaults to the username
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    pub phone: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub role: Role,

    /// Required when `role` is `admin`
    pub secret_key: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginBody {
    /// Email or username
    #[serde(alias = "identifier", alias = "emailOrUsername")]
    #[validate(length(min = 1, message = "Email or username is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Profile plus local session tokens
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub name: String,
    pub role: Role,
    pub phone: String,
    pub address: String,
    pub access_token: String,
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

fn auth_response(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let identity = AuthenticatedIdentity::from_user(&user, IdentitySource::Local);
    let tokens = state.tokens.issue_pair(&identity)?;

    Ok(AuthResponse {
        user_id: user.id,
        email: user.email,
        username: user.username,
        name: user.name,
        role: user.role,
        phone: user.phone,
        address: user.address,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
    })
}

/// Signup or login, dispatched on `action`
///
/// # Endpoint
///
/// ```text
/// POST /v1/auth
/// Content-Type: application/json
///
/// {"action": "signup", "email": "a@x.com", "username": "alice", "password": "p1",
///  "role": "user"}
///
/// {"action": "login", "email": "alice", "password": "p1"}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: unknown action or malformed body
/// - `422 Unprocessable Entity`: validation failed
/// - `409 Conflict`: email or username taken (signup)
/// - `403 Forbidden`: admin signup with a wrong or unconfigured secret key
/// - `401 Unauthorized`: invalid credentials (login)
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(request) = payload?;

    match request {
        AuthRequest::Signup(body) => {
            body.validate()?;

            let user = state
                .accounts
                .signup(SignupRequest {
                    email: body.email,
                    username: body.username,
                    password: body.password,
                    name: body.name,
                    phone: body.phone,
                    address: body.address,
                    role: body.role,
                    secret_key: body.secret_key,
                })
                .await?;

            Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
        }
        AuthRequest::Login(body) => {
            body.validate()?;

            let user = state
                .accounts
                .login(LoginRequest {
                    identifier: body.email,
                    password: body.password,
                })
                .await?;

            Ok((StatusCode::OK, Json(auth_response(&state, user)?)))
        }
    }
}

/// Refresh endpoint
///
/// The user is re-read so a role change since the last login takes effect.
/// The identity source of the refresh token is kept.
///
/// # Errors
///
/// - `401 Unauthorized`: invalid, expired or non-refresh token, or the account is gone
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshResponse>> {
    let Json(req) = payload?;

    let claims = state.tokens.validate_refresh(&req.refresh_token)?;

    let user = state
        .accounts
        .reload(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

    let identity = AuthenticatedIdentity::from_user(&user, claims.source);
    let access_token = state.tokens.issue(&identity, TokenType::Access)?;

    info!(user_id = %user.id, role = %user.role, "Access token refreshed");

    Ok(Json(RefreshResponse {
        access_token,
        expires_in: state.tokens.access_ttl().num_seconds(),
    }))
}

/// Current reconciled session
///
/// Returns `{resolution, display, acting}`, or 401 when no identity resolved.
pub async fn session(Extension(session): Extension<Session>) -> ApiResult<Json<SessionView>> {
    let view = session.view();
    if let Err(e) = require_identity(view.as_ref()) {
        if session.local_rejected() {
            return Err(ApiError::Unauthorized(
                "Invalid or malformed bearer token".to_string(),
            ));
        }
        return Err(e.into());
    }

    view.map(Json)
        .ok_or_else(|| ApiError::InternalError("resolved identity without a view".to_string()))
}

/// Sign-out
///
/// Clears the federated session cookie. Local tokens are held by the client,
/// which drops them on a 204.
pub async fn logout(Extension(session): Extension<Session>, jar: CookieJar) -> impl IntoResponse {
    if let Some(view) = session.view() {
        info!(user_id = %view.acting.user_id, "User signed out");
    }

    let jar = if session.sign_out().contains(&ClearTarget::Federated) {
        jar.remove(session_cookie_removal())
    } else {
        jar
    };

    (jar, StatusCode::NO_CONTENT)
}
