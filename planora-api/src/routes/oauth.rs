/// Federated sign-in endpoints (Google)
///
/// # Endpoints
///
/// - `GET /v1/auth/oauth/google` - 302 to the provider with a CSRF state cookie
/// - `GET /v1/auth/oauth/google/callback?code&state` - provisions the user,
///   sets the `planora_session` cookie and 302s to `POST_LOGIN_REDIRECT`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::session_cookie,
};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use planora_shared::{
    auth::{
        identity::{AuthenticatedIdentity, IdentitySource},
        jwt::TokenType,
        secret::constant_time_eq,
    },
    oauth::FederatedSignIn,
};
use serde::Deserialize;
use tracing::{info, warn};

/// Cookie holding the `state` value between redirect and callback
pub const STATE_COOKIE: &str = "planora_oauth_state";

const CALLBACK_PATH: &str = "/v1/auth/oauth/google/callback";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,

    /// Set by the provider when the user declines consent
    pub error: Option<String>,
}

fn provider(state: &AppState) -> ApiResult<&FederatedSignIn> {
    state
        .federated
        .as_ref()
        .ok_or_else(|| ApiError::NotFound("Federated sign-in is not configured".to_string()))
}

fn found(location: &str) -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())])
}

/// Redirects the browser to the provider's consent page
pub async fn start(State(state): State<AppState>, jar: CookieJar) -> ApiResult<impl IntoResponse> {
    let federated = provider(&state)?;
    let (url, csrf_state) = federated.begin()?;

    let cookie = Cookie::build((STATE_COOKIE, csrf_state))
        .path(CALLBACK_PATH)
        .http_only(true)
        .secure(state.config.api.production)
        .same_site(SameSite::Lax)
        .build();

    info!(provider = federated.provider_name(), "Federated sign-in started");

    Ok((jar.add(cookie), found(url.as_str())))
}

/// Provider callback
///
/// # Errors
///
/// - `400 Bad Request`: missing `code`
/// - `403 Forbidden`: state mismatch, consent declined, or unverified email
/// - `502 Bad Gateway`: code exchange or profile fetch failed
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    params: Result<Query<CallbackParams>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let federated = provider(&state)?;
    let Query(params) = params?;

    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let state_ok = match (expected.as_deref(), params.state.as_deref()) {
        (Some(expected), Some(supplied)) => constant_time_eq(expected, supplied),
        _ => false,
    };
    if !state_ok {
        warn!("Federated callback rejected: state mismatch");
        return Err(ApiError::Forbidden("OAuth state mismatch".to_string()));
    }

    if let Some(error) = params.error {
        info!(error = %error, "Federated sign-in declined at provider");
        return Err(ApiError::Forbidden(format!("Sign-in was not completed: {}", error)));
    }

    let code = params
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let user = federated.complete(&code).await?;
    let identity = AuthenticatedIdentity::from_user(&user, IdentitySource::Federated);
    let token = state.tokens.issue(&identity, TokenType::Access)?;

    info!(
        user_id = %user.id,
        provider = federated.provider_name(),
        "Federated sign-in completed"
    );

    let jar = jar
        .remove(Cookie::build(STATE_COOKIE).path(CALLBACK_PATH).build())
        .add(session_cookie(token, state.config.api.production));

    Ok((jar, found(&state.config.oauth.post_login_redirect)))
}
