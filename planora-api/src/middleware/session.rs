/// Session resolution middleware
///
/// Runs on every `/v1` request. The bearer token (password login) and the
/// `planora_session` cookie (federated sign-in) are probed independently and
/// fed into a [`Reconciler`]; the resolved [`Session`] is stored in the
/// request extensions for handlers to read through [`Caller`] or
/// `Extension<Session>`.
///
/// The middleware never rejects a request. Handlers decide whether an
/// identity is required. Client-set identity headers (`x-user-id`,
/// `x-is-admin`) are not read.
///
/// | Bearer token                      | Local probe event    |
/// |-----------------------------------|----------------------|
/// | absent                            | `LocalLoaded(None)`  |
/// | valid local access token          | `LocalLoaded(Some)`  |
/// | expired                           | `LocalLoaded(None)`  |
/// | malformed, forged, wrong source   | `LocalCorrupted`     |
///
/// | Session cookie                    | Federated probe event    |
/// |-----------------------------------|--------------------------|
/// | absent                            | `FederatedLoaded(None)`  |
/// | valid federated access token      | `FederatedLoaded(Some)`  |
/// | valid token, user no longer exists| `FederatedFailed`        |
/// | anything else                     | `FederatedFailed`        |
///
/// The federated identity is rebuilt from the stored user on every request,
/// so role and name changes take effect without signing in again.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use planora_shared::{
    accounts::AccountService,
    auth::{
        authorization::require_identity,
        identity::{AuthenticatedIdentity, IdentitySource},
        jwt::{TokenError, TokenSigner},
        session::{ClearTarget, Reconciler, SessionEvent, SessionView},
    },
};
use tracing::{debug, warn};

use crate::{app::AppState, error::ApiError};

/// Cookie carrying the federated access token
pub const SESSION_COOKIE: &str = "planora_session";

/// Builds the federated session cookie
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

/// Removal cookie matching [`session_cookie`]'s path
pub fn session_cookie_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Reconciled session for one request
#[derive(Debug, Clone)]
pub struct Session {
    reconciler: Reconciler,
}

impl Session {
    pub fn view(&self) -> Option<SessionView> {
        self.reconciler.view()
    }

    /// True when a bearer token was sent but could not be trusted
    pub fn local_rejected(&self) -> bool {
        self.reconciler.clears().contains(&ClearTarget::Local)
    }

    /// Runs sign-out on a copy of the reconciler and returns what to clear
    pub fn sign_out(&self) -> Vec<ClearTarget> {
        let mut reconciler = self.reconciler.clone();
        reconciler.apply(SessionEvent::SignOut);
        reconciler.clears().to_vec()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>, ()> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Some)
        .ok_or(())
}

fn probe_local(tokens: &TokenSigner, headers: &HeaderMap) -> SessionEvent {
    let token = match bearer_token(headers) {
        Ok(Some(token)) => token,
        Ok(None) => return SessionEvent::LocalLoaded(None),
        Err(()) => {
            debug!("Authorization header is not a bearer token");
            return SessionEvent::LocalCorrupted;
        }
    };

    match tokens.validate_access(token) {
        Ok(claims) if claims.source == IdentitySource::Local => {
            SessionEvent::LocalLoaded(Some(claims.identity()))
        }
        Ok(_) => {
            debug!("Bearer token carries a federated identity");
            SessionEvent::LocalCorrupted
        }
        Err(TokenError::Expired) => SessionEvent::LocalLoaded(None),
        Err(e) => {
            debug!(error = %e, "Bearer token rejected");
            SessionEvent::LocalCorrupted
        }
    }
}

/// Validates the session cookie, then reloads its user so role changes apply
/// on the next request
async fn probe_federated(
    tokens: &TokenSigner,
    accounts: &AccountService,
    jar: &CookieJar,
) -> SessionEvent {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return SessionEvent::FederatedLoaded(None);
    };

    let claims = match tokens.validate_access(cookie.value()) {
        Ok(claims) if claims.source == IdentitySource::Federated => claims,
        Ok(_) => return SessionEvent::FederatedFailed,
        Err(e) => {
            debug!(error = %e, "Session cookie rejected");
            return SessionEvent::FederatedFailed;
        }
    };

    match accounts.reload(claims.sub).await {
        Ok(Some(user)) => SessionEvent::FederatedLoaded(Some(AuthenticatedIdentity::from_user(
            &user,
            IdentitySource::Federated,
        ))),
        Ok(None) => {
            debug!(user_id = %claims.sub, "Session cookie names an unknown user");
            SessionEvent::FederatedFailed
        }
        Err(e) => {
            warn!(error = %e, user_id = %claims.sub, "Federated user reload failed; using cookie claims");
            SessionEvent::FederatedLoaded(Some(claims.identity()))
        }
    }
}

/// Resolves the request's session and clears a federated cookie that failed to load
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let mut reconciler = Reconciler::new(state.config.session.policy());
    reconciler.start();
    reconciler.apply(probe_local(&state.tokens, req.headers()));
    reconciler.apply(probe_federated(&state.tokens, &state.accounts, &jar).await);

    debug!(
        resolution = ?reconciler.resolution(),
        clears = ?reconciler.clears(),
        "Session resolved"
    );

    let clear_federated = reconciler.clears().contains(&ClearTarget::Federated);
    req.extensions_mut().insert(Session { reconciler });

    let response = next.run(req).await;

    // A handler that just issued a fresh session cookie wins over the clear
    let cookie_prefix = format!("{}=", SESSION_COOKIE);
    let reissued = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(&cookie_prefix));

    if clear_federated && !reissued {
        (jar.remove(session_cookie_removal()), response).into_response()
    } else {
        response
    }
}

/// Acting identity of an authenticated request
///
/// Rejects with 401 when the session resolved to no identity.
#[derive(Debug, Clone)]
pub struct Caller(pub AuthenticatedIdentity);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| ApiError::InternalError("session layer not installed".to_string()))?;

        let view = session.view();
        match require_identity(view.as_ref()) {
            Ok(identity) => Ok(Caller(identity.clone())),
            Err(_) if session.local_rejected() => Err(ApiError::Unauthorized(
                "Invalid or malformed bearer token".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}
