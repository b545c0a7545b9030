/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use planora_api::{app::AppState, config::Config};
/// use planora_shared::store::{DynStore, MemoryStore};
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let store: DynStore = Arc::new(MemoryStore::new());
/// let state = AppState::new(store, config, None);
/// let app = planora_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::session::session_layer};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use chrono::Duration;
use planora_shared::{
    accounts::AccountService,
    auth::jwt::TokenSigner,
    oauth::{FederatedSignIn, IdentityProvider},
    store::DynStore,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every field is an `Arc` or wraps one.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend (PostgreSQL or in-memory)
    pub store: DynStore,

    /// Application configuration
    pub config: Arc<Config>,

    /// Session token signer/verifier
    pub tokens: Arc<TokenSigner>,

    /// Password signup and login
    pub accounts: AccountService,

    /// Federated sign-in; None when no provider is configured
    pub federated: Option<FederatedSignIn>,
}

impl AppState {
    /// Creates new application state
    pub fn new(
        store: DynStore,
        config: Config,
        provider: Option<Arc<dyn IdentityProvider>>,
    ) -> Self {
        let tokens = TokenSigner::new(
            &config.jwt.secret,
            Duration::seconds(config.jwt.access_ttl_secs),
            Duration::seconds(config.jwt.refresh_ttl_secs),
        );
        let accounts = AccountService::new(store.clone(), config.admin.secret_key.clone());
        let federated = provider.map(|p| FederatedSignIn::new(store.clone(), p));

        Self {
            store,
            config: Arc::new(config),
            tokens: Arc::new(tokens),
            accounts,
            federated,
        }
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                          # Health check (public)
/// └── /v1/                             # API v1, session layer applied
///     ├── /auth
///     │   ├── POST /                   # signup | login
///     │   ├── POST /refresh
///     │   ├── GET  /session
///     │   ├── POST /logout
///     │   ├── GET  /oauth/google
///     │   └── GET  /oauth/google/callback
///     ├── /bookings
///     │   ├── GET | POST | PUT | DELETE /
///     │   └── PUT | DELETE /:id
///     ├── /messages
///     │   ├── POST /                   # public contact form
///     │   ├── GET  /                   # admin
///     │   └── PUT  /:id                # admin
///     └── GET /admin/stats             # admin
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Session resolution (`/v1` only)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let auth_routes = Router::new()
        .route("/", post(routes::auth::authenticate))
        .route("/refresh", post(routes::auth::refresh))
        .route("/session", get(routes::auth::session))
        .route("/logout", post(routes::auth::logout))
        .route("/oauth/google", get(routes::oauth::start))
        .route("/oauth/google/callback", get(routes::oauth::callback));

    let booking_routes = Router::new()
        .route(
            "/",
            get(routes::bookings::list_bookings)
                .post(routes::bookings::create_booking)
                .put(routes::bookings::update_booking_status)
                .delete(routes::bookings::delete_booking_by_query),
        )
        .route(
            "/:id",
            put(routes::bookings::update_booking_status_by_id)
                .delete(routes::bookings::delete_booking),
        );

    let message_routes = Router::new()
        .route(
            "/",
            get(routes::messages::list_messages).post(routes::messages::submit_message),
        )
        .route("/:id", put(routes::messages::update_message_status));

    let admin_routes = Router::new().route("/stats", get(routes::admin::stats));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .nest("/bookings", booking_routes)
        .nest("/messages", message_routes)
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn_with_state(state.clone(), session_layer));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}
