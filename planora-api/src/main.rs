//! # Planora API Server
//!
//! Booking portal backend: password and Google sign-in, reconciled sessions,
//! bookings, contact messages and the admin dashboard.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=memory:// JWT_SECRET=$(openssl rand -hex 32) cargo run -p planora-api
//! ```
//!
//! Set `LOG_FORMAT=json` for structured log output.

use anyhow::Context;
use planora_api::{
    app::{build_router, AppState},
    config::Config,
};
use planora_shared::{
    auth::secret::fingerprint,
    db::{
        migrations::{ensure_database_exists, run_migrations},
        pool::{create_pool, DatabaseConfig},
    },
    oauth::{GoogleConfig, GoogleProvider, IdentityProvider},
    store::{DynStore, MemoryStore, PgStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "planora_api=debug,planora_shared=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Returns the shared store plus the PostgreSQL handle to close on shutdown
async fn open_store(config: &Config) -> anyhow::Result<(DynStore, Option<PgStore>)> {
    if config.database.is_memory() {
        tracing::warn!("Using the in-memory store; data is lost on shutdown");
        return Ok((Arc::new(MemoryStore::new()), None));
    }

    ensure_database_exists(&config.database.url)
        .await
        .context("failed to check or create the database")?;

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("failed to connect to PostgreSQL")?;

    run_migrations(&pool).await.context("failed to run migrations")?;

    let store = PgStore::new(pool);
    Ok((Arc::new(store.clone()), Some(store)))
}

fn identity_provider(config: &Config) -> anyhow::Result<Option<Arc<dyn IdentityProvider>>> {
    let Some(google) = &config.oauth.google else {
        tracing::info!("Google sign-in disabled (GOOGLE_CLIENT_ID not set)");
        return Ok(None);
    };

    let provider = GoogleProvider::new(GoogleConfig {
        client_id: google.client_id.clone(),
        client_secret: google.client_secret.clone(),
        redirect_url: google.redirect_url.clone(),
    })
    .context("invalid Google OAuth settings")?;

    Ok(Some(Arc::new(provider)))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        "Planora API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    match &config.admin.secret_key {
        Some(key) => tracing::info!(key_fingerprint = %fingerprint(key), "Admin signup enabled"),
        None => tracing::warn!("ADMIN_SECRET_KEY is not set; admin signup is disabled"),
    }

    let (store, pg_store) = open_store(&config).await?;
    let provider = identity_provider(&config)?;
    let addr = config.bind_address();

    tracing::info!(
        store = store.backend(),
        display = %config.session.display,
        authority = %config.session.authority,
        "Session precedence configured"
    );

    let app = build_router(AppState::new(store, config, provider));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(pg_store) = pg_store {
        pg_store.close().await;
    }

    tracing::info!("Server stopped");
    Ok(())
}
