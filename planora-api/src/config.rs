/// Configuration management for the API server
///
/// Configuration is read from environment variables (a `.env` file is loaded
/// first when present) into a typed [`Config`].
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string, or `memory://` for the
///   in-process store (required)
/// - `JWT_SECRET`: session token signing key, at least 32 characters (required)
/// - `API_HOST` / `API_PORT`: bind address (default `0.0.0.0:3000`)
/// - `CORS_ORIGINS`: comma-separated origins, `*` for permissive (default `*`)
/// - `PRODUCTION`: marks session cookies `Secure` (default `false`)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default 10)
/// - `ACCESS_TOKEN_TTL_SECS` / `REFRESH_TOKEN_TTL_SECS`: token lifetimes
///   (default 24h / 30d)
/// - `ADMIN_SECRET_KEY`: key required for admin signup; unset disables it
/// - `SESSION_DISPLAY_PRECEDENCE` / `SESSION_AUTHORITY_PRECEDENCE`:
///   `local` or `federated` (defaults `federated` / `local`)
/// - `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`, `GOOGLE_REDIRECT_URL`:
///   enable Google sign-in when all three are set
/// - `POST_LOGIN_REDIRECT`: where the OAuth callback sends the browser
///   (default `/`)
///
/// # Example
///
/// ```no_run
/// use planora_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use planora_shared::auth::session::{Precedence, SessionPolicy};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// `DATABASE_URL` scheme that selects the in-memory store
pub const MEMORY_STORE_URL: &str = "memory://";

const MIN_JWT_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    pub session: SessionConfig,
    pub oauth: OAuthConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins (`*` = any)
    pub cors_origins: Vec<String>,

    /// Production mode: `Secure` cookies
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL or `memory://`
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url.starts_with(MEMORY_STORE_URL)
    }
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing key
    ///
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

/// Admin signup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Key required for `role = admin` signups; None disables admin signup
    pub secret_key: Option<String>,
}

/// Identity precedence when a request carries both a local and a federated session
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SessionConfig {
    pub display: Precedence,
    pub authority: Precedence,
}

impl SessionConfig {
    pub fn policy(&self) -> SessionPolicy {
        SessionPolicy {
            display: self.display,
            authority: self.authority,
        }
    }
}

/// Federated sign-in configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub google: Option<GoogleOAuthConfig>,

    /// Redirect target after a successful federated sign-in
    pub post_login_redirect: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

fn parse_or<T>(value: Option<String>, default: T, name: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} is invalid: {}", name, e)),
        None => Ok(default),
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key lookup (process env, a map in tests)
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let access_ttl_secs = parse_or(get("ACCESS_TOKEN_TTL_SECS"), 24 * 3600, "ACCESS_TOKEN_TTL_SECS")?;
        let refresh_ttl_secs =
            parse_or(get("REFRESH_TOKEN_TTL_SECS"), 30 * 24 * 3600, "REFRESH_TOKEN_TTL_SECS")?;
        if access_ttl_secs <= 0 || refresh_ttl_secs <= 0 {
            anyhow::bail!("token lifetimes must be positive");
        }

        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let google = match (
            get("GOOGLE_CLIENT_ID"),
            get("GOOGLE_CLIENT_SECRET"),
            get("GOOGLE_REDIRECT_URL"),
        ) {
            (Some(client_id), Some(client_secret), Some(redirect_url)) => Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                redirect_url,
            }),
            (None, None, None) => None,
            _ => anyhow::bail!(
                "GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_REDIRECT_URL must be set together"
            ),
        };

        Ok(Self {
            api: ApiConfig {
                host: get("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(get("API_PORT"), 3000, "API_PORT")?,
                cors_origins,
                production: parse_or(get("PRODUCTION"), false, "PRODUCTION")?,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: parse_or(get("DATABASE_MAX_CONNECTIONS"), 10, "DATABASE_MAX_CONNECTIONS")?,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                access_ttl_secs,
                refresh_ttl_secs,
            },
            admin: AdminConfig {
                secret_key: get("ADMIN_SECRET_KEY"),
            },
            session: SessionConfig {
                display: parse_or(
                    get("SESSION_DISPLAY_PRECEDENCE"),
                    Precedence::PreferFederated,
                    "SESSION_DISPLAY_PRECEDENCE",
                )?,
                authority: parse_or(
                    get("SESSION_AUTHORITY_PRECEDENCE"),
                    Precedence::PreferLocal,
                    "SESSION_AUTHORITY_PRECEDENCE",
                )?,
            },
            oauth: OAuthConfig {
                google,
                post_login_redirect: get("POST_LOGIN_REDIRECT").unwrap_or_else(|| "/".to_string()),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
