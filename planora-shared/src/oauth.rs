/// OAuth bridge: federated sign-in through an external identity provider
///
/// The provider proves who the visitor is; this module turns that proof into
/// a local [`User`]. The first sign-in for an unseen email provisions an
/// account with role `user` and a random password nobody knows. Later
/// sign-ins reuse the stored record, so role changes made locally apply to
/// federated sessions as well.
///
/// # Flow
///
/// 1. [`FederatedSignIn::begin`] returns the provider URL and a fresh `state`
/// 2. The provider redirects back with `code` + `state`; the caller checks
///    `state` against what it stored
/// 3. [`FederatedSignIn::complete`] exchanges the code and upserts the user
///
/// # Example
///
/// ```no_run
/// use planora_shared::oauth::{FederatedSignIn, GoogleConfig, GoogleProvider};
/// use planora_shared::store::{DynStore, MemoryStore};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: DynStore = Arc::new(MemoryStore::new());
/// let provider = GoogleProvider::new(GoogleConfig {
///     client_id: "id".to_string(),
///     client_secret: "secret".to_string(),
///     redirect_url: "http://localhost:3000/v1/auth/oauth/google/callback".to_string(),
/// })?;
///
/// let bridge = FederatedSignIn::new(store, Arc::new(provider));
/// let (url, state) = bridge.begin()?;
/// // redirect to `url`, remember `state`, then on callback:
/// let user = bridge.complete("code-from-callback").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use oauth2::{
    basic::BasicClient, reqwest::async_http_client, AuthUrl, AuthorizationCode, ClientId,
    ClientSecret, CsrfToken, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::password::{hash_password, PasswordError};
use crate::auth::secret::{random_alphanumeric, random_username_suffix, unusable_password};
use crate::models::user::{normalize_identifier, CreateUser, Role, User};
use crate::store::{DynStore, IdentityField, StoreError, UserStore};

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

/// Length of the CSRF `state` value
pub const STATE_LENGTH: usize = 32;

/// Attempts at finding a free username for a provisioned account
const MAX_USERNAME_ATTEMPTS: usize = 5;
const USERNAME_SUFFIX_LENGTH: usize = 4;
const USERNAME_MAX_LENGTH: usize = 48;

/// Error type for federated sign-in
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Provider credentials or URLs are unusable
    #[error("OAuth provider misconfigured: {0}")]
    Misconfigured(String),

    /// Code exchange with the provider failed
    #[error("Authorization code exchange failed: {0}")]
    Exchange(String),

    /// Provider profile missing or unacceptable
    #[error("Unusable provider profile: {0}")]
    Profile(String),

    /// No free username after several attempts
    #[error("Could not allocate a username for {0}")]
    UsernameExhausted(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the provider vouches for
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderProfile {
    pub email: String,

    #[serde(default)]
    pub email_verified: bool,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub picture: Option<String>,
}

/// An external identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &'static str;

    /// URL the browser is sent to, carrying `state`
    fn authorize_url(&self, state: &str) -> Result<Url, OAuthError>;

    /// Trades an authorization code for the visitor's profile
    async fn exchange(&self, code: &str) -> Result<ProviderProfile, OAuthError>;
}

/// Google OAuth client settings
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

/// Google authorization-code flow plus OpenID userinfo lookup
pub struct GoogleProvider {
    client: BasicClient,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Result<Self, OAuthError> {
        let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())
            .map_err(|e| OAuthError::Misconfigured(format!("auth url: {}", e)))?;
        let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())
            .map_err(|e| OAuthError::Misconfigured(format!("token url: {}", e)))?;
        let redirect_url = RedirectUrl::new(config.redirect_url)
            .map_err(|e| OAuthError::Misconfigured(format!("redirect url: {}", e)))?;

        let client = BasicClient::new(
            ClientId::new(config.client_id),
            Some(ClientSecret::new(config.client_secret)),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        Ok(Self {
            client,
            http: reqwest::Client::new(),
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorize_url(&self, state: &str) -> Result<Url, OAuthError> {
        let state = state.to_string();
        let (url, _) = self
            .client
            .authorize_url(move || CsrfToken::new(state))
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .url();

        Ok(url)
    }

    async fn exchange(&self, code: &str) -> Result<ProviderProfile, OAuthError> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        let profile = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| OAuthError::Exchange(format!("userinfo request: {}", e)))?
            .json::<ProviderProfile>()
            .await
            .map_err(|e| OAuthError::Profile(format!("userinfo body: {}", e)))?;

        debug!(provider = "google", "Fetched userinfo");
        Ok(profile)
    }
}

/// Username candidate from an email's local part, restricted to `[a-z0-9_.-]`
pub fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();

    let cleaned: String = local
        .to_ascii_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' | '.' | '-' => c,
            _ => '_',
        })
        .take(USERNAME_MAX_LENGTH)
        .collect();

    if cleaned.is_empty() {
        "guest".to_string()
    } else {
        cleaned
    }
}

/// Finds the user for `profile`, creating one on first sign-in
///
/// A concurrent first sign-in for the same email loses the insert race with a
/// duplicate-email error; that case re-reads and returns the winner's record.
pub async fn provision_federated(
    store: &DynStore,
    profile: &ProviderProfile,
) -> Result<User, OAuthError> {
    let email = normalize_identifier(&profile.email);
    if email.is_empty() || !email.contains('@') {
        return Err(OAuthError::Profile("provider returned no usable email".to_string()));
    }
    if !profile.email_verified {
        return Err(OAuthError::Profile("provider email is not verified".to_string()));
    }

    if let Some(user) = store.find_user_by_email(&email).await? {
        debug!(user_id = %user.id, "Federated sign-in for existing user");
        return Ok(user);
    }

    let password_hash = hash_password(&unusable_password())?;
    let base = username_from_email(&email);

    for attempt in 0..MAX_USERNAME_ATTEMPTS {
        let username = if attempt == 0 {
            base.clone()
        } else {
            format!("{}-{}", base, random_username_suffix(USERNAME_SUFFIX_LENGTH))
        };
        let name = profile
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .unwrap_or_else(|| username.clone());

        let insert = store
            .insert_user(CreateUser {
                email: email.clone(),
                username,
                name,
                password_hash: password_hash.clone(),
                role: Role::User,
                phone: String::new(),
                address: String::new(),
            })
            .await;

        match insert {
            Ok(user) => {
                info!(user_id = %user.id, username = %user.username, "Provisioned federated user");
                return Ok(user);
            }
            Err(StoreError::Duplicate(IdentityField::Email)) => {
                debug!("Concurrent federated provisioning, re-reading existing user");
                return store.find_user_by_email(&email).await?.ok_or_else(|| {
                    OAuthError::Store(StoreError::Unavailable(
                        "user vanished after duplicate email".to_string(),
                    ))
                });
            }
            Err(StoreError::Duplicate(IdentityField::Username)) => {
                debug!(attempt, "Username taken, retrying with suffix");
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!("Gave up allocating a username for a federated user");
    Err(OAuthError::UsernameExhausted(base))
}

/// Federated sign-in over one provider and the store
#[derive(Clone)]
pub struct FederatedSignIn {
    store: DynStore,
    provider: Arc<dyn IdentityProvider>,
}

impl FederatedSignIn {
    pub fn new(store: DynStore, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { store, provider }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Provider URL and the `state` value the callback must echo
    pub fn begin(&self) -> Result<(Url, String), OAuthError> {
        let state = random_alphanumeric(STATE_LENGTH);
        let url = self.provider.authorize_url(&state)?;
        Ok((url, state))
    }

    /// Exchanges `code` and returns the matching (possibly new) user
    pub async fn complete(&self, code: &str) -> Result<User, OAuthError> {
        let profile = self.provider.exchange(code).await?;
        provision_federated(&self.store, &profile).await
    }
}
