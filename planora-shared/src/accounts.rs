/// Custom (password) account flows: signup and login
///
/// # Rules
///
/// - Email and username are normalized before storage and lookup
/// - Uniqueness is decided by the store insert alone; a collision surfaces as
///   [`AccountError::Duplicate`] naming the field
/// - `role = admin` requires the configured admin signup key; with no key
///   configured, admin signup is refused outright
/// - Login accepts either email or username and answers every failure with the
///   same [`AccountError::InvalidCredentials`]
///
/// # Example
///
/// ```no_run
/// use planora_shared::accounts::{AccountService, LoginRequest, SignupRequest};
/// use planora_shared::models::user::Role;
/// use planora_shared::store::{DynStore, MemoryStore};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: DynStore = Arc::new(MemoryStore::new());
/// let accounts = AccountService::new(store, None);
///
/// let user = accounts.signup(SignupRequest {
///     email: "a@x.com".to_string(),
///     username: "alice".to_string(),
///     password: "p1".to_string(),
///     role: Role::User,
///     ..Default::default()
/// }).await?;
///
/// let again = accounts.login(LoginRequest {
///     identifier: "alice".to_string(),
///     password: "p1".to_string(),
/// }).await?;
/// assert_eq!(user.id, again.id);
/// # Ok(())
/// # }
/// ```

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{burn_verification, hash_password, verify_password, PasswordError};
use crate::auth::secret::constant_time_eq;
use crate::models::user::{normalize_identifier, CreateUser, Role, User};
use crate::store::{DynStore, IdentityField, StoreError, UserStore};

/// Error type for account operations
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Email or username already taken
    #[error("A user with this {0} already exists")]
    Duplicate(IdentityField),

    /// Unknown identifier or wrong password (deliberately indistinguishable)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Admin signup without the correct key
    #[error("Invalid admin secret key")]
    AdminSecretRejected,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => AccountError::Duplicate(field),
            other => AccountError::Store(other),
        }
    }
}

/// Signup input
#[derive(Debug, Clone, Default)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub password: String,

    /// Display name; the username is used when absent or blank
    pub name: Option<String>,

    pub phone: String,
    pub address: String,
    pub role: Role,

    /// Out-of-band key required for `Role::Admin`
    pub secret_key: Option<String>,
}

/// Login input; `identifier` is an email or a username
#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub identifier: String,
    pub password: String,
}

/// Signup/login over a store
#[derive(Clone)]
pub struct AccountService {
    store: DynStore,
    admin_secret: Option<String>,
}

impl AccountService {
    /// `admin_secret = None` disables admin signup
    pub fn new(store: DynStore, admin_secret: Option<String>) -> Self {
        Self {
            store,
            admin_secret: admin_secret.filter(|s| !s.is_empty()),
        }
    }

    fn check_admin_secret(&self, supplied: Option<&str>) -> Result<(), AccountError> {
        match (self.admin_secret.as_deref(), supplied) {
            (Some(expected), Some(supplied)) if constant_time_eq(expected, supplied) => Ok(()),
            (None, _) => {
                warn!("Admin signup attempted but no admin secret key is configured");
                Err(AccountError::AdminSecretRejected)
            }
            _ => {
                warn!("Admin signup rejected: wrong secret key");
                Err(AccountError::AdminSecretRejected)
            }
        }
    }

    /// Creates a new account
    ///
    /// # Errors
    ///
    /// - `AdminSecretRejected` for an admin signup without the configured key
    /// - `Duplicate` if email or username is taken (no record is created)
    pub async fn signup(&self, req: SignupRequest) -> Result<User, AccountError> {
        if req.role.is_admin() {
            self.check_admin_secret(req.secret_key.as_deref())?;
        }

        let email = normalize_identifier(&req.email);
        let username = normalize_identifier(&req.username);
        let name = req
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| username.clone());

        let password_hash = hash_password(&req.password)?;

        let user = self
            .store
            .insert_user(CreateUser {
                email,
                username,
                name,
                password_hash,
                role: req.role,
                phone: req.phone.trim().to_string(),
                address: req.address.trim().to_string(),
            })
            .await
            .map_err(|e| {
                if let StoreError::Duplicate(field) = &e {
                    info!(field = %field, "Signup rejected: duplicate identity");
                }
                AccountError::from(e)
            })?;

        info!(user_id = %user.id, role = %user.role, "User created");
        Ok(user)
    }

    /// Authenticates by email-or-username and password
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for both an unknown identifier and a wrong password.
    pub async fn login(&self, req: LoginRequest) -> Result<User, AccountError> {
        let key = normalize_identifier(&req.identifier);

        let Some(user) = self.store.find_user_by_login(&key).await? else {
            burn_verification(&req.password);
            info!("Login failed: unknown identifier");
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password(&req.password, &user.password_hash)? {
            info!(user_id = %user.id, "Login failed: wrong password");
            return Err(AccountError::InvalidCredentials);
        }

        info!(user_id = %user.id, "Login succeeded");
        Ok(user)
    }

    /// Re-reads a user (token refresh picks up role changes)
    pub async fn reload(&self, user_id: Uuid) -> Result<Option<User>, AccountError> {
        Ok(self.store.find_user_by_id(user_id).await?)
    }
}
