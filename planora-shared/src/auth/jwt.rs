/// Signed session tokens
///
/// Every authenticated request is identified by an HS256 JWT minted by this
/// service. The token carries the normalized identity (user id, email, display
/// name, role, source), so handlers read role and ownership key from a
/// verified payload and never from client-settable headers.
///
/// # Token Types
///
/// - **Access**: short-lived (default 24h), sent as `Authorization: Bearer`
///   for local logins or stored in the `planora_session` cookie for federated
///   sign-ins
/// - **Refresh**: long-lived (default 30d), only accepted by the refresh route
///
/// # Validation
///
/// Signature, `exp`, `nbf` and issuer (`planora`) are checked on every decode.
///
/// # Example
///
/// ```
/// use planora_shared::auth::identity::{AuthenticatedIdentity, IdentitySource};
/// use planora_shared::auth::jwt::{TokenSigner, TokenType};
/// use planora_shared::models::user::Role;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let signer = TokenSigner::new(
///     "a-secret-that-is-at-least-32-bytes-long",
///     Duration::hours(24),
///     Duration::days(30),
/// );
///
/// let identity = AuthenticatedIdentity {
///     user_id: Uuid::new_v4(),
///     email: "a@x.com".to_string(),
///     display_name: "Alice".to_string(),
///     role: Role::User,
///     source: IdentitySource::Local,
/// };
///
/// let token = signer.issue(&identity, TokenType::Access)?;
/// let claims = signer.validate_access(&token)?;
/// assert_eq!(claims.identity(), identity);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identity::{AuthenticatedIdentity, IdentitySource};
use crate::models::user::Role;

/// Issuer written into and required from every token
pub const ISSUER: &str = "planora";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to encode a token
    #[error("Failed to create token: {0}")]
    Create(String),

    /// Signature, issuer, structure or `nbf` check failed
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// Token is past its `exp`
    #[error("Token has expired")]
    Expired,

    /// Refresh token presented where an access token is required, or vice versa
    #[error("Expected {expected} token, got {actual} token")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims
///
/// Standard claims (`sub`, `iss`, `iat`, `nbf`, `exp`) plus the identity
/// fields needed by the authorization gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "planora"
    pub iss: String,

    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,

    pub email: String,
    pub name: String,
    pub role: Role,
    pub source: IdentitySource,
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims for `identity` valid for `expires_in` from now
    pub fn for_identity(
        identity: &AuthenticatedIdentity,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: identity.user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            email: identity.email.clone(),
            name: identity.display_name.clone(),
            role: identity.role,
            source: identity.source,
            token_type,
        }
    }

    /// The identity this token vouches for
    pub fn identity(&self) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            user_id: self.sub,
            email: self.email.clone(),
            display_name: self.name.clone(),
            role: self.role,
            source: self.source,
        }
    }
}

/// Access + refresh token pair returned by local sign-in
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Signs and verifies session tokens with one shared secret
///
/// Built once at startup from `JWT_SECRET` and the configured lifetimes.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    fn ttl(&self, token_type: TokenType) -> Duration {
        match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        }
    }

    /// Encodes already-built claims
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Create(format!("Token encoding failed: {}", e)))
    }

    /// Mints a token of `token_type` for `identity` with the configured lifetime
    pub fn issue(
        &self,
        identity: &AuthenticatedIdentity,
        token_type: TokenType,
    ) -> Result<String, TokenError> {
        self.sign(&Claims::for_identity(identity, token_type, self.ttl(token_type)))
    }

    /// Mints an access + refresh pair
    pub fn issue_pair(&self, identity: &AuthenticatedIdentity) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue(identity, TokenType::Access)?,
            refresh_token: self.issue(identity, TokenType::Refresh)?,
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// Verifies signature, issuer and time claims
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidIssuer => TokenError::Invalid("wrong issuer".to_string()),
                _ => TokenError::Invalid(e.to_string()),
            })
    }

    pub fn validate_access(&self, token: &str) -> Result<Claims, TokenError> {
        Self::expect_type(self.validate(token)?, TokenType::Access)
    }

    pub fn validate_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        Self::expect_type(self.validate(token)?, TokenType::Refresh)
    }

    fn expect_type(claims: Claims, expected: TokenType) -> Result<Claims, TokenError> {
        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected: expected.as_str(),
                actual: claims.token_type.as_str(),
            });
        }
        Ok(claims)
    }
}
