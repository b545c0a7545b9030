/// Normalized identity shared by both sign-in paths
///
/// Password logins and federated (OAuth) sign-ins both end up as an
/// [`AuthenticatedIdentity`] tagged with where it came from. Authorization
/// checks only ever look at this record, never at raw tokens or headers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::user::{Role, User};

/// Origin of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentitySource {
    /// Email/username + password flow owned by this service
    Local,

    /// External identity provider (Google OAuth)
    Federated,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::Local => "local",
            IdentitySource::Federated => "federated",
        }
    }
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is authenticated, independent of how
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedIdentity {
    pub user_id: Uuid,

    /// Normalized email; the ownership key for bookings
    pub email: String,

    pub display_name: String,

    pub role: Role,

    pub source: IdentitySource,
}

impl AuthenticatedIdentity {
    /// Builds the identity for a stored user signed in through `source`
    pub fn from_user(user: &User, source: IdentitySource) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            display_name: user.name.clone(),
            role: user.role,
            source,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
