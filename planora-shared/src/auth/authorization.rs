/// Authorization gate
///
/// Checks applied inside every protected data operation. They operate on the
/// *acting* identity chosen by the session reconciler, which in turn comes
/// from verified tokens only.
///
/// # Rules
///
/// 1. **Identity**: protected operations need an acting identity (`Unauthorized`)
/// 2. **Role**: admin-only operations need `role == admin` (`Forbidden`)
/// 3. **Ownership**: booking deletion needs the stored owner email to equal the
///    acting identity's email (`Forbidden`)
///
/// # Example
///
/// ```
/// use planora_shared::auth::authorization::{require_admin, require_ownership, AuthzError};
/// use planora_shared::auth::identity::{AuthenticatedIdentity, IdentitySource};
/// use planora_shared::models::user::Role;
/// use uuid::Uuid;
///
/// let caller = AuthenticatedIdentity {
///     user_id: Uuid::new_v4(),
///     email: "a@x.com".to_string(),
///     display_name: "Alice".to_string(),
///     role: Role::User,
///     source: IdentitySource::Local,
/// };
///
/// assert!(require_ownership(&caller, "a@x.com").is_ok());
/// assert!(matches!(require_ownership(&caller, "b@x.com"), Err(AuthzError::NotOwner)));
/// assert!(matches!(require_admin(&caller), Err(AuthzError::AdminRequired)));
/// ```

use super::identity::AuthenticatedIdentity;
use super::session::SessionView;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthzError {
    /// No identity claim on the request
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller is not an admin
    #[error("Admin access required")]
    AdminRequired,

    /// Caller does not own the resource
    #[error("Not authorized to modify this resource")]
    NotOwner,
}

/// Returns the acting identity or `Unauthenticated`
pub fn require_identity(view: Option<&SessionView>) -> Result<&AuthenticatedIdentity, AuthzError> {
    view.map(|v| &v.acting).ok_or(AuthzError::Unauthenticated)
}

pub fn require_admin(identity: &AuthenticatedIdentity) -> Result<(), AuthzError> {
    if !identity.is_admin() {
        return Err(AuthzError::AdminRequired);
    }
    Ok(())
}

/// Checks that `owner_email` is the caller's ownership key
///
/// Both sides are normalized at write time, so plain equality is enough.
pub fn require_ownership(identity: &AuthenticatedIdentity, owner_email: &str) -> Result<(), AuthzError> {
    if identity.email != owner_email {
        return Err(AuthzError::NotOwner);
    }
    Ok(())
}

/// Owner filter for listings: admins see everything, others only their own
pub fn listing_scope(identity: &AuthenticatedIdentity) -> Option<&str> {
    if identity.is_admin() {
        None
    } else {
        Some(identity.email.as_str())
    }
}
