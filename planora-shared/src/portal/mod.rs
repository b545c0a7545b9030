/// Booking, message and admin operations behind the authorization gate
///
/// Each operation takes the acting identity chosen by the session reconciler
/// (or none, for the public contact form) and applies the role and ownership
/// rules from [`crate::auth::authorization`] before touching the store.
///
/// # Modules
///
/// - [`bookings`]: list, create, change status, delete
/// - [`messages`]: public submission, admin listing and read status
/// - [`stats`]: admin dashboard aggregates

pub mod bookings;
pub mod messages;
pub mod stats;

use crate::auth::authorization::AuthzError;
use crate::store::StoreError;

/// Error type for portal operations
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    /// Target record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}
