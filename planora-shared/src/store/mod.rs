/// Storage abstraction for users, bookings and messages
///
/// Services never talk to a database driver directly. They take a [`Store`]
/// (usually as [`DynStore`]) so the same account, booking and session logic
/// runs against PostgreSQL in production and against [`MemoryStore`] in
/// development and tests.
///
/// # Uniqueness
///
/// Both backends enforce unique email and unique username inside the insert
/// itself. A colliding insert fails with [`StoreError::Duplicate`]; callers
/// must not pre-check with a lookup and must treat that error as the only
/// source of truth for duplicate identities.
///
/// # Example
///
/// ```no_run
/// use planora_shared::store::{DynStore, MemoryStore};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store: DynStore = Arc::new(MemoryStore::new());
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::booking::{Booking, BookingStatus, CreateBooking};
use crate::models::message::{CreateMessage, Message, MessageStatus};
use crate::models::user::{CreateUser, User};

/// Which unique identity column collided on insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Email,
    Username,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityField::Email => f.write_str("email"),
            IdentityField::Username => f.write_str("username"),
        }
    }
}

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unique constraint violated on insert
    #[error("A user with this {0} already exists")]
    Duplicate(IdentityField),

    /// Backend unreachable or failed
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// User records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; fails with `Duplicate` if email or username is taken
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Lookup by normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Lookup where either email or username equals the normalized key
    async fn find_user_by_login(&self, key: &str) -> StoreResult<Option<User>>;
}

/// Booking records
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a booking with status `Pending`
    async fn insert_booking(&self, data: CreateBooking) -> StoreResult<Booking>;

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>>;

    /// Lists bookings newest first; `owner = None` lists every booking
    async fn list_bookings(&self, owner: Option<&str>) -> StoreResult<Vec<Booking>>;

    /// Changes status and `updated_at` only
    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> StoreResult<Option<Booking>>;

    /// Returns true if a booking was removed
    async fn delete_booking(&self, id: Uuid) -> StoreResult<bool>;
}

/// Contact-form messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn insert_message(&self, data: CreateMessage) -> StoreResult<Message>;

    /// Lists messages newest first
    async fn list_messages(&self) -> StoreResult<Vec<Message>>;

    async fn update_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> StoreResult<Option<Message>>;
}

/// A complete backend
#[async_trait]
pub trait Store: UserStore + BookingStore + MessageStore {
    /// Cheap connectivity check for health endpoints
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name for logs ("postgres", "memory")
    fn backend(&self) -> &'static str;
}

/// Shared, type-erased store handle held in application state
pub type DynStore = Arc<dyn Store>;
