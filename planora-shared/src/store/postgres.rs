/// PostgreSQL store backed by the model queries
///
/// The pool is built once at startup (see [`crate::db::pool::create_pool`]),
/// handed to [`PgStore::new`], and released with [`PgStore::close`] during
/// shutdown. There is no global connection.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{
    BookingStore, IdentityField, MessageStore, Store, StoreError, StoreResult, UserStore,
};
use crate::db::pool::{close_pool, health_check};
use crate::models::booking::{Booking, BookingStatus, CreateBooking};
use crate::models::message::{CreateMessage, Message, MessageStatus};
use crate::models::user::{CreateUser, User};

/// Constraint names from the users migration
const EMAIL_CONSTRAINT: &str = "users_email_key";
const USERNAME_CONSTRAINT: &str = "users_username_key";

/// Maps driver errors onto the store taxonomy
///
/// Unique violations on the two identity constraints become `Duplicate`;
/// everything else is reported as the backend being unavailable.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.constraint() {
                Some(EMAIL_CONSTRAINT) => return StoreError::Duplicate(IdentityField::Email),
                Some(USERNAME_CONSTRAINT) => {
                    return StoreError::Duplicate(IdentityField::Username)
                }
                _ => {}
            }
        }

        StoreError::Unavailable(format!("Database error: {}", err))
    }
}

/// Store implementation over a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Closes every pooled connection
    pub async fn close(self) {
        close_pool(self.pool).await;
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_user_by_login(&self, key: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_login(&self.pool, key).await?)
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn insert_booking(&self, data: CreateBooking) -> StoreResult<Booking> {
        Ok(Booking::create(&self.pool, data).await?)
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        Ok(Booking::find_by_id(&self.pool, id).await?)
    }

    async fn list_bookings(&self, owner: Option<&str>) -> StoreResult<Vec<Booking>> {
        let bookings = match owner {
            Some(email) => Booking::list_by_owner(&self.pool, email).await?,
            None => Booking::list_all(&self.pool).await?,
        };
        debug!(count = bookings.len(), all = owner.is_none(), "Listed bookings");
        Ok(bookings)
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        Ok(Booking::update_status(&self.pool, id, status).await?)
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Booking::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn insert_message(&self, data: CreateMessage) -> StoreResult<Message> {
        Ok(Message::create(&self.pool, data).await?)
    }

    async fn list_messages(&self) -> StoreResult<Vec<Message>> {
        Ok(Message::list(&self.pool).await?)
    }

    async fn update_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> StoreResult<Option<Message>> {
        Ok(Message::update_status(&self.pool, id, status).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
