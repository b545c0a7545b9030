/// In-process store for development and tests
///
/// All three collections sit behind one `RwLock`, so the uniqueness check and
/// the insert of a user happen under the same write guard and two concurrent
/// signups for the same username cannot both succeed.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    BookingStore, IdentityField, MessageStore, Store, StoreError, StoreResult, UserStore,
};
use crate::models::booking::{Booking, BookingStatus, CreateBooking};
use crate::models::message::{CreateMessage, Message, MessageStatus};
use crate::models::user::{CreateUser, Role, User};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    bookings: Vec<Booking>,
    messages: Vec<Message>,
}

/// Store implementation held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Changes a stored user's role; returns false for an unknown id
    ///
    /// Role changes have no HTTP surface. This seeds development and test data.
    pub async fn set_user_role(&self, id: Uuid, role: Role) -> bool {
        let mut inner = self.inner.write().await;
        match inner.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.role = role;
                true
            }
            None => false,
        }
    }
}

/// Newest first; equal timestamps keep reverse insertion order
fn newest_first<T: Clone>(items: &[T], created_at: impl Fn(&T) -> chrono::DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().cloned().collect();
    out.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    out
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::Duplicate(IdentityField::Email));
        }
        if inner.users.iter().any(|u| u.username == data.username) {
            return Err(StoreError::Duplicate(IdentityField::Username));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            username: data.username,
            name: data.name,
            password_hash: data.password_hash,
            role: data.role,
            phone: data.phone,
            address: data.address,
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());

        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_login(&self, key: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.email == key || u.username == key)
            .cloned())
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn insert_booking(&self, data: CreateBooking) -> StoreResult<Booking> {
        let booking = Booking {
            id: Uuid::new_v4(),
            user_email: data.user_email,
            event_type: data.event_type,
            event_name: data.event_name,
            guest_count: data.guest_count,
            date: data.date,
            time: data.time,
            budget: data.budget,
            notes: data.notes,
            organizer_preference: data.organizer_preference,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
            updated_at: None,
        };

        self.inner.write().await.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn find_booking(&self, id: Uuid) -> StoreResult<Option<Booking>> {
        let inner = self.inner.read().await;
        Ok(inner.bookings.iter().find(|b| b.id == id).cloned())
    }

    async fn list_bookings(&self, owner: Option<&str>) -> StoreResult<Vec<Booking>> {
        let inner = self.inner.read().await;
        let matching: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| owner.map_or(true, |email| b.user_email == email))
            .cloned()
            .collect();

        Ok(newest_first(&matching, |b| b.created_at))
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> StoreResult<Option<Booking>> {
        let mut inner = self.inner.write().await;

        Ok(inner.bookings.iter_mut().find(|b| b.id == id).map(|booking| {
            booking.status = status;
            booking.updated_at = Some(Utc::now());
            booking.clone()
        }))
    }

    async fn delete_booking(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.bookings.len();
        inner.bookings.retain(|b| b.id != id);
        Ok(inner.bookings.len() < before)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert_message(&self, data: CreateMessage) -> StoreResult<Message> {
        let message = Message {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            message: data.message,
            status: MessageStatus::Unread,
            created_at: Utc::now(),
        };

        self.inner.write().await.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self) -> StoreResult<Vec<Message>> {
        let inner = self.inner.read().await;
        Ok(newest_first(&inner.messages, |m| m.created_at))
    }

    async fn update_message_status(
        &self,
        id: Uuid,
        status: MessageStatus,
    ) -> StoreResult<Option<Message>> {
        let mut inner = self.inner.write().await;

        Ok(inner.messages.iter_mut().find(|m| m.id == id).map(|message| {
            message.status = status;
            message.clone()
        }))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
