/// Booking operations
///
/// | Operation     | Who            | Rule                                     |
/// |---------------|----------------|------------------------------------------|
/// | list          | any identity   | admins see all, others only their own    |
/// | create        | any identity   | owner = caller's email, status `Pending` |
/// | update_status | admin          | changes `status` and `updated_at` only   |
/// | delete        | owner          | stored owner must equal caller's email   |

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::PortalError;
use crate::auth::authorization::{listing_scope, require_admin, require_ownership};
use crate::auth::identity::AuthenticatedIdentity;
use crate::models::booking::{Booking, BookingScope, BookingStatus, CreateBooking};
use crate::store::{BookingStore, DynStore};

/// Event details supplied by the booking wizard
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    pub event_type: String,
    pub event_name: String,
    pub guest_count: i32,
    pub date: NaiveDate,
    pub time: String,
    pub budget: i64,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub organizer_preference: String,
}

/// Bookings visible to `caller`, newest first, optionally split around `today`
pub async fn list(
    store: &DynStore,
    caller: &AuthenticatedIdentity,
    scope: Option<BookingScope>,
    today: NaiveDate,
) -> Result<Vec<Booking>, PortalError> {
    let bookings = store.list_bookings(listing_scope(caller)).await?;

    Ok(match scope {
        Some(scope) => bookings.into_iter().filter(|b| b.in_scope(scope, today)).collect(),
        None => bookings,
    })
}

/// Creates a `Pending` booking owned by `caller`
pub async fn create(
    store: &DynStore,
    caller: &AuthenticatedIdentity,
    details: BookingDetails,
) -> Result<Booking, PortalError> {
    let booking = store
        .insert_booking(CreateBooking {
            user_email: caller.email.clone(),
            event_type: details.event_type.trim().to_string(),
            event_name: details.event_name.trim().to_string(),
            guest_count: details.guest_count,
            date: details.date,
            time: details.time.trim().to_string(),
            budget: details.budget,
            notes: details.notes,
            organizer_preference: details.organizer_preference,
        })
        .await?;

    info!(booking_id = %booking.id, user_id = %caller.user_id, "Booking created");
    Ok(booking)
}

/// Admin-only status change
pub async fn update_status(
    store: &DynStore,
    caller: &AuthenticatedIdentity,
    id: Uuid,
    status: BookingStatus,
) -> Result<Booking, PortalError> {
    require_admin(caller)?;

    let booking = store
        .update_booking_status(id, status)
        .await?
        .ok_or(PortalError::NotFound("Booking"))?;

    info!(booking_id = %id, status = %status, admin_id = %caller.user_id, "Booking status updated");
    Ok(booking)
}

/// Owner-only deletion; a mismatched caller leaves the booking in place
pub async fn delete(
    store: &DynStore,
    caller: &AuthenticatedIdentity,
    id: Uuid,
) -> Result<(), PortalError> {
    let booking = store
        .find_booking(id)
        .await?
        .ok_or(PortalError::NotFound("Booking"))?;

    if let Err(e) = require_ownership(caller, &booking.user_email) {
        info!(booking_id = %id, user_id = %caller.user_id, "Booking delete refused: not owner");
        return Err(e.into());
    }

    if !store.delete_booking(id).await? {
        return Err(PortalError::NotFound("Booking"));
    }

    info!(booking_id = %id, user_id = %caller.user_id, "Booking deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::authorization::AuthzError;
    use crate::auth::identity::IdentitySource;
    use crate::models::user::Role;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn caller(email: &str, role: Role) -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: email.to_string(),
            role,
            source: IdentitySource::Local,
        }
    }

    fn details(name: &str, date: NaiveDate) -> BookingDetails {
        BookingDetails {
            event_type: "wedding".to_string(),
            event_name: name.to_string(),
            guest_count: 120,
            date,
            time: "16:00".to_string(),
            budget: 25_000,
            notes: "outdoor".to_string(),
            organizer_preference: String::new(),
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_listing_respects_role() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let alice = caller("a@x.com", Role::User);
        let bob = caller("b@x.com", Role::User);
        let admin = caller("ops@x.com", Role::Admin);

        create(&store, &alice, details("A1", day(2030, 1, 1))).await.unwrap();
        create(&store, &bob, details("B1", day(2030, 1, 2))).await.unwrap();
        create(&store, &alice, details("A2", day(2030, 1, 3))).await.unwrap();

        let today = day(2026, 1, 1);
        let mine = list(&store, &alice, None, today).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|b| b.user_email == "a@x.com"));

        assert_eq!(list(&store, &admin, None, today).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_scope_split() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let alice = caller("a@x.com", Role::User);
        let today = day(2026, 6, 1);

        create(&store, &alice, details("past", day(2026, 5, 1))).await.unwrap();
        create(&store, &alice, details("today", today)).await.unwrap();
        create(&store, &alice, details("next", day(2026, 7, 1))).await.unwrap();

        let upcoming = list(&store, &alice, Some(BookingScope::Upcoming), today).await.unwrap();
        let past = list(&store, &alice, Some(BookingScope::Past), today).await.unwrap();

        assert_eq!(upcoming.iter().map(|b| b.event_name.as_str()).collect::<Vec<_>>(), vec!["next"]);
        assert_eq!(past.len(), 2);
    }

    #[tokio::test]
    async fn test_admin_approval_changes_only_status() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let alice = caller("a@x.com", Role::User);
        let admin = caller("ops@x.com", Role::Admin);

        let booking = create(&store, &alice, details("Gala", day(2030, 2, 14))).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);

        let err = update_status(&store, &alice, booking.id, BookingStatus::Approved)
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::Authz(AuthzError::AdminRequired)));

        let approved = update_status(&store, &admin, booking.id, BookingStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, BookingStatus::Approved);
        assert_eq!(approved.event_name, "Gala");
        assert_eq!(approved.date, booking.date);
        assert_eq!(approved.user_email, booking.user_email);
        assert_eq!(approved.created_at, booking.created_at);

        let missing = update_status(&store, &admin, Uuid::new_v4(), BookingStatus::Rejected).await;
        assert!(matches!(missing, Err(PortalError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_requires_owner() {
        let store: DynStore = Arc::new(MemoryStore::new());
        let alice = caller("a@x.com", Role::User);
        let bob = caller("b@x.com", Role::User);
        let admin = caller("ops@x.com", Role::Admin);

        let booking = create(&store, &alice, details("Gala", day(2030, 2, 14))).await.unwrap();

        for intruder in [&bob, &admin] {
            let err = delete(&store, intruder, booking.id).await.unwrap_err();
            assert!(matches!(err, PortalError::Authz(AuthzError::NotOwner)));
        }
        assert!(store.find_booking(booking.id).await.unwrap().is_some());

        delete(&store, &alice, booking.id).await.unwrap();
        assert!(store.find_booking(booking.id).await.unwrap().is_none());

        let again = delete(&store, &alice, booking.id).await;
        assert!(matches!(again, Err(PortalError::NotFound(_))));
    }
}
