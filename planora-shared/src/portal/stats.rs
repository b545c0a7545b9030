/// Admin dashboard aggregates

use serde::Serialize;

use super::PortalError;
use crate::auth::authorization::require_admin;
use crate::auth::identity::AuthenticatedIdentity;
use crate::models::booking::BookingStatus;
use crate::models::message::MessageStatus;
use crate::store::{BookingStore, DynStore, MessageStore};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_bookings: usize,
    pub pending_bookings: usize,
    pub approved_bookings: usize,
    pub rejected_bookings: usize,
    pub unread_messages: usize,

    /// Sum of budgets over approved bookings, saturating at `i64::MAX`
    pub total_revenue: i64,
}

pub async fn admin_stats(
    store: &DynStore,
    caller: &AuthenticatedIdentity,
) -> Result<AdminStats, PortalError> {
    require_admin(caller)?;

    let bookings = store.list_bookings(None).await?;
    let messages = store.list_messages().await?;

    let mut stats = AdminStats {
        total_bookings: bookings.len(),
        unread_messages: messages
            .iter()
            .filter(|m| m.status == MessageStatus::Unread)
            .count(),
        ..Default::default()
    };

    for booking in &bookings {
        match booking.status {
            BookingStatus::Pending => stats.pending_bookings += 1,
            BookingStatus::Approved => {
                stats.approved_bookings += 1;
                stats.total_revenue = stats.total_revenue.saturating_add(booking.budget);
            }
            BookingStatus::Rejected => stats.rejected_bookings += 1,
        }
    }

    Ok(stats)
}
