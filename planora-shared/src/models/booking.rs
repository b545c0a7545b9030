/// Booking model and database operations
///
/// A booking ties the owner's email to event details and an approval status.
/// The owner email is the ownership key checked by the authorization gate.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE booking_status AS ENUM ('Pending', 'Approved', 'Rejected');
///
/// CREATE TABLE bookings (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_email VARCHAR(320) NOT NULL,
///     event_type VARCHAR(100) NOT NULL,
///     event_name VARCHAR(255) NOT NULL,
///     guest_count INTEGER NOT NULL CHECK (guest_count > 0),
///     date DATE NOT NULL,
///     time VARCHAR(32) NOT NULL,
///     budget BIGINT NOT NULL CHECK (budget >= 0),
///     notes TEXT NOT NULL DEFAULT '',
///     organizer_preference VARCHAR(255) NOT NULL DEFAULT '',
///     status booking_status NOT NULL DEFAULT 'Pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Booking approval status
///
/// New bookings always start as `Pending`; only admins move them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status")]
pub enum BookingStatus {
    Pending,
    Approved,
    Rejected,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    /// Accepts any casing ("approved", "APPROVED", "Approved")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "approved" => Ok(BookingStatus::Approved),
            "rejected" => Ok(BookingStatus::Rejected),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

/// Which slice of a booking list to return relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingScope {
    /// Event date is strictly after today
    Upcoming,

    /// Event date is today or earlier
    Past,
}

/// Booking model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,

    /// Normalized email of the owning user
    pub user_email: String,

    pub event_type: String,
    pub event_name: String,
    pub guest_count: i32,
    pub date: NaiveDate,

    /// Free-form time of day as entered in the booking wizard (e.g. "18:30")
    pub time: String,

    /// Budget in whole currency units
    pub budget: i64,

    pub notes: String,
    pub organizer_preference: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,

    /// Set on every status change
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Whether this booking falls into `scope` as seen on `today`
    pub fn in_scope(&self, scope: BookingScope, today: NaiveDate) -> bool {
        match scope {
            BookingScope::Upcoming => self.date > today,
            BookingScope::Past => self.date <= today,
        }
    }
}

/// Input for creating a booking
///
/// There is no status field: every new booking is `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBooking {
    pub user_email: String,
    pub event_type: String,
    pub event_name: String,
    pub guest_count: i32,
    pub date: NaiveDate,
    pub time: String,
    pub budget: i64,
    pub notes: String,
    pub organizer_preference: String,
}

const BOOKING_COLUMNS: &str = "id, user_email, event_type, event_name, guest_count, date, time, \
     budget, notes, organizer_preference, status, created_at, updated_at";

impl Booking {
    /// Inserts a new booking with status `Pending`
    pub async fn create(pool: &PgPool, data: CreateBooking) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO bookings (user_email, event_type, event_name, guest_count, date, time,
                                  budget, notes, organizer_preference, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'Pending')
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        );

        sqlx::query_as::<_, Booking>(&query)
            .bind(data.user_email)
            .bind(data.event_type)
            .bind(data.event_name)
            .bind(data.guest_count)
            .bind(data.date)
            .bind(data.time)
            .bind(data.budget)
            .bind(data.notes)
            .bind(data.organizer_preference)
            .fetch_one(pool)
            .await
    }

    /// Finds a booking by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM bookings WHERE id = $1", BOOKING_COLUMNS);

        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists every booking, newest first
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM bookings ORDER BY created_at DESC",
            BOOKING_COLUMNS
        );

        sqlx::query_as::<_, Booking>(&query).fetch_all(pool).await
    }

    /// Lists bookings owned by `user_email`, newest first
    pub async fn list_by_owner(pool: &PgPool, user_email: &str) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM bookings WHERE user_email = $1 ORDER BY created_at DESC",
            BOOKING_COLUMNS
        );

        sqlx::query_as::<_, Booking>(&query)
            .bind(user_email)
            .fetch_all(pool)
            .await
    }

    /// Sets the status (and `updated_at`) of a booking, leaving every other column untouched
    ///
    /// Returns the updated booking, or None if it does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE bookings SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            BOOKING_COLUMNS
        );

        sqlx::query_as::<_, Booking>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a booking by ID
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
