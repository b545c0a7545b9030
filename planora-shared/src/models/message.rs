/// Contact-form message model
///
/// Messages are submitted anonymously from the public contact form and read
/// by admins. They have no relation to any user account.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE message_status AS ENUM ('unread', 'read');
///
/// CREATE TABLE messages (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(320) NOT NULL,
///     message TEXT NOT NULL,
///     status message_status NOT NULL DEFAULT 'unread',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Read status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "message_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Unread,
    Read,
}

/// Contact-form submission
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a message (always stored as unread)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl Message {
    pub async fn create(pool: &PgPool, data: CreateMessage) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (name, email, message, status)
            VALUES ($1, $2, $3, 'unread')
            RETURNING id, name, email, message, status, created_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(data.message)
        .fetch_one(pool)
        .await
    }

    /// Lists all messages, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, name, email, message, status, created_at
            FROM messages
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Marks a message read or unread; None if it does not exist
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: MessageStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            UPDATE messages SET status = $2
            WHERE id = $1
            RETURNING id, name, email, message, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_status_wire_form() {
        assert_eq!(serde_json::to_string(&MessageStatus::Unread).unwrap(), "\"unread\"");
        let status: MessageStatus = serde_json::from_str("\"read\"").unwrap();
        assert_eq!(status, MessageStatus::Read);
    }
}
