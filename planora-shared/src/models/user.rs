/// User model and database operations
///
/// This module provides the User model and the queries the account service
/// needs: insert, lookup by id, by email, and by "email or username" for login.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(320) NOT NULL,
///     username VARCHAR(64) NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     phone VARCHAR(64) NOT NULL DEFAULT '',
///     address TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email),
///     CONSTRAINT users_username_key UNIQUE (username)
/// );
/// ```
///
/// Email and username are stored normalized (see [`normalize_identifier`]), so
/// the two unique constraints are the only uniqueness check in the system.
///
/// # Example
///
/// ```no_run
/// use planora_shared::models::user::{CreateUser, Role, User};
/// use planora_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "alice@example.com".to_string(),
///     username: "alice".to_string(),
///     name: "Alice".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::User,
///     phone: String::new(),
///     address: String::new(),
/// }).await?;
///
/// let found = User::find_by_login(&pool, "alice").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular customer account
    User,

    /// Back-office account: sees all bookings and messages, changes booking status
    Admin,
}

impl Role {
    /// Converts role to its wire/database string
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    /// Whether this role passes admin-only gates
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// User model representing an account
///
/// Passwords are stored as Argon2id hashes and the hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Normalized email address, unique across all users
    pub email: String,

    /// Normalized username, unique across all users
    pub username: String,

    /// Display name
    pub name: String,

    /// Argon2id password hash (PHC string)
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Account role
    pub role: Role,

    /// Contact phone (may be empty)
    pub phone: String,

    /// Postal address (may be empty)
    pub address: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// `email` and `username` must already be normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub username: String,
    pub name: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub role: Role,
    pub phone: String,
    pub address: String,
}

/// Normalizes an email or username for storage and lookup
///
/// Lookups and unique constraints both operate on the normalized form, so
/// `Alice@X.com` and `alice@x.com` are the same identity.
///
/// # Example
///
/// ```
/// use planora_shared::models::user::normalize_identifier;
///
/// assert_eq!(normalize_identifier("  Alice@X.com "), "alice@x.com");
/// ```
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_lowercase()
}

const USER_COLUMNS: &str =
    "id, email, username, name, password_hash, role, phone, address, created_at";

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns a database error carrying constraint `users_email_key` or
    /// `users_username_key` when the identity is already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (email, username, name, password_hash, role, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&query)
            .bind(data.email)
            .bind(data.username)
            .bind(data.name)
            .bind(data.password_hash)
            .bind(data.role)
            .bind(data.phone)
            .bind(data.address)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by normalized email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user whose email OR username equals the normalized key
    ///
    /// Usernames cannot contain `@`, so at most one row can match.
    pub async fn find_by_login(pool: &PgPool, key: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM users WHERE email = $1 OR username = $1 LIMIT 1",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }
}
