/// Database models for Planora
///
/// Each model carries its own PostgreSQL queries; the [`crate::store`] traits
/// put a backend-neutral face on them for the services.
///
/// # Models
///
/// - `user`: Accounts (password flow and federated sign-in)
/// - `booking`: Event bookings owned by a user email
/// - `message`: Anonymous contact-form submissions

pub mod booking;
pub mod message;
pub mod user;
