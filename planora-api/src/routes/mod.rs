/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Password signup/login, refresh, session view, logout
/// - `oauth`: Federated sign-in redirect and callback
/// - `bookings`: Booking CRUD behind the authorization gate
/// - `messages`: Contact form and admin inbox
/// - `admin`: Dashboard aggregates

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod health;
pub mod messages;
pub mod oauth;
