/// Booking endpoints
///
/// All endpoints require a resolved session; the acting identity decides
/// visibility (admin sees everything) and ownership.
///
/// # Endpoints
///
/// - `GET /v1/bookings[?scope=upcoming|past]` - List visible bookings
/// - `POST /v1/bookings` - Create a `Pending` booking owned by the caller
/// - `PUT /v1/bookings` `{bookingId, status}` - Change status (admin)
/// - `PUT /v1/bookings/:id` `{status}` - Change status (admin)
/// - `DELETE /v1/bookings?id=` / `DELETE /v1/bookings/:id` - Delete own booking

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::Caller,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use planora_shared::{
    models::booking::{Booking, BookingScope, BookingStatus},
    portal::bookings::{self, BookingDetails},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub scope: Option<BookingScope>,
}

/// Booking wizard submission
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 100, message = "Event type is required"))]
    pub event_type: String,

    #[validate(length(min = 1, max = 200, message = "Event name is required"))]
    pub event_name: String,

    #[validate(range(min = 1, message = "Guest count must be at least 1"))]
    pub guest_count: i32,

    pub date: NaiveDate,

    #[validate(length(min = 1, max = 32, message = "Time is required"))]
    pub time: String,

    #[validate(range(min = 0, max = 1_000_000_000, message = "Budget must be between 0 and 1000000000"))]
    pub budget: i64,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Notes must be at most 5000 characters"))]
    pub notes: String,

    #[serde(default)]
    pub organizer_preference: String,
}

impl From<CreateBookingRequest> for BookingDetails {
    fn from(req: CreateBookingRequest) -> Self {
        BookingDetails {
            event_type: req.event_type,
            event_name: req.event_name,
            guest_count: req.guest_count,
            date: req.date,
            time: req.time,
            budget: req.budget,
            notes: req.notes,
            organizer_preference: req.organizer_preference,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub booking_id: Uuid,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Uuid,
}

/// Status names are accepted in any case ("approved", "Approved")
fn parse_status(raw: &str) -> ApiResult<BookingStatus> {
    raw.parse().map_err(ApiError::BadRequest)
}

pub async fn list_bookings(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Booking>>> {
    let Query(query) = query?;
    let today = Utc::now().date_naive();

    let bookings = bookings::list(&state.store, &caller, query.scope, today).await?;
    Ok(Json(bookings))
}

pub async fn create_booking(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let Json(req) = payload?;
    req.validate()?;

    let booking = bookings::create(&state.store, &caller, req.into()).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn update_booking_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> ApiResult<Json<Booking>> {
    let Json(req) = payload?;
    let status = parse_status(&req.status)?;

    let booking = bookings::update_status(&state.store, &caller, req.booking_id, status).await?;
    Ok(Json(booking))
}

pub async fn update_booking_status_by_id(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StatusBody>, JsonRejection>,
) -> ApiResult<Json<Booking>> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let status = parse_status(&body.status)?;

    let booking = bookings::update_status(&state.store, &caller, id, status).await?;
    Ok(Json(booking))
}

pub async fn delete_booking_by_query(
    State(state): State<AppState>,
    Caller(caller): Caller,
    query: Result<Query<DeleteQuery>, QueryRejection>,
) -> ApiResult<StatusCode> {
    let Query(query) = query?;

    bookings::delete(&state.store, &caller, query.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_booking(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;

    bookings::delete(&state.store, &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
