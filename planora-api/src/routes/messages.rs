/// Contact-form endpoints
///
/// # Endpoints
///
/// - `POST /v1/messages` - Submit a message (public)
/// - `GET /v1/messages` - List messages, newest first (admin)
/// - `PUT /v1/messages/:id` `{status: "read" | "unread"}` - Mark a message (admin)

use crate::{app::AppState, error::ApiResult, middleware::session::Caller};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use planora_shared::{
    models::message::{CreateMessage, Message, MessageStatus},
    portal::messages,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitMessageRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateMessageRequest {
    pub status: MessageStatus,
}

pub async fn submit_message(
    State(state): State<AppState>,
    payload: Result<Json<SubmitMessageRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    let Json(req) = payload?;
    req.validate()?;

    let message = messages::submit(
        &state.store,
        CreateMessage {
            name: req.name,
            email: req.email,
            message: req.message,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<Message>>> {
    Ok(Json(messages::list(&state.store, &caller).await?))
}

pub async fn update_message_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateMessageRequest>, JsonRejection>,
) -> ApiResult<Json<Message>> {
    let Path(id) = id?;
    let Json(req) = payload?;

    let message = messages::set_status(&state.store, &caller, id, req.status).await?;
    Ok(Json(message))
}
