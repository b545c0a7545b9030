/// Contact-form messages
///
/// Submission is public; reading and marking messages is admin-only.

use tracing::info;
use uuid::Uuid;

use super::PortalError;
use crate::auth::authorization::require_admin;
use crate::auth::identity::AuthenticatedIdentity;
use crate::models::message::{CreateMessage, Message, MessageStatus};
use crate::store::{DynStore, MessageStore};

pub async fn submit(store: &DynStore, data: CreateMessage) -> Result<Message, PortalError> {
    let message = store
        .insert_message(CreateMessage {
            name: data.name.trim().to_string(),
            email: data.email.trim().to_ascii_lowercase(),
            message: data.message.trim().to_string(),
        })
        .await?;

    info!(message_id = %message.id, "Contact message received");
    Ok(message)
}

pub async fn list(
    store: &DynStore,
    caller: &AuthenticatedIdentity,
) -> Result<Vec<Message>, PortalError> {
    require_admin(caller)?;
    Ok(store.list_messages().await?)
}

pub async fn set_status(
    store: &DynStore,
    caller: &AuthenticatedIdentity,
    id: Uuid,
    status: MessageStatus,
) -> Result<Message, PortalError> {
    require_admin(caller)?;

    store
        .update_message_status(id, status)
        .await?
        .ok_or(PortalError::NotFound("Message"))
}
