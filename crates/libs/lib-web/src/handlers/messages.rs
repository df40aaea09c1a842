//! # Direct Message Handlers
//!
//! ## Endpoints
//!
//! - `POST /api/conversations/{user_id}/messages` - Send a message to `user_id`
//! - `GET /api/conversations/{user_id}/messages` - History with `user_id`, oldest first
//!
//! A send is durable once the response is 201. Live push to the recipient
//! happens after persistence and never affects the sender's response.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use lib_auth::Claims;
use lib_core::model::store::models::MessageForCreate;
use lib_core::model::store::{MessageRepository, UserRepository};
use lib_core::{AppError, DbPool};
use shared::dto::{Message, SendMessageRequest, UserId};
use shared::utils::compute_conversation_id;
use tracing::{debug, info, instrument};

use crate::extract::AppJson;
use crate::live::MessageRouter;
use crate::middleware::current_user_id;

/// Persist a message from the caller to `recipient_id`, then push it to the
/// recipient if connected.
///
/// # Errors
///
/// - `400` if the body is malformed, both `text` and `image_ref` are absent,
///   the text is too long, or the caller addresses themselves
/// - `404` if the recipient does not exist
#[instrument(skip_all)]
pub async fn send_message(
    State(db): State<DbPool>,
    State(router): State<MessageRouter>,
    Extension(claims): Extension<Claims>,
    Path(recipient_id): Path<UserId>,
    AppJson(payload): AppJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    let sender_id = current_user_id(&claims)?;
    let draft = MessageForCreate::new(sender_id, recipient_id, payload)?;

    if !UserRepository::exists(&db, recipient_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", recipient_id)));
    }

    let message = MessageRepository::create(&db, &draft).await?;
    let delivery = router.deliver(&message);

    info!(
        message_id = message.id,
        conversation = %compute_conversation_id(sender_id, recipient_id),
        recipient_id,
        delivery = ?delivery,
        "[MSG] SENT id={} {} -> {} delivery={:?}",
        message.id,
        sender_id,
        recipient_id,
        delivery
    );

    Ok((StatusCode::CREATED, Json(message)))
}

/// All messages between the caller and `other_user_id`.
#[instrument(skip_all)]
pub async fn list_messages(
    State(db): State<DbPool>,
    Extension(claims): Extension<Claims>,
    Path(other_user_id): Path<UserId>,
) -> Result<Json<Vec<Message>>, AppError> {
    let user_id = current_user_id(&claims)?;

    if !UserRepository::exists(&db, other_user_id).await? {
        return Err(AppError::NotFound(format!("User {} not found", other_user_id)));
    }

    let messages = MessageRepository::list_between(&db, user_id, other_user_id).await?;
    debug!(
        conversation = %compute_conversation_id(user_id, other_user_id),
        count = messages.len(),
        "[MSG] HISTORY count={}",
        messages.len()
    );
    Ok(Json(messages))
}
