//! # Bot Conversation Handlers
//!
//! ## Endpoints
//!
//! - `POST /api/bot/ask` - Ask the bot; answers synchronously
//! - `GET /api/bot/messages` - Caller's past exchanges, oldest first

use axum::{extract::State, Extension, Json};
use lib_auth::Claims;
use lib_core::AppError;
use shared::dto::{BotAskRequest, BotAskResponse, BotHistoryResponse};
use tracing::instrument;

use crate::bot::BotConversationService;
use crate::extract::AppJson;
use crate::middleware::current_user_id;

/// Ask the bot under the configured completion timeout.
///
/// Provider failures map to `502` and timeouts to `504`, both with
/// `"retryable": true`.
#[instrument(skip_all)]
pub async fn ask_bot(
    State(bot): State<BotConversationService>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<BotAskRequest>,
) -> Result<Json<BotAskResponse>, AppError> {
    let user_id = current_user_id(&claims)?;
    let answer = bot.ask(user_id, &payload.prompt, bot.default_timeout()).await?;
    Ok(Json(answer))
}

#[instrument(skip_all)]
pub async fn bot_history(
    State(bot): State<BotConversationService>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<BotHistoryResponse>, AppError> {
    let user_id = current_user_id(&claims)?;
    let exchanges = bot.history(user_id).await?;
    Ok(Json(BotHistoryResponse { exchanges }))
}
