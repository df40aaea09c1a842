//! # Bot Conversation Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::messaging::UserId;

/// A stored prompt/response pair between a user and the bot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotExchange {
    pub id: i64,
    pub user_id: UserId,
    pub prompt: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/bot/ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotAskRequest {
    pub prompt: String,
}

/// Response of `POST /api/bot/ask`
///
/// `persisted` is `false` when the completion succeeded but storing the pair
/// failed; the answer is still valid but will be missing from bot history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotAskResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub prompt: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
    pub persisted: bool,
}

/// Response of `GET /api/bot/messages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotHistoryResponse {
    pub exchanges: Vec<BotExchange>,
}
