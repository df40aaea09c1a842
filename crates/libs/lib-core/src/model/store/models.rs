use chrono::{DateTime, Utc};
use lib_utils::{non_blank, validate_max_chars, validate_not_empty};
use shared::dto::bot::BotExchange;
use shared::dto::messaging::{Message, SendMessageRequest, UserId, UserProfile};
use sqlx::FromRow;

use crate::error::AppError;

/// Longest accepted message text, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 10_000;

/// Longest accepted bot prompt, in characters.
pub const MAX_PROMPT_LENGTH: usize = 4_000;

/// User entity as stored by the account service.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Public profile with the online flag supplied by the caller.
    pub fn into_profile(self, online: bool) -> UserProfile {
        UserProfile {
            id: self.id,
            full_name: self.full_name,
            avatar_url: self.profile_pic,
            online,
        }
    }
}

/// Data structure for creating a new user (seeding and tests only).
#[derive(Debug, Clone)]
pub struct UserForCreate {
    pub full_name: String,
    pub email: String,
    pub profile_pic: Option<String>,
}

impl UserForCreate {
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            profile_pic: None,
        }
    }

    pub fn profile_pic(mut self, url: impl Into<String>) -> Self {
        self.profile_pic = Some(url.into());
        self
    }
}

/// Stored message row.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: i64,
    pub sender_id: i64,
    pub recipient_id: i64,
    pub text: Option<String>,
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            sender_id: row.sender_id,
            recipient_id: row.recipient_id,
            text: row.text,
            image_ref: row.image_ref,
            created_at: row.created_at,
        }
    }
}

/// A validated message ready to be persisted.
///
/// Construction is the only place the "text or image" rule is enforced, so
/// holding one means the request already passed validation.
#[derive(Debug, Clone)]
pub struct MessageForCreate {
    sender_id: UserId,
    recipient_id: UserId,
    text: Option<String>,
    image_ref: Option<String>,
}

impl MessageForCreate {
    /// Validate a send request from `sender_id` to `recipient_id`.
    ///
    /// Text is trimmed and blank text counts as absent. The image reference is
    /// opaque and only checked for presence.
    pub fn new(sender_id: UserId, recipient_id: UserId, request: SendMessageRequest) -> Result<Self, AppError> {
        if sender_id == recipient_id {
            return Err(AppError::Validation("Cannot send a message to yourself".to_string()));
        }

        let text = non_blank(request.text);
        let image_ref = request.image_ref.filter(|r| !r.is_empty());

        if text.is_none() && image_ref.is_none() {
            return Err(AppError::Validation(
                "A message needs text or an image".to_string(),
            ));
        }

        if let Some(text) = &text {
            validate_max_chars(text, MAX_MESSAGE_LENGTH, "Message text").map_err(AppError::Validation)?;
        }

        Ok(Self {
            sender_id,
            recipient_id,
            text,
            image_ref,
        })
    }

    pub fn sender_id(&self) -> UserId {
        self.sender_id
    }

    pub fn recipient_id(&self) -> UserId {
        self.recipient_id
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }
}

/// Validate a bot prompt, returning it trimmed.
pub fn validate_prompt(prompt: &str) -> Result<String, AppError> {
    validate_not_empty(prompt, "Prompt").map_err(AppError::Validation)?;
    let prompt = prompt.trim();
    validate_max_chars(prompt, MAX_PROMPT_LENGTH, "Prompt").map_err(AppError::Validation)?;
    Ok(prompt.to_string())
}

/// Stored bot exchange row.
#[derive(Debug, Clone, FromRow)]
pub struct BotExchangeRow {
    pub id: i64,
    pub user_id: i64,
    pub prompt: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl From<BotExchangeRow> for BotExchange {
    fn from(row: BotExchangeRow) -> Self {
        BotExchange {
            id: row.id,
            user_id: row.user_id,
            prompt: row.prompt,
            response: row.response,
            created_at: row.created_at,
        }
    }
}
