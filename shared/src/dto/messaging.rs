//! # Messaging Data Transfer Objects
//!
//! Defines request and response structures for direct messaging and the user directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque user identity as issued by the authentication service.
pub type UserId = i64;

/// A persisted direct message between two users.
///
/// At least one of `text` and `image_ref` is present. `image_ref` is an opaque
/// URL on an external asset host and is never inspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: i64,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// The unordered participant pair this message belongs to.
    pub fn pair(&self) -> ParticipantPair {
        ParticipantPair::new(self.sender_id, self.recipient_id)
    }
}

/// Unordered pair of participants identifying an implicit conversation.
///
/// `ParticipantPair::new(a, b) == ParticipantPair::new(b, a)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }
}

/// Body of `POST /api/conversations/{recipient_id}/messages`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

impl SendMessageRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image_ref: None,
        }
    }

    pub fn image(image_ref: impl Into<String>) -> Self {
        Self {
            text: None,
            image_ref: Some(image_ref.into()),
        }
    }
}

/// Entry of `GET /api/users`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Derived from live-channel membership at the time of the request.
    pub online: bool,
}

/// List of user profiles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserProfile>,
}
