//! # Message Repository
//!
//! Append-only store of direct messages, queried by participant pair.
//!
//! ## Ordering
//!
//! `created_at` is strictly increasing within a conversation. The row is
//! inserted first (taking SQLite's write lock), then its timestamp is moved
//! past the newest existing message of the same pair if the clock did not
//! advance. Both steps run in one transaction, so concurrent sends to the same
//! conversation cannot interleave between them.
//!
//! ## Example
//!
//! ```rust,no_run
//! # use lib_core::model::store::{MessageRepository, create_pool};
//! # use lib_core::model::store::models::MessageForCreate;
//! # use shared::dto::messaging::SendMessageRequest;
//! # async fn example() -> anyhow::Result<()> {
//! let pool = create_pool("sqlite:data/chat.db").await?;
//!
//! let draft = MessageForCreate::new(1, 2, SendMessageRequest::text("hi"))?;
//! let stored = MessageRepository::create(&pool, &draft).await?;
//!
//! let history = MessageRepository::list_between(&pool, 2, 1).await?;
//! assert_eq!(history.last().map(|m| m.id), Some(stored.id));
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use lib_utils::{now_utc, strictly_after};
use shared::dto::messaging::{Message, ParticipantPair, UserId};
use sqlx::query_as;

use super::models::{MessageForCreate, MessageRow};
use super::DbPool;

/// Message repository for database operations.
pub struct MessageRepository;

impl MessageRepository {
    /// Persist a validated message and return the stored record.
    ///
    /// The store assigns `id` and `created_at`.
    pub async fn create(pool: &DbPool, draft: &MessageForCreate) -> Result<Message, sqlx::Error> {
        let pair = ParticipantPair::new(draft.sender_id(), draft.recipient_id());
        let mut tx = pool.begin().await?;

        let mut row = query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (sender_id, recipient_id, pair_low, pair_high, text, image_ref, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, sender_id, recipient_id, text, image_ref, created_at
            "#
        )
        .bind(draft.sender_id())
        .bind(draft.recipient_id())
        .bind(pair.low())
        .bind(pair.high())
        .bind(draft.text())
        .bind(draft.image_ref())
        .bind(now_utc())
        .fetch_one(&mut *tx)
        .await?;

        let previous = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT created_at
            FROM messages
            WHERE pair_low = ? AND pair_high = ? AND id != ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        )
        .bind(pair.low())
        .bind(pair.high())
        .bind(row.id)
        .fetch_optional(&mut *tx)
        .await?;

        let created_at = strictly_after(row.created_at, previous);
        if created_at != row.created_at {
            sqlx::query("UPDATE messages SET created_at = ? WHERE id = ?")
                .bind(created_at)
                .bind(row.id)
                .execute(&mut *tx)
                .await?;
            row.created_at = created_at;
        }

        tx.commit().await?;

        Ok(row.into())
    }

    /// Find a message by id.
    pub async fn find_by_id(pool: &DbPool, id: i64) -> Result<Option<Message>, sqlx::Error> {
        let row = query_as::<_, MessageRow>(
            "SELECT id, sender_id, recipient_id, text, image_ref, created_at FROM messages WHERE id = ?"
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Message::from))
    }

    /// All messages exchanged between two users, oldest first.
    ///
    /// Argument order does not matter.
    pub async fn list_between(pool: &DbPool, user_a: UserId, user_b: UserId) -> Result<Vec<Message>, sqlx::Error> {
        let pair = ParticipantPair::new(user_a, user_b);

        let rows = query_as::<_, MessageRow>(
            r#"
            SELECT id, sender_id, recipient_id, text, image_ref, created_at
            FROM messages
            WHERE pair_low = ? AND pair_high = ?
            ORDER BY created_at ASC, id ASC
            "#
        )
        .bind(pair.low())
        .bind(pair.high())
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(Message::from).collect())
    }
}
