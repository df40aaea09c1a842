//! # Bot Exchange Repository
//!
//! Stores prompt/response pairs of the bot conversation. A pair is written in a
//! single insert, so a prompt is never stored without its response.

use chrono::{DateTime, Utc};
use shared::dto::bot::BotExchange;
use sqlx::query_as;

use super::models::BotExchangeRow;
use super::DbPool;

/// Bot exchange repository for database operations.
pub struct BotExchangeRepository;

impl BotExchangeRepository {
    /// Persist a completed exchange.
    pub async fn create(
        pool: &DbPool,
        user_id: i64,
        prompt: &str,
        response: &str,
        created_at: DateTime<Utc>,
    ) -> Result<BotExchange, sqlx::Error> {
        let row = query_as::<_, BotExchangeRow>(
            r#"
            INSERT INTO bot_exchanges (user_id, prompt, response, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, prompt, response, created_at
            "#
        )
        .bind(user_id)
        .bind(prompt)
        .bind(response)
        .bind(created_at)
        .fetch_one(pool)
        .await?;

        Ok(row.into())
    }

    /// A user's bot exchanges, oldest first.
    pub async fn list_for_user(pool: &DbPool, user_id: i64) -> Result<Vec<BotExchange>, sqlx::Error> {
        let rows = query_as::<_, BotExchangeRow>(
            r#"
            SELECT id, user_id, prompt, response, created_at
            FROM bot_exchanges
            WHERE user_id = ?
            ORDER BY created_at ASC, id ASC
            "#
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(BotExchange::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::store::memory_pool;
    use crate::model::store::models::UserForCreate;
    use crate::model::store::UserRepository;
    use lib_utils::now_utc;

    #[tokio::test]
    async fn test_create_and_list_for_user() {
        let pool = memory_pool().await.unwrap();
        let u1 = UserRepository::create(&pool, UserForCreate::new("One", "one@example.com")).await.unwrap();
        let u2 = UserRepository::create(&pool, UserForCreate::new("Two", "two@example.com")).await.unwrap();

        BotExchangeRepository::create(&pool, u1.id, "2+2", "4", now_utc()).await.unwrap();
        BotExchangeRepository::create(&pool, u2.id, "hello", "hi there", now_utc()).await.unwrap();
        BotExchangeRepository::create(&pool, u1.id, "3+3", "6", now_utc()).await.unwrap();

        let history = BotExchangeRepository::list_for_user(&pool, u1.id).await.unwrap();

        let pairs: Vec<_> = history.iter().map(|e| (e.prompt.as_str(), e.response.as_str())).collect();
        assert_eq!(pairs, vec![("2+2", "4"), ("3+3", "6")]);
        assert!(history.iter().all(|e| e.user_id == u1.id));
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected_by_foreign_key() {
        let pool = memory_pool().await.unwrap();

        let result = BotExchangeRepository::create(&pool, 999, "q", "a", now_utc()).await;

        assert!(result.is_err());
    }
}
