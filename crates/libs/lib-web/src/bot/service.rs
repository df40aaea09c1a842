//! # Bot Conversation Service
//!
//! Synchronous ask-and-answer path. One request produces one completion and at
//! most one stored exchange. The live subsystem is never involved.

use std::sync::Arc;
use std::time::{Duration, Instant};

use lib_core::model::store::models::validate_prompt;
use lib_core::model::store::BotExchangeRepository;
use lib_core::{AppError, DbPool};
use lib_utils::now_utc;
use shared::dto::{BotAskResponse, BotExchange, UserId};
use tracing::{error, info, warn};

use super::provider::CompletionProvider;

#[derive(Clone)]
pub struct BotConversationService {
    db: DbPool,
    provider: Arc<dyn CompletionProvider>,
    default_timeout: Duration,
}

impl BotConversationService {
    pub fn new(db: DbPool, provider: Arc<dyn CompletionProvider>, default_timeout: Duration) -> Self {
        Self {
            db,
            provider,
            default_timeout,
        }
    }

    /// Timeout used by the HTTP handler.
    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Ask the bot and store the exchange.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty or overlong prompt
    /// - `Upstream` when the provider fails, `UpstreamTimeout` when it exceeds
    ///   `timeout`; nothing is stored in either case
    ///
    /// A storage failure after a successful completion is not an error: the
    /// answer comes back with `persisted: false`.
    pub async fn ask(&self, user_id: UserId, prompt: &str, timeout: Duration) -> Result<BotAskResponse, AppError> {
        let prompt = validate_prompt(prompt)?;
        let started = Instant::now();

        let response = match tokio::time::timeout(timeout, self.provider.complete(&prompt)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(user_id, provider = self.provider.name(), error = %e, "[BOT] COMPLETION_FAILED user_id={} error={}", user_id, e);
                return Err(AppError::Upstream(e.to_string()));
            }
            Err(_) => {
                warn!(
                    user_id,
                    provider = self.provider.name(),
                    timeout_ms = timeout.as_millis(),
                    "[BOT] COMPLETION_TIMEOUT user_id={} after {}ms",
                    user_id,
                    timeout.as_millis()
                );
                return Err(AppError::UpstreamTimeout(timeout));
            }
        };

        info!(
            user_id,
            provider = self.provider.name(),
            latency_ms = started.elapsed().as_millis(),
            "[BOT] ANSWERED user_id={}",
            user_id
        );

        let created_at = now_utc();
        match BotExchangeRepository::create(&self.db, user_id, &prompt, &response, created_at).await {
            Ok(exchange) => Ok(BotAskResponse {
                id: Some(exchange.id),
                prompt: exchange.prompt,
                response: exchange.response,
                created_at: exchange.created_at,
                persisted: true,
            }),
            Err(e) => {
                error!(user_id, error = %e, "[BOT] PERSIST_FAILED user_id={} error={}", user_id, e);
                Ok(BotAskResponse {
                    id: None,
                    prompt,
                    response,
                    created_at,
                    persisted: false,
                })
            }
        }
    }

    /// The user's stored exchanges, oldest first.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<BotExchange>, AppError> {
        Ok(BotExchangeRepository::list_for_user(&self.db, user_id).await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::bot::provider::{CompletionError, DisabledCompletion};
    use async_trait::async_trait;
    use lib_core::model::store::memory_pool;
    use lib_core::model::store::models::UserForCreate;
    use lib_core::model::store::UserRepository;

    /// Provider answering simple sums, for tests.
    pub(crate) struct Arithmetic;

    #[async_trait]
    impl CompletionProvider for Arithmetic {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            let sum: i64 = prompt
                .split('+')
                .map(|part| part.trim().parse::<i64>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| CompletionError::Request(e.to_string()))?
                .into_iter()
                .sum();
            Ok(sum.to_string())
        }

        fn name(&self) -> &str {
            "arithmetic"
        }
    }

    struct Stalled;

    #[async_trait]
    impl CompletionProvider for Stalled {
        async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    async fn setup(provider: Arc<dyn CompletionProvider>) -> (BotConversationService, DbPool, UserId) {
        let pool = memory_pool().await.unwrap();
        let user = UserRepository::create(&pool, UserForCreate::new("Asker", "asker@example.com")).await.unwrap();
        let service = BotConversationService::new(pool.clone(), provider, Duration::from_secs(5));
        (service, pool, user.id)
    }

    #[tokio::test]
    async fn test_ask_returns_and_stores_exchange() {
        // Arrange
        let (service, _pool, user_id) = setup(Arc::new(Arithmetic)).await;

        // Act
        let answer = service.ask(user_id, "2+2", service.default_timeout()).await.unwrap();

        // Assert
        assert_eq!(answer.prompt, "2+2");
        assert_eq!(answer.response, "4");
        assert!(answer.persisted);
        assert!(answer.id.is_some());

        let history = service.history(user_id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].response, "4");
    }

    #[tokio::test]
    async fn test_provider_failure_is_upstream_and_stores_nothing() {
        let (service, _pool, user_id) = setup(Arc::new(DisabledCompletion::new("no key"))).await;

        let err = service.ask(user_id, "2+2", Duration::from_secs(1)).await.unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert!(err.is_retryable());
        assert!(service.history(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_retryable_and_stores_nothing() {
        let (service, _pool, user_id) = setup(Arc::new(Stalled)).await;

        let err = service.ask(user_id, "hello", Duration::from_millis(50)).await.unwrap_err();

        assert!(matches!(err, AppError::UpstreamTimeout(t) if t == Duration::from_millis(50)));
        assert!(err.is_retryable());
        assert!(service.history(user_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_failure_still_returns_answer() {
        let (service, pool, user_id) = setup(Arc::new(Arithmetic)).await;
        sqlx::query("DROP TABLE bot_exchanges").execute(&pool).await.unwrap();

        let answer = service.ask(user_id, "1+2", Duration::from_secs(1)).await.unwrap();

        assert_eq!(answer.response, "3");
        assert!(!answer.persisted);
        assert!(answer.id.is_none());
    }

    #[tokio::test]
    async fn test_empty_prompt_is_validation_error() {
        let (service, _pool, user_id) = setup(Arc::new(Arithmetic)).await;

        let err = service.ask(user_id, "   ", Duration::from_secs(1)).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }
}
