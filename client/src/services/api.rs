//! # API Client
//!
//! HTTP client for the chat backend's REST endpoints.
//!
//! [`ChatApi`] is the seam the session drives; [`ApiClient`] is the `reqwest`
//! implementation. Every request carries the bearer token from
//! [`ClientConfig`].

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::dto::{
    BotAskRequest, BotAskResponse, BotExchange, BotHistoryResponse, ErrorResponse, Message, SendMessageRequest,
    UserId, UserListResponse, UserProfile,
};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Trait for chat API operations
///
/// This trait allows for dependency injection and mocking in tests.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Every other user, with their online flag.
    async fn list_users(&self) -> Result<Vec<UserProfile>>;

    /// Messages between the caller and `other`, oldest first.
    async fn history(&self, other: UserId) -> Result<Vec<Message>>;

    /// Persist a message; returns the stored copy.
    async fn send_message(&self, recipient: UserId, request: &SendMessageRequest) -> Result<Message>;

    async fn ask_bot(&self, prompt: &str) -> Result<BotAskResponse>;

    async fn bot_history(&self) -> Result<Vec<BotExchange>>;
}

/// HTTP client for communicating with the backend API server.
pub struct ApiClient {
    client: Client,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// Requests time out after `config.request_timeout` so a dead backend
    /// never hangs the session.
    pub fn new(config: ClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, config }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.config.token)
    }

    async fn read<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| ClientError::Decode(e.to_string()));
        }

        let text = response.text().await.unwrap_or_default();
        let error = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => ClientError::Api {
                status: status.as_u16(),
                code: body.code,
                message: body.error,
                retryable: body.retryable,
            },
            Err(_) => ClientError::Api {
                status: status.as_u16(),
                code: "Unknown".to_string(),
                message: if text.is_empty() { status.to_string() } else { text },
                retryable: status.is_server_error(),
            },
        };
        warn!(status = status.as_u16(), error = %error, "API request failed");
        Err(error)
    }
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn list_users(&self) -> Result<Vec<UserProfile>> {
        let url = self.config.api_url("/api/users");
        let response = self.authorized(self.client.get(&url)).send().await?;
        let body: UserListResponse = Self::read(response).await?;
        Ok(body.users)
    }

    async fn history(&self, other: UserId) -> Result<Vec<Message>> {
        let url = self.config.api_url(&format!("/api/conversations/{}/messages", other));
        let response = self.authorized(self.client.get(&url)).send().await?;
        let messages: Vec<Message> = Self::read(response).await?;
        debug!(other, count = messages.len(), "History fetched");
        Ok(messages)
    }

    async fn send_message(&self, recipient: UserId, request: &SendMessageRequest) -> Result<Message> {
        let url = self.config.api_url(&format!("/api/conversations/{}/messages", recipient));
        let response = self.authorized(self.client.post(&url)).json(request).send().await?;
        Self::read(response).await
    }

    async fn ask_bot(&self, prompt: &str) -> Result<BotAskResponse> {
        let url = self.config.api_url("/api/bot/ask");
        let request = BotAskRequest { prompt: prompt.to_string() };
        let response = self.authorized(self.client.post(&url)).json(&request).send().await?;
        Self::read(response).await
    }

    async fn bot_history(&self) -> Result<Vec<BotExchange>> {
        let url = self.config.api_url("/api/bot/messages");
        let response = self.authorized(self.client.get(&url)).send().await?;
        let body: BotHistoryResponse = Self::read(response).await?;
        Ok(body.exchanges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_backend_is_a_retryable_network_error() {
        // Nothing listens on port 9 of localhost.
        let mut config = ClientConfig::new("http://127.0.0.1:9", "token");
        config.request_timeout = std::time::Duration::from_secs(2);
        let api = ApiClient::new(config);

        let err = api.list_users().await.unwrap_err();

        assert!(matches!(err, ClientError::Network(_)), "got {:?}", err);
        assert!(err.is_retryable());
    }
}
