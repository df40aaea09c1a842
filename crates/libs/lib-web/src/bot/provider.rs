//! # Completion Provider
//!
//! The language-model seam of the bot conversation. The service only sees
//! [`CompletionProvider`]; the concrete backend is chosen from configuration.
//!
//! With the `genai` feature, [`GenaiCompletion`] talks to Groq, DeepSeek,
//! OpenAI, Anthropic or Gemini through rust-genai. Without it, or without an
//! API key, [`DisabledCompletion`] answers every prompt with
//! [`CompletionError::Unavailable`].

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lib_utils::envs::{self, get_env_or, get_env_parse_or};
use thiserror::Error;

/// Request/response text completion.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Produce a response for a single prompt.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("bot is not available: {0}")]
    Unavailable(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider returned an empty response")]
    EmptyResponse,
}

// region: --- Provider selection

/// AI provider type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AiProvider {
    /// Groq (default)
    #[default]
    Groq,
    DeepSeek,
    OpenAI,
    Anthropic,
    /// Google Gemini
    Gemini,
}

impl AiProvider {
    /// Default model name for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            AiProvider::Groq => "llama-3.1-8b-instant",
            AiProvider::DeepSeek => "deepseek-chat",
            AiProvider::OpenAI => "gpt-4o-mini",
            AiProvider::Anthropic => "claude-3-haiku-20240307",
            AiProvider::Gemini => "gemini-2.0-flash",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            AiProvider::Groq => "GROQ_API_KEY",
            AiProvider::DeepSeek => "DEEPSEEK_API_KEY",
            AiProvider::OpenAI => "OPENAI_API_KEY",
            AiProvider::Anthropic => "ANTHROPIC_API_KEY",
            AiProvider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl FromStr for AiProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "groq" => Ok(AiProvider::Groq),
            "deepseek" => Ok(AiProvider::DeepSeek),
            "openai" => Ok(AiProvider::OpenAI),
            "anthropic" => Ok(AiProvider::Anthropic),
            "gemini" => Ok(AiProvider::Gemini),
            other => Err(format!("unknown bot provider '{}'", other)),
        }
    }
}

// endregion: --- Provider selection

// region: --- Config

const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly assistant inside a chat app. \
    Answer the user's question directly and concisely. \
    If you are unsure about something, say so rather than guessing.";

/// Bot configuration
#[derive(Clone, Debug)]
pub struct BotConfig {
    pub provider: AiProvider,
    /// Empty when the provider's key env var is unset.
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    /// Maximum response length in tokens
    pub max_tokens: u32,
    pub temperature: f32,
    /// Completion timeout applied per request
    pub timeout: Duration,
}

impl Default for BotConfig {
    fn default() -> Self {
        let provider = AiProvider::default();
        Self {
            provider,
            api_key: String::new(),
            model: provider.default_model().to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 500,
            temperature: 0.7,
            timeout: Duration::from_secs(30),
        }
    }
}

impl BotConfig {
    /// Load from `BOT_*` environment variables and the provider's key variable.
    pub fn from_env() -> Result<Self, envs::Error> {
        let defaults = Self::default();
        let provider: AiProvider = get_env_parse_or("BOT_PROVIDER", defaults.provider)?;

        Ok(Self {
            provider,
            api_key: get_env_or(provider.api_key_env(), ""),
            model: get_env_or("BOT_MODEL", provider.default_model()),
            system_prompt: get_env_or("BOT_SYSTEM_PROMPT", &defaults.system_prompt),
            max_tokens: get_env_parse_or("BOT_MAX_TOKENS", defaults.max_tokens)?,
            temperature: get_env_parse_or("BOT_TEMPERATURE", defaults.temperature)?,
            timeout: Duration::from_secs(get_env_parse_or("BOT_TIMEOUT_SECS", defaults.timeout.as_secs())?),
        })
    }
}

// endregion: --- Config

/// Build the provider described by `config`.
pub fn provider_from_config(config: &BotConfig) -> Arc<dyn CompletionProvider> {
    if config.api_key.trim().is_empty() {
        return Arc::new(DisabledCompletion::new(format!(
            "{} is not set",
            config.provider.api_key_env()
        )));
    }

    #[cfg(feature = "genai")]
    let provider: Arc<dyn CompletionProvider> = Arc::new(GenaiCompletion::new(config.clone()));

    #[cfg(not(feature = "genai"))]
    let provider: Arc<dyn CompletionProvider> =
        Arc::new(DisabledCompletion::new("built without the 'genai' feature"));

    provider
}

// region: --- Disabled

/// Provider used when no backend is configured.
#[derive(Debug, Clone)]
pub struct DisabledCompletion {
    reason: String,
}

impl DisabledCompletion {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl CompletionProvider for DisabledCompletion {
    async fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Err(CompletionError::Unavailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "disabled"
    }
}

// endregion: --- Disabled

// region: --- Genai

#[cfg(feature = "genai")]
pub struct GenaiCompletion {
    client: genai::Client,
    config: BotConfig,
}

#[cfg(feature = "genai")]
impl GenaiCompletion {
    pub fn new(config: BotConfig) -> Self {
        use genai::resolver::{AuthData, AuthResolver};

        let api_key = config.api_key.clone();
        let auth_resolver = AuthResolver::from_resolver_fn(
            move |_model_iden| -> Result<Option<AuthData>, genai::resolver::Error> {
                Ok(Some(AuthData::from_single(api_key.clone())))
            },
        );

        let client = genai::Client::builder()
            .with_auth_resolver(auth_resolver)
            .build();

        Self { client, config }
    }
}

#[cfg(feature = "genai")]
#[async_trait]
impl CompletionProvider for GenaiCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        use genai::chat::{ChatMessage, ChatOptions, ChatRequest};

        let chat_req = ChatRequest::default()
            .with_system(&self.config.system_prompt)
            .append_message(ChatMessage::user(prompt));

        let chat_options = ChatOptions::default()
            .with_temperature(self.config.temperature as f64)
            .with_max_tokens(self.config.max_tokens);

        tracing::debug!("[BOT] Calling provider with model: {}", self.config.model);
        let chat_res = self
            .client
            .exec_chat(&self.config.model, chat_req, Some(&chat_options))
            .await
            .map_err(|e| CompletionError::Request(e.to_string()))?;

        let text = chat_res
            .first_text()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        if text.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }

        Ok(text)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

// endregion: --- Genai
