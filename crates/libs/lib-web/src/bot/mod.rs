//! # Bot Conversation
//!
//! Request/response conversation with a language model, persisted per user.
//!
//! - **[`provider`]**: Completion provider seam and its configuration
//! - **[`service`]**: Ask with timeout, persist, history

pub mod provider;
pub mod service;

pub use provider::{
    provider_from_config, AiProvider, BotConfig, CompletionError, CompletionProvider, DisabledCompletion,
};
#[cfg(feature = "genai")]
pub use provider::GenaiCompletion;
pub use service::BotConversationService;
