//! # Application Module
//!
//! Client-side conversation state and the session that drives it.

pub mod events;
pub mod session;
pub mod view;

pub use events::{Command, Conversation, LiveStatus, ViewEvent};
pub use session::ChatSession;
pub use view::{BotEntry, ConversationView, ViewState};
