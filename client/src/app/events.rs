//! # Application Events
//!
//! Messages flowing into the conversation view's inbox, and the commands the
//! view hands back for the session to execute.

use shared::dto::{BotAskResponse, BotExchange, LiveEvent, Message, UserId};

use crate::error::ClientError;

/// What the user has open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversation {
    /// Direct conversation with another user.
    User(UserId),
    /// The bot conversation.
    Bot,
}

/// Connection state of the live channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveStatus {
    Connecting,
    Connected,
    Reconnecting,
    /// Gave up after repeated failures.
    Disabled,
}

/// Inbox entries, consumed by the view in arrival order.
///
/// Fetch results carry the `ticket` of the selection that requested them so a
/// late answer for an abandoned selection can be recognised and dropped.
#[derive(Debug, Clone)]
pub enum ViewEvent {
    /// Pushed by the server over the live channel.
    Live(LiveEvent),
    LiveStatus(LiveStatus),
    HistoryLoaded {
        ticket: u64,
        other: UserId,
        result: Result<Vec<Message>, ClientError>,
    },
    BotHistoryLoaded {
        ticket: u64,
        result: Result<Vec<BotExchange>, ClientError>,
    },
    /// Synchronous response of the caller's own send.
    MessageSent(Message),
    BotAnswered(BotAskResponse),
}

/// Work the view asks the session to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FetchHistory { ticket: u64, other: UserId },
    FetchBotHistory { ticket: u64 },
}
