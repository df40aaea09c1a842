//! # Chat Session
//!
//! Owns a [`ConversationView`] and its inbox. User actions (`select`, `send`,
//! `ask_bot`) are methods; asynchronous results (history fetches, live events)
//! come back through the inbox and are applied one at a time by
//! [`ChatSession::process_next`], so the view is only ever touched from the
//! task that owns the session.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use client::{ApiClient, ChatSession, ClientConfig, Conversation};
//! # async fn demo() -> Result<(), client::ClientError> {
//! let config = ClientConfig::from_env()?;
//! let mut session = ChatSession::new(1, Arc::new(ApiClient::new(config.clone())));
//! tokio::spawn(client::services::run_live_channel(config, session.inbox()));
//!
//! session.select(Conversation::User(2));
//! while session.process_next().await {
//!     println!("{} messages", session.view().messages().len());
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use shared::dto::{BotAskResponse, Message, SendMessageRequest, UserId, UserProfile};
use tracing::{debug, instrument};

use super::events::{Command, Conversation, ViewEvent};
use super::view::{ConversationView, ViewState};
use crate::error::{ClientError, Result};
use crate::services::ChatApi;

pub struct ChatSession {
    api: Arc<dyn ChatApi>,
    view: ConversationView,
    inbox_tx: Sender<ViewEvent>,
    inbox_rx: Receiver<ViewEvent>,
}

impl ChatSession {
    pub fn new(me: UserId, api: Arc<dyn ChatApi>) -> Self {
        let (inbox_tx, inbox_rx) = async_channel::unbounded();
        Self {
            api,
            view: ConversationView::new(me),
            inbox_tx,
            inbox_rx,
        }
    }

    /// Sender for producers outside the session, such as the live channel.
    pub fn inbox(&self) -> Sender<ViewEvent> {
        self.inbox_tx.clone()
    }

    pub fn view(&self) -> &ConversationView {
        &self.view
    }

    // region: --- User actions

    pub fn select(&mut self, conversation: Conversation) {
        let command = self.view.select(conversation);
        self.execute(command);
    }

    pub fn deselect(&mut self) {
        self.view.deselect();
    }

    pub fn refresh(&mut self) {
        let command = self.view.refresh();
        self.execute(command);
    }

    /// Send to the open conversation and append the stored message.
    #[instrument(skip_all)]
    pub async fn send(&mut self, request: SendMessageRequest) -> Result<Message> {
        let other = match self.view.state() {
            ViewState::Loading { other } | ViewState::Live { other } => other,
            ViewState::Idle | ViewState::BotLive => {
                return Err(ClientError::Validation("No conversation with a user is open".to_string()));
            }
        };

        let message = self.api.send_message(other, &request).await?;
        debug!(message_id = message.id, other, "[SESSION] SENT");
        self.view.apply(ViewEvent::MessageSent(message.clone()));
        Ok(message)
    }

    #[instrument(skip_all)]
    pub async fn ask_bot(&mut self, prompt: &str) -> Result<BotAskResponse> {
        if self.view.state() != ViewState::BotLive {
            return Err(ClientError::Validation("The bot conversation is not open".to_string()));
        }

        let answer = self.api.ask_bot(prompt).await?;
        self.view.apply(ViewEvent::BotAnswered(answer.clone()));
        Ok(answer)
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>> {
        self.api.list_users().await
    }

    // endregion: --- User actions

    // region: --- Inbox

    /// Wait for the next inbox event and apply it.
    ///
    /// Returns `false` once the inbox is closed.
    pub async fn process_next(&mut self) -> bool {
        match self.inbox_rx.recv().await {
            Ok(event) => {
                self.handle(event);
                true
            }
            Err(_) => false,
        }
    }

    /// Apply everything already queued without waiting. Returns how many
    /// events were applied.
    pub fn process_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.inbox_rx.try_recv() {
            self.handle(event);
            applied += 1;
        }
        applied
    }

    fn handle(&mut self, event: ViewEvent) {
        let command = self.view.apply(event);
        self.execute(command);
    }

    /// Run a view command in the background; the result lands in the inbox.
    fn execute(&self, command: Option<Command>) {
        let Some(command) = command else {
            return;
        };
        let api = Arc::clone(&self.api);
        let inbox = self.inbox_tx.clone();

        tokio::spawn(async move {
            let event = match command {
                Command::FetchHistory { ticket, other } => ViewEvent::HistoryLoaded {
                    ticket,
                    other,
                    result: api.history(other).await,
                },
                Command::FetchBotHistory { ticket } => ViewEvent::BotHistoryLoaded {
                    ticket,
                    result: api.bot_history().await,
                },
            };
            // The session may be gone by now.
            let _ = inbox.send(event).await;
        });
    }

    // endregion: --- Inbox
}
