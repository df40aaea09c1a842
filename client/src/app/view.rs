//! # Conversation View
//!
//! Single-threaded state machine that reconciles REST history with pushed live
//! events for the currently selected conversation.
//!
//! ```text
//!            select(user)              HistoryLoaded(ticket)
//!   Idle ───────────────▶ Loading ─────────────────────▶ Live
//!    ▲   ◀── deselect ──     │  ◀──── select(other user) ─┘
//!    │                       │
//!    └──── select(bot) ───▶ BotLive
//! ```
//!
//! ## Subscription
//!
//! The active participant pair is the subscription key. Leaving a pair clears
//! its contents and bumps the selection `ticket` before anything of the next
//! selection is requested, so once `select`/`deselect` returns nothing from the
//! old pair can land in the view: pushes are filtered by pair and fetch results
//! are filtered by ticket.
//!
//! ## Merge rule
//!
//! Every message enters through one path that dedups by id and keeps the list
//! ordered by `(created_at, id)`. History and pushes can therefore arrive in any
//! order. Pushes that arrive while history is loading are buffered and merged
//! once it lands.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use shared::dto::{BotAskResponse, BotExchange, LiveEvent, Message, ParticipantPair, UserId};
use tracing::debug;

use super::events::{Command, Conversation, LiveStatus, ViewEvent};
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// No conversation selected.
    Idle,
    /// History fetch for `other` in flight; pushes are buffered.
    Loading { other: UserId },
    /// History loaded, pushes for the pair are merged.
    Live { other: UserId },
    /// Bot conversation: request/response only.
    BotLive,
}

/// One prompt/answer pair shown in the bot conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotEntry {
    /// `None` when the server could not persist the exchange.
    pub id: Option<i64>,
    pub prompt: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

impl From<BotExchange> for BotEntry {
    fn from(exchange: BotExchange) -> Self {
        Self {
            id: Some(exchange.id),
            prompt: exchange.prompt,
            response: exchange.response,
            created_at: exchange.created_at,
        }
    }
}

impl From<BotAskResponse> for BotEntry {
    fn from(answer: BotAskResponse) -> Self {
        Self {
            id: answer.id,
            prompt: answer.prompt,
            response: answer.response,
            created_at: answer.created_at,
        }
    }
}

#[derive(Debug)]
pub struct ConversationView {
    me: UserId,
    state: ViewState,
    ticket: u64,
    messages: Vec<Message>,
    seen: HashSet<i64>,
    pending: Vec<Message>,
    bot_entries: Vec<BotEntry>,
    online: Vec<UserId>,
    live_status: LiveStatus,
    last_error: Option<ClientError>,
}

impl ConversationView {
    pub fn new(me: UserId) -> Self {
        Self {
            me,
            state: ViewState::Idle,
            ticket: 0,
            messages: Vec::new(),
            seen: HashSet::new(),
            pending: Vec::new(),
            bot_entries: Vec::new(),
            online: Vec::new(),
            live_status: LiveStatus::Connecting,
            last_error: None,
        }
    }

    // region: --- Accessors

    pub fn me(&self) -> UserId {
        self.me
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn conversation(&self) -> Option<Conversation> {
        match self.state {
            ViewState::Idle => None,
            ViewState::Loading { other } | ViewState::Live { other } => Some(Conversation::User(other)),
            ViewState::BotLive => Some(Conversation::Bot),
        }
    }

    pub fn active_pair(&self) -> Option<ParticipantPair> {
        match self.state {
            ViewState::Loading { other } | ViewState::Live { other } => Some(ParticipantPair::new(self.me, other)),
            ViewState::Idle | ViewState::BotLive => None,
        }
    }

    /// Messages of the active conversation, oldest first.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn bot_entries(&self) -> &[BotEntry] {
        &self.bot_entries
    }

    /// Latest presence snapshot.
    pub fn online_user_ids(&self) -> &[UserId] {
        &self.online
    }

    pub fn is_online(&self, user_id: UserId) -> bool {
        self.online.binary_search(&user_id).is_ok()
    }

    pub fn live_status(&self) -> LiveStatus {
        self.live_status
    }

    pub fn last_error(&self) -> Option<&ClientError> {
        self.last_error.as_ref()
    }

    // endregion: --- Accessors

    // region: --- Selection

    /// Open `conversation`. Re-selecting the open conversation is a no-op.
    pub fn select(&mut self, conversation: Conversation) -> Option<Command> {
        if self.conversation() == Some(conversation) {
            return None;
        }

        match conversation {
            Conversation::User(other) if other == self.me => {
                self.last_error = Some(ClientError::Validation("Cannot open a conversation with yourself".to_string()));
                None
            }
            Conversation::User(other) => {
                self.unsubscribe();
                self.state = ViewState::Loading { other };
                debug!(other, ticket = self.ticket, "[VIEW] SELECT user");
                Some(Command::FetchHistory { ticket: self.ticket, other })
            }
            Conversation::Bot => {
                self.unsubscribe();
                self.state = ViewState::BotLive;
                debug!(ticket = self.ticket, "[VIEW] SELECT bot");
                Some(Command::FetchBotHistory { ticket: self.ticket })
            }
        }
    }

    pub fn deselect(&mut self) {
        if self.state != ViewState::Idle {
            self.unsubscribe();
            self.state = ViewState::Idle;
            debug!(ticket = self.ticket, "[VIEW] DESELECT");
        }
    }

    /// Re-fetch the open conversation; results are merged, not replaced.
    pub fn refresh(&self) -> Option<Command> {
        match self.state {
            ViewState::Idle => None,
            ViewState::Loading { other } | ViewState::Live { other } => {
                Some(Command::FetchHistory { ticket: self.ticket, other })
            }
            ViewState::BotLive => Some(Command::FetchBotHistory { ticket: self.ticket }),
        }
    }

    fn unsubscribe(&mut self) {
        self.ticket += 1;
        self.messages.clear();
        self.seen.clear();
        self.pending.clear();
        self.bot_entries.clear();
        self.last_error = None;
    }

    // endregion: --- Selection

    // region: --- Inbox

    /// Apply one inbox event. May ask for follow-up work.
    pub fn apply(&mut self, event: ViewEvent) -> Option<Command> {
        match event {
            ViewEvent::Live(LiveEvent::PresenceUpdate { mut online_user_ids }) => {
                online_user_ids.sort_unstable();
                online_user_ids.dedup();
                self.online = online_user_ids;
                None
            }
            ViewEvent::Live(LiveEvent::MessageNew(message)) | ViewEvent::MessageSent(message) => {
                self.accept(message);
                None
            }
            ViewEvent::LiveStatus(status) => {
                let previous = std::mem::replace(&mut self.live_status, status);
                // Pushes may have been missed while the channel was down
                if status == LiveStatus::Connected && previous == LiveStatus::Reconnecting {
                    return self.refresh();
                }
                None
            }
            ViewEvent::HistoryLoaded { ticket, other, result } => {
                self.on_history(ticket, other, result);
                None
            }
            ViewEvent::BotHistoryLoaded { ticket, result } => {
                self.on_bot_history(ticket, result);
                None
            }
            ViewEvent::BotAnswered(answer) => {
                if self.state == ViewState::BotLive {
                    let entry = BotEntry::from(answer);
                    if entry.id.is_none() || !self.bot_entries.iter().any(|e| e.id == entry.id) {
                        self.bot_entries.push(entry);
                    }
                }
                None
            }
        }
    }

    fn accept(&mut self, message: Message) {
        match self.state {
            ViewState::Loading { other } if self.is_active(&message, other) => {
                if !self.pending.iter().any(|m| m.id == message.id) {
                    self.pending.push(message);
                }
            }
            ViewState::Live { other } if self.is_active(&message, other) => {
                self.merge(message);
            }
            _ => {
                debug!(message_id = message.id, "[VIEW] DROP message outside active conversation");
            }
        }
    }

    fn on_history(&mut self, ticket: u64, other: UserId, result: Result<Vec<Message>, ClientError>) {
        if ticket != self.ticket {
            debug!(ticket, current = self.ticket, "[VIEW] DROP stale history");
            return;
        }

        let messages = match result {
            Ok(messages) => messages,
            Err(err) => {
                self.last_error = Some(err);
                return;
            }
        };

        for message in messages {
            if self.is_active(&message, other) {
                self.merge(message);
            }
        }
        for message in std::mem::take(&mut self.pending) {
            self.merge(message);
        }

        self.state = ViewState::Live { other };
        self.last_error = None;
    }

    fn on_bot_history(&mut self, ticket: u64, result: Result<Vec<BotExchange>, ClientError>) {
        if ticket != self.ticket || self.state != ViewState::BotLive {
            return;
        }

        match result {
            Ok(exchanges) => {
                let mut entries: Vec<BotEntry> = exchanges.into_iter().map(BotEntry::from).collect();
                for entry in self.bot_entries.drain(..) {
                    if entry.id.is_none() || !entries.iter().any(|e| e.id == entry.id) {
                        entries.push(entry);
                    }
                }
                entries.sort_by_key(|e| e.created_at);
                self.bot_entries = entries;
                self.last_error = None;
            }
            Err(err) => self.last_error = Some(err),
        }
    }

    fn is_active(&self, message: &Message, other: UserId) -> bool {
        message.pair() == ParticipantPair::new(self.me, other)
    }

    fn merge(&mut self, message: Message) -> bool {
        if !self.seen.insert(message.id) {
            return false;
        }
        let key = (message.created_at, message.id);
        let position = self.messages.partition_point(|m| (m.created_at, m.id) <= key);
        self.messages.insert(position, message);
        true
    }

    // endregion: --- Inbox
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ME: UserId = 1;
    const ALICE: UserId = 2;
    const BOB: UserId = 3;

    fn msg(id: i64, from: UserId, to: UserId, secs: i64) -> Message {
        Message {
            id,
            sender_id: from,
            recipient_id: to,
            text: Some(format!("m{}", id)),
            image_ref: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    fn push(message: Message) -> ViewEvent {
        ViewEvent::Live(LiveEvent::MessageNew(message))
    }

    fn history(ticket: u64, other: UserId, messages: Vec<Message>) -> ViewEvent {
        ViewEvent::HistoryLoaded { ticket, other, result: Ok(messages) }
    }

    fn ticket_of(command: Option<Command>) -> u64 {
        match command {
            Some(Command::FetchHistory { ticket, .. }) | Some(Command::FetchBotHistory { ticket }) => ticket,
            None => panic!("expected a command"),
        }
    }

    fn ids(view: &ConversationView) -> Vec<i64> {
        view.messages().iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_select_user_loads_then_goes_live() {
        let mut view = ConversationView::new(ME);

        let command = view.select(Conversation::User(ALICE));
        assert_eq!(command, Some(Command::FetchHistory { ticket: 1, other: ALICE }));
        assert_eq!(view.state(), ViewState::Loading { other: ALICE });

        view.apply(history(1, ALICE, vec![msg(10, ALICE, ME, 1), msg(11, ME, ALICE, 2)]));

        assert_eq!(view.state(), ViewState::Live { other: ALICE });
        assert_eq!(ids(&view), vec![10, 11]);
    }

    #[test]
    fn test_same_message_from_push_and_history_appears_once() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));
        view.apply(history(ticket, ALICE, vec![msg(10, ALICE, ME, 1)]));

        view.apply(push(msg(11, ALICE, ME, 2)));
        let again = view.refresh();
        view.apply(history(ticket_of(again), ALICE, vec![msg(10, ALICE, ME, 1), msg(11, ALICE, ME, 2)]));

        assert_eq!(ids(&view), vec![10, 11]);
    }

    #[test]
    fn test_push_during_loading_is_buffered_and_merged() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));

        // Arrives before history, and history also contains it.
        view.apply(push(msg(12, ALICE, ME, 3)));
        view.apply(push(msg(12, ALICE, ME, 3)));
        assert!(view.messages().is_empty());

        view.apply(history(ticket, ALICE, vec![msg(10, ALICE, ME, 1), msg(12, ALICE, ME, 3)]));

        assert_eq!(ids(&view), vec![10, 12]);
    }

    #[test]
    fn test_switching_conversation_drops_late_events_of_previous_one() {
        let mut view = ConversationView::new(ME);
        let alice_ticket = ticket_of(view.select(Conversation::User(ALICE)));
        view.apply(history(alice_ticket, ALICE, vec![msg(10, ALICE, ME, 1)]));

        let bob_ticket = ticket_of(view.select(Conversation::User(BOB)));
        assert!(view.messages().is_empty());

        // Late traffic from the old conversation.
        view.apply(history(alice_ticket, ALICE, vec![msg(10, ALICE, ME, 1), msg(13, ALICE, ME, 4)]));
        view.apply(push(msg(14, ALICE, ME, 5)));
        assert_eq!(view.state(), ViewState::Loading { other: BOB });

        view.apply(history(bob_ticket, BOB, vec![msg(20, BOB, ME, 6)]));
        view.apply(push(msg(15, ALICE, ME, 7)));
        view.apply(push(msg(21, BOB, ME, 8)));

        assert_eq!(view.state(), ViewState::Live { other: BOB });
        assert_eq!(ids(&view), vec![20, 21]);
    }

    #[test]
    fn test_push_for_other_pair_is_ignored_while_live() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));
        view.apply(history(ticket, ALICE, vec![]));

        view.apply(push(msg(30, BOB, ME, 1)));
        view.apply(push(msg(31, ALICE, BOB, 2)));

        assert!(view.messages().is_empty());
    }

    #[test]
    fn test_reselecting_open_conversation_is_a_noop() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));
        view.apply(history(ticket, ALICE, vec![msg(10, ALICE, ME, 1)]));

        assert_eq!(view.select(Conversation::User(ALICE)), None);

        assert_eq!(view.state(), ViewState::Live { other: ALICE });
        assert_eq!(ids(&view), vec![10]);
        // The original ticket is still current.
        view.apply(history(ticket, ALICE, vec![msg(11, ME, ALICE, 2)]));
        assert_eq!(ids(&view), vec![10, 11]);
    }

    #[test]
    fn test_own_send_is_appended_in_order() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));
        view.apply(history(ticket, ALICE, vec![msg(10, ALICE, ME, 1)]));

        view.apply(ViewEvent::MessageSent(msg(11, ME, ALICE, 2)));
        view.apply(ViewEvent::MessageSent(msg(11, ME, ALICE, 2)));

        assert_eq!(ids(&view), vec![10, 11]);
    }

    #[test]
    fn test_out_of_order_arrival_is_sorted_by_creation() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));
        view.apply(history(ticket, ALICE, vec![msg(10, ALICE, ME, 1)]));

        view.apply(push(msg(13, ALICE, ME, 9)));
        view.apply(push(msg(12, ALICE, ME, 5)));

        assert_eq!(ids(&view), vec![10, 12, 13]);
    }

    #[test]
    fn test_deselect_stops_accepting_pushes() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));
        view.apply(history(ticket, ALICE, vec![msg(10, ALICE, ME, 1)]));

        view.deselect();
        view.apply(push(msg(11, ALICE, ME, 2)));

        assert_eq!(view.state(), ViewState::Idle);
        assert!(view.messages().is_empty());
        assert_eq!(view.refresh(), None);
    }

    #[test]
    fn test_bot_mode_ignores_pushes_and_keeps_answers() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::Bot));
        assert_eq!(view.state(), ViewState::BotLive);

        view.apply(push(msg(10, ALICE, ME, 1)));
        view.apply(ViewEvent::BotAnswered(BotAskResponse {
            id: None,
            prompt: "2+2".to_string(),
            response: "4".to_string(),
            created_at: Utc.timestamp_opt(1_700_000_100, 0).unwrap(),
            persisted: false,
        }));
        view.apply(ViewEvent::BotHistoryLoaded {
            ticket,
            result: Ok(vec![BotExchange {
                id: 7,
                user_id: ME,
                prompt: "hello".to_string(),
                response: "hi".to_string(),
                created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            }]),
        });

        assert!(view.messages().is_empty());
        let prompts: Vec<_> = view.bot_entries().iter().map(|e| e.prompt.as_str()).collect();
        assert_eq!(prompts, vec!["hello", "2+2"]);
    }

    #[test]
    fn test_presence_snapshot_replaces_online_set() {
        let mut view = ConversationView::new(ME);

        view.apply(ViewEvent::Live(LiveEvent::PresenceUpdate { online_user_ids: vec![BOB, ME, ALICE] }));
        assert!(view.is_online(ALICE));
        assert_eq!(view.online_user_ids(), &[ME, ALICE, BOB]);

        view.apply(ViewEvent::Live(LiveEvent::PresenceUpdate { online_user_ids: vec![ME] }));
        assert!(!view.is_online(ALICE));
    }

    #[test]
    fn test_reconnect_refreshes_open_conversation() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));
        view.apply(history(ticket, ALICE, vec![]));

        assert_eq!(view.apply(ViewEvent::LiveStatus(LiveStatus::Connected)), None);
        view.apply(ViewEvent::LiveStatus(LiveStatus::Reconnecting));
        let command = view.apply(ViewEvent::LiveStatus(LiveStatus::Connected));

        assert_eq!(command, Some(Command::FetchHistory { ticket, other: ALICE }));
    }

    #[test]
    fn test_failed_history_keeps_loading_until_retry() {
        let mut view = ConversationView::new(ME);
        let ticket = ticket_of(view.select(Conversation::User(ALICE)));

        view.apply(ViewEvent::HistoryLoaded {
            ticket,
            other: ALICE,
            result: Err(ClientError::Network("refused".to_string())),
        });
        assert_eq!(view.state(), ViewState::Loading { other: ALICE });
        assert!(view.last_error().is_some());

        let retry = view.refresh();
        view.apply(history(ticket_of(retry), ALICE, vec![msg(10, ALICE, ME, 1)]));

        assert_eq!(view.state(), ViewState::Live { other: ALICE });
        assert!(view.last_error().is_none());
    }

    #[test]
    fn test_selecting_self_is_rejected() {
        let mut view = ConversationView::new(ME);

        assert_eq!(view.select(Conversation::User(ME)), None);

        assert_eq!(view.state(), ViewState::Idle);
        assert!(matches!(view.last_error(), Some(ClientError::Validation(_))));
    }
}
