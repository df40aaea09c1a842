//! # Chat Client
//!
//! Line-oriented front end over [`ChatSession`].
//!
//! ```text
//! CHAT_TOKEN=<jwt> CHAT_USER_ID=<id> cargo run -p client --bin chat
//!
//! /users            list users with presence
//! /open <id>        open the conversation with a user
//! /bot              open the bot conversation
//! /close            close the open conversation
//! /refresh          re-fetch the open conversation
//! /image <url>      send an image reference
//! /quit
//! anything else     send as text (or ask the bot)
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use client::services::run_live_channel;
use client::{ApiClient, ChatSession, ClientConfig, Conversation, ViewState};
use shared::dto::{Message, SendMessageRequest, UserId};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ClientConfig::from_env()?;
    let me: UserId = std::env::var("CHAT_USER_ID")
        .context("CHAT_USER_ID must be set in environment")?
        .parse()
        .context("CHAT_USER_ID must be a number")?;

    let mut session = ChatSession::new(me, Arc::new(ApiClient::new(config.clone())));
    tokio::spawn(run_live_channel(config, session.inbox()));

    let mut printer = Printer::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Connected as user {}. Type /users to begin.", me);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut session, line.trim()).await {
                    break;
                }
                printer.render(&session);
            }
            alive = session.process_next() => {
                if !alive {
                    break;
                }
                printer.render(&session);
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    // Quiet by default so logs do not interleave with the conversation
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Returns `false` when the user asked to quit.
async fn handle_line(session: &mut ChatSession, line: &str) -> bool {
    let (command, argument) = match line.split_once(' ') {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "/quit" => return false,
        "/users" => match session.list_users().await {
            Ok(users) => {
                for user in users {
                    let marker = if user.online { "●" } else { "○" };
                    println!("  {} {:>4}  {}", marker, user.id, user.full_name);
                }
            }
            Err(e) => println!("! {}", e),
        },
        "/open" => match argument.parse::<UserId>() {
            Ok(other) => session.select(Conversation::User(other)),
            Err(_) => println!("! usage: /open <user id>"),
        },
        "/bot" => session.select(Conversation::Bot),
        "/close" => session.deselect(),
        "/refresh" => session.refresh(),
        "/image" => {
            if let Err(e) = session.send(SendMessageRequest::image(argument)).await {
                println!("! {}", e);
            }
        }
        _ if session.view().state() == ViewState::BotLive => match session.ask_bot(line).await {
            Ok(answer) => println!("bot> {}", answer.response),
            Err(e) if e.is_retryable() => println!("! {} (try again)", e),
            Err(e) => println!("! {}", e),
        },
        _ => {
            if let Err(e) = session.send(SendMessageRequest::text(line)).await {
                println!("! {}", e);
            }
        }
    }
    true
}

/// Prints each message of the open conversation once.
#[derive(Default)]
struct Printer {
    conversation: Option<Conversation>,
    printed: HashSet<i64>,
    last_error: Option<String>,
}

impl Printer {
    fn render(&mut self, session: &ChatSession) {
        let view = session.view();

        if view.conversation() != self.conversation {
            self.conversation = view.conversation();
            self.printed.clear();
            match self.conversation {
                Some(Conversation::User(other)) => {
                    let presence = if view.is_online(other) { "online" } else { "offline" };
                    println!("--- conversation with {} ({}) ---", other, presence);
                }
                Some(Conversation::Bot) => println!("--- bot ---"),
                None => println!("--- closed ---"),
            }
        }

        for message in view.messages() {
            if self.printed.insert(message.id) {
                print_message(view.me(), message);
            }
        }

        let error = view.last_error().map(|e| e.to_string());
        if let Some(message) = &error {
            if self.last_error.as_ref() != Some(message) {
                println!("! {}", message);
            }
        }
        self.last_error = error;
    }
}

fn print_message(me: UserId, message: &Message) {
    let who = if message.sender_id == me { "you".to_string() } else { message.sender_id.to_string() };
    let time = message.created_at.format("%H:%M:%S");
    match (&message.text, &message.image_ref) {
        (Some(text), Some(image)) => println!("[{}] {}: {} [image {}]", time, who, text, image),
        (Some(text), None) => println!("[{}] {}: {}", time, who, text),
        (None, Some(image)) => println!("[{}] {}: [image {}]", time, who, image),
        (None, None) => {}
    }
}
