//! # Live Channel Client
//!
//! Keeps the `/api/ws/live` WebSocket open and forwards every pushed event into
//! the session inbox, together with [`LiveStatus`] transitions.
//!
//! Reconnects with exponential backoff. After [`MAX_CONNECTION_ATTEMPTS`]
//! consecutive failures the channel reports [`LiveStatus::Disabled`] and stops;
//! a successful connection resets the count. The loop also ends as soon as the
//! inbox is closed.

use std::time::Duration;

use async_channel::Sender;
use futures_util::{Stream, StreamExt};
use shared::dto::LiveEvent;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, trace, warn};

use crate::app::{LiveStatus, ViewEvent};
use crate::config::ClientConfig;

/// Maximum number of consecutive connection failures before giving up
pub const MAX_CONNECTION_ATTEMPTS: u32 = 5;

const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Delay before the next attempt, doubling up to the cap.
pub fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(MAX_RECONNECT_DELAY)
}

/// How a connected session ended.
enum SessionEnd {
    /// Server closed or the socket failed; reconnect.
    Disconnected,
    /// Nobody is listening anymore.
    InboxClosed,
}

/// Run the live channel until the inbox closes or reconnection gives up.
pub async fn run_live_channel(config: ClientConfig, inbox: Sender<ViewEvent>) {
    run_with_delay(config, inbox, INITIAL_RECONNECT_DELAY).await
}

async fn run_with_delay(config: ClientConfig, inbox: Sender<ViewEvent>, initial_delay: Duration) {
    let url = config.live_url();
    let mut failures = 0u32;
    let mut delay = initial_delay;
    let mut status = LiveStatus::Connecting;

    loop {
        if inbox.send(ViewEvent::LiveStatus(status)).await.is_err() {
            return;
        }

        match connect_async(url.as_str()).await {
            Ok((stream, response)) => {
                info!(status = ?response.status(), "[LIVE] CONNECTED");
                failures = 0;
                delay = initial_delay;
                if inbox.send(ViewEvent::LiveStatus(LiveStatus::Connected)).await.is_err() {
                    return;
                }

                match forward_events(stream, &inbox).await {
                    SessionEnd::InboxClosed => return,
                    SessionEnd::Disconnected => warn!("[LIVE] DISCONNECTED reconnecting"),
                }
            }
            Err(e) => {
                failures += 1;
                error!(
                    error = %e,
                    attempt = failures,
                    max_attempts = MAX_CONNECTION_ATTEMPTS,
                    "[LIVE] CONNECT_FAILED"
                );
                if failures >= MAX_CONNECTION_ATTEMPTS {
                    error!("[LIVE] DISABLED after {} attempts", failures);
                    let _ = inbox.send(ViewEvent::LiveStatus(LiveStatus::Disabled)).await;
                    return;
                }
            }
        }

        status = LiveStatus::Reconnecting;
        debug!(delay_ms = delay.as_millis() as u64, "[LIVE] BACKOFF");
        sleep(delay).await;
        delay = next_backoff(delay);
    }
}

async fn forward_events<S>(mut stream: S, inbox: &Sender<ViewEvent>) -> SessionEnd
where
    S: Stream<Item = Result<WsMessage, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    let mut received = 0u64;
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(WsMessage::Text(text)) => match serde_json::from_str::<LiveEvent>(&text) {
                Ok(event) => {
                    received += 1;
                    trace!(kind = event.kind(), "[LIVE] EVENT");
                    if inbox.send(ViewEvent::Live(event)).await.is_err() {
                        return SessionEnd::InboxClosed;
                    }
                }
                Err(e) => warn!(error = %e, "[LIVE] Unparseable event ignored"),
            },
            Ok(WsMessage::Close(frame)) => {
                info!(reason = ?frame.map(|f| f.reason.to_string()), received, "[LIVE] Closed by server");
                return SessionEnd::Disconnected;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, received, "[LIVE] Read error");
                return SessionEnd::Disconnected;
            }
        }
    }
    SessionEnd::Disconnected
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::SinkExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        assert_eq!(next_backoff(Duration::from_secs(1)), Duration::from_secs(2));
        assert_eq!(next_backoff(Duration::from_secs(20)), MAX_RECONNECT_DELAY);
    }

    #[tokio::test]
    async fn test_forwards_pushed_events_into_inbox() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut socket = tokio_tungstenite::accept_async(tcp).await.unwrap();
            let event = LiveEvent::PresenceUpdate { online_user_ids: vec![1, 2] };
            socket
                .send(WsMessage::Text(serde_json::to_string(&event).unwrap()))
                .await
                .unwrap();
            socket.send(WsMessage::Text("not json".to_string())).await.unwrap();
            // Keep the socket open until the client goes away.
            while socket.next().await.is_some() {}
        });

        let (tx, rx) = async_channel::unbounded();
        let config = ClientConfig::new(format!("http://{}", addr), "token");
        let channel = tokio::spawn(run_live_channel(config, tx));

        let mut seen = Vec::new();
        while seen.len() < 3 {
            let event = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.unwrap().unwrap();
            seen.push(format!("{:?}", event));
        }
        assert!(seen[0].contains("Connecting"));
        assert!(seen[1].contains("Connected"));
        assert!(seen[2].contains("PresenceUpdate"));

        drop(rx);
        channel.abort();
    }

    #[tokio::test]
    async fn test_gives_up_after_repeated_failures() {
        // Bind then drop to get a port nobody listens on.
        let addr = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap();
        let (tx, rx) = async_channel::unbounded();
        let config = ClientConfig::new(format!("http://{}", addr), "token");

        tokio::time::timeout(
            Duration::from_secs(5),
            run_with_delay(config, tx, Duration::from_millis(1)),
        )
        .await
        .unwrap();

        let mut last = None;
        while let Ok(event) = rx.try_recv() {
            last = Some(event);
        }
        assert!(matches!(last, Some(ViewEvent::LiveStatus(LiveStatus::Disabled))));
    }
}
