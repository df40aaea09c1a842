//! # Live Channel Handler
//!
//! `GET /api/ws/live` - WebSocket carrying `presence.update` and `message.new`
//! events to the authenticated user.
//!
//! Each connection runs two tasks. The writer drains the connection's outbound
//! queue into the socket; the reader only watches for close and errors, since
//! clients send nothing. Whichever ends first tears the connection down and
//! releases its registry entry.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::Extension;
use futures_util::{SinkExt, StreamExt};
use lib_auth::Claims;
use lib_core::AppError;
use shared::dto::UserId;
use tracing::{debug, error, info, warn};

use crate::live::{ConnectionHandle, ConnectionRegistry, Outbound};
use crate::middleware::current_user_id;

pub async fn live_websocket(
    ws: WebSocketUpgrade,
    State(registry): State<Arc<ConnectionRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, AppError> {
    let user_id = current_user_id(&claims)?;

    info!(user_id, "[WS] CONNECT_ATTEMPT user_id={} path=/api/ws/live", user_id);

    Ok(ws
        .on_failed_upgrade(move |e| {
            warn!(user_id, error = %e, "[WS] UPGRADE_FAILED user_id={} error={}", user_id, e);
        })
        .on_upgrade(move |socket| handle_live_socket(socket, registry, user_id)))
}

async fn handle_live_socket(socket: WebSocket, registry: Arc<ConnectionRegistry>, user_id: UserId) {
    let (mut sender, mut receiver) = socket.split();
    let (handle, mut outbound) = ConnectionHandle::new(user_id);
    let connection_id = handle.id();
    let connection_start = Instant::now();

    info!(
        user_id,
        connection_id = %connection_id,
        "[WS] CONNECTED user_id={} connection_id={}",
        user_id,
        connection_id
    );

    let mut send_task = tokio::spawn(async move {
        let mut sent = 0u64;
        while let Some(item) = outbound.recv().await {
            match item {
                Outbound::Event(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            error!(user_id, error = %e, "[WS] SERIALIZE_ERROR user_id={} error={}", user_id, e);
                            continue;
                        }
                    };
                    if let Err(e) = sender.send(WsMessage::Text(json.into())).await {
                        warn!(user_id, error = %e, messages_sent = sent, "[WS] SEND_ERROR user_id={} error={}", user_id, e);
                        break;
                    }
                    sent += 1;
                    debug!(user_id, event = event.kind(), total_sent = sent, "[WS] EVENT_SENT type={}", event.kind());
                }
                Outbound::Close => {
                    debug!(user_id, "[WS] CLOSING user_id={} (replaced or unregistered)", user_id);
                    let _ = sender.send(WsMessage::Close(None)).await;
                    break;
                }
            }
        }
        sent
    });

    // Register only once the writer exists, so the first presence snapshot has somewhere to go.
    registry.register(handle);

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(WsMessage::Close(frame)) => {
                    let reason = frame
                        .map(|f| f.code.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    info!(user_id, reason = %reason, "[WS] CLOSE_RECEIVED user_id={} reason={}", user_id, reason);
                    break;
                }
                Ok(WsMessage::Text(text)) => {
                    debug!(user_id, size = text.len(), "[WS] IGNORED_TEXT user_id={}", user_id);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(user_id, error = %e, "[WS] RECV_ERROR user_id={} error={}", user_id, e);
                    break;
                }
            }
        }
    });

    let mut messages_sent = 0;
    tokio::select! {
        result = &mut send_task => {
            recv_task.abort();
            match result {
                Ok(sent) => messages_sent = sent,
                Err(e) => error!(user_id, error = ?e, "[WS] SEND_TASK_ERROR user_id={} error={:?}", user_id, e),
            }
        }
        result = &mut recv_task => {
            send_task.abort();
            if let Err(e) = result {
                error!(user_id, error = ?e, "[WS] RECV_TASK_ERROR user_id={} error={:?}", user_id, e);
            }
        }
    }

    let released = registry.release(user_id, connection_id);
    let duration = connection_start.elapsed();

    info!(
        user_id,
        connection_id = %connection_id,
        released,
        duration_ms = duration.as_millis(),
        messages_sent,
        "[WS] DISCONNECTED user_id={} duration={:.2}s released={}",
        user_id,
        duration.as_secs_f64(),
        released
    );
}
