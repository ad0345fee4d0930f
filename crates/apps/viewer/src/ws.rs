//! WebSocket bridge to the embedded map renderer.
//!
//! One renderer is driven at a time:
//! - on connect the host sends `hello` and attaches a fresh outbox link,
//!   which replaces any earlier renderer's link
//! - a sender task drains the link and pushes `command` frames in order
//! - renderer frames go through the session's inbound endpoint, which
//!   enforces the `ready` handshake

use axum::extract::ws::{Message, WebSocket};
use bridge::{Delivery, DropReason, HostMessage};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::routes::AppState;

pub async fn handle_renderer_socket(socket: WebSocket, state: AppState) {
    let mut endpoint = state.connector.open(Uuid::new_v4().to_string());
    let (mut ws_tx, mut ws_rx) = socket.split();

    let hello = HostMessage::Hello {
        session_id: endpoint.session().to_string(),
        server_version: env!("CARGO_PKG_VERSION").to_string(),
    };
    let hello = match hello.to_json() {
        Ok(text) => text,
        Err(e) => {
            error!("{e}");
            return;
        }
    };
    if let Err(e) = ws_tx.send(Message::Text(hello)).await {
        error!("Failed to send hello: {e}");
        return;
    }

    info!("renderer session {} connected", endpoint.session());

    let (link, mut commands) = state.outbox.attach();

    // Ends when the link is detached or replaced, or the socket fails.
    let sender_task = tokio::spawn(async move {
        while let Some(envelope) = commands.recv().await {
            let frame = HostMessage::Command {
                seq: envelope.seq,
                script: envelope.payload,
            };
            let text = match frame.to_json() {
                Ok(t) => t,
                Err(e) => {
                    error!("{e}");
                    continue;
                }
            };
            if let Err(e) = ws_tx.send(Message::Text(text)).await {
                warn!("Failed to send command: {e}");
                break;
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        let msg = match msg {
            Ok(m) => m,
            Err(e) => {
                warn!("WS receive error: {e}");
                break;
            }
        };

        match msg {
            Message::Text(text) => match endpoint.handle_text(&text) {
                Delivery::Delivered => {}
                Delivery::Acknowledged(seq) => debug!(session = endpoint.session(), seq, "applied"),
                Delivery::Dropped(DropReason::NotReady) | Delivery::Dropped(DropReason::Malformed) => {}
                Delivery::Dropped(DropReason::ChannelClosed) => {
                    warn!("app loop is gone, closing renderer session {}", endpoint.session());
                    break;
                }
            },
            Message::Binary(_) => {
                // Renderer frames are text only.
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => {
                info!("renderer session {} closed by client", endpoint.session());
                break;
            }
        }
    }

    let session_id = endpoint.session().to_string();
    if !state.outbox.detach(link) {
        debug!("renderer session {session_id} was already replaced");
    }
    if !endpoint.is_ready() {
        debug!("renderer session {session_id} never finished its handshake");
    }
    endpoint.close();
    let _ = sender_task.await;
    info!("renderer session {session_id} disconnected");
}
