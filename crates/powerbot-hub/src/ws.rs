use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::info;

use crate::hub::Hub;

/// Upgrades `GET /` (or wherever this is mounted) to a WebSocket and hands
/// the connection to `handle_connection`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, hub))
}

async fn handle_connection(socket: WebSocket, hub: Arc<Hub>) {
    let peer_id = uuid::Uuid::new_v4().to_string();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    hub.join(peer_id.clone(), tx);
    info!(peer_id, peers = hub.peer_count(), "peer joined");

    loop {
        tokio::select! {
            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let text_ref: &str = &text;
                        if text_ref == "ping" {
                            if sink.send(Message::Text("pong".into())).await.is_err() {
                                break;
                            }
                        } else {
                            hub.broadcast(text_ref);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
            forwarded = rx.recv() => {
                match forwarded {
                    Some(payload) => {
                        if sink.send(Message::Text(payload.into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    hub.leave(&peer_id);
    info!(peer_id, peers = hub.peer_count(), "peer left");
}
