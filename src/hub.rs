// WebSocket sync hub for player screens and controller remotes
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};

use crate::models::track::NextSong;
use crate::state::AppState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Role {
    Player,
    Controller,
}

impl Role {
    pub fn parse(raw: &str) -> Role {
        if raw.eq_ignore_ascii_case("player") {
            Role::Player
        } else {
            Role::Controller
        }
    }
}

struct HubClient {
    id: u64,
    #[allow(dead_code)]
    role: Role,
    tx: mpsc::UnboundedSender<Message>,
}

/// Registry of connected sync clients plus the shared playback state.
pub struct Hub {
    next_id: AtomicU64,
    clients: RwLock<Vec<HubClient>>,
    volume: RwLock<u32>,
    pub next_song: RwLock<NextSong>,
}

impl Hub {
    pub fn new() -> Self {
        Hub {
            next_id: AtomicU64::new(1),
            clients: RwLock::new(Vec::new()),
            volume: RwLock::new(100),
            next_song: RwLock::new(NextSong::default()),
        }
    }

    async fn connect(&self, role: Role) -> (u64, mpsc::UnboundedReceiver<Message>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut clients = self.clients.write().await;
        clients.push(HubClient { id, role, tx });
        info!("New {:?} connected. Total: {}", role, clients.len());
        (id, rx)
    }

    pub async fn disconnect(&self, id: u64) {
        let mut clients = self.clients.write().await;
        clients.retain(|c| c.id != id);
    }

    /// Send a message to every connected client except `sender`.
    /// Clients whose channel is gone are pruned.
    pub async fn broadcast(&self, message: &Value, sender: Option<u64>) {
        let text = message.to_string();
        let mut clients = self.clients.write().await;
        clients.retain(|client| {
            if Some(client.id) == sender {
                return true;
            }
            client.tx.send(Message::Text(text.clone().into())).is_ok()
        });
    }

    pub async fn current_volume(&self) -> u32 {
        *self.volume.read().await
    }

    pub async fn set_volume(&self, volume: u32) {
        *self.volume.write().await = volume;
    }
}

#[derive(Debug, Deserialize)]
pub struct SyncParams {
    pub role: Option<String>,
}

/// GET /ws/sync - unified hub for play/vol/control coordination.
/// Expected message format: {"type": "play|vol|control|ping", "data": {...}}
pub async fn ws_sync_handler(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let role = Role::parse(params.role.as_deref().unwrap_or("controller"));
    ws.on_upgrade(move |socket| handle_sync_socket(socket, role, state))
}

async fn handle_sync_socket(socket: WebSocket, role: Role, state: AppState) {
    let (id, mut outbound) = state.hub.connect(role).await;
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Send initial state (current volume)
    let volume = state.hub.current_volume().await;
    let initial = json!({"type": "vol", "data": {"volume": volume}}).to_string();
    if ws_sender.send(Message::Text(initial.into())).await.is_err() {
        state.hub.disconnect(id).await;
        return;
    }

    // Late joiners get the currently cued track so players can catch up
    let next = state.hub.next_song.read().await.clone();
    if let Some(video_id) = &next.video_id {
        let cue = json!({
            "type": "play",
            "data": {"videoId": video_id, "title": next.title, "timestamp": next.timestamp}
        })
        .to_string();
        if ws_sender.send(Message::Text(cue.into())).await.is_err() {
            state.hub.disconnect(id).await;
            return;
        }
    }

    loop {
        tokio::select! {
            // Messages queued for this client by broadcasts
            queued = outbound.recv() => {
                let msg = match queued {
                    Some(m) => m,
                    None => break,
                };
                if ws_sender.send(msg).await.is_err() {
                    break;
                }
            }

            inbound = ws_receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let envelope: Value = match serde_json::from_str(&text) {
                            Ok(v) => v,
                            Err(e) => {
                                warn!("Unparseable sync message from {}: {}", id, e);
                                continue;
                            }
                        };
                        let msg_type = envelope.get("type").and_then(|t| t.as_str()).unwrap_or("");
                        let msg_data = envelope.get("data").cloned().unwrap_or(Value::Null);

                        match msg_type {
                            "ping" => {
                                let ts = SystemTime::now()
                                    .duration_since(UNIX_EPOCH)
                                    .map(|d| d.as_secs_f64())
                                    .unwrap_or(0.0);
                                let pong = json!({"type": "pong", "ts": ts}).to_string();
                                if ws_sender.send(Message::Text(pong.into())).await.is_err() {
                                    break;
                                }
                            }
                            "play" => {
                                state
                                    .hub
                                    .broadcast(&json!({"type": "play", "data": msg_data}), Some(id))
                                    .await;
                            }
                            "vol" => {
                                if let Some(volume) =
                                    msg_data.get("volume").and_then(|v| v.as_u64())
                                {
                                    state.hub.set_volume(volume as u32).await;
                                }
                                state
                                    .hub
                                    .broadcast(&json!({"type": "vol", "data": msg_data}), Some(id))
                                    .await;
                            }
                            "control" => {
                                state
                                    .hub
                                    .broadcast(&json!({"type": "control", "data": msg_data}), Some(id))
                                    .await;
                            }
                            other => {
                                debug!("Ignoring sync message type '{}' from {}", other, id);
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if ws_sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!("WebSocket error for client {}: {}", id, e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.hub.disconnect(id).await;
    info!("Client {} disconnected", id);
}
