//! # Notification Fan-out
//!
//! Live push for order events over `/ws`.
//!
//! Two audiences: one broadcast room for admin sessions and one room per
//! order owner. A connected session declares which it is after the
//! upgrade (`{"type":"joinAdmin"}` or `{"type":"joinUser","userId":...}`);
//! until then it receives nothing. Each session is backed by an unbounded
//! channel that a bridge task forwards into the socket.
//!
//! Delivery is at-most-once with no durability: events to an audience with
//! no registered session are dropped, a closed session channel is dropped,
//! and nothing is queued or retried. Events carry the full current order
//! representation, not a diff.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::state::AppState;

type SessionId = Uuid;
type EventSender = mpsc::UnboundedSender<String>;

#[derive(Default)]
struct Rooms {
    admins: HashMap<SessionId, EventSender>,
    owners: HashMap<Uuid, HashMap<SessionId, EventSender>>,
}

#[derive(Default)]
pub struct Notifier {
    rooms: RwLock<Rooms>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn join_admin(&self, session: SessionId, tx: EventSender) {
        self.rooms.write().await.admins.insert(session, tx);
    }

    pub async fn join_owner(&self, owner: Uuid, session: SessionId, tx: EventSender) {
        self.rooms
            .write()
            .await
            .owners
            .entry(owner)
            .or_default()
            .insert(session, tx);
    }

    pub async fn leave(&self, session: SessionId) {
        let mut rooms = self.rooms.write().await;

        rooms.admins.remove(&session);
        rooms.owners.retain(|_, sessions| {
            sessions.remove(&session);
            !sessions.is_empty()
        });
    }

    pub async fn emit_to_admin<T: Serialize>(&self, event: &str, payload: &T) {
        let Some(frame) = envelope(event, payload) else {
            return;
        };

        let rooms = self.rooms.read().await;

        if rooms.admins.is_empty() {
            debug!(event, "no admin sessions, dropping event");
            return;
        }

        deliver(rooms.admins.values(), &frame);
    }

    pub async fn emit_to_owner<T: Serialize>(&self, owner: Uuid, event: &str, payload: &T) {
        let Some(frame) = envelope(event, payload) else {
            return;
        };

        let rooms = self.rooms.read().await;

        match rooms.owners.get(&owner) {
            Some(sessions) => deliver(sessions.values(), &frame),
            None => debug!(%owner, event, "no owner sessions, dropping event"),
        }
    }
}

fn envelope<T: Serialize>(event: &str, payload: &T) -> Option<String> {
    match serde_json::to_value(payload) {
        Ok(data) => Some(json!({ "event": event, "data": data }).to_string()),
        Err(e) => {
            warn!(event, "failed to encode event payload: {e}");
            None
        }
    }
}

fn deliver<'a>(sessions: impl Iterator<Item = &'a EventSender>, frame: &str) {
    for tx in sessions {
        if tx.send(frame.to_string()).is_err() {
            debug!("session channel closed, dropping event");
        }
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum JoinMessage {
    JoinAdmin,
    JoinUser {
        #[serde(rename = "userId")]
        user_id: Uuid,
    },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let session = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    info!(%session, "WebSocket client connected");

    let forward = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<JoinMessage>(&text) {
                Ok(JoinMessage::JoinAdmin) => {
                    state.notifier.join_admin(session, tx.clone()).await;
                    info!(%session, "admin joined");
                }
                Ok(JoinMessage::JoinUser { user_id }) => {
                    state.notifier.join_owner(user_id, session, tx.clone()).await;
                    info!(%session, %user_id, "user joined");
                }
                Err(_) => warn!(%session, "unrecognized message"),
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.notifier.leave(session).await;
    forward.abort();
    info!(%session, "WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn probe() -> (EventSender, mpsc::UnboundedReceiver<String>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test]
    async fn admin_room_receives_admin_events() {
        let notifier = Notifier::new();
        let (tx, mut rx) = probe();

        notifier.join_admin(Uuid::new_v4(), tx).await;
        notifier
            .emit_to_admin("newOrder", &json!({ "id": "abc" }))
            .await;

        let frame: Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["event"], "newOrder");
        assert_eq!(frame["data"]["id"], "abc");
    }

    #[tokio::test]
    async fn owner_events_reach_only_that_owner() {
        let notifier = Notifier::new();
        let owner = Uuid::new_v4();
        let (owner_tx, mut owner_rx) = probe();
        let (other_tx, mut other_rx) = probe();

        notifier.join_owner(owner, Uuid::new_v4(), owner_tx).await;
        notifier
            .join_owner(Uuid::new_v4(), Uuid::new_v4(), other_tx)
            .await;

        notifier
            .emit_to_owner(owner, "orderUpdate", &json!({ "status": "Accepted" }))
            .await;

        let frame: Value = serde_json::from_str(&owner_rx.recv().await.unwrap()).unwrap();
        assert_eq!(frame["event"], "orderUpdate");
        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn events_to_unregistered_audiences_are_dropped() {
        let notifier = Notifier::new();

        // No sessions at all; both emits drop silently.
        notifier.emit_to_admin("newOrder", &json!({})).await;
        notifier
            .emit_to_owner(Uuid::new_v4(), "orderUpdate", &json!({}))
            .await;
    }

    #[tokio::test]
    async fn a_left_session_receives_nothing_further() {
        let notifier = Notifier::new();
        let session = Uuid::new_v4();
        let (tx, mut rx) = probe();

        notifier.join_admin(session, tx).await;
        notifier.emit_to_admin("newOrder", &json!({ "n": 1 })).await;
        notifier.leave(session).await;
        notifier.emit_to_admin("newOrder", &json!({ "n": 2 })).await;

        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_session_channels_are_skipped() {
        let notifier = Notifier::new();
        let (dead_tx, dead_rx) = probe();
        let (live_tx, mut live_rx) = probe();

        notifier.join_admin(Uuid::new_v4(), dead_tx).await;
        notifier.join_admin(Uuid::new_v4(), live_tx).await;
        drop(dead_rx);

        notifier.emit_to_admin("newOrder", &json!({})).await;

        assert!(live_rx.recv().await.is_some());
    }
}
