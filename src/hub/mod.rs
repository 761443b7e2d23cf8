//! The hub: the relay's single exclusion domain over its combined indices,
//! plus one further per-room exclusion domain for membership sets.
//!
//! `HubState` (sessions + the three lookup indices) lives behind exactly one
//! `tokio::sync::RwLock` so that registration, imposter eviction, and
//! attach/detach can never interleave into an inconsistent view — the same
//! guarantee a P2P node's combined connection/netgroup/ban tracking gets
//! from being owned by a single manager rather than split across locks.
//! Each room's member set is its own `RwLock`; code that needs both always
//! takes the hub lock first.

pub mod identity;
pub mod messages;
pub mod rooms;

use crate::config::RelayConfig;
use crate::protocol::ClientMessage;
use crate::session::SessionHandle;
use crate::storage::Store;
use crate::types::{ConnectionId, RoomId, UserId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

struct SessionEntry {
    handle: SessionHandle,
    user_id: Option<UserId>,
    username: Option<String>,
}

pub(crate) struct RoomState {
    pub room_id: RoomId,
    pub members: RwLock<HashSet<UserId>>,
}

#[derive(Default)]
struct HubState {
    sessions: HashMap<ConnectionId, SessionEntry>,
    by_username: HashMap<String, ConnectionId>,
    by_user_id: HashMap<UserId, ConnectionId>,
    rooms: HashMap<RoomId, Arc<RoomState>>,
}

pub struct Hub {
    state: RwLock<HubState>,
    pub(crate) store: Store,
    pub(crate) config: RelayConfig,
}

impl Hub {
    pub fn new(store: Store, config: RelayConfig) -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(HubState::default()),
            store,
            config,
        })
    }

    pub async fn attach(&self, handle: SessionHandle) {
        let mut state = self.state.write().await;
        state.sessions.insert(
            handle.connection_id,
            SessionEntry {
                handle,
                user_id: None,
                username: None,
            },
        );
    }

    pub async fn detach(&self, connection_id: ConnectionId) {
        let removed = {
            let mut state = self.state.write().await;
            let entry = state.sessions.remove(&connection_id);
            if let Some(entry) = &entry {
                if let Some(username) = &entry.username {
                    state.by_username.remove(username);
                }
                if let Some(user_id) = entry.user_id {
                    state.by_user_id.remove(&user_id);
                }
            }
            entry
        };

        if let Some(entry) = removed {
            if let (Some(user_id), Some(username)) = (entry.user_id, entry.username) {
                self.broadcast_user_left(user_id, &username, connection_id)
                    .await;
            }
        }
    }

    pub async fn reject_invalid_message(&self, connection_id: ConnectionId, detail: String) {
        self.send_to_connection(
            connection_id,
            crate::protocol::ServerMessage::Error {
                code: crate::error::ErrorCode::InvalidMessage.to_string(),
                message: detail,
                target: None,
            },
        )
        .await;
    }

    pub async fn handle_client_message(&self, connection_id: ConnectionId, message: ClientMessage) {
        debug!(%connection_id, ?message, "dispatching client message");
        match message {
            ClientMessage::Register {
                username,
                fingerprint,
                recovery_code,
            } => {
                self.register(connection_id, username, fingerprint, recovery_code)
                    .await
            }
            ClientMessage::DirectMessage { to, content } => {
                self.send_direct(connection_id, to, content).await
            }
            ClientMessage::RoomCreate { name, is_public } => {
                self.create_room(connection_id, name, is_public).await
            }
            ClientMessage::RoomJoin { room_id } => self.join_room(connection_id, room_id).await,
            ClientMessage::RoomLeave { room_id } => self.leave_room(connection_id, room_id).await,
            ClientMessage::RoomMessage { room_id, content } => {
                self.send_room_message(connection_id, room_id, content).await
            }
            ClientMessage::RoomHistory {
                room_id,
                limit,
                before,
            } => self.get_history(connection_id, room_id, limit, before).await,
            ClientMessage::UserList => self.list_users(connection_id).await,
            ClientMessage::RoomList => self.list_rooms(connection_id).await,
        }
    }

    /// Fan out a message to every currently registered session except one —
    /// used for the global `user_joined`/`user_left` presence notifications.
    async fn broadcast_to_all_except(
        &self,
        except: ConnectionId,
        message: crate::protocol::ServerMessage,
    ) {
        let state = self.state.read().await;
        for (conn_id, entry) in state.sessions.iter() {
            if *conn_id == except || entry.username.is_none() {
                continue;
            }
            entry.handle.send(message.clone());
        }
    }

    pub(crate) async fn broadcast_user_joined(
        &self,
        user_id: UserId,
        username: &str,
        except: ConnectionId,
    ) {
        self.broadcast_to_all_except(
            except,
            crate::protocol::ServerMessage::UserJoined {
                user_id,
                username: username.to_string(),
            },
        )
        .await;
    }

    pub(crate) async fn broadcast_user_left(
        &self,
        user_id: UserId,
        username: &str,
        except: ConnectionId,
    ) {
        self.broadcast_to_all_except(
            except,
            crate::protocol::ServerMessage::UserLeft {
                user_id,
                username: username.to_string(),
            },
        )
        .await;
    }

    pub(crate) async fn send_to_connection(
        &self,
        connection_id: ConnectionId,
        message: crate::protocol::ServerMessage,
    ) {
        let state = self.state.read().await;
        if let Some(entry) = state.sessions.get(&connection_id) {
            entry.handle.send(message);
        }
    }

    pub(crate) async fn send_error(
        &self,
        connection_id: ConnectionId,
        err: crate::error::RelayError,
    ) {
        self.send_to_connection(
            connection_id,
            crate::protocol::ServerMessage::Error {
                code: err.code().to_string(),
                message: err.to_string(),
                target: None,
            },
        )
        .await;
    }

    /// Number of currently attached sessions (connected, registered or not).
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }

    /// Number of currently registered, connected users.
    pub async fn user_count(&self) -> usize {
        self.state.read().await.by_username.len()
    }

    /// Total persisted room count, independent of which rooms are currently
    /// hydrated into memory.
    pub async fn room_count(&self) -> usize {
        self.store.list_rooms().map(|rooms| rooms.len()).unwrap_or(0)
    }

    /// The underlying persisted store, for callers (tests, admin tooling)
    /// that need to inspect state the hub's own API doesn't surface.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Whether a user currently has a live, registered connection — the
    /// cleanup job must never reap a user who is connected right now, no
    /// matter how stale their persisted `last_seen_at` looks.
    pub(crate) async fn is_user_connected(&self, user_id: UserId) -> bool {
        self.state.read().await.by_user_id.contains_key(&user_id)
    }

    /// Drop a room's in-memory state, e.g. after the cleanup job deletes it
    /// from the store. A harmless no-op if nothing had it loaded.
    pub(crate) async fn evict_room_state(&self, room_id: RoomId) {
        self.state.write().await.rooms.remove(&room_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::storage::Store;
    use tokio::sync::mpsc;

    pub(crate) fn test_hub() -> Arc<Hub> {
        Hub::new(Store::open_temporary().unwrap(), RelayConfig::default())
    }

    pub(crate) fn test_handle() -> (SessionHandle, mpsc::Receiver<crate::protocol::ServerMessage>) {
        let (tx, rx) = mpsc::channel(crate::types::OUTBOUND_QUEUE_CAPACITY);
        (SessionHandle::new(ConnectionId::new(), tx), rx)
    }

    #[tokio::test]
    async fn attach_then_detach_clears_session() {
        let hub = test_hub();
        let (handle, _rx) = test_handle();
        let connection_id = handle.connection_id;
        hub.attach(handle).await;
        assert_eq!(hub.connection_count().await, 1);
        hub.detach(connection_id).await;
        assert_eq!(hub.connection_count().await, 0);
    }
}
