//! Room lifecycle: create, join, leave, listings, and history.

use super::{Hub, RoomState};
use crate::error::RelayError;
use crate::protocol::{MembershipAction, RoomMessageView, RoomView, ServerMessage, UserSummary};
use crate::storage::Room;
use crate::types::{
    ConnectionId, RoomId, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT, ROOM_NAME_MAX_LEN,
    ROOM_NAME_MIN_LEN,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

fn validate_room_name(name: &str) -> Result<(), RelayError> {
    let len = name.chars().count();
    if len < ROOM_NAME_MIN_LEN || len > ROOM_NAME_MAX_LEN {
        return Err(RelayError::InvalidRoomName(format!(
            "must be between {ROOM_NAME_MIN_LEN} and {ROOM_NAME_MAX_LEN} characters"
        )));
    }
    Ok(())
}

fn room_view(room: &Room, member_count: usize) -> RoomView {
    RoomView {
        room_id: room.room_id,
        name: room.name.clone(),
        creator: room.creator_username.clone(),
        creator_id: room.creator_id,
        member_count,
        is_public: room.is_public,
        created_at: room.created_at,
    }
}

impl Hub {
    /// Currently registered (user_id, username) for this connection, or a
    /// `NotRegistered` error.
    async fn require_identity(
        &self,
        connection_id: ConnectionId,
    ) -> Result<(crate::types::UserId, String), RelayError> {
        let state = self.state.read().await;
        let entry = state
            .sessions
            .get(&connection_id)
            .ok_or(RelayError::NotRegistered)?;
        match (entry.user_id, &entry.username) {
            (Some(user_id), Some(username)) => Ok((user_id, username.clone())),
            _ => Err(RelayError::NotRegistered),
        }
    }

    /// Fetch the in-memory room state, loading membership from the store on
    /// first touch. Takes the hub write lock only when a new room needs to
    /// be registered in the index.
    pub(crate) async fn room_state(&self, room_id: RoomId) -> Result<Arc<RoomState>, RelayError> {
        {
            let state = self.state.read().await;
            if let Some(room) = state.rooms.get(&room_id) {
                return Ok(room.clone());
            }
        }
        let members: HashSet<_> = self.store.list_members(room_id)?.into_iter().collect();
        let room_state = Arc::new(RoomState {
            room_id,
            members: tokio::sync::RwLock::new(members),
        });
        let mut state = self.state.write().await;
        Ok(state.rooms.entry(room_id).or_insert(room_state).clone())
    }

    async fn send_room_created_error(&self, connection_id: ConnectionId, err: RelayError) {
        self.send_to_connection(
            connection_id,
            ServerMessage::RoomCreated {
                success: false,
                room: None,
                error: Some(err.code().to_string()),
            },
        )
        .await;
    }

    async fn send_room_joined_error(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        err: RelayError,
    ) {
        self.send_to_connection(
            connection_id,
            ServerMessage::RoomJoined {
                success: false,
                room_id,
                room: None,
                members: None,
                history: None,
                error: Some(err.code().to_string()),
            },
        )
        .await;
    }

    async fn send_room_left_error(&self, connection_id: ConnectionId, room_id: RoomId, err: RelayError) {
        self.send_to_connection(
            connection_id,
            ServerMessage::RoomLeft {
                success: false,
                room_id,
                error: Some(err.code().to_string()),
            },
        )
        .await;
    }

    /// A `room_create` always persists a brand-new room, even if the name
    /// collides with an existing one — rooms are never deduplicated by name.
    pub(crate) async fn create_room(&self, connection_id: ConnectionId, name: String, is_public: bool) {
        let (user_id, username) = match self.require_identity(connection_id).await {
            Ok(identity) => identity,
            Err(e) => return self.send_room_created_error(connection_id, e).await,
        };
        if let Err(e) = validate_room_name(&name) {
            return self.send_room_created_error(connection_id, e).await;
        }

        let room = match self.store.create_room(&name, user_id, &username, is_public) {
            Ok(room) => room,
            Err(e) => {
                tracing::warn!(error = %e, "room persistence failed");
                return self
                    .send_room_created_error(
                        connection_id,
                        RelayError::InvalidMessage("failed to create room".into()),
                    )
                    .await;
            }
        };
        let _ = self.store.add_member(room.room_id, user_id);

        let room_state = Arc::new(RoomState {
            room_id: room.room_id,
            members: tokio::sync::RwLock::new(HashSet::from([user_id])),
        });
        self.state
            .write()
            .await
            .rooms
            .insert(room.room_id, room_state);

        info!(%connection_id, %username, room = %room.name, "room created");

        let view = room_view(&room, 1);
        self.send_to_connection(
            connection_id,
            ServerMessage::RoomCreated {
                success: true,
                room: Some(view.clone()),
                error: None,
            },
        )
        .await;

        if room.is_public {
            self.broadcast_to_all_except(
                connection_id,
                ServerMessage::RoomCreated {
                    success: true,
                    room: Some(view),
                    error: None,
                },
            )
            .await;
        }
    }

    /// Joining a room you're already a member of is a silent reconnect: the
    /// reply is resent but no `room_members` notification goes out.
    pub(crate) async fn join_room(&self, connection_id: ConnectionId, room_id: RoomId) {
        let (user_id, username) = match self.require_identity(connection_id).await {
            Ok(identity) => identity,
            Err(e) => return self.send_room_joined_error(connection_id, room_id, e).await,
        };

        let room = match self.store.get_room(room_id) {
            Ok(Some(room)) => room,
            Ok(None) => {
                return self
                    .send_room_joined_error(connection_id, room_id, RelayError::RoomNotFound)
                    .await
            }
            Err(e) => return self.send_room_joined_error(connection_id, room_id, e).await,
        };

        let room_state = match self.room_state(room_id).await {
            Ok(rs) => rs,
            Err(e) => return self.send_room_joined_error(connection_id, room_id, e).await,
        };

        let already_member = room_state.members.read().await.contains(&user_id);

        if !already_member {
            if let Err(e) = self.store.add_member(room_id, user_id) {
                return self.send_room_joined_error(connection_id, room_id, e).await;
            }
            room_state.members.write().await.insert(user_id);
        }
        let _ = self.store.touch_room_activity(room_id);

        let member_count = room_state.members.read().await.len();
        let members_usernames = self.resolve_usernames(&room_state).await;
        let history = self
            .store
            .recent_messages(room_id, DEFAULT_HISTORY_LIMIT)
            .unwrap_or_default()
            .into_iter()
            .rev()
            .map(|m| RoomMessageView {
                message_id: m.message_id,
                from: m.sender_username,
                from_id: m.sender_id,
                content: m.content,
                timestamp: m.created_at,
            })
            .collect();

        self.send_to_connection(
            connection_id,
            ServerMessage::RoomJoined {
                success: true,
                room_id,
                room: Some(room_view(&room, member_count)),
                members: Some(members_usernames.clone()),
                history: Some(history),
                error: None,
            },
        )
        .await;

        if !already_member {
            self.broadcast_to_room_except(
                &room_state,
                connection_id,
                ServerMessage::RoomMembers {
                    room_id,
                    action: MembershipAction::Joined,
                    user: username,
                    members: members_usernames,
                },
            )
            .await;
        }
    }

    pub(crate) async fn leave_room(&self, connection_id: ConnectionId, room_id: RoomId) {
        let (user_id, username) = match self.require_identity(connection_id).await {
            Ok(identity) => identity,
            Err(e) => return self.send_room_left_error(connection_id, room_id, e).await,
        };

        match self.store.get_room(room_id) {
            Ok(Some(_)) => {}
            Ok(None) => {
                return self
                    .send_room_left_error(connection_id, room_id, RelayError::RoomNotFound)
                    .await
            }
            Err(e) => return self.send_room_left_error(connection_id, room_id, e).await,
        }

        let room_state = match self.room_state(room_id).await {
            Ok(rs) => rs,
            Err(e) => return self.send_room_left_error(connection_id, room_id, e).await,
        };

        let was_member = room_state.members.write().await.remove(&user_id);
        if !was_member {
            return self
                .send_room_left_error(connection_id, room_id, RelayError::NotInRoom)
                .await;
        }
        let _ = self.store.remove_member(room_id, user_id);
        let _ = self.store.touch_room_activity(room_id);

        self.send_to_connection(
            connection_id,
            ServerMessage::RoomLeft {
                success: true,
                room_id,
                error: None,
            },
        )
        .await;

        let members_usernames = self.resolve_usernames(&room_state).await;
        self.broadcast_to_room_except(
            &room_state,
            connection_id,
            ServerMessage::RoomMembers {
                room_id,
                action: MembershipAction::Left,
                user: username,
                members: members_usernames,
            },
        )
        .await;
    }

    /// Every public room, plus private rooms the requester already belongs to.
    pub(crate) async fn list_rooms(&self, connection_id: ConnectionId) {
        let (user_id, _username) = match self.require_identity(connection_id).await {
            Ok(identity) => identity,
            Err(e) => return self.send_error(connection_id, e).await,
        };
        let rooms = match self.store.list_rooms() {
            Ok(rooms) => rooms,
            Err(e) => return self.send_error(connection_id, e).await,
        };
        let mut summaries = Vec::new();
        for room in rooms {
            if !room.is_public && !self.store.is_member(room.room_id, user_id).unwrap_or(false) {
                continue;
            }
            let count = self.store.member_count(room.room_id).unwrap_or(0);
            summaries.push(room_view(&room, count));
        }
        self.send_to_connection(connection_id, ServerMessage::RoomListResponse { rooms: summaries })
            .await;
    }

    pub(crate) async fn list_users(&self, connection_id: ConnectionId) {
        let state = self.state.read().await;
        let users = state
            .by_username
            .iter()
            .filter_map(|(username, conn)| {
                state
                    .sessions
                    .get(conn)
                    .and_then(|e| e.user_id)
                    .map(|user_id| UserSummary {
                        user_id,
                        username: username.clone(),
                    })
            })
            .collect();
        drop(state);
        self.send_to_connection(connection_id, ServerMessage::UserListResponse { users })
            .await;
    }

    pub(crate) async fn get_history(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        limit: Option<usize>,
        before: Option<i64>,
    ) {
        let (user_id, _username) = match self.require_identity(connection_id).await {
            Ok(identity) => identity,
            Err(e) => return self.send_error(connection_id, e).await,
        };

        let room_state = match self.room_state(room_id).await {
            Ok(rs) => rs,
            Err(e) => return self.send_error(connection_id, e).await,
        };
        let is_member = room_state.members.read().await.contains(&user_id);
        if !is_member {
            return self.send_error(connection_id, RelayError::NotInRoom).await;
        }

        let limit = match limit {
            None | Some(0) => DEFAULT_HISTORY_LIMIT,
            Some(n) => n.min(MAX_HISTORY_LIMIT),
        };

        let mut fetched = self
            .store
            .history(room_id, limit + 1, before)
            .unwrap_or_default();
        let has_more = fetched.len() > limit;
        fetched.truncate(limit);
        let messages = fetched
            .into_iter()
            .rev()
            .map(|m| RoomMessageView {
                message_id: m.message_id,
                from: m.sender_username,
                from_id: m.sender_id,
                content: m.content,
                timestamp: m.created_at,
            })
            .collect();

        self.send_to_connection(
            connection_id,
            ServerMessage::RoomHistoryResponse {
                room_id,
                messages,
                has_more,
            },
        )
        .await;
    }

    async fn resolve_usernames(&self, room_state: &RoomState) -> Vec<String> {
        // Hub lock is acquired before the room lock, per the hub's lock
        // ordering rule — never the reverse.
        let state = self.state.read().await;
        let members = room_state.members.read().await;
        members
            .iter()
            .copied()
            .filter_map(|user_id| {
                state
                    .by_user_id
                    .get(&user_id)
                    .and_then(|conn| state.sessions.get(conn))
                    .and_then(|entry| entry.username.clone())
            })
            .collect()
    }

    /// Fan out to every currently-connected member of a room except one
    /// connection, under hub-lock-then-room-lock order. A full outbound
    /// queue silently drops the message — no backpressure onto the sender.
    pub(crate) async fn broadcast_to_room_except(
        &self,
        room_state: &RoomState,
        except: ConnectionId,
        message: ServerMessage,
    ) {
        let state = self.state.read().await;
        let members = room_state.members.read().await;
        for user_id in members.iter() {
            if let Some(conn) = state.by_user_id.get(user_id) {
                if *conn == except {
                    continue;
                }
                if let Some(entry) = state.sessions.get(conn) {
                    entry.handle.send(message.clone());
                }
            }
        }
    }
}
