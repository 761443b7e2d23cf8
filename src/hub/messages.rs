//! Direct messages (never persisted, best-effort delivery) and room
//! messages (persisted, fanned out to every connected member).

use super::Hub;
use crate::error::RelayError;
use crate::protocol::ServerMessage;
use crate::types::{now_ms, ConnectionId, MessageId, RoomId, MESSAGE_BODY_MAX_LEN};

fn validate_content(content: &str) -> Result<(), RelayError> {
    if content.is_empty() || content.len() > MESSAGE_BODY_MAX_LEN {
        return Err(RelayError::InvalidMessage(format!(
            "content must be 1-{MESSAGE_BODY_MAX_LEN} bytes"
        )));
    }
    Ok(())
}

impl Hub {
    pub(crate) async fn send_direct(&self, connection_id: ConnectionId, to: String, content: String) {
        let (user_id, from_username) = {
            let state = self.state.read().await;
            let Some(entry) = state.sessions.get(&connection_id) else {
                return;
            };
            match (entry.user_id, &entry.username) {
                (Some(id), Some(name)) => (id, name.clone()),
                _ => return self.send_error(connection_id, RelayError::NotRegistered).await,
            }
        };

        if let Err(e) = validate_content(&content) {
            return self.send_error(connection_id, e).await;
        }

        let state = self.state.read().await;
        let Some(target_conn) = state.by_username.get(&to).copied() else {
            drop(state);
            return self.send_error(connection_id, RelayError::UserNotFound).await;
        };
        if let Some(entry) = state.sessions.get(&target_conn) {
            entry.handle.send(ServerMessage::DirectMessage {
                message_id: MessageId::new(),
                from: from_username,
                from_id: user_id,
                content,
                timestamp: now_ms(),
            });
        }
    }

    /// Best-effort durability: a persistence failure never blocks real-time
    /// delivery, it just means the message won't survive in room history.
    pub(crate) async fn send_room_message(
        &self,
        connection_id: ConnectionId,
        room_id: RoomId,
        content: String,
    ) {
        let (user_id, username) = {
            let state = self.state.read().await;
            let Some(entry) = state.sessions.get(&connection_id) else {
                return;
            };
            match (entry.user_id, &entry.username) {
                (Some(id), Some(name)) => (id, name.clone()),
                _ => return self.send_error(connection_id, RelayError::NotRegistered).await,
            }
        };

        if let Err(e) = validate_content(&content) {
            return self.send_error(connection_id, e).await;
        }

        let room_state = match self.room_state(room_id).await {
            Ok(rs) => rs,
            Err(e) => return self.send_error(connection_id, e).await,
        };
        let is_member = room_state.members.read().await.contains(&user_id);
        if !is_member {
            return self.send_error(connection_id, RelayError::NotInRoom).await;
        }

        let (message_id, timestamp) = match self.store.append_message(room_id, user_id, &username, &content) {
            Ok(record) => (record.message_id, record.created_at),
            Err(e) => {
                tracing::warn!(error = %e, "room message persistence failed, delivering anyway");
                (MessageId::new(), now_ms())
            }
        };
        let _ = self.store.touch_room_activity(room_id);

        let fanout = ServerMessage::RoomMessage {
            message_id,
            room_id,
            from: username,
            from_id: user_id,
            content,
            timestamp,
        };

        // The sender is a member of the room, so it's included in the
        // fan-out: broadcast to everyone but exclude nobody.
        let state = self.state.read().await;
        let members = room_state.members.read().await;
        for member_id in members.iter() {
            if let Some(conn) = state.by_user_id.get(member_id) {
                if let Some(entry) = state.sessions.get(conn) {
                    entry.handle.send(fanout.clone());
                }
            }
        }
    }
}
