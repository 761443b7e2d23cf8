//! Tagged client/server message variants, one per wire command.
//!
//! Mirrors a P2P `Message` enum's one-variant-per-command shape, but tagged
//! as JSON rather than dispatched off a binary command string: unknown
//! variants fail to decode instead of landing in a catch-all arm.

use crate::types::{MessageId, RoomId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message on a connection: claim a username. `fingerprint` proves
    /// prior ownership; `recovery_code` reclaims ownership when the
    /// fingerprint no longer matches.
    Register {
        username: String,
        #[serde(default)]
        fingerprint: Option<String>,
        #[serde(default)]
        recovery_code: Option<String>,
    },
    DirectMessage { to: String, content: String },
    RoomCreate { name: String, is_public: bool },
    RoomJoin { room_id: RoomId },
    RoomLeave { room_id: RoomId },
    RoomMessage { room_id: RoomId, content: String },
    RoomHistory {
        room_id: RoomId,
        #[serde(default)]
        limit: Option<usize>,
        #[serde(default)]
        before: Option<i64>,
    },
    UserList,
    RoomList,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomView {
    pub room_id: RoomId,
    pub name: String,
    pub creator: String,
    pub creator_id: UserId,
    pub member_count: usize,
    pub is_public: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomMessageView {
    pub message_id: MessageId,
    pub from: String,
    pub from_id: UserId,
    pub content: String,
    pub timestamp: i64,
}

/// `room_members` notification kind — a member joined or left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipAction {
    Joined,
    Left,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    RegisterAck {
        success: bool,
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        user_id: Option<UserId>,
        /// Present only on first-ever registration of this username.
        #[serde(default)]
        recovery_code: Option<String>,
        #[serde(default)]
        is_new_user: Option<bool>,
        #[serde(default)]
        error: Option<String>,
    },
    /// Sent to a session that was just displaced by an imposter-eviction reclaim.
    Kicked {
        reason: String,
    },
    UserJoined {
        user_id: UserId,
        username: String,
    },
    UserLeft {
        user_id: UserId,
        username: String,
    },
    RoomCreated {
        success: bool,
        #[serde(default)]
        room: Option<RoomView>,
        #[serde(default)]
        error: Option<String>,
    },
    RoomJoined {
        success: bool,
        room_id: RoomId,
        #[serde(default)]
        room: Option<RoomView>,
        #[serde(default)]
        members: Option<Vec<String>>,
        #[serde(default)]
        history: Option<Vec<RoomMessageView>>,
        #[serde(default)]
        error: Option<String>,
    },
    RoomLeft {
        success: bool,
        room_id: RoomId,
        #[serde(default)]
        error: Option<String>,
    },
    RoomMembers {
        room_id: RoomId,
        action: MembershipAction,
        user: String,
        members: Vec<String>,
    },
    DirectMessage {
        message_id: MessageId,
        from: String,
        from_id: UserId,
        content: String,
        timestamp: i64,
    },
    RoomMessage {
        message_id: MessageId,
        room_id: RoomId,
        from: String,
        from_id: UserId,
        content: String,
        timestamp: i64,
    },
    UserListResponse {
        users: Vec<UserSummary>,
    },
    RoomListResponse {
        rooms: Vec<RoomView>,
    },
    RoomHistoryResponse {
        room_id: RoomId,
        /// Oldest-first.
        messages: Vec<RoomMessageView>,
        has_more: bool,
    },
    Error {
        code: String,
        message: String,
        #[serde(default)]
        target: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_tags_as_expected() {
        let msg = ClientMessage::Register {
            username: "nyx".into(),
            fingerprint: Some("abc".into()),
            recovery_code: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.starts_with(r#"{"type":"register""#));
    }

    #[test]
    fn unit_variant_decodes_with_null_payload() {
        let json = r#"{"type":"user_list","payload":null}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, ClientMessage::UserList));
    }

    #[test]
    fn register_omits_optional_fields_when_absent() {
        let json = r#"{"type":"register","payload":{"username":"nyx"}}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Register { username, fingerprint, recovery_code } => {
                assert_eq!(username, "nyx");
                assert!(fingerprint.is_none());
                assert!(recovery_code.is_none());
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }
}
