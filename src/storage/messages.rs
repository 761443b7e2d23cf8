//! Room message store.
//!
//! Keys are `room_id || inverted_timestamp || message_id`, so a prefix scan
//! over a room's 16-byte `room_id` walks messages newest-first without a
//! secondary index: ascending key order on an inverted timestamp is
//! descending order on the real one.

use super::{decode, encode, Store};
use crate::error::Result;
use crate::types::{now_ms, MessageId, RoomId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub message_id: MessageId,
    pub room_id: RoomId,
    pub sender_id: UserId,
    pub sender_username: String,
    pub content: String,
    pub created_at: i64,
}

fn invert_ts(created_at: i64) -> [u8; 8] {
    let ts = created_at.max(0) as u64;
    (u64::MAX - ts).to_be_bytes()
}

fn message_key(room_id: RoomId, created_at: i64, message_id: MessageId) -> Vec<u8> {
    let mut key = Vec::with_capacity(40);
    key.extend_from_slice(room_id.as_bytes());
    key.extend_from_slice(&invert_ts(created_at));
    key.extend_from_slice(message_id.as_bytes());
    key
}

impl Store {
    pub fn append_message(
        &self,
        room_id: RoomId,
        sender_id: UserId,
        sender_username: &str,
        content: &str,
    ) -> Result<MessageRecord> {
        let record = MessageRecord {
            message_id: MessageId::new(),
            room_id,
            sender_id,
            sender_username: sender_username.to_string(),
            content: content.to_string(),
            created_at: now_ms(),
        };
        let key = message_key(room_id, record.created_at, record.message_id);
        self.room_messages.insert(key, encode(&record)?)?;
        Ok(record)
    }

    /// Most recent `limit` messages for a room, newest first.
    pub fn recent_messages(&self, room_id: RoomId, limit: usize) -> Result<Vec<MessageRecord>> {
        self.history(room_id, limit, None)
    }

    /// Up to `limit` messages for a room, newest first, optionally restricted
    /// to those strictly older than `before` (a millisecond timestamp).
    pub fn history(
        &self,
        room_id: RoomId,
        limit: usize,
        before: Option<i64>,
    ) -> Result<Vec<MessageRecord>> {
        let mut out = Vec::with_capacity(limit);
        for entry in self.room_messages.scan_prefix(room_id.as_bytes()) {
            if out.len() >= limit {
                break;
            }
            let (_, bytes) = entry?;
            let record: MessageRecord = decode(&bytes)?;
            if let Some(before) = before {
                if record.created_at >= before {
                    continue;
                }
            }
            out.push(record);
        }
        Ok(out)
    }

    pub(crate) fn delete_all_messages(&self, room_id: RoomId) -> Result<()> {
        let keys: Vec<_> = self
            .room_messages
            .scan_prefix(room_id.as_bytes())
            .keys()
            .collect::<std::result::Result<_, _>>()?;
        for key in keys {
            self.room_messages.remove(key)?;
        }
        Ok(())
    }

    /// Purge messages older than the retention window, across every room.
    pub fn delete_messages_older_than(&self, cutoff_ms: i64) -> Result<usize> {
        let mut removed = 0usize;
        let mut keys = Vec::new();
        for entry in self.room_messages.iter() {
            let (key, bytes) = entry?;
            let record: MessageRecord = decode(&bytes)?;
            if record.created_at < cutoff_ms {
                keys.push(key.to_vec());
            }
        }
        for key in keys {
            self.room_messages.remove(key)?;
            removed += 1;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn recent_messages_are_newest_first() {
        let store = Store::open_temporary().unwrap();
        let user = UserId::new();
        let room = store.create_room("lobby", user, "nyx", true).unwrap();

        store
            .append_message(room.room_id, user, "nyx", "first")
            .unwrap();
        sleep(Duration::from_millis(2));
        store
            .append_message(room.room_id, user, "nyx", "second")
            .unwrap();

        let recent = store.recent_messages(room.room_id, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "second");
        assert_eq!(recent[1].content, "first");
    }

    #[test]
    fn recent_messages_respects_limit() {
        let store = Store::open_temporary().unwrap();
        let user = UserId::new();
        let room = store.create_room("lobby", user, "nyx", true).unwrap();
        for i in 0..5 {
            store
                .append_message(room.room_id, user, "nyx", &format!("msg{i}"))
                .unwrap();
        }
        assert_eq!(store.recent_messages(room.room_id, 3).unwrap().len(), 3);
    }

    #[test]
    fn history_before_excludes_newer_messages() {
        let store = Store::open_temporary().unwrap();
        let user = UserId::new();
        let room = store.create_room("lobby", user, "nyx", true).unwrap();
        store
            .append_message(room.room_id, user, "nyx", "old")
            .unwrap();
        let cutoff = now_ms() + 1;
        sleep(Duration::from_millis(2));
        store
            .append_message(room.room_id, user, "nyx", "new")
            .unwrap();

        let before_cutoff = store.history(room.room_id, 10, Some(cutoff)).unwrap();
        assert_eq!(before_cutoff.len(), 1);
        assert_eq!(before_cutoff[0].content, "old");
    }

    #[test]
    fn delete_older_than_purges_across_rooms() {
        let store = Store::open_temporary().unwrap();
        let user = UserId::new();
        let room = store.create_room("lobby", user, "nyx", true).unwrap();
        store
            .append_message(room.room_id, user, "nyx", "old")
            .unwrap();
        let cutoff = now_ms() + 1;
        sleep(Duration::from_millis(2));
        store
            .append_message(room.room_id, user, "nyx", "new")
            .unwrap();

        let removed = store.delete_messages_older_than(cutoff).unwrap();
        assert_eq!(removed, 1);
        let remaining = store.recent_messages(room.room_id, 10).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].content, "new");
    }
}
