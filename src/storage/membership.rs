//! Room membership store: who belongs to which room, keyed for prefix scans.

use super::{decode, encode, Store};
use crate::error::Result;
use crate::types::{now_ms, RoomId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct MembershipRecord {
    joined_at: i64,
}

fn member_key(room_id: RoomId, user_id: UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(room_id.as_bytes());
    key.extend_from_slice(user_id.as_bytes());
    key
}

impl Store {
    pub fn add_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool> {
        let key = member_key(room_id, user_id);
        if self.room_members.contains_key(&key)? {
            return Ok(false);
        }
        let record = MembershipRecord { joined_at: now_ms() };
        self.room_members.insert(key, encode(&record)?)?;
        Ok(true)
    }

    pub fn remove_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool> {
        let key = member_key(room_id, user_id);
        Ok(self.room_members.remove(key)?.is_some())
    }

    pub fn is_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool> {
        Ok(self.room_members.contains_key(member_key(room_id, user_id))?)
    }

    pub fn list_members(&self, room_id: RoomId) -> Result<Vec<UserId>> {
        let mut out = Vec::new();
        for entry in self.room_members.scan_prefix(room_id.as_bytes()) {
            let (key, _) = entry?;
            let user_bytes: [u8; 16] = key[16..32].try_into().map_err(|_| {
                crate::error::RelayError::Internal("corrupt membership key".into())
            })?;
            out.push(UserId(uuid::Uuid::from_bytes(user_bytes)));
        }
        Ok(out)
    }

    pub fn member_count(&self, room_id: RoomId) -> Result<usize> {
        Ok(self.room_members.scan_prefix(room_id.as_bytes()).count())
    }

    pub(crate) fn delete_all_members(&self, room_id: RoomId) -> Result<()> {
        let keys: Vec<_> = self
            .room_members
            .scan_prefix(room_id.as_bytes())
            .keys()
            .collect::<std::result::Result<_, _>>()?;
        for key in keys {
            self.room_members.remove(key)?;
        }
        Ok(())
    }

    /// Remove a user from every room's membership set — used when a user is
    /// reaped by the cleanup job.
    pub fn remove_user_from_all_rooms(&self, user_id: UserId) -> Result<()> {
        let mut keys = Vec::new();
        for entry in self.room_members.iter() {
            let (key, _) = entry?;
            if key.len() == 32 && &key[16..32] == user_id.as_bytes() {
                keys.push(key.to_vec());
            }
        }
        for key in keys {
            self.room_members.remove(key)?;
        }
        Ok(())
    }
}
