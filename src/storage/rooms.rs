//! Room store.

use super::{decode, encode, Store};
use crate::error::Result;
use crate::types::{now_ms, RoomId, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: RoomId,
    pub name: String,
    pub creator_id: UserId,
    pub creator_username: String,
    pub is_public: bool,
    pub created_at: i64,
    pub last_activity_at: i64,
}

impl Store {
    pub fn create_room(
        &self,
        name: &str,
        creator_id: UserId,
        creator_username: &str,
        is_public: bool,
    ) -> Result<Room> {
        let now = now_ms();
        let room = Room {
            room_id: RoomId::new(),
            name: name.to_string(),
            creator_id,
            creator_username: creator_username.to_string(),
            is_public,
            created_at: now,
            last_activity_at: now,
        };
        self.rooms.insert(room.room_id.as_bytes(), encode(&room)?)?;
        Ok(room)
    }

    pub fn get_room(&self, room_id: RoomId) -> Result<Option<Room>> {
        match self.rooms.get(room_id.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn touch_room_activity(&self, room_id: RoomId) -> Result<()> {
        if let Some(mut room) = self.get_room(room_id)? {
            room.last_activity_at = now_ms();
            self.rooms.insert(room.room_id.as_bytes(), encode(&room)?)?;
        }
        Ok(())
    }

    pub fn list_rooms(&self) -> Result<Vec<Room>> {
        let mut out = Vec::new();
        for entry in self.rooms.iter() {
            let (_, bytes) = entry?;
            out.push(decode(&bytes)?);
        }
        Ok(out)
    }

    /// Rooms created by `creator_id` — used to cascade-delete a departing
    /// user's rooms.
    pub fn list_rooms_by_creator(&self, creator_id: UserId) -> Result<Vec<Room>> {
        Ok(self
            .list_rooms()?
            .into_iter()
            .filter(|room| room.creator_id == creator_id)
            .collect())
    }

    pub fn delete_room(&self, room_id: RoomId) -> Result<()> {
        self.rooms.remove(room_id.as_bytes())?;
        self.delete_all_members(room_id)?;
        self.delete_all_messages(room_id)?;
        Ok(())
    }

    /// Empty rooms whose last activity is older than `cutoff_ms` — only
    /// considered by the cleanup job, never by `leave_room` directly.
    pub fn list_rooms_inactive_before(&self, cutoff_ms: i64) -> Result<Vec<Room>> {
        let mut out = Vec::new();
        for entry in self.rooms.iter() {
            let (_, bytes) = entry?;
            let room: Room = decode(&bytes)?;
            if room.last_activity_at < cutoff_ms {
                out.push(room);
            }
        }
        Ok(out)
    }
}
