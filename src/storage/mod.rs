//! Embedded persistence: a `sled::Db` with one tree per entity, matching the
//! four stores the hub is built on (identity, rooms, membership, messages).

pub mod identity;
pub mod membership;
pub mod messages;
pub mod rooms;

use crate::error::Result;
use std::path::Path;

/// Record types kept in the store; each (de)serializes via `bincode`.
pub use identity::User;
pub use messages::MessageRecord;
pub use rooms::Room;

#[derive(Clone)]
pub struct Store {
    #[allow(dead_code)]
    db: sled::Db,
    pub(crate) users: sled::Tree,
    pub(crate) users_by_id: sled::Tree,
    pub(crate) rooms: sled::Tree,
    pub(crate) room_members: sled::Tree,
    pub(crate) room_messages: sled::Tree,
}

impl Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self {
            users: db.open_tree("users")?,
            users_by_id: db.open_tree("users_by_id")?,
            rooms: db.open_tree("rooms")?,
            room_members: db.open_tree("room_members")?,
            room_messages: db.open_tree("room_messages")?,
            db,
        })
    }

    /// Open an ephemeral, purely in-memory store — used by tests.
    pub fn open_temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self {
            users: db.open_tree("users")?,
            users_by_id: db.open_tree("users_by_id")?,
            rooms: db.open_tree("rooms")?,
            room_members: db.open_tree("room_members")?,
            room_messages: db.open_tree("room_messages")?,
            db,
        })
    }
}

pub(crate) fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_survives_a_reopen_at_the_same_path() {
        let dir = tempfile::tempdir().unwrap();
        let user_id = {
            let store = Store::open(dir.path()).unwrap();
            let user = store.create_user("nyx", [1; 32], [2; 32]).unwrap();
            user.user_id
        };

        let reopened = Store::open(dir.path()).unwrap();
        let user = reopened.get_user_by_username("nyx").unwrap().unwrap();
        assert_eq!(user.user_id, user_id);
    }
}
