//! Core identifiers and shared value types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Current time as milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_millis() as i64
}

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

uuid_id!(UserId);
uuid_id!(ConnectionId);
uuid_id!(RoomId);
uuid_id!(MessageId);

/// Maximum length, in bytes, of a username.
pub const USERNAME_MAX_LEN: usize = 20;
/// Minimum length, in bytes, of a username.
pub const USERNAME_MIN_LEN: usize = 3;
/// Maximum length, in bytes, of a room name.
pub const ROOM_NAME_MAX_LEN: usize = 50;
/// Minimum length, in bytes, of a room name.
pub const ROOM_NAME_MIN_LEN: usize = 1;
/// Maximum length, in bytes, of a chat message body.
pub const MESSAGE_BODY_MAX_LEN: usize = 4096;
/// Default number of history entries returned for a room.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
/// Hard cap on history entries returned for a room, regardless of request.
pub const MAX_HISTORY_LIMIT: usize = 100;
/// Outbound per-session queue capacity before messages are dropped.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;
/// Number of words drawn from the recovery dictionary to build a phrase.
pub const RECOVERY_PHRASE_WORDS: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_display_and_parse() {
        let id = RoomId::new();
        let s = id.to_string();
        let parsed: RoomId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn now_ms_is_monotonic_enough() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
    }
}
