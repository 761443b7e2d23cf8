//! The envelope every wire message travels in: `{ type, payload, timestamp }`.

use crate::error::{RelayError, Result};
use crate::types::now_ms;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(flatten)]
    pub message: T,
    pub timestamp: i64,
}

/// Decode a single text frame into a tagged message, stamped with its own
/// arrival time is the caller's job — this only recovers what the client sent.
pub fn decode<'a, T>(text: &'a str) -> Result<T>
where
    T: Deserialize<'a>,
{
    let envelope: Envelope<T> = serde_json::from_str(text)?;
    Ok(envelope.message)
}

/// Wrap a server message in an envelope stamped with the current time and
/// serialize it to a single text frame.
pub fn encode<T: Serialize>(message: &T) -> Result<String> {
    let envelope = Envelope {
        message,
        timestamp: now_ms(),
    };
    serde_json::to_string(&envelope).map_err(RelayError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::ClientMessage;

    #[test]
    fn decodes_tagged_envelope() {
        let text = r#"{"type":"room_list","payload":null,"timestamp":123}"#;
        let msg: ClientMessage = decode(text).unwrap();
        assert!(matches!(msg, ClientMessage::RoomList));
    }

    #[test]
    fn unknown_type_fails_closed() {
        let text = r#"{"type":"nonsense","payload":null,"timestamp":123}"#;
        let result: Result<ClientMessage> = decode(text);
        assert!(result.is_err());
    }

    #[test]
    fn encode_round_trips_through_decode() {
        use crate::protocol::messages::ServerMessage;
        let msg = ServerMessage::Kicked {
            reason: "owner logged in elsewhere".into(),
        };
        let text = encode(&msg).unwrap();
        let decoded: ServerMessage = decode(&text).unwrap();
        assert!(matches!(decoded, ServerMessage::Kicked { .. }));
    }
}
