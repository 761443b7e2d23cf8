//! Reader task: decode incoming frames and hand them to the hub, bounded by
//! a read deadline so a silent peer gets reaped instead of held forever.

use super::T_READ_SECS;
use crate::hub::Hub;
use crate::protocol::{self, ClientMessage};
use crate::types::ConnectionId;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub async fn run(mut stream: SplitStream<WebSocket>, connection_id: ConnectionId, hub: Arc<Hub>) {
    loop {
        let next = tokio::time::timeout(Duration::from_secs(T_READ_SECS), stream.next()).await;
        let frame = match next {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                warn!(%connection_id, error = %e, "websocket read error");
                return;
            }
            Ok(None) => {
                debug!(%connection_id, "peer closed connection");
                return;
            }
            Err(_) => {
                debug!(%connection_id, "read deadline exceeded, closing");
                return;
            }
        };

        match frame {
            Message::Text(text) => match protocol::decode::<ClientMessage>(&text) {
                Ok(message) => hub.handle_client_message(connection_id, message).await,
                Err(e) => {
                    warn!(%connection_id, error = %e, "failed to decode client message");
                    hub.reject_invalid_message(connection_id, e.to_string())
                        .await;
                }
            },
            Message::Close(_) => {
                debug!(%connection_id, "received close frame");
                return;
            }
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {
                // Heartbeats are handled transparently by the transport; the
                // protocol only speaks text frames.
            }
        }
    }
}
