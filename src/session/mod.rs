//! Session endpoint: one reader task and one writer task per connection,
//! joined by a bounded outbound queue. Mirrors a per-peer `tx: mpsc::Sender`
//! handle backing non-blocking sends, generalized from a raw TCP peer to an
//! axum WebSocket split sink/stream.

pub mod reader;
pub mod writer;

use crate::hub::Hub;
use crate::protocol::ServerMessage;
use crate::types::{now_ms, ConnectionId};
use axum::extract::ws::WebSocket;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Read deadline: a connection silent this long is considered dead.
pub const T_READ_SECS: u64 = 60;
/// Write deadline for a single outbound frame.
pub const T_WRITE_SECS: u64 = 10;
/// Idle period after which the writer sends a ping to keep the connection alive.
pub const T_PING_SECS: u64 = 54;

/// A session's outbound handle, held by the hub. Sending never blocks: a
/// full queue silently drops the message, matching the fan-out "send-or-drop"
/// discipline — a slow reader must not stall the rest of the relay.
#[derive(Clone)]
pub struct SessionHandle {
    pub connection_id: ConnectionId,
    outbound: mpsc::Sender<ServerMessage>,
}

impl SessionHandle {
    pub fn new(connection_id: ConnectionId, outbound: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            connection_id,
            outbound,
        }
    }

    pub fn send(&self, message: ServerMessage) -> bool {
        self.outbound.try_send(message).is_ok()
    }
}

/// Drive one upgraded WebSocket connection end to end: spawn reader/writer
/// tasks, attach to the hub, and block until the connection closes.
pub async fn run(socket: WebSocket, hub: Arc<Hub>) {
    let connection_id = ConnectionId::new();
    let (sink, stream) = socket.split();
    let (tx, rx) = mpsc::channel(crate::types::OUTBOUND_QUEUE_CAPACITY);

    let handle = SessionHandle::new(connection_id, tx);
    hub.attach(handle).await;
    debug!(%connection_id, "session attached");

    let writer_task = tokio::spawn(writer::run(sink, rx));
    reader::run(stream, connection_id, hub.clone()).await;

    writer_task.abort();
    hub.detach(connection_id).await;
    info!(%connection_id, at = now_ms(), "session detached");
}
