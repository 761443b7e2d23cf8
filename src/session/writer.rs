//! Writer task: drains the outbound queue and serializes each message to a
//! text frame, sending a transport ping after a period of outbound silence
//! so idle connections stay distinguishable from dead ones.

use super::{T_PING_SECS, T_WRITE_SECS};
use crate::protocol::{self, ServerMessage};
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

pub async fn run(mut sink: SplitSink<WebSocket, Message>, mut rx: mpsc::Receiver<ServerMessage>) {
    let mut ping_interval = tokio::time::interval(Duration::from_secs(T_PING_SECS));
    ping_interval.tick().await; // first tick fires immediately; discard it

    loop {
        tokio::select! {
            outgoing = rx.recv() => {
                let Some(message) = outgoing else {
                    let _ = sink.close().await;
                    return;
                };
                let frame = match protocol::encode(&message) {
                    Ok(text) => Message::Text(text),
                    Err(e) => {
                        warn!(error = %e, "failed to encode outbound message");
                        continue;
                    }
                };
                if write_with_deadline(&mut sink, frame).await.is_err() {
                    return;
                }
                ping_interval.reset();
            }
            _ = ping_interval.tick() => {
                if write_with_deadline(&mut sink, Message::Ping(Vec::new())).await.is_err() {
                    return;
                }
            }
        }
    }
}

async fn write_with_deadline(
    sink: &mut SplitSink<WebSocket, Message>,
    frame: Message,
) -> Result<(), ()> {
    match tokio::time::timeout(Duration::from_secs(T_WRITE_SECS), sink.send(frame)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            warn!(error = %e, "websocket write error");
            Err(())
        }
        Err(_) => {
            warn!("write deadline exceeded, closing connection");
            Err(())
        }
    }
}
