//! Periodic background sweep: purge stale room messages, then empty
//! inactive rooms, then inactive users — in that order, so a room is never
//! deleted while messages referencing it still exist, and a user is never
//! deleted while still a member of a room the sweep hasn't reaped yet.

use crate::hub::Hub;
use crate::types::now_ms;
use std::sync::Arc;
use tracing::info;

/// Run the cleanup sweep forever, once per `hub.config.cleanup_interval`.
/// Ticks are never overlapping: this loop only starts the next sweep after
/// the previous one (including all three phases) has finished.
pub async fn run(hub: Arc<Hub>) {
    let mut interval = tokio::time::interval(hub.config.cleanup_interval);
    loop {
        interval.tick().await;
        sweep(&hub).await;
    }
}

async fn sweep(hub: &Arc<Hub>) {
    let now = now_ms();

    let message_cutoff = now - hub.config.message_retention.as_millis() as i64;
    match hub.store.delete_messages_older_than(message_cutoff) {
        Ok(removed) if removed > 0 => info!(removed, "cleanup: purged old room messages"),
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "cleanup: message purge failed"),
    }

    let room_cutoff = now - hub.config.room_inactivity.as_millis() as i64;
    match hub.store.list_rooms_inactive_before(room_cutoff) {
        Ok(rooms) => {
            for room in rooms {
                let empty = hub.store.member_count(room.room_id).unwrap_or(0) == 0;
                if !empty {
                    continue;
                }
                if let Err(e) = hub.store.delete_room(room.room_id) {
                    tracing::warn!(room = %room.name, error = %e, "cleanup: room delete failed");
                    continue;
                }
                hub.evict_room_state(room.room_id).await;
                info!(room = %room.name, "cleanup: reaped inactive empty room");
            }
        }
        Err(e) => tracing::warn!(error = %e, "cleanup: room scan failed"),
    }

    let user_cutoff = now - hub.config.user_inactivity.as_millis() as i64;
    match hub.store.list_users_inactive_before(user_cutoff) {
        Ok(users) => {
            for user in users {
                if hub.is_user_connected(user.user_id).await {
                    continue;
                }
                // Cascade: a departing user takes the rooms they created
                // with them, along with those rooms' members and messages.
                match hub.store.list_rooms_by_creator(user.user_id) {
                    Ok(owned_rooms) => {
                        for room in owned_rooms {
                            if let Err(e) = hub.store.delete_room(room.room_id) {
                                tracing::warn!(room = %room.name, error = %e, "cleanup: owned-room cascade delete failed");
                                continue;
                            }
                            hub.evict_room_state(room.room_id).await;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(username = %user.username, error = %e, "cleanup: owned-room scan failed");
                        continue;
                    }
                }
                if let Err(e) = hub.store.remove_user_from_all_rooms(user.user_id) {
                    tracing::warn!(username = %user.username, error = %e, "cleanup: membership cleanup failed");
                    continue;
                }
                if let Err(e) = hub.store.delete_user(&user.username) {
                    tracing::warn!(username = %user.username, error = %e, "cleanup: user delete failed");
                    continue;
                }
                info!(username = %user.username, "cleanup: reaped inactive user");
            }
        }
        Err(e) => tracing::warn!(error = %e, "cleanup: user scan failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RelayConfig;
    use crate::storage::Store;
    use std::time::Duration;

    #[tokio::test]
    async fn sweep_purges_old_messages_but_keeps_recent() {
        let store = Store::open_temporary().unwrap();
        let mut config = RelayConfig::default();
        config.message_retention = Duration::from_millis(1);
        let hub = Hub::new(store, config);

        let user = hub.store.create_user("nyx", [0; 32], [0; 32]).unwrap();
        let room = hub
            .store
            .create_room("lobby", user.user_id, "nyx", true)
            .unwrap();
        hub.store
            .append_message(room.room_id, user.user_id, "nyx", "hi")
            .unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        sweep(&hub).await;

        assert!(hub.store.recent_messages(room.room_id, 10).unwrap().is_empty());
    }

    #[tokio::test]
    async fn sweep_does_not_reap_connected_users() {
        let store = Store::open_temporary().unwrap();
        let mut config = RelayConfig::default();
        config.user_inactivity = Duration::from_millis(1);
        let hub = Hub::new(store, config);

        let (tx, _rx) = tokio::sync::mpsc::channel(4);
        let handle = crate::session::SessionHandle::new(crate::types::ConnectionId::new(), tx);
        let connection_id = handle.connection_id;
        hub.attach(handle).await;
        hub.register(connection_id, "nyx".into(), "fp".into()).await;
        let user = hub.store.get_user_by_username("nyx").unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        sweep(&hub).await;

        assert!(hub.store.get_user_by_id(user.user_id).unwrap().is_some());
    }
}
