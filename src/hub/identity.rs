//! Registration and imposter eviction: the exclusion-domain-critical path.
//!
//! A single wire message, `register`, carries both fresh registration and
//! reclaim of an existing username: it either fully succeeds (bindings
//! updated, any prior occupant evicted) or fully fails — it never leaves
//! `by_username` pointing at one connection while `by_user_id` points at
//! another. That's enforced simply by doing the whole read-decide-write
//! sequence under one write lock acquisition of the hub's state.

use super::Hub;
use crate::crypto::{generate_recovery_phrase, hash_fingerprint, hash_recovery_phrase};
use crate::error::RelayError;
use crate::protocol::ServerMessage;
use crate::types::{ConnectionId, UserId, USERNAME_MAX_LEN, USERNAME_MIN_LEN};
use tracing::info;

fn validate_username(username: &str) -> Result<(), RelayError> {
    let len = username.chars().count();
    if len < USERNAME_MIN_LEN || len > USERNAME_MAX_LEN {
        return Err(RelayError::InvalidUsername(format!(
            "must be between {USERNAME_MIN_LEN} and {USERNAME_MAX_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(RelayError::InvalidUsername(
            "must contain only letters, digits, '_' or '-'".into(),
        ));
    }
    Ok(())
}

impl Hub {
    /// Resolve a `register` message to one of four outcomes: fresh
    /// registration, login of a returning fingerprint, reclaim via a matching
    /// recovery code (which rotates the stored fingerprint), or rejection.
    pub(crate) async fn register(
        &self,
        connection_id: ConnectionId,
        username: String,
        fingerprint: Option<String>,
        recovery_code: Option<String>,
    ) {
        if let Err(e) = validate_username(&username) {
            return self.send_register_error(connection_id, e).await;
        }

        let fingerprint_hash = fingerprint.as_deref().map(hash_fingerprint);

        let existing = match self.store.get_user_by_username(&username) {
            Ok(existing) => existing,
            Err(e) => return self.send_register_error(connection_id, e).await,
        };

        let (user_id, recovery_phrase, is_new_user) = match existing {
            None => {
                let (phrase, recovery_hash) = generate_recovery_phrase();
                let fp_hash = fingerprint_hash.unwrap_or_else(|| hash_fingerprint(""));
                match self.store.create_user(&username, fp_hash, recovery_hash) {
                    Ok(user) => (user.user_id, Some(phrase), true),
                    Err(e) => return self.send_register_error(connection_id, e).await,
                }
            }
            Some(user) => {
                let fingerprint_matches = match fingerprint_hash {
                    Some(hash) => hash == user.fingerprint_hash,
                    None => false,
                };
                if fingerprint_matches {
                    (user.user_id, None, false)
                } else if let Some(code) = &recovery_code {
                    if hash_recovery_phrase(code) == user.recovery_hash {
                        let new_fingerprint_hash = fingerprint_hash.unwrap_or(user.fingerprint_hash);
                        match self.store.rebind_user(
                            &username,
                            new_fingerprint_hash,
                            user.recovery_hash,
                        ) {
                            Ok(Some(rebound)) => (rebound.user_id, None, false),
                            Ok(None) => {
                                return self.send_register_error(connection_id, RelayError::UserNotFound).await
                            }
                            Err(e) => return self.send_register_error(connection_id, e).await,
                        }
                    } else {
                        return self
                            .send_register_error(connection_id, RelayError::InvalidRecovery)
                            .await;
                    }
                } else {
                    return self
                        .send_register_error(connection_id, RelayError::RecoveryRequired)
                        .await;
                }
            }
        };

        self.bind_connection(connection_id, user_id, username.clone())
            .await;
        let _ = self.store.touch_last_seen(&username);
        self.broadcast_user_joined(user_id, &username, connection_id)
            .await;

        self.send_to_connection(
            connection_id,
            ServerMessage::RegisterAck {
                success: true,
                username: Some(username),
                user_id: Some(user_id),
                recovery_code: recovery_phrase,
                is_new_user: Some(is_new_user),
                error: None,
            },
        )
        .await;
    }

    async fn send_register_error(&self, connection_id: ConnectionId, err: RelayError) {
        self.send_to_connection(
            connection_id,
            ServerMessage::RegisterAck {
                success: false,
                username: None,
                user_id: None,
                recovery_code: None,
                is_new_user: None,
                error: Some(err.code().to_string()),
            },
        )
        .await;
    }

    /// Atomically bind `connection_id` to `user_id`/`username`, evicting
    /// whatever connection previously held that username, if any.
    async fn bind_connection(&self, connection_id: ConnectionId, user_id: UserId, username: String) {
        let mut state = self.state.write().await;

        if let Some(old_connection_id) = state.by_username.get(&username).copied() {
            if old_connection_id != connection_id {
                if let Some(old_entry) = state.sessions.get_mut(&old_connection_id) {
                    old_entry.username = None;
                    old_entry.user_id = None;
                    old_entry.handle.send(ServerMessage::Kicked {
                        reason: "owner logged in elsewhere".into(),
                    });
                }
                state.by_username.remove(&username);
                state.by_user_id.remove(&user_id);
                info!(%old_connection_id, %username, "evicted stale session on reclaim");
            }
        }

        if let Some(entry) = state.sessions.get_mut(&connection_id) {
            entry.user_id = Some(user_id);
            entry.username = Some(username.clone());
        }
        state.by_username.insert(username, connection_id);
        state.by_user_id.insert(user_id, connection_id);
    }
}
