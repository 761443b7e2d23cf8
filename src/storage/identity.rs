//! Identity store: usernames, fingerprint hashes, recovery hashes.

use super::{decode, encode, Store};
use crate::crypto::Digest32;
use crate::error::Result;
use crate::types::{now_ms, UserId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,
    pub fingerprint_hash: Digest32,
    pub recovery_hash: Digest32,
    pub created_at: i64,
    pub last_seen_at: i64,
}

impl Store {
    pub fn create_user(
        &self,
        username: &str,
        fingerprint_hash: Digest32,
        recovery_hash: Digest32,
    ) -> Result<User> {
        let now = now_ms();
        let user = User {
            user_id: UserId::new(),
            username: username.to_string(),
            fingerprint_hash,
            recovery_hash,
            created_at: now,
            last_seen_at: now,
        };
        self.users.insert(username.as_bytes(), encode(&user)?)?;
        self.users_by_id
            .insert(user.user_id.as_bytes(), username.as_bytes())?;
        Ok(user)
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.users.get(username.as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn get_user_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        match self.users_by_id.get(user_id.as_bytes())? {
            Some(username_bytes) => {
                let username = String::from_utf8_lossy(&username_bytes).into_owned();
                self.get_user_by_username(&username)
            }
            None => Ok(None),
        }
    }

    pub fn touch_last_seen(&self, username: &str) -> Result<()> {
        if let Some(mut user) = self.get_user_by_username(username)? {
            user.last_seen_at = now_ms();
            self.users.insert(username.as_bytes(), encode(&user)?)?;
        }
        Ok(())
    }

    /// Rebind a username to a new fingerprint/recovery pair, keeping its
    /// `user_id` and `created_at` — used by the imposter-eviction reclaim flow.
    pub fn rebind_user(
        &self,
        username: &str,
        fingerprint_hash: Digest32,
        recovery_hash: Digest32,
    ) -> Result<Option<User>> {
        let Some(mut user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };
        user.fingerprint_hash = fingerprint_hash;
        user.recovery_hash = recovery_hash;
        user.last_seen_at = now_ms();
        self.users.insert(username.as_bytes(), encode(&user)?)?;
        Ok(Some(user))
    }

    pub fn delete_user(&self, username: &str) -> Result<()> {
        if let Some(bytes) = self.users.remove(username.as_bytes())? {
            let user: User = decode(&bytes)?;
            self.users_by_id.remove(user.user_id.as_bytes())?;
        }
        Ok(())
    }

    /// Users whose `last_seen_at` is older than `cutoff_ms` — candidates for
    /// the cleanup job's inactivity sweep.
    pub fn list_users_inactive_before(&self, cutoff_ms: i64) -> Result<Vec<User>> {
        let mut out = Vec::new();
        for entry in self.users.iter() {
            let (_, bytes) = entry?;
            let user: User = decode(&bytes)?;
            if user.last_seen_at < cutoff_ms {
                out.push(user);
            }
        }
        Ok(out)
    }
}
