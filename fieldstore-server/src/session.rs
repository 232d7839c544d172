//! Session token store with sliding expiration.
//!
//! Tokens map to the [`UserSnapshot`] captured at login. Every
//! successful lookup pushes the expiry back; the periodic session sweep
//! removes records that have been idle longer than the lifetime.
//!
//! A user may hold any number of concurrent tokens (one per device).

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use dashmap::DashMap;
use fieldstore_core::{
    Clock, FieldstoreResult, SessionError, Timestamp, UserSnapshot, SESSION_TOKEN_BYTES,
};
use rand::RngCore;

/// A live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user: UserSnapshot,
    pub last_accessed_at: Timestamp,
}

/// Concurrent token -> session map.
pub struct SessionTokenBin {
    records: DashMap<String, SessionRecord>,
    /// Linearizes compound operations and last-access updates with the sweep.
    bin_lock: Mutex<()>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

impl SessionTokenBin {
    pub fn new(clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self {
            records: DashMap::new(),
            bin_lock: Mutex::new(()),
            clock,
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Mint a fresh token for `user`. Existing tokens for the user stay valid.
    pub fn issue_token(&self, user: UserSnapshot) -> FieldstoreResult<String> {
        let token = generate_token();
        self.insert(token, user)
    }

    fn insert(&self, token: String, user: UserSnapshot) -> FieldstoreResult<String> {
        let _guard = self.lock();
        if self.records.contains_key(&token) {
            tracing::error!("Session token collision");
            return Err(SessionError::TokenCollision.into());
        }

        let username = user.username.clone();
        self.records.insert(
            token.clone(),
            SessionRecord {
                user,
                last_accessed_at: self.clock.now(),
            },
        );
        tracing::debug!(username = %username, "Session token issued");
        Ok(token)
    }

    /// Remove `token`. Returns true if it existed.
    pub fn revoke_token(&self, token: &str) -> bool {
        let _guard = self.lock();
        self.records.remove(token).is_some()
    }

    /// Remove every token belonging to `username`. Returns how many were removed.
    pub fn revoke_all_tokens_for(&self, username: &str) -> usize {
        let _guard = self.lock();
        let tokens: Vec<String> = self
            .records
            .iter()
            .filter(|entry| entry.value().user.username == username)
            .map(|entry| entry.key().clone())
            .collect();

        let mut removed = 0;
        for token in tokens {
            if self.records.remove(&token).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            tracing::info!(username = %username, removed, "Revoked all session tokens");
        }
        removed
    }

    /// The user behind `token`, refreshing its last access.
    ///
    /// A record idle past the lifetime is treated as absent and dropped,
    /// even if the sweep has not reached it yet.
    pub fn get_user(&self, token: &str) -> Option<UserSnapshot> {
        let _guard = self.lock();
        let now = self.clock.now();

        {
            let mut record = self.records.get_mut(token)?;
            if !self.is_expired(&record, now) {
                record.last_accessed_at = now;
                return Some(record.user.clone());
            }
        }

        self.records.remove(token);
        tracing::debug!("Dropped expired session found on lookup");
        None
    }

    /// Time until `token` expires if left idle. Zero for unknown tokens.
    pub fn remaining_lifetime(&self, token: &str) -> Duration {
        let _guard = self.lock();
        let now = self.clock.now();
        self.records
            .get(token)
            .map(|record| {
                let idle = idle_for(record.last_accessed_at, now);
                self.lifetime.saturating_sub(idle)
            })
            .unwrap_or(Duration::ZERO)
    }

    /// Remove every record idle for longer than the lifetime.
    pub fn sweep_expired(&self) -> usize {
        let _guard = self.lock();
        let now = self.clock.now();
        let before = self.records.len();
        self.records
            .retain(|_, record| idle_for(record.last_accessed_at, now) <= self.lifetime);
        before - self.records.len()
    }

    pub fn active_sessions(&self) -> usize {
        let _guard = self.lock();
        self.records.len()
    }

    fn is_expired(&self, record: &SessionRecord, now: Timestamp) -> bool {
        idle_for(record.last_accessed_at, now) > self.lifetime
    }

    // Guards no data, so a poisoned lock is reused as is.
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.bin_lock.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for SessionTokenBin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokenBin")
            .field("sessions", &self.records.len())
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

fn generate_token() -> String {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Idle time, clamped at zero if the clock moved backwards.
fn idle_for(last_accessed_at: Timestamp, now: Timestamp) -> Duration {
    (now - last_accessed_at).to_std().unwrap_or(Duration::ZERO)
}
