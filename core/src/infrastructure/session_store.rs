// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Session Store
//!
//! Server-side session state keyed by an opaque random id carried in the
//! session cookie.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Remember which user a browser is logged in as, and queue
//!   one-shot flash messages for the next rendered page
//! - **Integration:** `presentation::session` loads a handle per request
//!
//! Authenticated sessions expire two weeks after their last write. An
//! anonymous session only carries flash messages: it lives for an hour and
//! is dropped as soon as its flashes are read.
//!
//! Expired entries are treated as absent. They are reclaimed by
//! [`SessionStore::prune_expired`], which runs on login, every
//! [`SWEEP_EVERY`] flash writes, and from the background task started by
//! [`SessionStore::spawn_sweeper`].

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::debug;
use uuid::Uuid;

use crate::domain::user::UserId;

/// Lifetime of an idle authenticated session
pub const SESSION_TTL_DAYS: i64 = 14;

/// Lifetime of an anonymous, flash-only session
pub const ANONYMOUS_TTL_MINUTES: i64 = 60;

/// Flash writes between opportunistic sweeps
pub const SWEEP_EVERY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: FlashLevel::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { level: FlashLevel::Error, text: text.into() }
    }
}

#[derive(Debug, Clone)]
pub struct SessionData {
    pub user_id: Option<UserId>,
    pub flashes: Vec<FlashMessage>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    fn new() -> Self {
        Self {
            user_id: None,
            flashes: Vec::new(),
            expires_at: Utc::now() + Duration::minutes(ANONYMOUS_TTL_MINUTES),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    fn touch(&mut self) {
        let ttl = if self.user_id.is_some() {
            Duration::days(SESSION_TTL_DAYS)
        } else {
            Duration::minutes(ANONYMOUS_TTL_MINUTES)
        };
        self.expires_at = Utc::now() + ttl;
    }
}

/// Thread-safe in-process session table
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionData>,
    flash_writes: AtomicUsize,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` names a live session
    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions
            .get(&id)
            .map(|data| !data.is_expired())
            .unwrap_or(false)
    }

    pub fn user_id(&self, id: SessionId) -> Option<UserId> {
        self.sessions
            .get(&id)
            .filter(|data| !data.is_expired())
            .and_then(|data| data.user_id)
    }

    /// Bind `user_id` to a fresh session id, carrying over pending flashes.
    /// Returns the id the client must use from now on.
    pub fn login(&self, current: SessionId, user_id: UserId) -> SessionId {
        self.prune_expired();
        let mut data = self
            .sessions
            .remove(&current)
            .map(|(_, data)| data)
            .filter(|data| !data.is_expired())
            .unwrap_or_else(SessionData::new);
        data.user_id = Some(user_id);
        data.touch();

        let rotated = SessionId::new();
        self.sessions.insert(rotated, data);
        rotated
    }

    /// Forget the authenticated user; returns who was logged in.
    /// The session falls back to the anonymous lifetime.
    pub fn logout(&self, id: SessionId) -> Option<UserId> {
        self.sessions.get_mut(&id).and_then(|mut data| {
            let user_id = data.user_id.take();
            data.touch();
            user_id
        })
    }

    pub fn push_flash(&self, id: SessionId, message: FlashMessage) {
        {
            let mut entry = self.sessions.entry(id).or_insert_with(SessionData::new);
            if entry.is_expired() {
                *entry = SessionData::new();
            }
            entry.flashes.push(message);
            entry.touch();
        }

        // The entry guard must be released before sweeping the map
        if self.flash_writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.prune_expired();
        }
    }

    /// Drain queued flash messages. An anonymous session has nothing left
    /// once drained and is removed.
    pub fn take_flashes(&self, id: SessionId) -> Vec<FlashMessage> {
        let flashes = self
            .sessions
            .get_mut(&id)
            .map(|mut data| std::mem::take(&mut data.flashes))
            .unwrap_or_default();
        self.sessions
            .remove_if(&id, |_, data| data.user_id.is_none() && data.flashes.is_empty());
        flashes
    }

    /// Drop every expired session; returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, data| !data.is_expired());
        before.saturating_sub(self.sessions.len())
    }

    /// Prune expired sessions every `every` until the handle is aborted
    pub fn spawn_sweeper(self: Arc<Self>, every: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = interval(every);
            loop {
                tick.tick().await;
                let pruned = self.prune_expired();
                if pruned > 0 {
                    debug!(pruned, remaining = self.len(), "Pruned expired sessions");
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_rotates_id_and_keeps_flashes() {
        let store = SessionStore::new();
        let anonymous = SessionId::new();
        store.push_flash(anonymous, FlashMessage::error("Please log in"));

        let rotated = store.login(anonymous, UserId(5));
        assert_ne!(rotated, anonymous);
        assert!(!store.contains(anonymous));
        assert_eq!(store.user_id(rotated), Some(UserId(5)));
        assert_eq!(store.take_flashes(rotated), vec![FlashMessage::error("Please log in")]);
    }

    #[test]
    fn test_flashes_are_consumed_once() {
        let store = SessionStore::new();
        let id = SessionId::new();
        store.push_flash(id, FlashMessage::success("Saved"));
        assert_eq!(store.take_flashes(id).len(), 1);
        assert!(store.take_flashes(id).is_empty());
    }

    #[test]
    fn test_logout_clears_user() {
        let store = SessionStore::new();
        let id = store.login(SessionId::new(), UserId(1));
        assert_eq!(store.logout(id), Some(UserId(1)));
        assert_eq!(store.user_id(id), None);
        assert_eq!(store.logout(id), None);
    }

    #[test]
    fn test_unknown_session_is_anonymous() {
        let store = SessionStore::new();
        let id = SessionId::new();
        assert!(!store.contains(id));
        assert_eq!(store.user_id(id), None);
        assert!(store.take_flashes(id).is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_expired_session_is_ignored() {
        let store = SessionStore::new();
        let id = store.login(SessionId::new(), UserId(1));
        store.sessions.get_mut(&id).unwrap().expires_at = Utc::now() - Duration::seconds(1);
        assert!(!store.contains(id));
        assert_eq!(store.user_id(id), None);
        store.prune_expired();
        assert_eq!(store.len(), 0);
    }

    fn expire(store: &SessionStore, id: SessionId) {
        store.sessions.get_mut(&id).unwrap().expires_at = Utc::now() - Duration::seconds(1);
    }

    #[test]
    fn test_drained_anonymous_session_is_removed() {
        let store = SessionStore::new();
        let anonymous = SessionId::new();
        store.push_flash(anonymous, FlashMessage::error("Please log in"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.take_flashes(anonymous).len(), 1);
        assert!(store.is_empty());

        let user = store.login(SessionId::new(), UserId(2));
        store.push_flash(user, FlashMessage::success("Saved"));
        store.take_flashes(user);
        assert!(store.contains(user));
    }

    #[test]
    fn test_anonymous_sessions_are_short_lived() {
        let store = SessionStore::new();
        let anonymous = SessionId::new();
        store.push_flash(anonymous, FlashMessage::error("Please log in"));
        let expires_at = store.sessions.get(&anonymous).unwrap().expires_at;
        assert!(expires_at <= Utc::now() + Duration::minutes(ANONYMOUS_TTL_MINUTES));

        let user = store.login(anonymous, UserId(1));
        let expires_at = store.sessions.get(&user).unwrap().expires_at;
        assert!(expires_at > Utc::now() + Duration::days(SESSION_TTL_DAYS - 1));
    }

    #[test]
    fn test_flash_writes_reclaim_expired_sessions_without_login() {
        let store = SessionStore::new();
        let stale: Vec<SessionId> = (0..10).map(|_| SessionId::new()).collect();
        for id in &stale {
            store.push_flash(*id, FlashMessage::error("Please log in"));
            expire(&store, *id);
        }

        for _ in 0..SWEEP_EVERY {
            store.push_flash(SessionId::new(), FlashMessage::error("Please log in"));
        }

        assert_eq!(store.len(), SWEEP_EVERY);
        assert!(stale.iter().all(|id| !store.sessions.contains_key(id)));
    }

    #[tokio::test]
    async fn test_sweeper_prunes_in_background() {
        let store = Arc::new(SessionStore::new());
        let id = SessionId::new();
        store.push_flash(id, FlashMessage::error("Please log in"));
        expire(&store, id);

        let handle = store.clone().spawn_sweeper(std::time::Duration::from_millis(10));
        for _ in 0..50 {
            if store.is_empty() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        handle.abort();
        assert!(store.is_empty());
    }
}
