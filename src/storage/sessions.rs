//! In-memory per-user session state.
//!
//! Sessions hold the quality tier a user picked with `/quality`. They are
//! created lazily the first time a user's tier is read and live until the
//! process exits; nothing is persisted. The store is owned by the running
//! bot instance and shared through `Arc`, there is no global map.

use dashmap::DashMap;
use teloxide::types::UserId;

use crate::download::quality::QualityTier;

/// Preference state for a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: UserId,
    pub tier: QualityTier,
}

impl UserSession {
    fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            tier: QualityTier::default(),
        }
    }
}

/// Concurrent map of user sessions.
///
/// Backed by a sharded `DashMap`: readers and writers for different users
/// touch different shards, and no lock is ever held across an `.await`.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<UserId, UserSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the user's tier, creating a session with the default tier
    /// on first access. Never fails.
    pub fn get_tier(&self, user_id: UserId) -> QualityTier {
        self.sessions
            .entry(user_id)
            .or_insert_with(|| UserSession::new(user_id))
            .tier
    }

    /// Stores the user's tier, overwriting any previous choice.
    pub fn set_tier(&self, user_id: UserId, tier: QualityTier) {
        self.sessions
            .entry(user_id)
            .and_modify(|session| session.tier = tier)
            .or_insert(UserSession { user_id, tier });
        log::debug!("Quality tier for user {} set to {}", user_id, tier);
    }

    /// Snapshot of a user's session, if one exists.
    pub fn session(&self, user_id: UserId) -> Option<UserSession> {
        self.sessions.get(&user_id).map(|entry| *entry)
    }

    /// Number of users seen since startup.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
