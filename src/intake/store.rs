//! Session storage keyed by user id.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::state::Session;
use crate::channels::ChatId;
use crate::error::StoreError;

/// Backend-agnostic session storage.
///
/// Plain get/set/delete; callers that read, decide and write back hold their
/// own lock around the sequence (see `IntakeFlow`).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session for a user, `None` when idle.
    async fn get(&self, user: ChatId) -> Result<Option<Session>, StoreError>;

    /// Insert or replace a user's session.
    async fn set(&self, user: ChatId, session: Session) -> Result<(), StoreError>;

    /// Drop a user's session, returning what was there.
    async fn delete(&self, user: ChatId) -> Result<Option<Session>, StoreError>;
}

/// Process-local store. Everything is lost on restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ChatId, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, user: ChatId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(&user).cloned())
    }

    async fn set(&self, user: ChatId, session: Session) -> Result<(), StoreError> {
        self.sessions.write().await.insert(user, session);
        Ok(())
    }

    async fn delete(&self, user: ChatId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.write().await.remove(&user))
    }
}
