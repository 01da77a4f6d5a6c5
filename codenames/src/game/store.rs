//! In-memory session store.
//!
//! A single reader/writer lock covers every session: writers on any session
//! exclude all other access for the length of one validate-and-mutate step.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

use super::{
    entities::{GameState, SessionId},
    errors::{GameError, GameResult},
};

/// Active sessions keyed by ID. Values are immutable snapshots; an update
/// works on a private copy and replaces the snapshot only on success.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<GameState>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, session_id: &str) -> GameResult<Arc<GameState>> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| GameError::SessionNotFound(session_id.to_string()))
    }

    /// Inserts a new session, returning its snapshot.
    pub async fn insert(&self, state: GameState) -> Arc<GameState> {
        let snapshot = Arc::new(state);
        self.sessions
            .write()
            .await
            .insert(snapshot.id.clone(), snapshot.clone());
        snapshot
    }

    /// Applies `mutate` to a copy of the session under the write lock.
    ///
    /// The copy is committed only if `mutate` returns `Ok`, with its
    /// `version` one above the snapshot it replaces; on error the stored
    /// snapshot is left exactly as it was.
    pub async fn update<F>(&self, session_id: &str, mutate: F) -> GameResult<Arc<GameState>>
    where
        F: FnOnce(&mut GameState) -> GameResult<()>,
    {
        let mut sessions = self.sessions.write().await;
        let current = sessions
            .get(session_id)
            .ok_or_else(|| GameError::SessionNotFound(session_id.to_string()))?;

        let mut next = GameState::clone(current);
        mutate(&mut next)?;
        next.version = current.version + 1;

        let snapshot = Arc::new(next);
        sessions.insert(session_id.to_string(), snapshot.clone());
        Ok(snapshot)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn ids(&self) -> Vec<SessionId> {
        self.sessions.read().await.keys().cloned().collect()
    }
}
