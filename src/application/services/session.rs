use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::entities::{RemoteSession, Session};

/// Shared handle to the currently authenticated principal. Owned by the
/// DAL layer, read by the sync service (the role passes and the own-user
/// download need the bearer token).
#[derive(Clone, Default)]
pub struct SessionState {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    pub async fn current(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    pub async fn remote(&self) -> Option<RemoteSession> {
        self.inner.read().await.as_ref().and_then(|s| s.remote.clone())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }
}
