use std::sync::Arc;

use tracing::warn;

use super::session::SessionState;
use crate::application::ports::{RoleLocalStore, RoleRemoteStore};
use crate::domain::entities::RoleRecord;
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::shared::error::{AppError, Result};
use crate::shared::validation;

/// Routing layer for role management. Same policy as users: local first,
/// best-effort remote mirror, local-only reads. Roles carry no per-record
/// sync flag; the bidirectional role passes reconcile divergence.
pub struct HybridRoleDal {
    local: Arc<dyn RoleLocalStore>,
    remote: Arc<dyn RoleRemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
    session: SessionState,
}

impl HybridRoleDal {
    pub fn new(
        local: Arc<dyn RoleLocalStore>,
        remote: Arc<dyn RoleRemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        session: SessionState,
    ) -> Self {
        Self {
            local,
            remote,
            connectivity,
            session,
        }
    }

    pub async fn insert(&self, role: &RoleRecord) -> Result<()> {
        validation::require_non_empty("role name", &role.name)?;
        if self.local.find_by_name(&role.name).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "role name '{}' is already in use",
                role.name
            )));
        }

        self.local.insert(role).await?;
        self.mirror(|token| {
            let remote = Arc::clone(&self.remote);
            let role = role.clone();
            async move { remote.insert(&token, &role).await }
        })
        .await;
        Ok(())
    }

    pub async fn update(&self, role: &RoleRecord) -> Result<()> {
        validation::require_non_empty("role name", &role.name)?;
        if let Some(existing) = self.local.find_by_name(&role.name).await? {
            if existing.id != role.id {
                return Err(AppError::Conflict(format!(
                    "role name '{}' is already in use",
                    role.name
                )));
            }
        }

        self.local.update(role).await?;
        self.mirror(|token| {
            let remote = Arc::clone(&self.remote);
            let role = role.clone();
            async move { remote.update(&token, &role).await }
        })
        .await;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.local.delete(id).await?;
        self.mirror(|token| {
            let remote = Arc::clone(&self.remote);
            async move { remote.delete(&token, id).await }
        })
        .await;
        Ok(())
    }

    /// Reads never touch the remote store.
    pub async fn fetch_by_id(&self, id: i64) -> Result<Option<RoleRecord>> {
        self.local.fetch_by_id(id).await
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<RoleRecord>> {
        self.local.find_by_name(name).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<RoleRecord>> {
        self.local.fetch_all().await
    }

    /// Run the remote leg when online with a token at hand; failures are
    /// logged and swallowed, reconciliation happens in the next sync run.
    async fn mirror<F, Fut>(&self, op: F)
    where
        F: FnOnce(String) -> Fut,
        Fut: std::future::Future<Output = Result<()>>,
    {
        if !self.connectivity.is_online() {
            return;
        }
        let Some(remote_session) = self.session.remote().await else {
            return;
        };
        if let Err(err) = op(remote_session.token).await {
            warn!("remote mirror of role write failed: {}", err);
        }
    }
}
