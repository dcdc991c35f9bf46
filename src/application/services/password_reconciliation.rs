use std::sync::Arc;

use tracing::info;

use crate::application::ports::{UserLocalStore, UserRemoteStore};
use crate::domain::entities::UserRecord;
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::shared::error::{AppError, Result};
use crate::shared::password::hash_password;

/// Interactive reconciliation of password changes made offline. The
/// remote store only accepts a new password after re-proving the old one,
/// which an unattended sync pass cannot do; this flow is driven by a
/// user-facing wizard that re-collects both passwords.
pub struct PasswordReconciliation {
    local: Arc<dyn UserLocalStore>,
    remote: Arc<dyn UserRemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
}

impl PasswordReconciliation {
    pub fn new(
        local: Arc<dyn UserLocalStore>,
        remote: Arc<dyn UserRemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
    ) -> Self {
        Self {
            local,
            remote,
            connectivity,
        }
    }

    /// Records waiting for interactive reconciliation.
    pub async fn pending(&self) -> Result<Vec<UserRecord>> {
        self.local.records_with_pending_password_change().await
    }

    /// Reconcile one record. `old_password` must hash to the retained
    /// pre-change digest and `new_password` to the digest currently
    /// stored locally (guarding against the user mixing the two up);
    /// only then is the remote store re-authenticated and updated.
    pub async fn reconcile(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<UserRecord> {
        let mut user = self
            .local
            .fetch_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        if !user.pending_password_change {
            return Err(AppError::Validation(format!(
                "user {} has no pending password change",
                user_id
            )));
        }
        let old_hash = user.old_password_hash.clone().ok_or_else(|| {
            AppError::Internal(format!(
                "user {} is pending without a retained old password hash",
                user_id
            ))
        })?;

        let old_digest = hash_password(old_password);
        if old_digest != old_hash {
            return Err(AppError::Validation(
                "old password could not be verified".to_string(),
            ));
        }
        if hash_password(new_password) != user.password_hash {
            return Err(AppError::Validation(
                "new password does not match the locally stored change".to_string(),
            ));
        }

        if !self.connectivity.check_connectivity().await {
            return Err(AppError::RemoteUnavailable(
                "password reconciliation requires connectivity".to_string(),
            ));
        }

        let remote_session = self.remote.sign_in(&user.email, &old_digest).await?;
        self.remote
            .update_password(&remote_session, &user.password_hash)
            .await?;

        user.clear_pending_password_change();
        if user.remote_id.is_none() {
            user.remote_id = Some(remote_session.remote_id.clone());
        }
        user.touch();
        self.local.update(&user).await?;

        info!(user = user.id, "offline password change reconciled");
        Ok(user)
    }
}
