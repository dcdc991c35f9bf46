use crate::domain::entities::{RemoteSession, RoleRecord, UserRecord, UserRole};
use crate::shared::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A user profile as stored in the remote `users` collection. Local-only
/// sync bookkeeping (needs-sync, pending password state) never leaves the
/// device, and the document carries no password field at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub remote_id: String,
    pub name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: UserRole,
}

impl RemoteUser {
    /// Wire profile for a local record. `remote_id` stays empty when the
    /// record was never mirrored; callers fill it from the session.
    pub fn from_record(user: &UserRecord) -> Self {
        Self {
            remote_id: user.remote_id.clone().unwrap_or_default(),
            name: user.name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// Contract over the remote account service. Every call is network-bound;
/// operations past sign-in/creation require the session issued there. The
/// remote security model only exposes the authenticated principal's own
/// user document, so there is no bulk user fetch.
#[async_trait]
pub trait UserRemoteStore: Send + Sync {
    async fn create_account(&self, email: &str, password: &str)
        -> Result<RemoteSession, AppError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<RemoteSession, AppError>;
    async fn sign_out(&self, session: &RemoteSession) -> Result<(), AppError>;
    async fn fetch(
        &self,
        session: &RemoteSession,
        remote_id: &str,
    ) -> Result<Option<RemoteUser>, AppError>;
    async fn upsert_profile(
        &self,
        session: &RemoteSession,
        user: &RemoteUser,
    ) -> Result<(), AppError>;
    async fn update_password(
        &self,
        session: &RemoteSession,
        new_password: &str,
    ) -> Result<(), AppError>;
    async fn delete(&self, session: &RemoteSession, remote_id: &str) -> Result<(), AppError>;
}

/// Contract over the remote `roles` collection. Roles are world-readable
/// for authenticated principals, so a bearer token is enough.
#[async_trait]
pub trait RoleRemoteStore: Send + Sync {
    async fn fetch(&self, token: &str, id: i64) -> Result<Option<RoleRecord>, AppError>;
    async fn fetch_all(&self, token: &str) -> Result<Vec<RoleRecord>, AppError>;
    async fn insert(&self, token: &str, role: &RoleRecord) -> Result<(), AppError>;
    async fn update(&self, token: &str, role: &RoleRecord) -> Result<(), AppError>;
    async fn delete(&self, token: &str, id: i64) -> Result<(), AppError>;
}
