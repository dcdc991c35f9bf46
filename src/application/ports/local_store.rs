use crate::domain::entities::{NewUser, RoleRecord, UserRecord};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// Contract over the embedded user table. All operations are local-disk
/// bound; "not found" is `Ok(None)` on fetches and `AppError::NotFound` on
/// updates/deletes of missing rows. Constraint violations surface as
/// `AppError::Conflict`.
#[async_trait]
pub trait UserLocalStore: Send + Sync {
    /// Insert the draft and return the stored record with its assigned id.
    async fn insert(&self, user: &NewUser) -> Result<UserRecord, AppError>;
    async fn update(&self, user: &UserRecord) -> Result<(), AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    async fn fetch_by_id(&self, id: i64) -> Result<Option<UserRecord>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;
    async fn fetch_all(&self) -> Result<Vec<UserRecord>, AppError>;

    /// Record a confirmed remote mirror: persist the remote id and clear
    /// the needs-sync flag in one statement.
    async fn mark_synced(&self, id: i64, remote_id: &str) -> Result<(), AppError>;
    async fn clear_needs_sync(&self, id: i64) -> Result<(), AppError>;
    async fn records_needing_sync(&self) -> Result<Vec<UserRecord>, AppError>;
    async fn pending_sync_count(&self) -> Result<u32, AppError>;

    async fn records_with_pending_password_change(&self) -> Result<Vec<UserRecord>, AppError>;
    async fn clear_pending_password_change(&self, id: i64) -> Result<(), AppError>;
}

/// Contract over the embedded role table. Role ids are caller-assigned
/// (1-3 reserved for the seed set).
#[async_trait]
pub trait RoleLocalStore: Send + Sync {
    async fn insert(&self, role: &RoleRecord) -> Result<(), AppError>;
    async fn update(&self, role: &RoleRecord) -> Result<(), AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
    async fn fetch_by_id(&self, id: i64) -> Result<Option<RoleRecord>, AppError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<RoleRecord>, AppError>;
    async fn fetch_all(&self) -> Result<Vec<RoleRecord>, AppError>;
}
