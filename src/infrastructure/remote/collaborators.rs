use async_trait::async_trait;
use serde_json::Value;

use crate::domain::entities::RemoteSession;
use crate::shared::error::Result;

/// The remote authentication provider: email+password in, opaque
/// identifier plus bearer token out. Implementations map transport and
/// provider errors onto the `AppError` remote kinds.
#[async_trait]
pub trait AuthClient: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<RemoteSession>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<RemoteSession>;
    async fn sign_out(&self, token: &str) -> Result<()>;
    async fn update_password(&self, token: &str, new_password: &str) -> Result<()>;
    async fn delete_account(&self, token: &str) -> Result<()>;
}

/// The remote document database: per-path create/read/update/delete plus
/// a collection listing. Paths look like `users/<uid>` and `roles/<id>`.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    async fn get(&self, token: &str, path: &str) -> Result<Option<Value>>;
    async fn put(&self, token: &str, path: &str, document: Value) -> Result<()>;
    async fn delete(&self, token: &str, path: &str) -> Result<()>;
    async fn list(&self, token: &str, collection: &str) -> Result<Vec<(String, Value)>>;
}
