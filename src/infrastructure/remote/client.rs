use std::sync::Arc;

use async_trait::async_trait;

use super::collaborators::{AuthClient, DocumentClient};
use super::documents::{role_path, user_path, RoleDocument, UserDocument, ROLES_COLLECTION};
use crate::application::ports::{RemoteUser, RoleRemoteStore, UserRemoteStore};
use crate::domain::entities::{RemoteSession, RoleRecord};
use crate::shared::error::Result;

/// `UserRemoteStore` over the auth provider plus the `users` document
/// collection.
pub struct RemoteUserClient {
    auth: Arc<dyn AuthClient>,
    documents: Arc<dyn DocumentClient>,
}

impl RemoteUserClient {
    pub fn new(auth: Arc<dyn AuthClient>, documents: Arc<dyn DocumentClient>) -> Self {
        Self { auth, documents }
    }
}

#[async_trait]
impl UserRemoteStore for RemoteUserClient {
    async fn create_account(&self, email: &str, password: &str) -> Result<RemoteSession> {
        self.auth.sign_up(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<RemoteSession> {
        self.auth.sign_in(email, password).await
    }

    async fn sign_out(&self, session: &RemoteSession) -> Result<()> {
        self.auth.sign_out(&session.token).await
    }

    async fn fetch(&self, session: &RemoteSession, remote_id: &str) -> Result<Option<RemoteUser>> {
        let value = self
            .documents
            .get(&session.token, &user_path(remote_id))
            .await?;
        match value {
            Some(value) => {
                let doc: UserDocument = serde_json::from_value(value)?;
                Ok(Some(doc.into_remote_user(remote_id)?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_profile(&self, session: &RemoteSession, user: &RemoteUser) -> Result<()> {
        let doc = UserDocument::from_remote_user(user);
        self.documents
            .put(
                &session.token,
                &user_path(&user.remote_id),
                serde_json::to_value(doc)?,
            )
            .await
    }

    async fn update_password(&self, session: &RemoteSession, new_password: &str) -> Result<()> {
        self.auth.update_password(&session.token, new_password).await
    }

    async fn delete(&self, session: &RemoteSession, remote_id: &str) -> Result<()> {
        self.documents
            .delete(&session.token, &user_path(remote_id))
            .await?;
        self.auth.delete_account(&session.token).await
    }
}

/// `RoleRemoteStore` over the `roles` document collection.
pub struct RemoteRoleClient {
    documents: Arc<dyn DocumentClient>,
}

impl RemoteRoleClient {
    pub fn new(documents: Arc<dyn DocumentClient>) -> Self {
        Self { documents }
    }

    async fn put_role(&self, token: &str, role: &RoleRecord) -> Result<()> {
        let doc = RoleDocument::from(role);
        self.documents
            .put(token, &role_path(role.id), serde_json::to_value(doc)?)
            .await
    }
}

#[async_trait]
impl RoleRemoteStore for RemoteRoleClient {
    async fn fetch(&self, token: &str, id: i64) -> Result<Option<RoleRecord>> {
        let value = self.documents.get(token, &role_path(id)).await?;
        match value {
            Some(value) => {
                let doc: RoleDocument = serde_json::from_value(value)?;
                Ok(Some(doc.into()))
            }
            None => Ok(None),
        }
    }

    async fn fetch_all(&self, token: &str) -> Result<Vec<RoleRecord>> {
        let entries = self.documents.list(token, ROLES_COLLECTION).await?;
        let mut roles = Vec::with_capacity(entries.len());
        for (_, value) in entries {
            let doc: RoleDocument = serde_json::from_value(value)?;
            roles.push(doc.into());
        }
        roles.sort_by_key(|r: &RoleRecord| r.id);
        Ok(roles)
    }

    async fn insert(&self, token: &str, role: &RoleRecord) -> Result<()> {
        self.put_role(token, role).await
    }

    async fn update(&self, token: &str, role: &RoleRecord) -> Result<()> {
        self.put_role(token, role).await
    }

    async fn delete(&self, token: &str, id: i64) -> Result<()> {
        self.documents.delete(token, &role_path(id)).await
    }
}
