use serde::{Deserialize, Serialize};

use crate::application::ports::RemoteUser;
use crate::domain::entities::{RoleRecord, UserRole};
use crate::shared::error::{AppError, Result};

pub const USERS_COLLECTION: &str = "users";
pub const ROLES_COLLECTION: &str = "roles";

pub fn user_path(remote_id: &str) -> String {
    format!("{}/{}", USERS_COLLECTION, remote_id)
}

pub fn role_path(id: i64) -> String {
    format!("{}/{}", ROLES_COLLECTION, id)
}

/// Wire form of a user profile document. No password and no local sync
/// bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDocument {
    pub name: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub role_id: i64,
}

impl UserDocument {
    pub fn from_remote_user(user: &RemoteUser) -> Self {
        Self {
            name: user.name.clone(),
            lastname: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role_id: user.role.id(),
        }
    }

    pub fn into_remote_user(self, remote_id: &str) -> Result<RemoteUser> {
        let role = UserRole::from_id(self.role_id).ok_or_else(|| {
            AppError::Internal(format!(
                "remote user {} carries unknown role id {}",
                remote_id, self.role_id
            ))
        })?;
        Ok(RemoteUser {
            remote_id: remote_id.to_string(),
            name: self.name,
            last_name: self.lastname,
            username: self.username,
            email: self.email,
            role,
        })
    }
}

/// Wire form of a role document, keyed by the decimal string of its id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleDocument {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<&RoleRecord> for RoleDocument {
    fn from(role: &RoleRecord) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            description: role.description.clone(),
        }
    }
}

impl From<RoleDocument> for RoleRecord {
    fn from(doc: RoleDocument) -> Self {
        RoleRecord {
            id: doc.id,
            name: doc.name,
            description: doc.description,
        }
    }
}
