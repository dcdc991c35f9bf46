use serde::{Deserialize, Serialize};

use super::user::UserRole;

/// An authorization role. Ids 1-3 are the seeded defaults and are never
/// auto-generated; further roles are created by the role-management flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl RoleRecord {
    pub fn new(id: i64, name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description,
        }
    }

    /// The reserved seed set. Seeding is idempotent: stores only create
    /// these when absent.
    pub fn defaults() -> Vec<RoleRecord> {
        vec![
            RoleRecord::new(
                UserRole::User.id(),
                UserRole::User.name(),
                Some("Standard user".to_string()),
            ),
            RoleRecord::new(
                UserRole::Admin.id(),
                UserRole::Admin.name(),
                Some("Administrator".to_string()),
            ),
            RoleRecord::new(
                UserRole::Guest.id(),
                UserRole::Guest.name(),
                Some("Guest access".to_string()),
            ),
        ]
    }
}
