use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::domain::entities::{RoleRecord, UserRecord, UserRole};
use crate::shared::error::{AppError, Result};

/// Raw `users` row. Timestamps are ISO-8601 text, the remote identifier
/// lives in the `firebase_uid` column.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub firebase_uid: Option<String>,
    pub role_id: i64,
    pub needs_sync: bool,
    pub pending_password_change: bool,
    pub old_password_hash: Option<String>,
    pub registration_date: String,
    pub last_modified: String,
    pub password_changed_date: Option<String>,
}

impl UserRow {
    pub fn into_record(self) -> Result<UserRecord> {
        let role = UserRole::from_id(self.role_id).ok_or_else(|| {
            AppError::Storage(format!("unknown role id {} for user {}", self.role_id, self.id))
        })?;
        Ok(UserRecord {
            id: self.id,
            name: self.name,
            last_name: self.lastname,
            username: self.username,
            email: self.email,
            password_hash: self.password,
            remote_id: self.firebase_uid,
            role,
            needs_sync: self.needs_sync,
            pending_password_change: self.pending_password_change,
            old_password_hash: self.old_password_hash,
            registered_at: parse_timestamp(&self.registration_date)?,
            last_modified: parse_timestamp(&self.last_modified)?,
            password_changed_at: self
                .password_changed_date
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl From<RoleRow> for RoleRecord {
    fn from(row: RoleRow) -> Self {
        RoleRecord {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}
