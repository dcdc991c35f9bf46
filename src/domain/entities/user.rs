use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Application role. The discriminants double as foreign keys into the
/// `roles` table, so they are stable and reserved.
#[repr(i64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    User = 1,
    Admin = 2,
    Guest = 3,
}

impl UserRole {
    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(UserRole::User),
            2 => Some(UserRole::Admin),
            3 => Some(UserRole::Guest),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            UserRole::User => "User",
            UserRole::Admin => "Admin",
            UserRole::Guest => "Guest",
        }
    }
}

/// One application user as stored locally. `password_hash` is always a
/// digest; plaintext only transits registration/login call paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Opaque remote identifier, empty until the first successful remote
    /// mirror. Never cleared afterwards except by account deletion.
    pub remote_id: Option<String>,
    pub role: UserRole,
    /// Set whenever the local copy has changes not yet confirmed mirrored
    /// remotely; cleared only after a confirmed remote success.
    pub needs_sync: bool,
    pub pending_password_change: bool,
    /// Digest of the password in effect before an offline change.
    /// Non-empty if and only if `pending_password_change` is set.
    pub old_password_hash: Option<String>,
    pub registered_at: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub password_changed_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }

    /// Record a confirmed remote mirror.
    pub fn mark_synced(&mut self, remote_id: &str) {
        self.remote_id = Some(remote_id.to_string());
        self.needs_sync = false;
    }

    /// Flag an offline password change, retaining the digest that was in
    /// effect before it so the interactive reconciliation can re-prove it.
    pub fn begin_password_change(&mut self, old_hash: String, new_hash: String) {
        self.old_password_hash = Some(old_hash);
        self.password_hash = new_hash;
        self.pending_password_change = true;
        self.password_changed_at = Some(Utc::now());
        self.touch();
    }

    pub fn clear_pending_password_change(&mut self) {
        self.pending_password_change = false;
        self.old_password_hash = None;
    }
}

/// Draft for a user insert; the local store assigns the id.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub remote_id: Option<String>,
    pub needs_sync: bool,
}

impl NewUser {
    pub fn new(
        name: impl Into<String>,
        last_name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role: UserRole,
    ) -> Self {
        Self {
            name: name.into(),
            last_name: last_name.into(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role,
            remote_id: None,
            needs_sync: true,
        }
    }
}
