use serde::{Deserialize, Serialize};

use super::user::UserRecord;

/// Credentials returned by the remote auth provider after sign-in or
/// account creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSession {
    pub remote_id: String,
    pub token: String,
    pub email: String,
}

/// The locally authenticated principal. `remote` is `None` when the
/// sign-in was served by the local fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub user: UserRecord,
    pub remote: Option<RemoteSession>,
}

impl Session {
    pub fn local(user: UserRecord) -> Self {
        Self { user, remote: None }
    }

    pub fn online(user: UserRecord, remote: RemoteSession) -> Self {
        Self {
            user,
            remote: Some(remote),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.remote.as_ref().map(|r| r.token.as_str())
    }
}
