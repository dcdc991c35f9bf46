use thiserror::Error;

/// Sub-kind for remote authentication failures. Callers branch on these:
/// a background upload treats `AccountExists` as already-synced, while an
/// interactive sign-in surfaces every kind as a generic credentials error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAuthKind {
    InvalidCredentials,
    UnknownAccount,
    AccountExists,
    Unauthorized,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Remote auth error: {message}")]
    RemoteAuth {
        kind: RemoteAuthKind,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Uniform credentials failure for sign-in paths. The message never
    /// reveals which store rejected the attempt.
    pub fn invalid_credentials() -> Self {
        AppError::RemoteAuth {
            kind: RemoteAuthKind::InvalidCredentials,
            message: "invalid email or password".to_string(),
        }
    }

    pub fn remote_auth(kind: RemoteAuthKind, message: impl Into<String>) -> Self {
        AppError::RemoteAuth {
            kind,
            message: message.into(),
        }
    }

    pub fn auth_kind(&self) -> Option<RemoteAuthKind> {
        match self {
            AppError::RemoteAuth { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True for the error kinds a best-effort remote mirror swallows.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AppError::RemoteUnavailable(_) | AppError::RemoteAuth { .. }
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(db.message().to_string())
            }
            _ => AppError::Storage(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Storage(format!("invalid timestamp column: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
