//! Offline-first account data layer for a desktop login/registration
//! application: a hybrid routing layer over an embedded SQLite store and
//! a remote document-style service, plus the background reconciliation
//! engine that converges the two once connectivity returns.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod shared;

pub use application::ports::{
    ConnectivityProbe, RemoteUser, RoleLocalStore, RoleRemoteStore, UserLocalStore,
    UserRemoteStore,
};
pub use application::services::{
    CreateUserRequest, HybridRoleDal, HybridUserDal, PasswordReconciliation, RegisterRequest,
    SessionState, SyncService,
};
pub use domain::entities::{
    NewUser, RemoteSession, RoleRecord, Session, SyncEvent, SyncPass, SyncPassOutcome, SyncReport,
    UserRecord, UserRole,
};
pub use infrastructure::connectivity::{ConnectivityMonitor, TcpProbe};
pub use infrastructure::database::{Database, DbPool, SqliteRoleRepository, SqliteUserRepository};
pub use infrastructure::remote::{RemoteRoleClient, RemoteUserClient};
pub use shared::config::AppConfig;
pub use shared::error::{AppError, RemoteAuthKind, Result};
pub use shared::logging::init_logging;
