use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use accountd_core::application::services::{
    HybridRoleDal, HybridUserDal, PasswordReconciliation, SessionState, SyncService,
};
use accountd_core::infrastructure::connectivity::ConnectivityMonitor;
use accountd_core::infrastructure::database::{
    Database, DbPool, SqliteRoleRepository, SqliteUserRepository,
};
use accountd_core::infrastructure::remote::memory::{InMemoryAuthClient, InMemoryDocumentClient};
use accountd_core::infrastructure::remote::{RemoteRoleClient, RemoteUserClient};
use accountd_core::{ConnectivityProbe, UserRole};
use sqlx::sqlite::SqlitePoolOptions;

/// Probe whose answer is scripted by the test.
pub struct ScriptedProbe {
    online: AtomicBool,
}

impl ScriptedProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ConnectivityProbe for ScriptedProbe {
    async fn probe(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Full stack over an in-memory database and in-memory remote backend.
pub struct Harness {
    pub pool: DbPool,
    pub probe: Arc<ScriptedProbe>,
    pub auth: Arc<InMemoryAuthClient>,
    pub docs: Arc<InMemoryDocumentClient>,
    pub monitor: Arc<ConnectivityMonitor>,
    pub session: SessionState,
    pub local_users: Arc<SqliteUserRepository>,
    pub local_roles: Arc<SqliteRoleRepository>,
    pub users: HybridUserDal,
    pub roles: HybridRoleDal,
    pub sync: Arc<SyncService>,
    pub reconciliation: PasswordReconciliation,
}

impl Harness {
    pub async fn new(online: bool) -> Self {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Database::create_schema(&pool).await.unwrap();
        Database::seed_default_roles(&pool).await.unwrap();

        let probe = Arc::new(ScriptedProbe::new(online));
        let auth = Arc::new(InMemoryAuthClient::new());
        let docs = Arc::new(InMemoryDocumentClient::new());
        let monitor = Arc::new(ConnectivityMonitor::new(probe.clone()));
        monitor.check_connectivity().await;

        let session = SessionState::new();
        let local_users = Arc::new(SqliteUserRepository::new(pool.clone()));
        let local_roles = Arc::new(SqliteRoleRepository::new(pool.clone()));
        let remote_users = Arc::new(RemoteUserClient::new(auth.clone(), docs.clone()));
        let remote_roles = Arc::new(RemoteRoleClient::new(docs.clone()));

        let users = HybridUserDal::new(
            local_users.clone(),
            remote_users.clone(),
            monitor.clone(),
            session.clone(),
        );
        let roles = HybridRoleDal::new(
            local_roles.clone(),
            remote_roles.clone(),
            monitor.clone(),
            session.clone(),
        );
        let sync = Arc::new(SyncService::new(
            local_users.clone(),
            local_roles.clone(),
            remote_users.clone(),
            remote_roles.clone(),
            monitor.clone(),
            session.clone(),
        ));
        let reconciliation =
            PasswordReconciliation::new(local_users.clone(), remote_users, monitor.clone());

        Self {
            pool,
            probe,
            auth,
            docs,
            monitor,
            session,
            local_users,
            local_roles,
            users,
            roles,
            sync,
            reconciliation,
        }
    }

    /// Flip connectivity for the probe and both remote endpoints, then
    /// refresh the monitor's cached flag.
    pub async fn set_online(&self, online: bool) {
        self.probe.set(online);
        self.auth.set_reachable(online);
        self.docs.set_reachable(online);
        self.monitor.check_connectivity().await;
    }

    pub fn register_request(email: &str, password: &str) -> accountd_core::RegisterRequest {
        accountd_core::RegisterRequest {
            name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            username: email.split('@').next().unwrap_or(email).to_string(),
            email: email.to_string(),
            password: password.to_string(),
            password_confirmation: password.to_string(),
            role: UserRole::User,
        }
    }
}
