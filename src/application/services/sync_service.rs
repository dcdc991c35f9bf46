use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::session::SessionState;
use crate::application::ports::{
    RoleLocalStore, RoleRemoteStore, UserLocalStore, UserRemoteStore,
};
use crate::domain::entities::{
    RemoteSession, SyncEvent, SyncPass, SyncPassOutcome, SyncReport,
};
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::shared::error::RemoteAuthKind;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Background reconciliation engine. One run at a time per instance; a
/// second caller is rejected with an `already_running` report rather than
/// queued. A run executes four ordered passes, each individually
/// fault-tolerant: a failing pass never aborts the remaining ones.
pub struct SyncService {
    local_users: Arc<dyn UserLocalStore>,
    local_roles: Arc<dyn RoleLocalStore>,
    remote_users: Arc<dyn UserRemoteStore>,
    remote_roles: Arc<dyn RoleRemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
    session: SessionState,
    running: AtomicBool,
    events: broadcast::Sender<SyncEvent>,
}

/// Releases the in-flight flag even when the run future is dropped
/// mid-pass.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SyncService {
    pub fn new(
        local_users: Arc<dyn UserLocalStore>,
        local_roles: Arc<dyn RoleLocalStore>,
        remote_users: Arc<dyn UserRemoteStore>,
        remote_roles: Arc<dyn RoleRemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        session: SessionState,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            local_users,
            local_roles,
            remote_users,
            remote_roles,
            connectivity,
            session,
            running: AtomicBool::new(false),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Execute one sync cycle. Returns an explicit offline report when the
    /// fresh probe says offline.
    pub async fn run(&self) -> SyncReport {
        if !self.connectivity.check_connectivity().await {
            debug!("sync requested while offline");
            return SyncReport::offline();
        }

        if self.running.swap(true, Ordering::SeqCst) {
            return SyncReport::already_running();
        }
        let _running = RunningGuard(&self.running);

        let started_at = Utc::now();
        self.emit(SyncEvent::Started);
        info!("sync run started");

        let remote_session = self.session.remote().await;
        let passes = SyncPass::ALL;
        let total = passes.len();
        let mut outcomes = Vec::with_capacity(total);

        for (index, pass) in passes.into_iter().enumerate() {
            self.emit(SyncEvent::Pass {
                index: index + 1,
                total,
                label: pass.label().to_string(),
            });

            let outcome = match pass {
                SyncPass::DownloadUsers => self.download_users(remote_session.as_ref()).await,
                SyncPass::UploadUsers => self.upload_users().await,
                SyncPass::DownloadRoles => self.download_roles(remote_session.as_ref()).await,
                SyncPass::UploadRoles => self.upload_roles(remote_session.as_ref()).await,
            };
            if let Some(err) = &outcome.error {
                error!(pass = pass.label(), "sync pass failed: {}", err);
            }
            outcomes.push(outcome);
        }

        let report = SyncReport::from_passes(started_at, outcomes);
        info!(
            success = report.success,
            synced = report.total_synced(),
            "sync run finished"
        );

        self.emit(SyncEvent::Completed(report.clone()));
        report
    }

    /// Startup trigger: run once when online with pending work.
    pub async fn sync_on_startup(&self) -> Option<SyncReport> {
        if !self.connectivity.check_connectivity().await {
            return None;
        }
        match self.local_users.pending_sync_count().await {
            Ok(0) => None,
            Ok(_) => Some(self.run().await),
            Err(err) => {
                warn!("pending-sync count failed at startup: {}", err);
                None
            }
        }
    }

    /// Spawn a listener that triggers a run on each offline-to-online
    /// transition when pending work exists.
    pub fn schedule_on_connectivity(self: &Arc<Self>) {
        let service = Arc::clone(self);
        let mut rx = self.connectivity.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(true) => {
                        let pending = service
                            .local_users
                            .pending_sync_count()
                            .await
                            .unwrap_or_default();
                        if pending > 0 {
                            service.run().await;
                        }
                    }
                    Ok(false) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "connectivity event listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    /// Pass 1: reconcile the authenticated principal's own record. The
    /// remote access model forbids bulk user listing, so this is the whole
    /// download surface; with no principal it counts zero.
    async fn download_users(&self, remote_session: Option<&RemoteSession>) -> SyncPassOutcome {
        let pass = SyncPass::DownloadUsers;
        let Some(remote_session) = remote_session else {
            return SyncPassOutcome::ok(pass, 0);
        };

        let profile = match self
            .remote_users
            .fetch(remote_session, &remote_session.remote_id)
            .await
        {
            Ok(Some(profile)) => profile,
            Ok(None) => return SyncPassOutcome::ok(pass, 0),
            Err(err) => return SyncPassOutcome::failed(pass, err.to_string()),
        };

        let local = match self.local_users.find_by_email(&profile.email).await {
            Ok(local) => local,
            Err(err) => return SyncPassOutcome::failed(pass, err.to_string()),
        };

        match local {
            Some(mut user) => {
                if user.needs_sync {
                    // Unsynced local edits win; the upload pass handles them.
                    return SyncPassOutcome::ok(pass, 0);
                }
                let unchanged = user.name == profile.name
                    && user.last_name == profile.last_name
                    && user.username == profile.username
                    && user.role == profile.role
                    && user.remote_id.as_deref() == Some(profile.remote_id.as_str());
                if unchanged {
                    return SyncPassOutcome::ok(pass, 0);
                }
                user.name = profile.name;
                user.last_name = profile.last_name;
                user.username = profile.username;
                user.role = profile.role;
                user.remote_id = Some(profile.remote_id);
                user.touch();
                // Refreshing from remote is not a local edit to re-upload.
                user.needs_sync = false;
                match self.local_users.update(&user).await {
                    Ok(()) => SyncPassOutcome::ok(pass, 1),
                    Err(err) => SyncPassOutcome::failed(pass, err.to_string()),
                }
            }
            None => SyncPassOutcome::ok(pass, 0),
        }
    }

    /// Pass 2: upload locally created users. Records without a remote id
    /// get an account created (credential: the stored digest); an
    /// already-exists answer marks the record synced without merging,
    /// deferring true reconciliation to the user's next interactive
    /// sign-in. Records that already have a remote id cannot be updated
    /// without that user's own authenticated session, so their flag is
    /// cleared to avoid repeated fruitless attempts.
    async fn upload_users(&self) -> SyncPassOutcome {
        let pass = SyncPass::UploadUsers;
        let pending = match self.local_users.records_needing_sync().await {
            Ok(pending) => pending,
            Err(err) => return SyncPassOutcome::failed(pass, err.to_string()),
        };

        let mut synced = 0;
        for user in pending {
            if user.remote_id.is_some() {
                // Password state is untouched here either way, so a
                // pending password change does not block this branch.
                debug!(
                    user = user.id,
                    "already mirrored remotely, clearing flag without update"
                );
                if let Err(err) = self.local_users.clear_needs_sync(user.id).await {
                    warn!(user = user.id, "failed to clear sync flag: {}", err);
                }
                synced += 1;
                continue;
            }

            if user.pending_password_change {
                // Creating the account would send the unproven new
                // password; that is owned by the interactive
                // reconciliation flow.
                debug!(user = user.id, "skipping user with pending password change");
                continue;
            }

            match self
                .remote_users
                .create_account(&user.email, &user.password_hash)
                .await
            {
                Ok(remote_session) => {
                    let mut profile = crate::application::ports::RemoteUser::from_record(&user);
                    profile.remote_id = remote_session.remote_id.clone();
                    if let Err(err) = self
                        .remote_users
                        .upsert_profile(&remote_session, &profile)
                        .await
                    {
                        warn!(user = user.id, "profile upload failed: {}", err);
                    }
                    match self
                        .local_users
                        .mark_synced(user.id, &remote_session.remote_id)
                        .await
                    {
                        Ok(()) => synced += 1,
                        Err(err) => warn!(user = user.id, "failed to mark synced: {}", err),
                    }
                }
                Err(err) if err.auth_kind() == Some(RemoteAuthKind::AccountExists) => {
                    info!(
                        user = user.id,
                        "remote account already exists, marking synced without merge"
                    );
                    if let Err(err) = self.local_users.clear_needs_sync(user.id).await {
                        warn!(user = user.id, "failed to clear sync flag: {}", err);
                    }
                    synced += 1;
                }
                Err(err) => {
                    // Leave needs_sync set; this record is retried next run.
                    warn!(user = user.id, "user upload failed: {}", err);
                }
            }
        }

        SyncPassOutcome::ok(pass, synced)
    }

    /// Pass 3: remote roles into the local table. Needs a token; without
    /// one this is a no-op success, not a failure.
    async fn download_roles(&self, remote_session: Option<&RemoteSession>) -> SyncPassOutcome {
        let pass = SyncPass::DownloadRoles;
        let Some(remote_session) = remote_session else {
            return SyncPassOutcome::ok(pass, 0);
        };

        let remote_roles = match self.remote_roles.fetch_all(&remote_session.token).await {
            Ok(roles) => roles,
            Err(err) => return SyncPassOutcome::failed(pass, err.to_string()),
        };

        let mut synced = 0;
        for role in remote_roles {
            let result = match self.local_roles.fetch_by_id(role.id).await {
                Ok(Some(existing)) if existing == role => continue,
                Ok(Some(_)) => self.local_roles.update(&role).await,
                Ok(None) => self.local_roles.insert(&role).await,
                Err(err) => {
                    warn!(role = role.id, "local role lookup failed: {}", err);
                    continue;
                }
            };
            match result {
                Ok(()) => synced += 1,
                Err(err) => warn!(role = role.id, "role download failed: {}", err),
            }
        }

        SyncPassOutcome::ok(pass, synced)
    }

    /// Pass 4: local roles up to the remote collection, insert-or-update
    /// decided by a per-record existence check. Same token precondition as
    /// the download pass.
    async fn upload_roles(&self, remote_session: Option<&RemoteSession>) -> SyncPassOutcome {
        let pass = SyncPass::UploadRoles;
        let Some(remote_session) = remote_session else {
            return SyncPassOutcome::ok(pass, 0);
        };

        let local_roles = match self.local_roles.fetch_all().await {
            Ok(roles) => roles,
            Err(err) => return SyncPassOutcome::failed(pass, err.to_string()),
        };

        let mut synced = 0;
        for role in local_roles {
            let result = match self
                .remote_roles
                .fetch(&remote_session.token, role.id)
                .await
            {
                Ok(Some(existing)) if existing == role => continue,
                Ok(Some(_)) => self.remote_roles.update(&remote_session.token, &role).await,
                Ok(None) => self.remote_roles.insert(&remote_session.token, &role).await,
                Err(err) => {
                    warn!(role = role.id, "remote role lookup failed: {}", err);
                    continue;
                }
            };
            match result {
                Ok(()) => synced += 1,
                Err(err) => warn!(role = role.id, "role upload failed: {}", err),
            }
        }

        SyncPassOutcome::ok(pass, synced)
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{ConnectivityProbe, RemoteUser};
    use crate::domain::entities::{NewUser, RoleRecord, UserRecord};
    use crate::infrastructure::connectivity::ConnectivityMonitor;
    use crate::shared::error::Result;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    struct OnlineProbe;

    #[async_trait]
    impl ConnectivityProbe for OnlineProbe {
        async fn probe(&self) -> bool {
            true
        }
    }

    /// User store whose first pending-records query parks forever, so a
    /// run can be cancelled mid-pass deterministically. Later queries
    /// return empty.
    struct StallingUserStore {
        entered: Arc<Notify>,
        stall: AtomicBool,
    }

    impl StallingUserStore {
        fn new(entered: Arc<Notify>) -> Self {
            Self {
                entered,
                stall: AtomicBool::new(true),
            }
        }
    }

    #[async_trait]
    impl UserLocalStore for StallingUserStore {
        async fn insert(&self, _user: &NewUser) -> Result<UserRecord> {
            unreachable!()
        }

        async fn update(&self, _user: &UserRecord) -> Result<()> {
            unreachable!()
        }

        async fn delete(&self, _id: i64) -> Result<()> {
            unreachable!()
        }

        async fn fetch_by_id(&self, _id: i64) -> Result<Option<UserRecord>> {
            unreachable!()
        }

        async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>> {
            unreachable!()
        }

        async fn fetch_all(&self) -> Result<Vec<UserRecord>> {
            unreachable!()
        }

        async fn mark_synced(&self, _id: i64, _remote_id: &str) -> Result<()> {
            unreachable!()
        }

        async fn clear_needs_sync(&self, _id: i64) -> Result<()> {
            unreachable!()
        }

        async fn records_needing_sync(&self) -> Result<Vec<UserRecord>> {
            if self.stall.swap(false, Ordering::SeqCst) {
                self.entered.notify_one();
                std::future::pending::<()>().await;
            }
            Ok(Vec::new())
        }

        async fn pending_sync_count(&self) -> Result<u32> {
            Ok(0)
        }

        async fn records_with_pending_password_change(&self) -> Result<Vec<UserRecord>> {
            Ok(Vec::new())
        }

        async fn clear_pending_password_change(&self, _id: i64) -> Result<()> {
            unreachable!()
        }
    }

    struct NullRoleStore;

    #[async_trait]
    impl RoleLocalStore for NullRoleStore {
        async fn insert(&self, _role: &RoleRecord) -> Result<()> {
            unreachable!()
        }

        async fn update(&self, _role: &RoleRecord) -> Result<()> {
            unreachable!()
        }

        async fn delete(&self, _id: i64) -> Result<()> {
            unreachable!()
        }

        async fn fetch_by_id(&self, _id: i64) -> Result<Option<RoleRecord>> {
            unreachable!()
        }

        async fn find_by_name(&self, _name: &str) -> Result<Option<RoleRecord>> {
            unreachable!()
        }

        async fn fetch_all(&self) -> Result<Vec<RoleRecord>> {
            unreachable!()
        }
    }

    struct NullRemoteUsers;

    #[async_trait]
    impl UserRemoteStore for NullRemoteUsers {
        async fn create_account(&self, _email: &str, _password: &str) -> Result<RemoteSession> {
            unreachable!()
        }

        async fn sign_in(&self, _email: &str, _password: &str) -> Result<RemoteSession> {
            unreachable!()
        }

        async fn sign_out(&self, _session: &RemoteSession) -> Result<()> {
            unreachable!()
        }

        async fn fetch(
            &self,
            _session: &RemoteSession,
            _remote_id: &str,
        ) -> Result<Option<RemoteUser>> {
            unreachable!()
        }

        async fn upsert_profile(
            &self,
            _session: &RemoteSession,
            _user: &RemoteUser,
        ) -> Result<()> {
            unreachable!()
        }

        async fn update_password(
            &self,
            _session: &RemoteSession,
            _new_password: &str,
        ) -> Result<()> {
            unreachable!()
        }

        async fn delete(&self, _session: &RemoteSession, _remote_id: &str) -> Result<()> {
            unreachable!()
        }
    }

    struct NullRemoteRoles;

    #[async_trait]
    impl RoleRemoteStore for NullRemoteRoles {
        async fn fetch(&self, _token: &str, _id: i64) -> Result<Option<RoleRecord>> {
            unreachable!()
        }

        async fn fetch_all(&self, _token: &str) -> Result<Vec<RoleRecord>> {
            unreachable!()
        }

        async fn insert(&self, _token: &str, _role: &RoleRecord) -> Result<()> {
            unreachable!()
        }

        async fn update(&self, _token: &str, _role: &RoleRecord) -> Result<()> {
            unreachable!()
        }

        async fn delete(&self, _token: &str, _id: i64) -> Result<()> {
            unreachable!()
        }
    }

    fn service(entered: Arc<Notify>) -> Arc<SyncService> {
        Arc::new(SyncService::new(
            Arc::new(StallingUserStore::new(entered)),
            Arc::new(NullRoleStore),
            Arc::new(NullRemoteUsers),
            Arc::new(NullRemoteRoles),
            Arc::new(ConnectivityMonitor::new(Arc::new(OnlineProbe))),
            SessionState::new(),
        ))
    }

    #[tokio::test]
    async fn test_second_caller_is_rejected_while_a_run_is_in_flight() {
        let entered = Arc::new(Notify::new());
        let service = service(entered.clone());

        let first = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.run().await }
        });
        entered.notified().await;

        let report = service.run().await;
        assert_eq!(
            report.error.as_deref(),
            Some("a sync run is already in progress")
        );

        first.abort();
        let _ = first.await;
    }

    #[tokio::test]
    async fn test_cancelled_run_releases_the_in_flight_flag() {
        let entered = Arc::new(Notify::new());
        let service = service(entered.clone());

        let running = tokio::spawn({
            let service = Arc::clone(&service);
            async move { service.run().await }
        });
        entered.notified().await;
        running.abort();
        assert!(running.await.unwrap_err().is_cancelled());

        let report = service.run().await;
        assert!(report.success);
        assert!(report.error.is_none());
    }
}
