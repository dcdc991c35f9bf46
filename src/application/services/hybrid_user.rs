use std::sync::Arc;

use tracing::{debug, info, warn};

use super::session::SessionState;
use crate::application::ports::{RemoteUser, UserLocalStore, UserRemoteStore};
use crate::domain::entities::{NewUser, RemoteSession, Session, UserRecord, UserRole};
use crate::infrastructure::connectivity::ConnectivityMonitor;
use crate::shared::error::{AppError, RemoteAuthKind, Result};
use crate::shared::password::{hash_password, verify_password};
use crate::shared::validation;

/// Registration input. The very first user of an empty system is promoted
/// to Admin by the caller; the DAL just accepts the explicit role.
#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub role: UserRole,
}

/// Admin-created user input, mirrored best-effort like any other write.
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Routing layer between the local and remote user stores. Reads are
/// served from local only; writes land locally first and are mirrored to
/// the remote best-effort, never failing the overall operation.
pub struct HybridUserDal {
    local: Arc<dyn UserLocalStore>,
    remote: Arc<dyn UserRemoteStore>,
    connectivity: Arc<ConnectivityMonitor>,
    session: SessionState,
}

impl HybridUserDal {
    pub fn new(
        local: Arc<dyn UserLocalStore>,
        remote: Arc<dyn UserRemoteStore>,
        connectivity: Arc<ConnectivityMonitor>,
        session: SessionState,
    ) -> Self {
        Self {
            local,
            remote,
            connectivity,
            session,
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Register a new account. Attempts remote creation first when a fresh
    /// probe says online; on any remote unavailability the record is
    /// created locally only, flagged for the next sync pass.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserRecord> {
        validation::require_non_empty("name", &request.name)?;
        validation::validate_email(&request.email)?;
        validation::validate_password(&request.password)?;
        validation::validate_confirmation(&request.password, &request.password_confirmation)?;

        if self.local.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "email {} is already registered",
                request.email
            )));
        }

        let digest = hash_password(&request.password);
        let mut draft = NewUser::new(
            request.name,
            request.last_name,
            request.username,
            request.email.clone(),
            digest.clone(),
            request.role,
        );

        // Fresh reading: the branch below decides whether to create the
        // remote account now or defer to sync.
        if self.connectivity.check_connectivity().await {
            match self.remote.create_account(&request.email, &digest).await {
                Ok(remote_session) => {
                    draft.remote_id = Some(remote_session.remote_id.clone());
                    draft.needs_sync = false;
                    let record = self.local.insert(&draft).await?;
                    // The account itself is mirrored; a failed profile put
                    // is recovered by the next sign-in refresh.
                    if let Err(err) = self.mirror_profile(&remote_session, &record).await {
                        warn!(user = record.id, "profile mirror failed: {}", err);
                    }
                    info!(user = record.id, "registered online");
                    return Ok(record);
                }
                Err(err) if err.auth_kind() == Some(RemoteAuthKind::AccountExists) => {
                    return Err(AppError::Conflict(format!(
                        "email {} is already registered",
                        request.email
                    )));
                }
                Err(err) => {
                    warn!("remote account creation failed, registering locally: {}", err);
                }
            }
        }

        let record = self.local.insert(&draft).await?;
        info!(user = record.id, "registered offline, pending sync");
        Ok(record)
    }

    /// Sign in. Remote first on a fresh online reading, with the resulting
    /// profile cached locally so the same credentials work offline later;
    /// local-hash fallback otherwise. Both legs failing yields the same
    /// generic credentials error.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserRecord> {
        validation::require_non_empty("email", email)?;
        validation::require_non_empty("password", password)?;
        let digest = hash_password(password);

        if self.connectivity.check_connectivity().await {
            match self.remote.sign_in(email, &digest).await {
                Ok(remote_session) => {
                    let record = self.cache_signed_in_user(email, &digest, &remote_session).await?;
                    self.session
                        .set(Session::online(record.clone(), remote_session))
                        .await;
                    return Ok(record);
                }
                Err(err) => {
                    debug!("remote sign-in failed, trying local fallback: {}", err);
                }
            }
        }

        match self.local.find_by_email(email).await? {
            Some(user) if user.password_hash == digest => {
                self.session.set(Session::local(user.clone())).await;
                Ok(user)
            }
            _ => Err(AppError::invalid_credentials()),
        }
    }

    /// Best-effort remote sign-out; local session state is always cleared.
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(remote_session) = self.session.remote().await {
            if self.connectivity.is_online() {
                if let Err(err) = self.remote.sign_out(&remote_session).await {
                    warn!("remote sign-out failed: {}", err);
                }
            }
        }
        self.session.clear().await;
        Ok(())
    }

    /// Admin-style insert: local first, remote mirrored best-effort when
    /// the cached flag says online.
    pub async fn insert(&self, request: CreateUserRequest) -> Result<UserRecord> {
        validation::require_non_empty("name", &request.name)?;
        validation::validate_email(&request.email)?;
        validation::validate_password(&request.password)?;

        if self.local.find_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict(format!(
                "email {} is already registered",
                request.email
            )));
        }

        let digest = hash_password(&request.password);
        let draft = NewUser::new(
            request.name,
            request.last_name,
            request.username,
            request.email.clone(),
            digest.clone(),
            request.role,
        );
        let record = self.local.insert(&draft).await?;

        if self.connectivity.is_online() {
            match self.remote.create_account(&record.email, &digest).await {
                Ok(remote_session) => {
                    if let Err(err) = self.mirror_profile(&remote_session, &record).await {
                        warn!(user = record.id, "profile mirror failed: {}", err);
                    }
                    self.local
                        .mark_synced(record.id, &remote_session.remote_id)
                        .await?;
                }
                Err(err) if err.auth_kind() == Some(RemoteAuthKind::AccountExists) => {
                    debug!(user = record.id, "remote account already exists, marking synced");
                    self.local.clear_needs_sync(record.id).await?;
                }
                Err(err) => {
                    warn!(user = record.id, "remote mirror of insert failed: {}", err);
                }
            }
        }

        // Re-read so the caller observes the sync-tracking outcome.
        self.local
            .fetch_by_id(record.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", record.id)))
    }

    /// Profile update: local write always precedes the remote attempt, and
    /// the remote leg can only push the authenticated principal's own
    /// document.
    pub async fn update(&self, mut user: UserRecord) -> Result<UserRecord> {
        validation::require_non_empty("name", &user.name)?;
        validation::validate_email(&user.email)?;

        user.needs_sync = true;
        user.touch();
        self.local.update(&user).await?;

        if self.connectivity.is_online() {
            if let Some(remote_session) = self.session.remote().await {
                if user.remote_id.as_deref() == Some(remote_session.remote_id.as_str()) {
                    match self
                        .remote
                        .upsert_profile(&remote_session, &RemoteUser::from_record(&user))
                        .await
                    {
                        Ok(()) => {
                            self.local.clear_needs_sync(user.id).await?;
                            user.needs_sync = false;
                        }
                        Err(err) => {
                            warn!(user = user.id, "remote mirror of update failed: {}", err);
                        }
                    }
                }
            }
        }

        Ok(user)
    }

    /// Delete from both stores. Local failure aborts. The remote leg only
    /// runs for the authenticated principal's own account: the auth
    /// provider deletes the bearer's own account and the document store
    /// only grants writes on the principal's own path, so deleting another
    /// user leaves their remote side untouched. Remote failure is
    /// tolerated and logged, leaving an orphan remote account.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let user = self
            .local
            .fetch_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))?;

        self.local.delete(id).await?;

        if let Some(remote_id) = &user.remote_id {
            if self.connectivity.is_online() {
                if let Some(remote_session) = self.session.remote().await {
                    if remote_session.remote_id == *remote_id {
                        if let Err(err) = self.remote.delete(&remote_session, remote_id).await {
                            warn!(user = id, "remote deletion failed, orphan remains: {}", err);
                        }
                    }
                }
            }
        }

        if let Some(session) = self.session.current().await {
            if session.user.id == id {
                self.session.clear().await;
            }
        }

        Ok(())
    }

    /// Change the principal's password. Online: re-authenticate with the
    /// current password and push the new one immediately. Offline (or on
    /// any remote failure): flag the record pending and retain the digest
    /// in effect before the change for the interactive reconciliation.
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
        confirmation: &str,
    ) -> Result<UserRecord> {
        validation::validate_password(new_password)?;
        validation::validate_confirmation(new_password, confirmation)?;

        let mut user = self
            .local
            .fetch_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))?;

        if !verify_password(current_password, &user.password_hash) {
            return Err(AppError::invalid_credentials());
        }

        let current_digest = user.password_hash.clone();
        let new_digest = hash_password(new_password);

        if self.connectivity.check_connectivity().await {
            match self.remote.sign_in(&user.email, &current_digest).await {
                Ok(remote_session) => {
                    match self
                        .remote
                        .update_password(&remote_session, &new_digest)
                        .await
                    {
                        Ok(()) => {
                            user.password_hash = new_digest;
                            user.password_changed_at = Some(chrono::Utc::now());
                            user.clear_pending_password_change();
                            user.touch();
                            self.local.update(&user).await?;
                            info!(user = user.id, "password changed online");
                            return Ok(user);
                        }
                        Err(err) => warn!("remote password update failed: {}", err),
                    }
                }
                Err(err) => debug!("remote re-auth for password change failed: {}", err),
            }
        }

        if user.pending_password_change {
            // Second offline change: the remote still knows the original
            // password, keep that digest as the reconciliation proof.
            user.password_hash = new_digest;
            user.password_changed_at = Some(chrono::Utc::now());
            user.touch();
        } else {
            user.begin_password_change(current_digest, new_digest);
        }
        self.local.update(&user).await?;
        info!(user = user.id, "password changed offline, pending reconciliation");
        Ok(user)
    }

    /// Reads never touch the remote store.
    pub async fn fetch_by_id(&self, id: i64) -> Result<Option<UserRecord>> {
        self.local.fetch_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.local.find_by_email(email).await
    }

    pub async fn fetch_all(&self) -> Result<Vec<UserRecord>> {
        self.local.fetch_all().await
    }

    pub async fn pending_sync_count(&self) -> Result<u32> {
        self.local.pending_sync_count().await
    }

    /// Upsert the remote principal into the local cache after an online
    /// sign-in. Local records with unsynced edits win and get pushed up
    /// instead; otherwise local is refreshed from the remote document.
    async fn cache_signed_in_user(
        &self,
        email: &str,
        digest: &str,
        remote_session: &RemoteSession,
    ) -> Result<UserRecord> {
        let profile = match self
            .remote
            .fetch(remote_session, &remote_session.remote_id)
            .await
        {
            Ok(profile) => profile,
            Err(err) => {
                debug!("remote profile fetch failed during sign-in: {}", err);
                None
            }
        };

        match self.local.find_by_email(email).await? {
            Some(mut user) => {
                user.password_hash = digest.to_string();
                user.remote_id = Some(remote_session.remote_id.clone());
                if user.needs_sync {
                    // Offline edits pending: push local state up now. The
                    // flag is cleared only on a confirmed push; otherwise
                    // it stays set for the next login.
                    match self.mirror_profile(remote_session, &user).await {
                        Ok(()) => user.needs_sync = false,
                        Err(err) => {
                            warn!(user = user.id, "push of unsynced edits failed: {}", err);
                        }
                    }
                } else if let Some(profile) = profile {
                    user.name = profile.name;
                    user.last_name = profile.last_name;
                    user.username = profile.username;
                    user.role = profile.role;
                }
                user.touch();
                self.local.update(&user).await?;
                Ok(user)
            }
            None => {
                let mut draft = match profile {
                    Some(profile) => NewUser::new(
                        profile.name,
                        profile.last_name,
                        profile.username,
                        email,
                        digest,
                        profile.role,
                    ),
                    None => NewUser::new("", "", email, email, digest, UserRole::User),
                };
                draft.remote_id = Some(remote_session.remote_id.clone());
                draft.needs_sync = false;
                self.local.insert(&draft).await
            }
        }
    }

    async fn mirror_profile(&self, remote_session: &RemoteSession, user: &UserRecord) -> Result<()> {
        let mut profile = RemoteUser::from_record(user);
        profile.remote_id = remote_session.remote_id.clone();
        self.remote.upsert_profile(remote_session, &profile).await
    }
}
