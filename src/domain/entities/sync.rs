use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One directional reconciliation step within a sync run, in execution
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncPass {
    DownloadUsers,
    UploadUsers,
    DownloadRoles,
    UploadRoles,
}

impl SyncPass {
    pub const ALL: [SyncPass; 4] = [
        SyncPass::DownloadUsers,
        SyncPass::UploadUsers,
        SyncPass::DownloadRoles,
        SyncPass::UploadRoles,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SyncPass::DownloadUsers => "Downloading users",
            SyncPass::UploadUsers => "Uploading users",
            SyncPass::DownloadRoles => "Downloading roles",
            SyncPass::UploadRoles => "Uploading roles",
        }
    }
}

/// Outcome of one pass. Per-record failures inside a pass are logged and
/// skipped; `success` is false only when the whole pass failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPassOutcome {
    pub pass: SyncPass,
    pub success: bool,
    pub synced: u32,
    pub error: Option<String>,
}

impl SyncPassOutcome {
    pub fn ok(pass: SyncPass, synced: u32) -> Self {
        Self {
            pass,
            success: true,
            synced,
            error: None,
        }
    }

    pub fn failed(pass: SyncPass, error: impl Into<String>) -> Self {
        Self {
            pass,
            success: false,
            synced: 0,
            error: Some(error.into()),
        }
    }
}

/// Aggregated result of one sync run. Transient: constructed fresh per
/// invocation and handed to completion-event subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub success: bool,
    pub users_uploaded: u32,
    pub users_downloaded: u32,
    pub roles_uploaded: u32,
    pub roles_downloaded: u32,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub passes: Vec<SyncPassOutcome>,
}

impl SyncReport {
    pub fn from_passes(started_at: DateTime<Utc>, passes: Vec<SyncPassOutcome>) -> Self {
        let mut report = Self {
            success: passes.iter().all(|p| p.success),
            users_uploaded: 0,
            users_downloaded: 0,
            roles_uploaded: 0,
            roles_downloaded: 0,
            error: None,
            started_at,
            finished_at: Utc::now(),
            passes: Vec::new(),
        };
        for outcome in &passes {
            match outcome.pass {
                SyncPass::DownloadUsers => report.users_downloaded += outcome.synced,
                SyncPass::UploadUsers => report.users_uploaded += outcome.synced,
                SyncPass::DownloadRoles => report.roles_downloaded += outcome.synced,
                SyncPass::UploadRoles => report.roles_uploaded += outcome.synced,
            }
        }
        report.error = passes
            .iter()
            .filter_map(|p| p.error.clone())
            .reduce(|acc, e| format!("{}; {}", acc, e));
        report.passes = passes;
        report
    }

    /// Run refused because the fresh connectivity probe said offline.
    pub fn offline() -> Self {
        Self::aborted("offline")
    }

    /// Run refused because another run is in flight. Requests are rejected
    /// rather than queued to avoid unbounded backlog.
    pub fn already_running() -> Self {
        Self::aborted("a sync run is already in progress")
    }

    fn aborted(reason: &str) -> Self {
        let now = Utc::now();
        Self {
            success: false,
            users_uploaded: 0,
            users_downloaded: 0,
            roles_uploaded: 0,
            roles_downloaded: 0,
            error: Some(reason.to_string()),
            started_at: now,
            finished_at: now,
            passes: Vec::new(),
        }
    }

    pub fn total_synced(&self) -> u32 {
        self.users_uploaded + self.users_downloaded + self.roles_uploaded + self.roles_downloaded
    }
}

/// Progress events published over a broadcast channel. Handlers see events
/// in emission order; no other ordering is guaranteed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SyncEvent {
    Started,
    Pass {
        index: usize,
        total: usize,
        label: String,
    },
    Completed(SyncReport),
}
