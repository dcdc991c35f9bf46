mod common;

use std::time::Duration;

use accountd_core::infrastructure::remote::AuthClient;
use accountd_core::shared::password::hash_password;
use accountd_core::{RoleLocalStore, RoleRecord, SyncEvent};
use common::Harness;

#[tokio::test]
async fn offline_registration_converges_after_reconnect() {
    let h = Harness::new(false).await;
    let user = h
        .users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    assert!(user.needs_sync);
    assert!(user.remote_id.is_none());
    assert_eq!(h.auth.account_count(), 0);

    h.set_online(true).await;
    let report = h.sync.run().await;

    assert!(report.success);
    assert_eq!(report.users_uploaded, 1);

    let stored = h.users.fetch_by_id(user.id).await.unwrap().unwrap();
    assert!(!stored.needs_sync);
    let uid = stored.remote_id.expect("remote id assigned by sync");
    assert!(h.auth.has_account("a@x.com"));
    assert_eq!(
        h.auth.password_of("a@x.com").as_deref(),
        Some(hash_password("secret1").as_str())
    );
    let doc = h.docs.document(&format!("users/{}", uid)).unwrap();
    assert_eq!(doc["email"], "a@x.com");
}

#[tokio::test]
async fn every_pending_record_converges_in_one_run() {
    let h = Harness::new(false).await;
    for i in 0..5 {
        h.users
            .register(Harness::register_request(&format!("u{}@x.com", i), "secret1"))
            .await
            .unwrap();
    }
    assert_eq!(h.users.pending_sync_count().await.unwrap(), 5);

    h.set_online(true).await;
    let report = h.sync.run().await;

    assert!(report.success);
    assert_eq!(report.users_uploaded, 5);
    assert_eq!(h.users.pending_sync_count().await.unwrap(), 0);
    assert_eq!(h.auth.account_count(), 5);
    for user in h.users.fetch_all().await.unwrap() {
        assert!(!user.needs_sync);
        assert!(user.remote_id.is_some());
    }
}

#[tokio::test]
async fn second_cycle_uploads_nothing_new() {
    let h = Harness::new(true).await;
    h.users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    h.users.sign_in("a@x.com", "secret1").await.unwrap();

    h.local_roles
        .insert(&RoleRecord::new(5, "Manager", None))
        .await
        .unwrap();

    let report = h.sync.run().await;
    assert!(report.success);
    // Three seeded roles plus the new one.
    assert_eq!(report.roles_uploaded, 4);
    assert_eq!(h.docs.document_count("roles"), 4);
    let doc = h.docs.document("roles/5").unwrap();
    assert_eq!(doc["name"], "Manager");

    let report = h.sync.run().await;
    assert!(report.success);
    assert_eq!(report.roles_uploaded, 0);
    assert_eq!(report.roles_downloaded, 0);
    assert_eq!(report.users_uploaded, 0);
    assert_eq!(h.docs.document_count("roles"), 4);
}

#[tokio::test]
async fn roles_created_remotely_come_down() {
    let h = Harness::new(true).await;
    h.users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    h.users.sign_in("a@x.com", "secret1").await.unwrap();

    h.docs.put_document(
        "roles/7",
        serde_json::json!({"id": 7, "name": "Auditor", "description": null}),
    );

    let report = h.sync.run().await;
    assert!(report.success);
    assert_eq!(report.roles_downloaded, 1);

    let role = h.roles.fetch_by_id(7).await.unwrap().unwrap();
    assert_eq!(role.name, "Auditor");
}

#[tokio::test]
async fn role_passes_are_skipped_without_a_session() {
    let h = Harness::new(false).await;
    h.users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    h.set_online(true).await;

    let report = h.sync.run().await;

    // No principal: user upload still runs, role passes no-op cleanly.
    assert!(report.success);
    assert_eq!(report.users_uploaded, 1);
    assert_eq!(report.roles_uploaded, 0);
    assert_eq!(report.roles_downloaded, 0);
    assert_eq!(h.docs.document_count("roles"), 0);
}

#[tokio::test]
async fn pending_password_change_is_never_uploaded() {
    let h = Harness::new(false).await;
    let user = h
        .users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    h.users
        .change_password(user.id, "secret1", "secret2", "secret2")
        .await
        .unwrap();

    h.set_online(true).await;
    let report = h.sync.run().await;
    assert!(report.success);
    assert_eq!(report.users_uploaded, 0);

    // The record keeps waiting for the interactive reconciliation.
    let stored = h.users.fetch_by_id(user.id).await.unwrap().unwrap();
    assert!(stored.needs_sync);
    assert!(stored.pending_password_change);
    assert_eq!(
        stored.old_password_hash.as_deref(),
        Some(hash_password("secret1").as_str())
    );
    assert_eq!(h.auth.account_count(), 0);
}

#[tokio::test]
async fn pending_change_on_a_mirrored_record_clears_the_flag_but_not_the_password() {
    let h = Harness::new(true).await;
    let user = h
        .users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    assert!(user.remote_id.is_some());

    h.set_online(false).await;
    h.users
        .change_password(user.id, "secret1", "secret2", "secret2")
        .await
        .unwrap();
    // The offline change also left a profile edit behind.
    let mut stored = h.users.fetch_by_id(user.id).await.unwrap().unwrap();
    stored.name = "Augusta".to_string();
    h.users.update(stored).await.unwrap();

    h.set_online(true).await;
    let report = h.sync.run().await;
    assert!(report.success);

    let stored = h.users.fetch_by_id(user.id).await.unwrap().unwrap();
    assert!(!stored.needs_sync);
    assert!(stored.pending_password_change);
    // The remote credential is still the pre-change one.
    assert_eq!(
        h.auth.password_of("a@x.com").as_deref(),
        Some(hash_password("secret1").as_str())
    );
}

#[tokio::test]
async fn already_existing_remote_account_is_marked_synced_without_merge() {
    let h = Harness::new(false).await;
    let user = h
        .users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();
    // The same email was registered remotely from another device.
    h.set_online(true).await;
    h.auth
        .sign_up("a@x.com", &hash_password("other-password"))
        .await
        .unwrap();

    let report = h.sync.run().await;
    assert!(report.success);
    assert_eq!(report.users_uploaded, 1);

    let stored = h.users.fetch_by_id(user.id).await.unwrap().unwrap();
    assert!(!stored.needs_sync);
    // No merge happened; the remote credential was left alone.
    assert!(stored.remote_id.is_none());
    assert_eq!(
        h.auth.password_of("a@x.com").as_deref(),
        Some(hash_password("other-password").as_str())
    );
}

#[tokio::test]
async fn failed_upload_leaves_the_flag_for_the_next_run() {
    let h = Harness::new(false).await;
    h.users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();

    // Probe says online but the auth endpoint is down.
    h.auth.set_reachable(false);
    h.docs.set_reachable(false);
    h.probe.set(true);
    h.monitor.check_connectivity().await;

    let report = h.sync.run().await;
    assert!(report.success);
    assert_eq!(report.users_uploaded, 0);
    assert_eq!(h.users.pending_sync_count().await.unwrap(), 1);

    h.set_online(true).await;
    let report = h.sync.run().await;
    assert_eq!(report.users_uploaded, 1);
    assert_eq!(h.users.pending_sync_count().await.unwrap(), 0);
}

#[tokio::test]
async fn offline_run_yields_an_offline_report() {
    let h = Harness::new(false).await;
    let report = h.sync.run().await;
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("offline"));
    assert!(report.passes.is_empty());
    assert_eq!(report.total_synced(), 0);
}

#[tokio::test]
async fn run_emits_ordered_progress_events() {
    let h = Harness::new(true).await;
    h.users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();

    let mut rx = h.sync.subscribe();
    let report = h.sync.run().await;
    assert!(report.success);

    assert!(matches!(rx.try_recv().unwrap(), SyncEvent::Started));
    for expected in 1..=4 {
        match rx.try_recv().unwrap() {
            SyncEvent::Pass { index, total, label } => {
                assert_eq!(index, expected);
                assert_eq!(total, 4);
                assert!(!label.is_empty());
            }
            other => panic!("expected pass event, got {:?}", other),
        }
    }
    match rx.try_recv().unwrap() {
        SyncEvent::Completed(completed) => assert!(completed.success),
        other => panic!("expected completed event, got {:?}", other),
    }
}

#[tokio::test]
async fn startup_trigger_runs_only_with_pending_work() {
    let h = Harness::new(false).await;
    h.users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();

    assert!(h.sync.sync_on_startup().await.is_none());

    h.set_online(true).await;
    let report = h.sync.sync_on_startup().await.expect("pending work");
    assert_eq!(report.users_uploaded, 1);

    // Nothing left to do: no run at all.
    assert!(h.sync.sync_on_startup().await.is_none());
}

#[tokio::test]
async fn reconnect_transition_triggers_a_run() {
    let h = Harness::new(false).await;
    h.users
        .register(Harness::register_request("a@x.com", "secret1"))
        .await
        .unwrap();

    h.sync.schedule_on_connectivity();
    h.set_online(true).await;

    let mut pending = h.users.pending_sync_count().await.unwrap();
    for _ in 0..50 {
        if pending == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        pending = h.users.pending_sync_count().await.unwrap();
    }
    assert_eq!(pending, 0);
    assert!(h.auth.has_account("a@x.com"));
}
