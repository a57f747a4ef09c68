//! End-to-end flows over the file-backed cache and the in-memory remote:
//! offline edits surviving restarts, two-device sync, and conflict
//! resolution.

use std::sync::Arc;

use daybook::model::{Entry, EntryDate, MetaValue};
use daybook::remote::memory::InMemoryRemote;
use daybook::store::fs::FileStore;
use daybook::store::CacheStore;
use daybook::sync::{entry_path, DrainOutcome, EntrySyncState, RemoteRefresh, SyncCoordinator};

fn date(s: &str) -> EntryDate {
    s.parse().unwrap()
}

fn sample_entry(s: &str) -> Entry {
    let mut entry = Entry::empty(&date(s));
    entry.scores.score = MetaValue::Int(8);
    entry.scores.discipline = MetaValue::Int(9);
    entry.scores.focus = MetaValue::Int(7);
    entry.net_worth_delta = MetaValue::Int(1000);
    entry.sections.identity = "I am building...".to_string();
    entry
}

#[tokio::test]
async fn offline_edits_survive_restart_and_sync_later() {
    let dir = tempfile::tempdir().unwrap();
    let cache_root = dir.path().join("cache");
    let remote = Arc::new(InMemoryRemote::new());

    // First run: save offline, never sync.
    {
        let coord = SyncCoordinator::new(FileStore::new(cache_root.clone()), remote.clone());
        coord.save_local(&sample_entry("2025-12-25")).unwrap();
        coord.save_local(&sample_entry("2025-12-26")).unwrap();
        assert_eq!(coord.store().pending_dates().unwrap().len(), 2);
    }

    // Second run: the queue survived the restart; drain it.
    let coord = SyncCoordinator::new(FileStore::new(cache_root), remote.clone());
    assert_eq!(coord.store().pending_dates().unwrap().len(), 2);

    let outcome = coord.sync_all_pending().await.unwrap();
    match outcome {
        DrainOutcome::Completed(report) => {
            assert_eq!(report.synced.len(), 2);
            assert!(report.is_clean());
        }
        DrainOutcome::AlreadyRunning => panic!("drain did not run"),
    }

    let pushed = remote.content_of(&entry_path(&date("2025-12-25"))).unwrap();
    assert!(pushed.contains("score: 8"));
    assert!(pushed.contains("net_worth_delta: 1000"));
    assert!(pushed.contains("# 1. Identity & North Star"));
    assert!(pushed.contains("I am building..."));
}

#[tokio::test]
async fn second_device_discovers_and_hydrates_entries() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());

    // Device A writes and syncs.
    let device_a = SyncCoordinator::new(FileStore::new(dir.path().join("a")), remote.clone());
    device_a.save_local(&sample_entry("2025-12-25")).unwrap();
    device_a.sync_one(&date("2025-12-25")).await.unwrap();

    // Device B starts empty, learns the date from the remote listing, and
    // hydrates the entry lazily on first read.
    let device_b = SyncCoordinator::new(FileStore::new(dir.path().join("b")), remote.clone());
    let refresh = device_b.load_remote_index().await;
    assert!(matches!(refresh, RemoteRefresh::Applied { dates: 1 }));
    assert_eq!(
        device_b.store().date_index().unwrap(),
        vec![date("2025-12-25")]
    );
    assert!(device_b
        .store()
        .get_record(&date("2025-12-25"))
        .unwrap()
        .is_none());

    let entry = device_b.load(&date("2025-12-25")).await.unwrap();
    assert_eq!(entry.sections.identity, "I am building...");
    assert_eq!(
        device_b.sync_state(&date("2025-12-25")).unwrap(),
        EntrySyncState::Synced
    );
}

#[tokio::test]
async fn concurrent_editors_conflict_then_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let d = date("2025-12-25");

    let device_a = SyncCoordinator::new(FileStore::new(dir.path().join("a")), remote.clone());
    let device_b = SyncCoordinator::new(FileStore::new(dir.path().join("b")), remote.clone());

    // Both devices start from the same synced revision.
    device_a.save_local(&sample_entry("2025-12-25")).unwrap();
    device_a.sync_one(&d).await.unwrap();
    device_b.load(&d).await.unwrap();

    // A pushes an edit first.
    let mut from_a = sample_entry("2025-12-25");
    from_a.sections.wins = "device A won".into();
    device_a.save_local(&from_a).unwrap();
    device_a.sync_one(&d).await.unwrap();

    // B's push is now conditioned on a stale token and must conflict.
    let mut from_b = sample_entry("2025-12-25");
    from_b.sections.notes = "device B note".into();
    device_b.save_local(&from_b).unwrap();
    let err = device_b.sync_one(&d).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(device_b.sync_state(&d).unwrap(), EntrySyncState::Pending);

    // B adopts the remote copy, merges, and pushes cleanly.
    let mut merged = device_b.adopt_remote(&d).await.unwrap().unwrap();
    assert_eq!(merged.sections.wins, "device A won");
    merged.sections.notes = "device B note".into();
    device_b.save_local(&merged).unwrap();
    device_b.sync_one(&d).await.unwrap();

    let final_doc = remote.content_of(&entry_path(&d)).unwrap();
    assert!(final_doc.contains("device A won"));
    assert!(final_doc.contains("device B note"));
}

#[tokio::test]
async fn pruned_entries_can_be_rehydrated() {
    let dir = tempfile::tempdir().unwrap();
    let remote = Arc::new(InMemoryRemote::new());
    let coord = SyncCoordinator::new(FileStore::new(dir.path().join("cache")), remote.clone());

    for day in ["2025-12-01", "2025-12-02", "2025-12-03"] {
        coord.save_local(&sample_entry(day)).unwrap();
        coord.sync_one(&date(day)).await.unwrap();
    }

    let report = coord.store().prune(1).unwrap();
    assert_eq!(
        report.removed,
        vec![date("2025-12-02"), date("2025-12-01")]
    );
    // The pruned dates are still listed, and reading one pulls it back
    // from the remote.
    assert_eq!(coord.store().date_index().unwrap().len(), 3);
    let entry = coord.load(&date("2025-12-01")).await.unwrap();
    assert_eq!(entry.sections.identity, "I am building...");
}
