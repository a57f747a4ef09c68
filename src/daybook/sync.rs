//! Sync coordination: the offline/online lifecycle of entries.
//!
//! Every local save lands in the cache as `Pending`; only a confirmed
//! remote write promotes an entry to `Synced` with a fresh version token.
//! Failures never lose local work — a failed push leaves the entry queued
//! for the next drain.
//!
//! The core is logically single-threaded, but remote calls suspend, and
//! while one is in flight other triggers (a periodic timer, a connectivity
//! event, a user action) can interleave. Cross-operation invariants are
//! therefore held by explicit guards rather than assumed: an atomic
//! in-flight flag collapses overlapping drains into one run, and a guarded
//! date set keeps two remote writes for the same entry from ever racing.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::codec;
use crate::error::{DaybookError, Result};
use crate::model::{CacheRecord, Entry, EntryDate, SyncState};
use crate::remote::{RemoteFile, RemoteStore};
use crate::store::CacheStore;

const ENTRIES_DIR: &str = "entries";

/// Remote path for an entry document.
pub fn entry_path(date: &EntryDate) -> String {
    format!("{}/{}.md", ENTRIES_DIR, date)
}

/// Per-entry lifecycle state as the coordinator sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySyncState {
    /// Never written locally or remotely.
    Unsynced,
    /// Local write not yet confirmed against the remote store.
    Pending,
    /// Local and remote agreed as of the last successful write.
    Synced,
}

/// Result of a single-entry sync attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Synced,
    /// Another sync for this date is mid-flight; nothing was done.
    AlreadyInFlight,
    /// No pending record for this date; nothing to push.
    NothingPending,
}

/// Result of a drain request.
#[derive(Debug)]
pub enum DrainOutcome {
    /// A drain was already running; this call was a no-op.
    AlreadyRunning,
    Completed(DrainReport),
}

#[derive(Debug, Default)]
pub struct DrainReport {
    pub synced: Vec<EntryDate>,
    pub failed: Vec<(EntryDate, DaybookError)>,
}

impl DrainReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of the best-effort remote index refresh. Failure is expected
/// offline and deliberately ignored — but it is reported as a value, not
/// swallowed in a silent catch, so callers and tests can see it happened.
#[derive(Debug)]
pub enum RemoteRefresh {
    Applied { dates: usize },
    Ignored(DaybookError),
}

pub struct SyncCoordinator<S, R> {
    store: S,
    remote: R,
    drain_active: AtomicBool,
    in_flight: Mutex<HashSet<EntryDate>>,
}

impl<S: CacheStore, R: RemoteStore> SyncCoordinator<S, R> {
    pub fn new(store: S, remote: R) -> Self {
        Self {
            store,
            remote,
            drain_active: AtomicBool::new(false),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Validate, encode, and persist an entry locally. The record becomes
    /// `Pending` regardless of its prior state; a known remote token is
    /// preserved so the eventual push stays conditioned on it.
    pub fn save_local(&self, entry: &Entry) -> Result<EntryDate> {
        let report = codec::validate(entry);
        if !report.is_valid() {
            return Err(DaybookError::Validation(report.errors.join("; ")));
        }
        let date: EntryDate = entry
            .date
            .parse()
            .map_err(DaybookError::Validation)?;

        let document = codec::encode(entry);
        let token = self
            .store
            .get_record(&date)?
            .and_then(|r| r.remote_version_token);
        self.store
            .put_record(&date, &CacheRecord::pending(document, token))?;
        debug!(%date, "saved entry locally, pending sync");
        Ok(date)
    }

    /// Load an entry: cache first, then the remote (hydrating the cache as
    /// `Synced`), and finally a fresh empty entry for an unknown date.
    pub async fn load(&self, date: &EntryDate) -> Result<Entry> {
        if let Some(record) = self.store.get_record(date)? {
            return codec::migrate(codec::decode(&record.document));
        }

        match self.remote.read(&entry_path(date)).await? {
            Some(file) => {
                debug!(%date, "hydrated entry from remote");
                self.store.put_record(
                    date,
                    &CacheRecord::synced(file.content.clone(), file.version_token),
                )?;
                codec::migrate(codec::decode(&file.content))
            }
            None => Ok(Entry::empty(date)),
        }
    }

    pub fn sync_state(&self, date: &EntryDate) -> Result<EntrySyncState> {
        Ok(match self.store.get_record(date)? {
            None => EntrySyncState::Unsynced,
            Some(record) if record.sync_state == SyncState::Pending => EntrySyncState::Pending,
            Some(_) => EntrySyncState::Synced,
        })
    }

    /// Read the remote copy without touching the cache. This is the hook
    /// for resolving a conflict by hand: fetch, compare, re-save.
    pub async fn fetch_remote(&self, date: &EntryDate) -> Result<Option<RemoteFile>> {
        self.remote.read(&entry_path(date)).await
    }

    /// Take the remote side of a conflict: overwrite the local record with
    /// the remote copy and its token, as `Synced`. The caller can then
    /// re-apply local edits on top and push normally. If the remote copy is
    /// gone, the local record loses its stale token so the next push
    /// re-creates the file.
    pub async fn adopt_remote(&self, date: &EntryDate) -> Result<Option<Entry>> {
        match self.remote.read(&entry_path(date)).await? {
            Some(file) => {
                self.store.put_record(
                    date,
                    &CacheRecord::synced(file.content.clone(), file.version_token),
                )?;
                debug!(%date, "adopted remote copy");
                Ok(Some(codec::migrate(codec::decode(&file.content))?))
            }
            None => {
                if let Some(record) = self.store.get_record(date)? {
                    self.store
                        .put_record(date, &CacheRecord::pending(record.document, None))?;
                }
                Ok(None)
            }
        }
    }

    /// Push one pending entry. Serialized per date: a second call for the
    /// same date while a write is in flight does nothing.
    pub async fn sync_one(&self, date: &EntryDate) -> Result<SyncOutcome> {
        {
            let mut in_flight = self.in_flight.lock().unwrap();
            if !in_flight.insert(*date) {
                return Ok(SyncOutcome::AlreadyInFlight);
            }
        }

        let result = self.push(date).await;
        self.in_flight.lock().unwrap().remove(date);
        result
    }

    async fn push(&self, date: &EntryDate) -> Result<SyncOutcome> {
        let Some(record) = self.store.get_record(date)? else {
            return Ok(SyncOutcome::NothingPending);
        };
        if record.sync_state == SyncState::Synced {
            return Ok(SyncOutcome::NothingPending);
        }

        let path = entry_path(date);
        let message = format!("daybook: update {}", date);
        let token = self
            .remote
            .write(
                &path,
                &record.document,
                record.remote_version_token.as_deref(),
                &message,
            )
            .await?;

        self.store.mark_synced(date, &token)?;
        debug!(%date, token, "entry synced");
        Ok(SyncOutcome::Synced)
    }

    /// Drain the pending queue sequentially. Overlapping triggers (timer
    /// tick, back-online event, manual sync) collapse into a single run.
    pub async fn sync_all_pending(&self) -> Result<DrainOutcome> {
        if self.drain_active.swap(true, Ordering::SeqCst) {
            return Ok(DrainOutcome::AlreadyRunning);
        }

        let result = self.drain().await;
        self.drain_active.store(false, Ordering::SeqCst);
        result.map(DrainOutcome::Completed)
    }

    async fn drain(&self) -> Result<DrainReport> {
        let pending = self.store.pending_dates()?;
        let mut report = DrainReport::default();

        for date in pending {
            match self.sync_one(&date).await {
                Ok(SyncOutcome::Synced) => report.synced.push(date),
                Ok(_) => {}
                Err(err) => {
                    // The entry stays queued; conflicts included.
                    warn!(%date, error = %err, "sync failed, entry remains pending");
                    report.failed.push((date, err));
                }
            }
        }
        Ok(report)
    }

    /// Refresh the date index from the remote listing. Dates of records
    /// still pending locally are kept even when the remote doesn't know
    /// them yet — a pure replace would orphan unpushed work from every
    /// listing until its first successful sync.
    pub async fn load_remote_index(&self) -> RemoteRefresh {
        let listing = match self.remote.list_dir(ENTRIES_DIR).await {
            Ok(listing) => listing,
            Err(err) => {
                debug!(error = %err, "remote index refresh skipped");
                return RemoteRefresh::Ignored(err);
            }
        };

        let mut dates: Vec<EntryDate> = listing
            .iter()
            .filter_map(|entry| entry.name.strip_suffix(".md"))
            .filter_map(|stem| stem.parse().ok())
            .collect();

        match self.store.pending_dates() {
            Ok(pending) => dates.extend(pending),
            Err(err) => return RemoteRefresh::Ignored(err),
        }
        if let Err(err) = self.store.replace_date_index(&dates) {
            return RemoteRefresh::Ignored(err);
        }

        let count = dates.len();
        debug!(dates = count, "remote index applied");
        RemoteRefresh::Applied { dates: count }
    }

    /// Remove an entry everywhere: the remote copy (when one is known) and
    /// the local record and index entry.
    pub async fn delete(&self, date: &EntryDate) -> Result<()> {
        let path = entry_path(date);
        let message = format!("daybook: delete {}", date);

        let token = match self.store.get_record(date)? {
            Some(record) => record.remote_version_token,
            None => self.remote.read(&path).await?.map(|f| f.version_token),
        };

        if let Some(token) = token {
            match self.remote.delete(&path, &token, &message).await {
                Ok(()) => {}
                // Already gone remotely; local cleanup still applies.
                Err(DaybookError::Authorization { status: 404, .. }) => {}
                Err(err) => return Err(err),
            }
        }

        self.store.delete_record(date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MetaValue;
    use crate::remote::memory::InMemoryRemote;
    use crate::store::memory::InMemoryStore;

    fn date(s: &str) -> EntryDate {
        s.parse().unwrap()
    }

    fn entry_for(s: &str) -> Entry {
        let mut entry = Entry::empty(&date(s));
        entry.sections.wins = format!("won on {}", s);
        entry
    }

    fn coordinator() -> SyncCoordinator<InMemoryStore, InMemoryRemote> {
        SyncCoordinator::new(InMemoryStore::new(), InMemoryRemote::new())
    }

    #[tokio::test]
    async fn test_save_then_sync_promotes_to_synced() {
        let coord = coordinator();
        let d = coord.save_local(&entry_for("2025-05-01")).unwrap();
        assert_eq!(coord.sync_state(&d).unwrap(), EntrySyncState::Pending);
        assert_eq!(coord.store().pending_dates().unwrap(), vec![d]);

        let outcome = coord.sync_one(&d).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Synced);
        assert_eq!(coord.sync_state(&d).unwrap(), EntrySyncState::Synced);
        assert!(coord.store().pending_dates().unwrap().is_empty());

        let pushed = coord.remote().content_of(&entry_path(&d)).unwrap();
        assert!(pushed.contains("won on 2025-05-01"));
    }

    #[tokio::test]
    async fn test_resave_keeps_token_for_conditioned_push() {
        let coord = coordinator();
        let d = coord.save_local(&entry_for("2025-05-01")).unwrap();
        coord.sync_one(&d).await.unwrap();
        let first_token = coord.remote().token_of(&entry_path(&d)).unwrap();

        // Editing again goes back to Pending but remembers the token.
        let mut edited = entry_for("2025-05-01");
        edited.sections.notes = "more".into();
        coord.save_local(&edited).unwrap();
        let record = coord.store().get_record(&d).unwrap().unwrap();
        assert_eq!(record.sync_state, SyncState::Pending);
        assert_eq!(record.remote_version_token.as_deref(), Some(first_token.as_str()));

        // The conditioned push succeeds and rotates the token.
        coord.sync_one(&d).await.unwrap();
        let second_token = coord.remote().token_of(&entry_path(&d)).unwrap();
        assert_ne!(first_token, second_token);
    }

    #[tokio::test]
    async fn test_conflict_surfaces_and_entry_stays_pending() {
        let coord = coordinator();
        let d = coord.save_local(&entry_for("2025-05-01")).unwrap();
        coord.sync_one(&d).await.unwrap();

        // Someone else rotates the remote revision.
        let foreign = coord.remote().seed(&entry_path(&d), "foreign edit");

        let mut edited = entry_for("2025-05-01");
        edited.sections.notes = "local edit".into();
        coord.save_local(&edited).unwrap();

        let err = coord.sync_one(&d).await.unwrap_err();
        assert!(err.is_conflict());
        // Not clobbered, still queued for manual resolution.
        assert_eq!(
            coord.remote().content_of(&entry_path(&d)).as_deref(),
            Some("foreign edit")
        );
        assert_eq!(coord.sync_state(&d).unwrap(), EntrySyncState::Pending);
        assert_eq!(coord.remote().token_of(&entry_path(&d)), Some(foreign));

        // The remote copy is reachable for resolution.
        let remote_copy = coord.fetch_remote(&d).await.unwrap().unwrap();
        assert_eq!(remote_copy.content, "foreign edit");
    }

    #[tokio::test]
    async fn test_conflict_resolved_by_adopting_remote() {
        let coord = coordinator();
        let d = coord.save_local(&entry_for("2025-05-01")).unwrap();
        coord.sync_one(&d).await.unwrap();
        coord.remote().seed(
            &entry_path(&d),
            "---\ndate: 2025-05-01\n---\n\n# 2. Wins\n\ntheir win\n",
        );

        let mut edited = entry_for("2025-05-01");
        edited.sections.notes = "my note".into();
        coord.save_local(&edited).unwrap();
        assert!(coord.sync_one(&d).await.unwrap_err().is_conflict());

        // Adopt the remote copy, merge the local edit back in, push again.
        let mut merged = coord.adopt_remote(&d).await.unwrap().unwrap();
        assert_eq!(merged.sections.wins, "their win");
        merged.sections.notes = "my note".into();
        coord.save_local(&merged).unwrap();
        assert_eq!(coord.sync_one(&d).await.unwrap(), SyncOutcome::Synced);

        let pushed = coord.remote().content_of(&entry_path(&d)).unwrap();
        assert!(pushed.contains("their win"));
        assert!(pushed.contains("my note"));
    }

    #[tokio::test]
    async fn test_adopt_remote_when_remote_gone_drops_stale_token() {
        let coord = coordinator();
        let d = coord.save_local(&entry_for("2025-05-01")).unwrap();
        coord.sync_one(&d).await.unwrap();

        // The remote file disappears out from under us.
        let token = coord.remote().token_of(&entry_path(&d)).unwrap();
        coord
            .remote()
            .delete(&entry_path(&d), &token, "external delete")
            .await
            .unwrap();

        assert!(coord.adopt_remote(&d).await.unwrap().is_none());
        let record = coord.store().get_record(&d).unwrap().unwrap();
        assert_eq!(record.remote_version_token, None);
        assert_eq!(record.sync_state, SyncState::Pending);

        // The next push re-creates the file.
        assert_eq!(coord.sync_one(&d).await.unwrap(), SyncOutcome::Synced);
    }

    #[tokio::test]
    async fn test_drain_syncs_everything_and_keeps_failures_queued() {
        let coord = coordinator();
        let d1 = coord.save_local(&entry_for("2025-05-01")).unwrap();
        let d2 = coord.save_local(&entry_for("2025-05-02")).unwrap();
        let d3 = coord.save_local(&entry_for("2025-05-03")).unwrap();

        // Exactly one write attempt fails; the drain hits dates newest
        // first, so 2025-05-03 fails and stays pending.
        coord.remote().fail_next_writes(1);

        let outcome = coord.sync_all_pending().await.unwrap();
        let report = match outcome {
            DrainOutcome::Completed(report) => report,
            DrainOutcome::AlreadyRunning => panic!("drain did not run"),
        };
        assert_eq!(report.synced, vec![d2, d1]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, d3);
        assert_eq!(coord.store().pending_dates().unwrap(), vec![d3]);

        // The next drain picks the failure up.
        let outcome = coord.sync_all_pending().await.unwrap();
        match outcome {
            DrainOutcome::Completed(report) => assert_eq!(report.synced, vec![d3]),
            DrainOutcome::AlreadyRunning => panic!("drain did not run"),
        }
    }

    #[tokio::test]
    async fn test_overlapping_drains_collapse_into_one() {
        let coord = coordinator();
        coord.save_local(&entry_for("2025-05-01")).unwrap();
        coord.save_local(&entry_for("2025-05-02")).unwrap();

        let (first, second) = tokio::join!(coord.sync_all_pending(), coord.sync_all_pending());
        let outcomes = [first.unwrap(), second.unwrap()];

        let ran: Vec<&DrainReport> = outcomes
            .iter()
            .filter_map(|o| match o {
                DrainOutcome::Completed(report) => Some(report),
                DrainOutcome::AlreadyRunning => None,
            })
            .collect();
        // Exactly one drain ran; the overlapping trigger was a no-op.
        assert_eq!(ran.len(), 1);
        assert_eq!(ran[0].synced.len(), 2);
        assert!(coord.store().pending_dates().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_date_never_syncs_twice_concurrently() {
        let coord = coordinator();
        let d = coord.save_local(&entry_for("2025-05-01")).unwrap();

        let (first, second) = tokio::join!(coord.sync_one(&d), coord.sync_one(&d));
        let outcomes = [first.unwrap(), second.unwrap()];
        assert!(outcomes.contains(&SyncOutcome::Synced));
        assert!(outcomes.contains(&SyncOutcome::AlreadyInFlight));
        // One write reached the remote, not two.
        assert_eq!(coord.remote().write_attempts(), 1);
    }

    #[tokio::test]
    async fn test_load_remote_index_replaces_and_keeps_pending() {
        let coord = coordinator();
        coord.remote().seed("entries/2025-04-01.md", "a");
        coord.remote().seed("entries/2025-04-02.md", "b");
        coord.remote().seed("entries/readme.txt", "junk");
        let local = coord.save_local(&entry_for("2025-05-01")).unwrap();

        let refresh = coord.load_remote_index().await;
        assert!(matches!(refresh, RemoteRefresh::Applied { dates: 3 }));
        assert_eq!(
            coord.store().date_index().unwrap(),
            vec![local, date("2025-04-02"), date("2025-04-01")]
        );
    }

    #[tokio::test]
    async fn test_load_remote_index_failure_is_ignored_not_fatal() {
        let coord = coordinator();
        coord.save_local(&entry_for("2025-05-01")).unwrap();
        coord.remote().fail_next_lists(1);

        let refresh = coord.load_remote_index().await;
        assert!(matches!(refresh, RemoteRefresh::Ignored(_)));
        // The local index is untouched.
        assert_eq!(coord.store().date_index().unwrap(), vec![date("2025-05-01")]);
    }

    #[tokio::test]
    async fn test_load_hydrates_from_remote_as_synced() {
        let coord = coordinator();
        let d = date("2025-04-01");
        let doc = "---\nschema: 1\ndate: 2025-04-01\n---\n\n# 2. Wins\n\nremote win\n";
        coord.remote().seed(&entry_path(&d), doc);

        let entry = coord.load(&d).await.unwrap();
        assert_eq!(entry.sections.wins, "remote win");
        assert_eq!(coord.sync_state(&d).unwrap(), EntrySyncState::Synced);
        let record = coord.store().get_record(&d).unwrap().unwrap();
        assert_eq!(record.document, doc);
        assert!(record.remote_version_token.is_some());
    }

    #[tokio::test]
    async fn test_load_unknown_date_is_a_fresh_entry() {
        let coord = coordinator();
        let d = date("2025-04-01");
        let entry = coord.load(&d).await.unwrap();
        assert_eq!(entry, Entry::empty(&d));
        assert_eq!(coord.sync_state(&d).unwrap(), EntrySyncState::Unsynced);
    }

    #[tokio::test]
    async fn test_save_local_rejects_invalid_entries() {
        let coord = coordinator();
        let mut bad = entry_for("2025-05-01");
        bad.scores.mood = MetaValue::Int(42);
        let err = coord.save_local(&bad).unwrap_err();
        assert!(matches!(err, DaybookError::Validation(_)));
        assert!(coord.store().pending_dates().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_remote_and_local() {
        let coord = coordinator();
        let d = coord.save_local(&entry_for("2025-05-01")).unwrap();
        coord.sync_one(&d).await.unwrap();

        coord.delete(&d).await.unwrap();
        assert!(coord.remote().content_of(&entry_path(&d)).is_none());
        assert!(coord.store().get_record(&d).unwrap().is_none());
        assert!(coord.store().date_index().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_of_never_synced_entry_is_local_only() {
        let coord = coordinator();
        let d = coord.save_local(&entry_for("2025-05-01")).unwrap();
        coord.delete(&d).await.unwrap();
        assert!(coord.store().get_record(&d).unwrap().is_none());
    }
}
