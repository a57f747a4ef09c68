//! # Cache Storage Layer
//!
//! Durable local persistence for entries, their sync markers, and the date
//! index. The [`CacheStore`] trait abstracts the backend:
//!
//! - [`fs::FileStore`]: production file-based storage
//!   - Record metadata and the date index in `data.json`
//!   - Document text in individual files: `entry-<date>.md`
//!   - Settings blob in `settings.json`
//! - [`memory::InMemoryStore`]: in-memory storage for testing
//!
//! Metadata and documents are stored separately so listing and sync-state
//! queries don't require reading every document.
//!
//! ## Consistency rules
//!
//! The pending queue is *derived*: a date is pending iff its record exists
//! with `sync_state = Pending`, so queue membership and record state cannot
//! diverge. Every successful [`CacheStore::put_record`] also inserts the
//! date into the date index (insert-if-absent, sorted descending). The index
//! may hold dates with no local record — those are remote-only entries,
//! hydrated lazily on first read.

use crate::error::Result;
use crate::model::{CacheRecord, EntryDate};

pub mod fs;
pub mod memory;

/// Bytes used and whether the backend currently accepts writes.
#[derive(Debug, Clone, Copy)]
pub struct StorageUsage {
    pub bytes_used: u64,
    pub writable: bool,
}

/// What `prune` did: records it removed, and how many beyond the retention
/// horizon it refused to touch because they were still pending.
#[derive(Debug, Default)]
pub struct PruneReport {
    pub removed: Vec<EntryDate>,
    pub kept_pending: usize,
}

/// Abstract interface for the local cache.
pub trait CacheStore: Send + Sync {
    /// Get the cached record for a date, if one exists locally.
    fn get_record(&self, date: &EntryDate) -> Result<Option<CacheRecord>>;

    /// Create or overwrite a record. Also inserts the date into the date
    /// index if absent.
    fn put_record(&self, date: &EntryDate, record: &CacheRecord) -> Result<()>;

    /// Remove a record, its document, and the date's index entry. Absent
    /// pieces are skipped, so this is safe for index-only dates.
    fn delete_record(&self, date: &EntryDate) -> Result<()>;

    /// All known dates, sorted descending (most recent first).
    fn date_index(&self) -> Result<Vec<EntryDate>>;

    /// Authoritative replacement of the date index, e.g. from a remote
    /// listing. Existing records are untouched.
    fn replace_date_index(&self, dates: &[EntryDate]) -> Result<()>;

    /// Dates whose records are awaiting a remote write, sorted descending.
    fn pending_dates(&self) -> Result<Vec<EntryDate>>;

    /// Flip a record to `Pending`. Errors if the record does not exist.
    fn mark_pending(&self, date: &EntryDate) -> Result<()>;

    /// Flip a record to `Synced` with a fresh version token. Errors if the
    /// record does not exist.
    fn mark_synced(&self, date: &EntryDate, token: &str) -> Result<()>;

    /// Opaque settings blob. Missing settings read as an empty object.
    fn settings(&self) -> Result<serde_json::Value>;

    fn put_settings(&self, settings: &serde_json::Value) -> Result<()>;

    /// Probe bytes used and write availability.
    fn usage(&self) -> Result<StorageUsage>;

    /// Delete the oldest **synced** records beyond the `keep` most recent
    /// dates. Pending records are never pruned (that would lose unsynced
    /// work); their dates stay in the index either way.
    fn prune(&self, keep: usize) -> Result<PruneReport>;
}

impl<T: CacheStore + ?Sized> CacheStore for std::sync::Arc<T> {
    fn get_record(&self, date: &EntryDate) -> Result<Option<CacheRecord>> {
        (**self).get_record(date)
    }

    fn put_record(&self, date: &EntryDate, record: &CacheRecord) -> Result<()> {
        (**self).put_record(date, record)
    }

    fn delete_record(&self, date: &EntryDate) -> Result<()> {
        (**self).delete_record(date)
    }

    fn date_index(&self) -> Result<Vec<EntryDate>> {
        (**self).date_index()
    }

    fn replace_date_index(&self, dates: &[EntryDate]) -> Result<()> {
        (**self).replace_date_index(dates)
    }

    fn pending_dates(&self) -> Result<Vec<EntryDate>> {
        (**self).pending_dates()
    }

    fn mark_pending(&self, date: &EntryDate) -> Result<()> {
        (**self).mark_pending(date)
    }

    fn mark_synced(&self, date: &EntryDate, token: &str) -> Result<()> {
        (**self).mark_synced(date, token)
    }

    fn settings(&self) -> Result<serde_json::Value> {
        (**self).settings()
    }

    fn put_settings(&self, settings: &serde_json::Value) -> Result<()> {
        (**self).put_settings(settings)
    }

    fn usage(&self) -> Result<StorageUsage> {
        (**self).usage()
    }

    fn prune(&self, keep: usize) -> Result<PruneReport> {
        (**self).prune(keep)
    }
}

/// Insert a date into a descending-sorted list if absent. Shared by the
/// store implementations.
pub(crate) fn insert_date_desc(dates: &mut Vec<EntryDate>, date: EntryDate) {
    if !dates.contains(&date) {
        dates.push(date);
        dates.sort_by(|a, b| b.cmp(a));
    }
}
