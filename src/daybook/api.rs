//! # API Facade
//!
//! The single entry point for daybook operations, regardless of the UI in
//! front of it. The facade dispatches to command modules and the sync
//! coordinator, normalizes inputs, and returns structured `CmdResult`
//! values — no business logic, no I/O formatting, no terminal assumptions.
//!
//! `DaybookApi<S, R>` is generic over both boundaries:
//! - Production: `DaybookApi<FileStore, GitHubStore>`
//! - Testing: `DaybookApi<InMemoryStore, InMemoryRemote>`

use std::path::Path;

use crate::commands;
use crate::error::{DaybookError, Result};
use crate::model::{Entry, EntryDate};
use crate::remote::{RemoteFile, RemoteStore};
use crate::store::CacheStore;
use crate::sync::SyncCoordinator;

pub struct DaybookApi<S: CacheStore, R: RemoteStore> {
    sync: SyncCoordinator<S, R>,
}

impl<S: CacheStore, R: RemoteStore> DaybookApi<S, R> {
    pub fn new(store: S, remote: R) -> Self {
        Self {
            sync: SyncCoordinator::new(store, remote),
        }
    }

    pub fn coordinator(&self) -> &SyncCoordinator<S, R> {
        &self.sync
    }

    pub fn save_entry(&self, entry: &Entry) -> Result<CmdResult> {
        commands::save::run(&self.sync, entry)
    }

    pub async fn show_entry(&self, date: &EntryDate) -> Result<CmdResult> {
        commands::show::run(&self.sync, date).await
    }

    /// Load the structured entry for editing flows.
    pub async fn load_entry(&self, date: &EntryDate) -> Result<Entry> {
        self.sync.load(date).await
    }

    pub fn list_entries(&self, query: Option<&str>, page: usize) -> Result<CmdResult> {
        commands::list::run(self.sync.store(), query, page)
    }

    pub async fn sync(&self, refresh_index: bool) -> Result<CmdResult> {
        commands::sync::run(&self.sync, refresh_index).await
    }

    pub fn status(&self) -> Result<CmdResult> {
        commands::status::run(self.sync.store())
    }

    pub fn export_entries(&self, format: commands::export::ExportFormat) -> Result<CmdResult> {
        commands::export::run(self.sync.store(), format)
    }

    pub fn import_entries(&self, path: &Path) -> Result<CmdResult> {
        commands::import::run(self.sync.store(), path)
    }

    pub async fn delete_entry(&self, date: &EntryDate) -> Result<CmdResult> {
        commands::delete::run(&self.sync, date).await
    }

    pub fn prune(&self, keep: usize) -> Result<CmdResult> {
        commands::prune::run(self.sync.store(), keep)
    }

    /// The remote copy of an entry, for resolving conflicts by hand.
    pub async fn fetch_remote(&self, date: &EntryDate) -> Result<Option<RemoteFile>> {
        self.sync.fetch_remote(date).await
    }

    /// Resolve a conflict by taking the remote side; returns the adopted
    /// entry so callers can re-apply local edits on top.
    pub async fn adopt_remote(&self, date: &EntryDate) -> Result<Option<Entry>> {
        self.sync.adopt_remote(date).await
    }
}

/// Parse a CLI-supplied date argument, defaulting to today.
pub fn resolve_date(raw: Option<&str>) -> Result<EntryDate> {
    match raw {
        Some(s) => s.parse().map_err(DaybookError::Validation),
        None => Ok(EntryDate::today()),
    }
}

pub use crate::commands::config::ConfigAction;
pub use crate::commands::export::ExportFormat;
pub use crate::commands::{CmdMessage, CmdResult, EntryListing, MessageLevel};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::InMemoryRemote;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn test_resolve_date() {
        assert!(resolve_date(Some("2025-06-01")).is_ok());
        assert!(resolve_date(Some("junk")).is_err());
        assert_eq!(resolve_date(None).unwrap(), EntryDate::today());
    }

    #[tokio::test]
    async fn test_facade_save_and_list() {
        let api = DaybookApi::new(InMemoryStore::new(), InMemoryRemote::new());
        let date: EntryDate = "2025-06-01".parse().unwrap();
        api.save_entry(&Entry::empty(&date)).unwrap();

        let listing = api.list_entries(None, 1).unwrap();
        assert_eq!(listing.listings.len(), 1);
        assert_eq!(listing.listings[0].date, date);
    }
}
