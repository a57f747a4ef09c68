use super::{insert_date_desc, CacheStore, PruneReport, StorageUsage};
use crate::error::{DaybookError, Result};
use crate::model::{CacheRecord, EntryDate, SyncState};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory cache store for tests. No persistence, no filesystem.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: HashMap<EntryDate, CacheRecord>,
    dates: Vec<EntryDate>,
    settings: Option<serde_json::Value>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for InMemoryStore {
    fn get_record(&self, date: &EntryDate) -> Result<Option<CacheRecord>> {
        Ok(self.inner.lock().unwrap().records.get(date).cloned())
    }

    fn put_record(&self, date: &EntryDate, record: &CacheRecord) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.records.insert(*date, record.clone());
        insert_date_desc(&mut inner.dates, *date);
        Ok(())
    }

    fn delete_record(&self, date: &EntryDate) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.records.remove(date);
        inner.dates.retain(|d| d != date);
        Ok(())
    }

    fn date_index(&self) -> Result<Vec<EntryDate>> {
        Ok(self.inner.lock().unwrap().dates.clone())
    }

    fn replace_date_index(&self, dates: &[EntryDate]) -> Result<()> {
        let mut sorted = dates.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));
        sorted.dedup();
        self.inner.lock().unwrap().dates = sorted;
        Ok(())
    }

    fn pending_dates(&self) -> Result<Vec<EntryDate>> {
        let inner = self.inner.lock().unwrap();
        let mut pending: Vec<EntryDate> = inner
            .records
            .iter()
            .filter(|(_, record)| record.sync_state == SyncState::Pending)
            .map(|(date, _)| *date)
            .collect();
        pending.sort_by(|a, b| b.cmp(a));
        Ok(pending)
    }

    fn mark_pending(&self, date: &EntryDate) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .get_mut(date)
            .ok_or(DaybookError::EntryNotFound(*date))?;
        record.sync_state = SyncState::Pending;
        record.last_modified_at = Utc::now();
        Ok(())
    }

    fn mark_synced(&self, date: &EntryDate, token: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let record = inner
            .records
            .get_mut(date)
            .ok_or(DaybookError::EntryNotFound(*date))?;
        record.sync_state = SyncState::Synced;
        record.remote_version_token = Some(token.to_string());
        record.last_modified_at = Utc::now();
        Ok(())
    }

    fn settings(&self) -> Result<serde_json::Value> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .settings
            .clone()
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())))
    }

    fn put_settings(&self, settings: &serde_json::Value) -> Result<()> {
        self.inner.lock().unwrap().settings = Some(settings.clone());
        Ok(())
    }

    fn usage(&self) -> Result<StorageUsage> {
        let inner = self.inner.lock().unwrap();
        let bytes_used = inner
            .records
            .values()
            .map(|r| r.document.len() as u64)
            .sum();
        Ok(StorageUsage {
            bytes_used,
            writable: true,
        })
    }

    fn prune(&self, keep: usize) -> Result<PruneReport> {
        let mut inner = self.inner.lock().unwrap();
        let mut report = PruneReport::default();

        let candidates: Vec<EntryDate> = inner.dates.iter().skip(keep).copied().collect();
        for date in candidates {
            match inner.records.get(&date).map(|record| record.sync_state) {
                Some(SyncState::Synced) => {
                    inner.records.remove(&date);
                    report.removed.push(date);
                }
                Some(SyncState::Pending) => report.kept_pending += 1,
                None => {}
            }
        }
        Ok(report)
    }
}
