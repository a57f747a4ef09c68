use super::{insert_date_desc, CacheStore, PruneReport, StorageUsage};
use crate::error::{DaybookError, Result};
use crate::model::{CacheRecord, EntryDate, SyncState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const MANIFEST_FILENAME: &str = "data.json";
const SETTINGS_FILENAME: &str = "settings.json";
const PROBE_FILENAME: &str = ".write-probe";

/// Per-record metadata kept in the manifest; the document itself lives in
/// its own file so state queries don't read every entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecordMeta {
    remote_version_token: Option<String>,
    sync_state: SyncState,
    last_modified_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Manifest {
    records: HashMap<EntryDate, RecordMeta>,
    /// The date index, sorted descending.
    dates: Vec<EntryDate>,
}

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, date: &EntryDate) -> PathBuf {
        self.root.join(format!("entry-{}.md", date))
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(DaybookError::Io)?;
        }
        Ok(())
    }

    fn load_manifest(&self) -> Result<Manifest> {
        let path = self.root.join(MANIFEST_FILENAME);
        if !path.exists() {
            return Ok(Manifest::default());
        }
        let content = fs::read_to_string(path).map_err(DaybookError::Io)?;
        let manifest: Manifest =
            serde_json::from_str(&content).map_err(DaybookError::Serialization)?;
        Ok(manifest)
    }

    fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        self.ensure_dir()?;
        let path = self.root.join(MANIFEST_FILENAME);
        let content =
            serde_json::to_string_pretty(manifest).map_err(DaybookError::Serialization)?;
        fs::write(path, content).map_err(DaybookError::Io)?;
        Ok(())
    }
}

impl CacheStore for FileStore {
    fn get_record(&self, date: &EntryDate) -> Result<Option<CacheRecord>> {
        let manifest = self.load_manifest()?;
        let Some(meta) = manifest.records.get(date) else {
            return Ok(None);
        };

        let doc_path = self.document_path(date);
        let document = if doc_path.exists() {
            fs::read_to_string(doc_path).map_err(DaybookError::Io)?
        } else {
            String::new()
        };

        Ok(Some(CacheRecord {
            document,
            remote_version_token: meta.remote_version_token.clone(),
            sync_state: meta.sync_state,
            last_modified_at: meta.last_modified_at,
        }))
    }

    fn put_record(&self, date: &EntryDate, record: &CacheRecord) -> Result<()> {
        self.ensure_dir()?;

        // 1. Update the manifest: record metadata plus the date index.
        let mut manifest = self.load_manifest()?;
        manifest.records.insert(
            *date,
            RecordMeta {
                remote_version_token: record.remote_version_token.clone(),
                sync_state: record.sync_state,
                last_modified_at: record.last_modified_at,
            },
        );
        insert_date_desc(&mut manifest.dates, *date);
        self.save_manifest(&manifest)?;

        // 2. Write the document file.
        fs::write(self.document_path(date), &record.document).map_err(DaybookError::Io)?;
        Ok(())
    }

    fn delete_record(&self, date: &EntryDate) -> Result<()> {
        let mut manifest = self.load_manifest()?;
        manifest.records.remove(date);
        manifest.dates.retain(|d| d != date);
        self.save_manifest(&manifest)?;

        let doc_path = self.document_path(date);
        if doc_path.exists() {
            fs::remove_file(doc_path).map_err(DaybookError::Io)?;
        }
        Ok(())
    }

    fn date_index(&self) -> Result<Vec<EntryDate>> {
        Ok(self.load_manifest()?.dates)
    }

    fn replace_date_index(&self, dates: &[EntryDate]) -> Result<()> {
        let mut manifest = self.load_manifest()?;
        let mut sorted = dates.to_vec();
        sorted.sort_by(|a, b| b.cmp(a));
        sorted.dedup();
        manifest.dates = sorted;
        self.save_manifest(&manifest)
    }

    fn pending_dates(&self) -> Result<Vec<EntryDate>> {
        let manifest = self.load_manifest()?;
        let mut pending: Vec<EntryDate> = manifest
            .records
            .iter()
            .filter(|(_, meta)| meta.sync_state == SyncState::Pending)
            .map(|(date, _)| *date)
            .collect();
        pending.sort_by(|a, b| b.cmp(a));
        Ok(pending)
    }

    fn mark_pending(&self, date: &EntryDate) -> Result<()> {
        let mut manifest = self.load_manifest()?;
        let meta = manifest
            .records
            .get_mut(date)
            .ok_or(DaybookError::EntryNotFound(*date))?;
        meta.sync_state = SyncState::Pending;
        meta.last_modified_at = Utc::now();
        self.save_manifest(&manifest)
    }

    fn mark_synced(&self, date: &EntryDate, token: &str) -> Result<()> {
        let mut manifest = self.load_manifest()?;
        let meta = manifest
            .records
            .get_mut(date)
            .ok_or(DaybookError::EntryNotFound(*date))?;
        meta.sync_state = SyncState::Synced;
        meta.remote_version_token = Some(token.to_string());
        meta.last_modified_at = Utc::now();
        self.save_manifest(&manifest)
    }

    fn settings(&self) -> Result<serde_json::Value> {
        let path = self.root.join(SETTINGS_FILENAME);
        if !path.exists() {
            return Ok(serde_json::Value::Object(Default::default()));
        }
        let content = fs::read_to_string(path).map_err(DaybookError::Io)?;
        serde_json::from_str(&content).map_err(DaybookError::Serialization)
    }

    fn put_settings(&self, settings: &serde_json::Value) -> Result<()> {
        self.ensure_dir()?;
        let content =
            serde_json::to_string_pretty(settings).map_err(DaybookError::Serialization)?;
        fs::write(self.root.join(SETTINGS_FILENAME), content).map_err(DaybookError::Io)?;
        Ok(())
    }

    fn usage(&self) -> Result<StorageUsage> {
        let mut bytes_used = 0u64;
        if self.root.exists() {
            for dir_entry in fs::read_dir(&self.root).map_err(DaybookError::Io)? {
                let dir_entry = dir_entry.map_err(DaybookError::Io)?;
                let meta = dir_entry.metadata().map_err(DaybookError::Io)?;
                if meta.is_file() {
                    bytes_used += meta.len();
                }
            }
        }

        // Writability is probed, not assumed: a full or read-only disk
        // reports unwritable instead of erroring.
        let probe = self.root.join(PROBE_FILENAME);
        let writable = self.ensure_dir().is_ok()
            && fs::write(&probe, b"probe").is_ok()
            && fs::remove_file(&probe).is_ok();

        Ok(StorageUsage {
            bytes_used,
            writable,
        })
    }

    fn prune(&self, keep: usize) -> Result<PruneReport> {
        let mut manifest = self.load_manifest()?;
        let mut report = PruneReport::default();

        // dates is sorted descending, so everything past `keep` is oldest.
        let candidates: Vec<EntryDate> = manifest.dates.iter().skip(keep).copied().collect();
        for date in candidates {
            match manifest.records.get(&date).map(|meta| meta.sync_state) {
                Some(SyncState::Synced) => {
                    manifest.records.remove(&date);
                    let doc_path = self.document_path(&date);
                    if doc_path.exists() {
                        fs::remove_file(doc_path).map_err(DaybookError::Io)?;
                    }
                    report.removed.push(date);
                }
                Some(SyncState::Pending) => report.kept_pending += 1,
                None => {} // index-only date, nothing cached to prune
            }
        }

        self.save_manifest(&manifest)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> EntryDate {
        s.parse().unwrap()
    }

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("cache"));
        (dir, store)
    }

    #[test]
    fn test_put_get_round_trip() {
        let (_dir, store) = store();
        let d = date("2025-04-01");
        let record = CacheRecord::pending("---\ndate: 2025-04-01\n---\n".into(), None);
        store.put_record(&d, &record).unwrap();

        let loaded = store.get_record(&d).unwrap().unwrap();
        assert_eq!(loaded.document, record.document);
        assert_eq!(loaded.sync_state, SyncState::Pending);
        assert_eq!(loaded.remote_version_token, None);
    }

    #[test]
    fn test_put_updates_date_index_sorted_descending() {
        let (_dir, store) = store();
        for s in ["2025-04-01", "2025-04-03", "2025-04-02", "2025-04-03"] {
            store
                .put_record(&date(s), &CacheRecord::pending(String::new(), None))
                .unwrap();
        }
        let index = store.date_index().unwrap();
        assert_eq!(
            index,
            vec![date("2025-04-03"), date("2025-04-02"), date("2025-04-01")]
        );
    }

    #[test]
    fn test_pending_queue_tracks_sync_state() {
        let (_dir, store) = store();
        let d = date("2025-04-01");
        store
            .put_record(&d, &CacheRecord::pending(String::new(), None))
            .unwrap();
        assert_eq!(store.pending_dates().unwrap(), vec![d]);

        store.mark_synced(&d, "tok-1").unwrap();
        assert!(store.pending_dates().unwrap().is_empty());
        let record = store.get_record(&d).unwrap().unwrap();
        assert_eq!(record.remote_version_token.as_deref(), Some("tok-1"));
        assert_eq!(record.sync_state, SyncState::Synced);

        store.mark_pending(&d).unwrap();
        assert_eq!(store.pending_dates().unwrap(), vec![d]);
    }

    #[test]
    fn test_mark_missing_record_errors() {
        let (_dir, store) = store();
        let d = date("2025-04-01");
        assert!(matches!(
            store.mark_synced(&d, "tok"),
            Err(DaybookError::EntryNotFound(_))
        ));
        assert!(store.mark_pending(&d).is_err());
    }

    #[test]
    fn test_delete_removes_record_and_index_entry() {
        let (_dir, store) = store();
        let d = date("2025-04-01");
        store
            .put_record(&d, &CacheRecord::pending("body".into(), None))
            .unwrap();
        store.delete_record(&d).unwrap();

        assert!(store.get_record(&d).unwrap().is_none());
        assert!(store.date_index().unwrap().is_empty());
        // Deleting again is a no-op, not an error.
        store.delete_record(&d).unwrap();
    }

    #[test]
    fn test_replace_date_index_keeps_records() {
        let (_dir, store) = store();
        let d = date("2025-04-01");
        store
            .put_record(&d, &CacheRecord::pending("body".into(), None))
            .unwrap();

        let remote_only = date("2025-05-01");
        store.replace_date_index(&[remote_only, d]).unwrap();
        assert_eq!(store.date_index().unwrap(), vec![remote_only, d]);
        // The record behind the replaced index is still readable.
        assert!(store.get_record(&d).unwrap().is_some());
        assert!(store.get_record(&remote_only).unwrap().is_none());
    }

    #[test]
    fn test_settings_round_trip() {
        let (_dir, store) = store();
        assert_eq!(
            store.settings().unwrap(),
            serde_json::Value::Object(Default::default())
        );
        let value = serde_json::json!({"theme": "dark", "streak_goal": 30});
        store.put_settings(&value).unwrap();
        assert_eq!(store.settings().unwrap(), value);
    }

    #[test]
    fn test_usage_probe() {
        let (_dir, store) = store();
        store
            .put_record(
                &date("2025-04-01"),
                &CacheRecord::pending("0123456789".into(), None),
            )
            .unwrap();
        let usage = store.usage().unwrap();
        assert!(usage.writable);
        assert!(usage.bytes_used >= 10);
    }

    #[test]
    fn test_prune_keeps_pending_and_recent() {
        let (_dir, store) = store();
        let old_synced = date("2025-01-01");
        let old_pending = date("2025-01-02");
        let recent_a = date("2025-03-01");
        let recent_b = date("2025-03-02");

        store
            .put_record(&old_synced, &CacheRecord::synced("a".into(), "t1".into()))
            .unwrap();
        store
            .put_record(&old_pending, &CacheRecord::pending("b".into(), None))
            .unwrap();
        store
            .put_record(&recent_a, &CacheRecord::synced("c".into(), "t2".into()))
            .unwrap();
        store
            .put_record(&recent_b, &CacheRecord::pending("d".into(), None))
            .unwrap();

        let report = store.prune(2).unwrap();
        assert_eq!(report.removed, vec![old_synced]);
        assert_eq!(report.kept_pending, 1);

        // Pending record beyond the horizon survives; its date stays listed.
        assert!(store.get_record(&old_pending).unwrap().is_some());
        assert!(store.get_record(&old_synced).unwrap().is_none());
        assert!(store.date_index().unwrap().contains(&old_synced));
    }
}
