use crate::commands::export::ExportDocument;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DaybookError, Result};
use crate::model::{CacheRecord, EntryDate, SyncState};
use crate::store::CacheStore;
use std::fs;
use std::path::Path;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    /// Keys that are not valid calendar dates.
    pub skipped: usize,
    /// Entries already synced locally, which import never overwrites.
    pub preserved: usize,
}

pub fn run<S: CacheStore>(store: &S, path: &Path) -> Result<CmdResult> {
    let content = fs::read_to_string(path).map_err(DaybookError::Io)?;
    let export: ExportDocument =
        serde_json::from_str(&content).map_err(DaybookError::Serialization)?;

    let report = import_document(store, export)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Imported {} entries ({} skipped, {} already synced)",
        report.imported, report.skipped, report.preserved
    )));
    Ok(result)
}

pub fn import_document<S: CacheStore>(store: &S, export: ExportDocument) -> Result<ImportReport> {
    let mut report = ImportReport::default();

    for (key, exported) in export.entries {
        let Ok(date) = key.parse::<EntryDate>() else {
            report.skipped += 1;
            continue;
        };

        if let Some(existing) = store.get_record(&date)? {
            if existing.sync_state == SyncState::Synced {
                report.preserved += 1;
                continue;
            }
        }

        // A synced flag without a token can't condition future writes, so
        // such entries re-enter the queue as pending.
        let sync_state = if exported.synced && exported.version_token.is_some() {
            SyncState::Synced
        } else {
            SyncState::Pending
        };
        store.put_record(
            &date,
            &CacheRecord {
                document: exported.document,
                remote_version_token: exported.version_token,
                sync_state,
                last_modified_at: exported.updated_at,
            },
        )?;
        report.imported += 1;
    }

    Ok(report)
}
