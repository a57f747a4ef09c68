use crate::commands::{CmdMessage, CmdResult};
use crate::error::{DaybookError, Result};
use crate::model::SyncState;
use crate::store::CacheStore;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;

pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Archive,
}

/// The JSON export document. Also the shape `import` accepts. Field names
/// stay camelCase on the wire; existing backups depend on them.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub total_entries: usize,
    /// Keyed by date string so the file stays readable and diffs cleanly.
    pub entries: BTreeMap<String, ExportedEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedEntry {
    pub document: String,
    pub synced: bool,
    pub version_token: Option<String>,
    pub updated_at: DateTime<Utc>,
}

pub fn run<S: CacheStore>(store: &S, format: ExportFormat) -> Result<CmdResult> {
    // 1. Collect every cached record.
    let export = build_export(store)?;

    if export.entries.is_empty() {
        let mut res = CmdResult::default();
        res.add_message(CmdMessage::info("No entries to export."));
        return Ok(res);
    }

    // 2. Write the output file.
    let stamp = export.exported_at.format("%Y-%m-%d_%H%M%S");
    let filename = match format {
        ExportFormat::Json => {
            let filename = format!("daybook-{}.json", stamp);
            let content = serde_json::to_string_pretty(&export)?;
            std::fs::write(&filename, content).map_err(DaybookError::Io)?;
            filename
        }
        ExportFormat::Archive => {
            let filename = format!("daybook-{}.tar.gz", stamp);
            let file = File::create(&filename).map_err(DaybookError::Io)?;
            write_archive(file, &export)?;
            filename
        }
    };

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Exported {} entries to {}",
        export.total_entries, filename
    )));
    Ok(result)
}

pub fn build_export<S: CacheStore>(store: &S) -> Result<ExportDocument> {
    let mut entries = BTreeMap::new();
    for date in store.date_index()? {
        // Index-only dates have nothing cached to export.
        if let Some(record) = store.get_record(&date)? {
            entries.insert(
                date.to_string(),
                ExportedEntry {
                    document: record.document,
                    synced: record.sync_state == SyncState::Synced,
                    version_token: record.remote_version_token,
                    updated_at: record.last_modified_at,
                },
            );
        }
    }

    Ok(ExportDocument {
        version: EXPORT_VERSION,
        exported_at: Utc::now(),
        total_entries: entries.len(),
        entries,
    })
}

/// One `entries/<date>.md` member per entry, mirroring the remote layout.
pub fn write_archive<W: Write>(writer: W, export: &ExportDocument) -> Result<()> {
    let enc = GzEncoder::new(writer, Compression::default());
    let mut tar = tar::Builder::new(enc);

    for (date, entry) in &export.entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(entry.document.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();

        tar.append_data(
            &mut header,
            format!("entries/{}.md", date),
            entry.document.as_bytes(),
        )
        .map_err(DaybookError::Io)?;
    }

    tar.finish().map_err(DaybookError::Io)?;
    Ok(())
}
