use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::CacheStore;

pub fn run<S: CacheStore>(store: &S, keep: usize) -> Result<CmdResult> {
    let report = store.prune(keep)?;

    let mut result = CmdResult::default();
    if report.removed.is_empty() {
        result.add_message(CmdMessage::info("Nothing to prune."));
    } else {
        result.add_message(CmdMessage::success(format!(
            "Pruned {} cached entries (keeping the {} most recent)",
            report.removed.len(),
            keep
        )));
    }
    if report.kept_pending > 0 {
        result.add_message(CmdMessage::warning(format!(
            "{} older entries kept: they have unsynced changes",
            report.kept_pending
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CacheRecord, EntryDate};
    use crate::store::memory::InMemoryStore;

    #[test]
    fn test_prune_reports_kept_pending() {
        let store = InMemoryStore::new();
        let old: EntryDate = "2025-01-01".parse().unwrap();
        let new: EntryDate = "2025-06-01".parse().unwrap();
        store
            .put_record(&old, &CacheRecord::pending("unsynced".into(), None))
            .unwrap();
        store
            .put_record(&new, &CacheRecord::synced("synced".into(), "v1".into()))
            .unwrap();

        let result = run(&store, 1).unwrap();
        assert!(result
            .messages
            .iter()
            .any(|m| m.content.contains("unsynced changes")));
        assert!(store.get_record(&old).unwrap().is_some());
    }
}
