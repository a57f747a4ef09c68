use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::Entry;
use crate::remote::RemoteStore;
use crate::store::CacheStore;
use crate::sync::SyncCoordinator;

pub fn run<S: CacheStore, R: RemoteStore>(
    coordinator: &SyncCoordinator<S, R>,
    entry: &Entry,
) -> Result<CmdResult> {
    let date = coordinator.save_local(entry)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Saved {} (pending sync)",
        date
    )));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntryDate, MetaValue};
    use crate::remote::memory::InMemoryRemote;
    use crate::store::memory::InMemoryStore;

    fn coordinator() -> SyncCoordinator<InMemoryStore, InMemoryRemote> {
        SyncCoordinator::new(InMemoryStore::new(), InMemoryRemote::new())
    }

    #[test]
    fn test_save_queues_entry() {
        let coord = coordinator();
        let date: EntryDate = "2025-07-01".parse().unwrap();
        let entry = Entry::empty(&date);

        let result = run(&coord, &entry).unwrap();
        assert!(result.messages[0].content.contains("2025-07-01"));
        assert_eq!(coord.store().pending_dates().unwrap(), vec![date]);
    }

    #[test]
    fn test_save_rejects_bad_scores() {
        let coord = coordinator();
        let date: EntryDate = "2025-07-01".parse().unwrap();
        let mut entry = Entry::empty(&date);
        entry.scores.focus = MetaValue::Int(99);

        assert!(run(&coord, &entry).is_err());
    }
}
