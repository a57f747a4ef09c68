use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::EntryDate;
use crate::remote::RemoteStore;
use crate::store::CacheStore;
use crate::sync::SyncCoordinator;

pub async fn run<S: CacheStore, R: RemoteStore>(
    coordinator: &SyncCoordinator<S, R>,
    date: &EntryDate,
) -> Result<CmdResult> {
    coordinator.delete(date).await?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("Deleted {}", date)));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entry;
    use crate::remote::memory::InMemoryRemote;
    use crate::store::memory::InMemoryStore;

    #[tokio::test]
    async fn test_delete_clears_cache_and_index() {
        let coord = SyncCoordinator::new(InMemoryStore::new(), InMemoryRemote::new());
        let date: EntryDate = "2025-07-01".parse().unwrap();
        coord.save_local(&Entry::empty(&date)).unwrap();

        run(&coord, &date).await.unwrap();
        assert!(coord.store().get_record(&date).unwrap().is_none());
        assert!(coord.store().date_index().unwrap().is_empty());
    }
}
