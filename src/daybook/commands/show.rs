use crate::codec;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::model::EntryDate;
use crate::remote::RemoteStore;
use crate::store::CacheStore;
use crate::sync::{EntrySyncState, SyncCoordinator};

pub async fn run<S: CacheStore, R: RemoteStore>(
    coordinator: &SyncCoordinator<S, R>,
    date: &EntryDate,
) -> Result<CmdResult> {
    let entry = coordinator.load(date).await?;
    let document = codec::encode(&entry);

    let mut result = CmdResult::default()
        .with_document(document)
        .with_entry(entry);
    match coordinator.sync_state(date)? {
        EntrySyncState::Pending => {
            result.add_message(CmdMessage::warning(format!("{} has unsynced changes", date)))
        }
        EntrySyncState::Unsynced => {
            result.add_message(CmdMessage::info(format!("{} has no entry yet", date)))
        }
        EntrySyncState::Synced => {}
    }
    Ok(result)
}
