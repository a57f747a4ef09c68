use crate::commands::{CmdMessage, CmdResult, EntryListing};
use crate::error::Result;
use crate::index::EntryIndex;
use crate::model::SyncState;
use crate::store::CacheStore;
use crate::sync::EntrySyncState;

pub fn run<S: CacheStore>(store: &S, query: Option<&str>, page: usize) -> Result<CmdResult> {
    // 1. Build the listing view over the persisted date index.
    let mut index = EntryIndex::from_dates(store.date_index()?);
    if let Some(query) = query {
        index.set_search_query(query);
    }
    index.go_to_page(page);
    let page = index.page(store)?;

    // 2. Annotate each date with what the cache knows about it.
    let mut listings = Vec::with_capacity(page.dates.len());
    for date in &page.dates {
        let (state, modified) = match store.get_record(date)? {
            Some(record) => {
                let state = match record.sync_state {
                    SyncState::Pending => EntrySyncState::Pending,
                    SyncState::Synced => EntrySyncState::Synced,
                };
                (state, Some(record.last_modified_at))
            }
            None => (EntrySyncState::Unsynced, None),
        };
        listings.push(EntryListing {
            date: *date,
            state,
            modified,
        });
    }

    let mut result = CmdResult::default().with_listings(listings).with_page(page);
    if result.listings.is_empty() {
        result.add_message(CmdMessage::info("No entries found."));
    }
    Ok(result)
}
