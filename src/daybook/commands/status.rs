use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::CacheStore;

pub fn run<S: CacheStore>(store: &S) -> Result<CmdResult> {
    let dates = store.date_index()?;
    let mut cached = 0usize;
    for date in &dates {
        if store.get_record(date)?.is_some() {
            cached += 1;
        }
    }
    let pending = store.pending_dates()?;
    let usage = store.usage()?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::info(format!(
        "{} entries known, {} cached locally ({} KiB)",
        dates.len(),
        cached,
        usage.bytes_used / 1024
    )));

    if pending.is_empty() {
        result.add_message(CmdMessage::success("Everything is synced."));
    } else {
        result.add_message(CmdMessage::warning(format!(
            "{} awaiting sync: {}",
            pending.len(),
            pending
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    if !usage.writable {
        result.add_message(CmdMessage::error(
            "Local cache is not writable; new edits will be lost on exit.",
        ));
    }
    Ok(result)
}
