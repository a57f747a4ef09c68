use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::remote::RemoteStore;
use crate::store::CacheStore;
use crate::sync::{DrainOutcome, RemoteRefresh, SyncCoordinator};

pub async fn run<S: CacheStore, R: RemoteStore>(
    coordinator: &SyncCoordinator<S, R>,
    refresh_index: bool,
) -> Result<CmdResult> {
    let mut result = CmdResult::default();

    // 1. Best-effort index refresh; being offline is not a failure.
    if refresh_index {
        match coordinator.load_remote_index().await {
            RemoteRefresh::Applied { dates } => {
                result.add_message(CmdMessage::info(format!("Remote index: {} entries", dates)))
            }
            RemoteRefresh::Ignored(err) => result.add_message(CmdMessage::warning(format!(
                "Remote index unavailable ({}), continuing with local index",
                err
            ))),
        }
    }

    // 2. Drain the pending queue.
    match coordinator.sync_all_pending().await? {
        DrainOutcome::AlreadyRunning => {
            result.add_message(CmdMessage::info("A sync is already running."));
        }
        DrainOutcome::Completed(report) => {
            if report.synced.is_empty() && report.failed.is_empty() {
                result.add_message(CmdMessage::info("Nothing pending."));
            } else if !report.synced.is_empty() {
                result.add_message(CmdMessage::success(format!(
                    "Synced {} {}",
                    report.synced.len(),
                    if report.synced.len() == 1 { "entry" } else { "entries" }
                )));
            }
            for (date, err) in &report.failed {
                if err.is_conflict() {
                    result.add_message(CmdMessage::error(format!(
                        "Conflict on {}: the remote copy changed. Fetch it, merge by hand, and save again.",
                        date
                    )));
                } else {
                    result.add_message(CmdMessage::warning(format!(
                        "{} still pending: {}",
                        date, err
                    )));
                }
            }
        }
    }

    Ok(result)
}
