use anyhow::Result;
use uuid::Uuid;

use crate::{
    diff::{compare, Change},
    fetcher::CatalogSource,
    notifier::Notifier,
    store::SnapshotStore,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report changes without notifying or persisting.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    FetchFailed,
    StoreUnreadable,
    Unchanged,
    Changed { changes: Vec<Change>, persisted: bool },
}

/// One pass of fetch, compare, notify, persist.
///
/// Stored state is only rewritten when something changed. The only error
/// returned is a failed snapshot write.
pub fn run(
    source: &impl CatalogSource,
    store: &impl SnapshotStore,
    notifier: &impl Notifier,
    opts: RunOptions,
) -> Result<RunOutcome> {
    let run_id = Uuid::new_v4();
    log::info!("run.start run_id={} dry_run={}", run_id, opts.dry_run);

    let current = source.fetch();
    if current.is_empty() {
        log::warn!("run.abort run_id={} reason=no_data", run_id);
        return Ok(RunOutcome::FetchFailed);
    }

    let previous = match store.load() {
        Ok(previous) => previous,
        Err(e) => {
            log::error!("run.abort run_id={} reason=store_unreadable err={:#}", run_id, e);
            return Ok(RunOutcome::StoreUnreadable);
        }
    };

    let changes = compare(&previous, &current);
    if changes.is_empty() {
        log::info!("run.done run_id={} changes=0", run_id);
        return Ok(RunOutcome::Unchanged);
    }

    log::info!("run.changes run_id={} count={}", run_id, changes.len());
    for change in &changes {
        log::info!("change {}", change);
    }

    if opts.dry_run {
        log::info!("run.done run_id={} dry_run=true persisted=false", run_id);
        return Ok(RunOutcome::Changed { changes, persisted: false });
    }

    notifier.notify(&changes);
    store.save(&current)?;

    log::info!("run.done run_id={} changes={} persisted=true", run_id, changes.len());
    Ok(RunOutcome::Changed { changes, persisted: true })
}
