use dmirror_api::FileRecord;

use crate::error;
use crate::index::{self, Snapshot};
use crate::state::ArcShared;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    pub total: usize,
    pub changed: usize,
    pub removed: usize,
    pub notified: usize,
    pub failed: usize,
}

pub async fn cycle(state: &ArcShared) -> error::Result<Report> {
    let (prev, next) = state.index()
        .rebuild(|| index::build(state.store(), state.root_folder()))
        .await
        .map_err(|err| error::Error::new(error::Kind::Sync)
            .message("index rebuild failed")
            .source(err))?;

    let prev_index = prev.as_deref().map(Snapshot::index);
    let changed = select(index::changed(prev_index, next.index()), state.sync().notify_limit);

    let mut report = Report {
        total: next.index().len(),
        changed: changed.len(),
        removed: index::removed(prev_index, next.index()),
        notified: 0,
        failed: 0,
    };

    if report.removed > 0 {
        tracing::debug!("{} entries removed since last cycle", report.removed);
    }

    for record in changed {
        match state.notifier().notify(record).await {
            Ok(()) => report.notified += 1,
            Err(err) => {
                tracing::warn!("failed to notify update of {}: {err}", record.path);

                report.failed += 1;
            }
        }
    }

    Ok(report)
}

fn select(mut changed: Vec<&FileRecord>, limit: Option<usize>) -> Vec<&FileRecord> {
    if let Some(limit) = limit {
        if changed.len() > limit {
            changed.sort_by(|a, b| b.modified_time.cmp(&a.modified_time));
            changed.truncate(limit);
        }
    }

    changed
}

pub async fn run(state: ArcShared) -> error::Result<()> {
    let report = cycle(&state).await?;

    tracing::info!(
        "synced {} entries. {} changed, {} removed, {} notified, {} failed",
        report.total,
        report.changed,
        report.removed,
        report.notified,
        report.failed,
    );

    Ok(())
}
