use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::error;
use crate::state::ArcShared;

pub mod sync;

/// runs `runner` immediately and then once every `interval` until the
/// token is cancelled. failures are logged and the next run proceeds
async fn job_task<F, T>(
    state: ArcShared,
    interval: Duration,
    token: CancellationToken,
    runner: F
)
where
    T: Future<Output = error::Result<()>>,
    F: Fn(ArcShared) -> T,
{
    loop {
        tracing::info!("running job");

        tokio::select! {
            biased;

            _ = token.cancelled() => break,
            result = runner(Arc::clone(&state)) => {
                if let Err(err) = result {
                    tracing::error!("job failed with error: {err}");
                } else {
                    tracing::debug!("job finished {}", chrono::Local::now());
                }
            }
        }

        if token.is_cancelled() {
            break;
        }

        tracing::debug!("waiting for {interval:?}");

        tokio::select! {
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!("job stopped");
}

fn spawn_job<F, T>(
    state: &ArcShared,
    name: &'static str,
    interval: Duration,
    token: CancellationToken,
    runner: F
) -> JoinHandle<()>
where
    T: Future<Output = error::Result<()>> + Send + 'static,
    F: Fn(ArcShared) -> T + Send + 'static,
{
    let local_state = Arc::clone(state);

    tokio::spawn(async move {
        let job_span = tracing::span!(
            tracing::Level::INFO,
            "job",
            name = name
        );

        job_task(local_state, interval, token, runner)
            .instrument(job_span)
            .await
    })
}

pub fn background(state: &ArcShared, token: CancellationToken) -> JoinHandle<()> {
    let interval = state.sync().poll;

    spawn_job(state, "drive_sync", interval, token, sync::run)
}
