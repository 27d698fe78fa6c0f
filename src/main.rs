use std::sync::Arc;
use std::time::Duration;

use axum_server::Handle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{FmtSubscriber, EnvFilter};
use futures::StreamExt;
use futures::stream::FuturesUnordered;

mod error;
mod net;
mod path;
mod config;
mod drive;
mod extract;
mod index;
mod notify;
mod state;
mod jobs;
mod routing;

#[cfg(test)]
mod test_support;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

fn main() {
    use tokio::runtime::Builder;

    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let verbose = std::env::var("VERBOSE")
            .map(|v| config::parse_flag(&v))
            .unwrap_or(false);

        EnvFilter::new(if verbose { "debug" } else { "info" })
    });

    if let Err(err) = FmtSubscriber::builder()
        .with_env_filter(filter)
        .try_init() {
        eprintln!("failed to initialize global tracing subscriber: {err}");
        return;
    }

    let rt = match Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .max_blocking_threads(4)
        .build() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!("failed to start tokio runtime. {err}");
            return;
        }
    };

    tracing::event!(
        tracing::Level::INFO,
        "started tokio runtime"
    );

    if let Err(err) = rt.block_on(init()) {
        tracing::error!("{err}");
    }
}

async fn init() -> error::Result<()> {
    let config = config::get_config()?;
    let state = Arc::new(state::Shared::from_config(&config).await?);
    let token = CancellationToken::new();
    let handle = Handle::new();
    let mut all_futs = FuturesUnordered::new();

    all_futs.push(jobs::background(&state, token.clone()));
    all_futs.push(tokio::spawn(shutdown_signal(token.clone(), handle.clone())));

    let router = routing::routes(&state);

    for (key, listener) in config.settings.listeners {
        let instance_router = router.clone();
        let instance_handle = handle.clone();

        all_futs.push(tokio::spawn(async move {
            let tcp_listener = match std::net::TcpListener::bind(listener.addr) {
                Ok(l) => l,
                Err(err) => {
                    tracing::error!("\"{key}\" failed to bind to socket address: {err}");

                    return;
                }
            };

            if let Err(err) = tcp_listener.set_nonblocking(true) {
                tracing::error!("\"{key}\" failed to set listener non-blocking: {err}");

                return;
            }

            match tcp_listener.local_addr() {
                Ok(addr) => {
                    tracing::info!("\"{key}\" tcp socket listener: {addr}");
                }
                Err(err) => {
                    tracing::error!("\"{key}\" failed to retrieve tcp listener address: {err}");
                }
            }

            let fut = axum_server::from_tcp(tcp_listener)
                .handle(instance_handle)
                .serve(instance_router.into_make_service());

            if let Err(err) = fut.await {
                tracing::error!("\"{key}\" server error: {err}");
            }
        }));
    }

    while let Some(result) = all_futs.next().await {
        if let Err(err) = result {
            tracing::error!("task failed: {err}");
        }
    }

    tracing::info!("shutdown complete");

    Ok(())
}

async fn shutdown_signal(token: CancellationToken, handle: Handle) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {err}");

            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");

                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown requested");

    token.cancel();
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
}
