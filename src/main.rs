use std::net::SocketAddr;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod error;
mod jobs;
mod net;
mod routing;
mod sec;
mod sql;
mod state;
mod user;

fn main() {
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init()
        .expect("failed to set global tracing subscriber");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_io()
        .enable_time()
        .max_blocking_threads(4)
        .build()
        .expect("failed to start tokio runtime");

    tracing::info!("started tokio runtime");

    if let Err(err) = rt.block_on(serve()) {
        tracing::error!("server exited with error: {err}");
    }
}

fn spawn_listener(
    key: String,
    listener: config::Listener,
    router: axum::Router,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let tcp = match std::net::TcpListener::bind(listener.addr) {
            Ok(l) => l,
            Err(err) => {
                tracing::error!("listener \"{key}\" failed to bind: {err}");

                return;
            }
        };

        match tcp.local_addr() {
            Ok(addr) => tracing::info!("listener \"{key}\" bound to {addr}"),
            Err(err) => tracing::error!("listener \"{key}\" failed to read local address: {err}"),
        }

        // the limiter and the captcha check key off the peer address so the
        // connect info has to ride along with the service
        let served = axum_server::from_tcp(tcp)
            .serve(router.into_make_service_with_connect_info::<SocketAddr>());

        if let Err(err) = served.await {
            tracing::error!("listener \"{key}\" server error: {err}");
        }
    })
}

async fn serve() -> error::Result<()> {
    let config = config::get_config()?;
    let state = Arc::new(state::Shared::from_config(&config)?);
    let router = routing::routes(&state, &config)?;

    let mut tasks = FuturesUnordered::new();

    tasks.extend(jobs::background(&state, config.settings.data.clone())?);

    for (key, listener) in config.settings.listeners {
        tasks.push(spawn_listener(key, listener, router.clone()));
    }

    while tasks.next().await.is_some() {}

    Ok(())
}
