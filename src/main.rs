mod allow_list;
mod config;
mod error;
mod proxy;
mod relay;
mod upstream;

use std::sync::Arc;

use tokio::{signal, sync::broadcast};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{
    proxy::{Router, start_proxy},
    relay::ImageRelay,
    upstream::HttpUpstream,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let (config, allow_list) = config::load();

    let upstream = HttpUpstream::new(
        allow_list.clone(),
        config.upstream_timeout(),
        config.max_redirects,
    )?;
    let router = Router::new(Arc::new(ImageRelay::new(allow_list, upstream)));

    let (kill, _) = broadcast::channel::<()>(1);

    let kill_signal = kill.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("ctrl+c received, shutting down");
            let _ = kill_signal.send(());
        }
    });

    start_proxy(router, kill.subscribe(), &config.listen_addr()).await
}
