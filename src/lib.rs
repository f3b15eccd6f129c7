use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{ServiceExt, extract::Request};
use prometheus_client::registry::Registry;
use tokio::task::JoinSet;
use tower::Layer;
use tracing::info;

use crate::{
    config::Configuration, metrics::start_metrics, middleware::RewriteUriLayer,
    registry::RegistryClient, state::BrowserState,
};

pub mod config;
mod deletion;
mod error;
mod flash;
mod metrics;
mod middleware;
mod registry;
mod state;
mod views;


/// Starts the browser and its metrics listener. The returned tasks run until
/// they are shut down or one of the listeners fails.
pub async fn start(config: Configuration) -> Result<JoinSet<Result<()>>> {
    let mut tasks = JoinSet::new();
    let mut metrics = Registry::with_prefix("registry_browser");

    let client =
        RegistryClient::new(&config.registry).context("Failed to build registry client")?;
    let state = Arc::new(BrowserState::new(config.clone(), client, &mut metrics));

    start_metrics(&mut tasks, &config.prometheus, metrics)?;

    let app = RewriteUriLayer.layer(views::router(state));
    let listen_addr = format!("{}:{}", config.listen.address, config.listen.port);
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to listen on {listen_addr}"))?;

    info!(%listen_addr, registry = %config.registry.url, "Serving registry browser");

    tasks.spawn(async move {
        axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;
        Ok(())
    });

    Ok(tasks)
}
