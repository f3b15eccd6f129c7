use std::sync::Arc;

use anyhow::Result;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use prometheus_client::{
    encoding::{EncodeLabelSet, EncodeLabelValue, text::encode},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};
use tokio::task::JoinSet;
use tracing::info;

use crate::config::PrometheusConfig;

#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EncodeLabelValue)]
pub(crate) enum Outcome {
    Deleted,
    Failed,
    Blocked,
    NotFound,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct DeletionLabels {
    outcome: Outcome,
}

/// Counts how every attempted tag deletion ended.
#[derive(Clone, Debug, Default)]
pub(crate) struct DeletionMetrics {
    deletions: Family<DeletionLabels, Counter>,
}

impl DeletionMetrics {
    pub fn new(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        registry.register(
            "tag_deletions",
            "Number of tag deletions attempted, by outcome",
            metrics.deletions.clone(),
        );
        metrics
    }

    pub fn record(&self, outcome: Outcome) {
        self.deletions
            .get_or_create(&DeletionLabels { outcome })
            .inc();
    }

    #[cfg(test)]
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.deletions
            .get_or_create(&DeletionLabels { outcome })
            .get()
    }
}

/// Axum handler that returns Prometheus metrics
async fn metrics_handler(State(registry): State<Arc<Registry>>) -> Response {
    let mut buffer = String::new();

    if let Err(err) = encode(&mut buffer, &registry) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", err),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        buffer,
    )
        .into_response()
}

fn metrics_router(registry: Registry) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(Arc::new(registry))
}

pub(crate) fn start_metrics(
    tasks: &mut JoinSet<Result<()>>,
    config: &PrometheusConfig,
    registry: Registry,
) -> Result<()> {
    let app = metrics_router(registry);
    let listen_addr = format!("{}:{}", config.address, config.port);

    tasks.spawn(async move {
        let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
        info!(%listen_addr, "Serving metrics");
        axum::serve(listener, app).await?;
        Ok(())
    });

    Ok(())
}
