use prometheus_client::registry::Registry;

use crate::{
    config::Configuration,
    deletion::TagDeleter,
    metrics::DeletionMetrics,
    registry::RegistryApi,
};

pub struct BrowserState<R> {
    pub config: Configuration,
    pub registry: R,
    pub(crate) metrics: DeletionMetrics,
}

impl<R: RegistryApi> BrowserState<R> {
    pub fn new(config: Configuration, registry: R, metrics: &mut Registry) -> Self {
        Self {
            config,
            registry,
            metrics: DeletionMetrics::new(metrics),
        }
    }

    pub(crate) fn deleter(&self) -> TagDeleter<'_, R> {
        TagDeleter::new(
            &self.registry,
            self.config.delete_enabled,
            self.config.auth_retries,
            &self.metrics,
        )
    }

    /// Host and port to show in `docker pull` commands.
    pub fn pull_host(&self) -> &str {
        let url = self
            .config
            .registry
            .public_url
            .as_deref()
            .unwrap_or(&self.config.registry.url);

        url.trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
    }
}
