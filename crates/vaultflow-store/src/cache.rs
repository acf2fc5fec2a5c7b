use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vaultflow_client::FlowClient;
use vaultflow_config::FlowDefinition;

use crate::error::StoreError;
use crate::settings::SettingsStore;

/// Flow definitions keyed by url, backed by `Settings::flow_definitions`.
#[derive(Clone)]
pub struct FlowDefinitionCache {
  store: Arc<SettingsStore>,
  client: FlowClient,
}

impl FlowDefinitionCache {
  pub fn new(store: Arc<SettingsStore>, client: FlowClient) -> Self {
    Self { store, client }
  }

  /// The cached definition for `url`, without touching the network.
  pub async fn cached(&self, url: &str) -> Option<FlowDefinition> {
    self.store.get().await.flow_definition(url).cloned()
  }

  /// Cached definition, or fetch, validate, cache and persist it.
  #[instrument(name = "resolve_flow_definition", skip(self))]
  pub async fn resolve(&self, url: &str) -> Result<FlowDefinition, StoreError> {
    if let Some(definition) = self.cached(url).await {
      debug!("flow definition cache hit");
      return Ok(definition);
    }

    info!("flow definition cache miss, fetching");
    let definition = self.client.fetch_flow_definition(url).await?;
    self.store.replace_flow_definition(definition.clone()).await?;
    Ok(definition)
  }

  /// Fetch a fresh definition, falling back to [`FlowDefinitionCache::resolve`]
  /// when the fetch fails or the document is invalid.
  ///
  /// A fresh definition is returned but not written to the cache; callers
  /// decide whether to store it with `SettingsStore::replace_flow_definition`.
  #[instrument(name = "refresh_flow_definition", skip(self))]
  pub async fn refresh(&self, url: &str) -> Result<FlowDefinition, StoreError> {
    match self.client.fetch_flow_definition(url).await {
      Ok(definition) => Ok(definition),
      Err(e) => {
        warn!(error = %e, "could not refresh flow definition, using cached version");
        self.resolve(url).await
      }
    }
  }
}
