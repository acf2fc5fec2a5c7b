use tracing::{info, instrument, warn};
use vaultflow_client::FlowClient;
use vaultflow_config::{FlowConfiguration, new_command_id};

use crate::error::StoreError;
use crate::settings::SettingsStore;

/// Fetch a configuration document, give it a fresh command id and append it.
#[instrument(name = "add_configuration_from_url", skip(store, client))]
pub async fn add_configuration_from_url(
  store: &SettingsStore,
  client: &FlowClient,
  url: &str,
) -> Result<FlowConfiguration, StoreError> {
  let mut configuration = client.fetch_configuration(url).await?;
  configuration.command.id = new_command_id();
  store.add_configuration(configuration.clone()).await?;

  info!(command_id = %configuration.command.id, command = %configuration.command.name, "imported configuration");
  Ok(configuration)
}

/// Store `api_key` and import every configuration published for the account.
///
/// Entries that cannot be fetched or do not validate are skipped. Returns the
/// imported configurations.
#[instrument(name = "connect_account", skip(store, client, api_key))]
pub async fn connect_account(
  store: &SettingsStore,
  client: &FlowClient,
  api_key: &str,
) -> Result<Vec<FlowConfiguration>, StoreError> {
  store.update_api_key(api_key).await?;

  let base_url = store.get().await.base_url;
  let urls = client.list_commands(&base_url, api_key).await;
  info!(count = urls.len(), "importing account configurations");

  let mut imported = Vec::new();
  for url in urls {
    match add_configuration_from_url(store, client, &url).await {
      Ok(configuration) => imported.push(configuration),
      Err(e) => warn!(url = %url, error = %e, "skipping configuration"),
    }
  }

  Ok(imported)
}
