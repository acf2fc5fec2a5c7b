//! The engine facade a host embeds.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use vaultflow_client::FlowClient;
use vaultflow_config::{FlowConfiguration, FlowDefinition};
use vaultflow_store::{SettingsStore, add_configuration_from_url, connect_account};
use vaultflow_workspace::{Workspace, WorkspaceError, WorkspaceFile};

use crate::error::EngineError;
use crate::events::ExecutionNotifier;
use crate::executor::{ExecutionReport, Executor};
use crate::registry::CommandRegistry;
use crate::trigger::{TriggerDecision, TriggerEngine};
use crate::ui::UserInterface;

const FILE_OPEN_CAPACITY: usize = 64;

/// Wires settings, commands, execution and triggers together.
///
/// ```ignore
/// let engine = Engine::new(store, FlowClient::default(), workspace, ui);
/// engine.apply_settings().await;
///
/// // host side: forward file-open events
/// engine.file_opened(file);
///
/// engine.execute_command("cmd-1").await?;
/// engine.teardown().await;
/// ```
pub struct Engine {
  store: Arc<SettingsStore>,
  client: FlowClient,
  workspace: Arc<dyn Workspace>,
  executor: Arc<Executor>,
  registry: CommandRegistry,
  triggers: Arc<TriggerEngine>,
  file_open: broadcast::Sender<WorkspaceFile>,
}

impl Engine {
  pub fn new(
    store: Arc<SettingsStore>,
    client: FlowClient,
    workspace: Arc<dyn Workspace>,
    ui: Arc<dyn UserInterface>,
  ) -> Self {
    let executor = Executor::new(store.clone(), client.clone(), workspace.clone(), ui);
    Self::from_executor(store, client, workspace, executor)
  }

  /// Like [`Engine::new`], reporting execution events to `notifier`.
  pub fn with_notifier(
    store: Arc<SettingsStore>,
    client: FlowClient,
    workspace: Arc<dyn Workspace>,
    ui: Arc<dyn UserInterface>,
    notifier: Arc<dyn ExecutionNotifier>,
  ) -> Self {
    let executor = Executor::new(store.clone(), client.clone(), workspace.clone(), ui).with_notifier(notifier);
    Self::from_executor(store, client, workspace, executor)
  }

  fn from_executor(
    store: Arc<SettingsStore>,
    client: FlowClient,
    workspace: Arc<dyn Workspace>,
    executor: Executor,
  ) -> Self {
    let executor = Arc::new(executor);
    let triggers = Arc::new(TriggerEngine::new(store.clone(), executor.clone(), workspace.clone()));
    let (file_open, _) = broadcast::channel(FILE_OPEN_CAPACITY);
    Self {
      store,
      client,
      workspace,
      executor,
      registry: CommandRegistry::new(),
      triggers,
      file_open,
    }
  }

  pub fn store(&self) -> &Arc<SettingsStore> {
    &self.store
  }

  pub fn registry(&self) -> &CommandRegistry {
    &self.registry
  }

  pub fn triggers(&self) -> &Arc<TriggerEngine> {
    &self.triggers
  }

  /// Re-register every configured command and the trigger listener.
  pub async fn apply_settings(&self) {
    let settings = self.store.get().await;
    self
      .registry
      .replace_all(settings.flow_configurations.iter().map(|c| c.command.clone()))
      .await;
    self.triggers.register(&self.file_open).await;
  }

  /// Publish a file-open event to the trigger listener.
  pub fn file_opened(&self, file: WorkspaceFile) {
    // No receiver means no fileOpen triggers are registered.
    let _ = self.file_open.send(file);
  }

  /// Evaluate triggers for `path` and wait for the executions they spawn.
  pub async fn open_file(&self, path: &str) -> Result<Vec<(String, TriggerDecision)>, EngineError> {
    let file = self
      .workspace
      .file(path)
      .await?
      .ok_or_else(|| WorkspaceError::NotFound {
        path: path.to_string(),
      })?;
    let decisions = self.triggers.handle_file_open(&file).await;
    self.triggers.drain().await;
    Ok(decisions)
  }

  /// Run the configuration registered under `command_id`.
  ///
  /// Unknown ids are ignored with a warning.
  #[instrument(name = "execute_command", skip(self))]
  pub async fn execute_command(&self, command_id: &str) -> Result<Option<ExecutionReport>, EngineError> {
    let settings = self.store.get().await;
    let Some(configuration) = settings.configuration(command_id) else {
      warn!("no configuration for command");
      return Ok(None);
    };
    self.executor.execute(configuration).await.map(Some)
  }

  pub async fn update_api_key(&self, api_key: &str) -> Result<(), EngineError> {
    self.store.update_api_key(api_key).await?;
    Ok(())
  }

  /// Replace an existing configuration (matched by command id).
  pub async fn update_configuration(&self, configuration: FlowConfiguration) -> Result<bool, EngineError> {
    let updated = self.store.upsert_configuration(configuration).await?;
    self.apply_settings().await;
    Ok(updated)
  }

  pub async fn add_configuration(&self, configuration: FlowConfiguration) -> Result<(), EngineError> {
    self.store.add_configuration(configuration).await?;
    self.apply_settings().await;
    Ok(())
  }

  /// Remove a configuration, its command and re-register triggers.
  pub async fn remove_configuration(&self, command_id: &str) -> Result<FlowConfiguration, EngineError> {
    let removed = self.store.remove_configuration(command_id).await?;
    self.registry.unregister(command_id).await;
    self.triggers.register(&self.file_open).await;
    info!(command_id = %command_id, "removed configuration");
    Ok(removed)
  }

  pub async fn duplicate_configuration(&self, command_id: &str) -> Result<FlowConfiguration, EngineError> {
    let copy = self.store.duplicate_configuration(command_id).await?;
    self.apply_settings().await;
    Ok(copy)
  }

  pub async fn import_configuration(&self, url: &str) -> Result<FlowConfiguration, EngineError> {
    let configuration = add_configuration_from_url(&self.store, &self.client, url).await?;
    self.apply_settings().await;
    Ok(configuration)
  }

  /// Store the key and import the account's configurations.
  pub async fn connect_account(&self, api_key: &str) -> Result<Vec<FlowConfiguration>, EngineError> {
    let imported = connect_account(&self.store, &self.client, api_key).await?;
    self.apply_settings().await;
    Ok(imported)
  }

  /// Refresh a flow definition and write it to the cache.
  pub async fn refresh_flow_definition(&self, url: &str) -> Result<FlowDefinition, EngineError> {
    let definition = self.executor.cache().refresh(url).await?;
    self.store.replace_flow_definition(definition.clone()).await?;
    Ok(definition)
  }

  /// Stop trigger listeners, clear the session state and wait for
  /// executions already in flight.
  pub async fn teardown(&self) {
    self.triggers.teardown().await;
    self.triggers.drain().await;
  }
}
