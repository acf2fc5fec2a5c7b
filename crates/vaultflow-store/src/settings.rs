use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use vaultflow_config::{FlowConfiguration, FlowDefinition, Settings, duplicate_with_new_command, parse_settings};

use crate::backend::SettingsBackend;
use crate::error::StoreError;

/// The in-memory settings, synchronized with a [`SettingsBackend`].
///
/// Reads return a copy. Writes replace the whole value and persist it before
/// returning; the lock is held across the write so that concurrent
/// mutations apply one after another.
pub struct SettingsStore {
  backend: Arc<dyn SettingsBackend>,
  current: Mutex<Settings>,
}

impl SettingsStore {
  /// Load settings from `backend`.
  ///
  /// A missing document yields defaults. So does a document that fails
  /// validation, in which case the stored document is left untouched.
  pub async fn load(backend: Arc<dyn SettingsBackend>) -> Result<Self, StoreError> {
    let settings = match backend.load().await? {
      None => {
        info!("no stored settings, using defaults");
        Settings::default()
      }
      Some(document) => match parse_settings(&document) {
        Ok(settings) => settings,
        Err(e) => {
          warn!(error = %e, "stored settings are invalid, using defaults");
          Settings::default()
        }
      },
    };

    Ok(Self::with_settings(backend, settings))
  }

  /// Wrap already-loaded settings without reading the backend.
  pub fn with_settings(backend: Arc<dyn SettingsBackend>, settings: Settings) -> Self {
    Self {
      backend,
      current: Mutex::new(settings),
    }
  }

  /// A copy of the current settings.
  pub async fn get(&self) -> Settings {
    self.current.lock().await.clone()
  }

  /// Replace the settings and persist them.
  pub async fn save(&self, settings: Settings) -> Result<(), StoreError> {
    let mut current = self.current.lock().await;
    self.persist(&settings).await?;
    *current = settings;
    Ok(())
  }

  /// Apply `f` to a copy of the settings, then persist and install it.
  ///
  /// Nothing changes if persisting fails.
  pub async fn update<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> Result<R, StoreError> {
    let mut current = self.current.lock().await;
    let mut next = current.clone();
    let result = f(&mut next);
    self.persist(&next).await?;
    *current = next;
    Ok(result)
  }

  async fn persist(&self, settings: &Settings) -> Result<(), StoreError> {
    let document = serde_json::to_value(settings)?;
    self.backend.save(&document).await
  }

  pub async fn update_api_key(&self, api_key: &str) -> Result<(), StoreError> {
    self
      .update(|settings| settings.api_key = Some(api_key.to_string()))
      .await
  }

  pub async fn add_configuration(&self, configuration: FlowConfiguration) -> Result<(), StoreError> {
    self
      .update(|settings| settings.flow_configurations.push(configuration))
      .await
  }

  /// Replace the configuration with the same command id.
  ///
  /// Returns `false` (and still persists) when no such configuration exists;
  /// use [`SettingsStore::add_configuration`] to create one.
  #[instrument(name = "upsert_configuration", skip(self, configuration), fields(command_id = %configuration.command.id))]
  pub async fn upsert_configuration(&self, configuration: FlowConfiguration) -> Result<bool, StoreError> {
    self
      .update(|settings| {
        match settings
          .flow_configurations
          .iter_mut()
          .find(|stored| stored.command.id == configuration.command.id)
        {
          Some(stored) => {
            *stored = configuration;
            true
          }
          None => false,
        }
      })
      .await
  }

  /// Remove and return the configuration for `command_id`.
  pub async fn remove_configuration(&self, command_id: &str) -> Result<FlowConfiguration, StoreError> {
    self
      .update(|settings| {
        let index = settings
          .flow_configurations
          .iter()
          .position(|stored| stored.command.id == command_id)?;
        Some(settings.flow_configurations.remove(index))
      })
      .await?
      .ok_or_else(|| StoreError::UnknownCommand {
        command_id: command_id.to_string(),
      })
  }

  /// Append a copy of `command_id`'s configuration under a fresh id.
  pub async fn duplicate_configuration(&self, command_id: &str) -> Result<FlowConfiguration, StoreError> {
    self
      .update(|settings| {
        let copy = duplicate_with_new_command(settings.configuration(command_id)?);
        settings.flow_configurations.push(copy.clone());
        Some(copy)
      })
      .await?
      .ok_or_else(|| StoreError::UnknownCommand {
        command_id: command_id.to_string(),
      })
  }

  /// Insert `definition` into the cache, replacing any entry with its url.
  pub async fn replace_flow_definition(&self, definition: FlowDefinition) -> Result<(), StoreError> {
    self
      .update(|settings| {
        match settings
          .flow_definitions
          .iter_mut()
          .find(|cached| cached.url == definition.url)
        {
          Some(cached) => *cached = definition,
          None => settings.flow_definitions.push(definition),
        }
      })
      .await
  }
}
