//! The shared execution path used by manual commands and triggers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};
use vaultflow_client::FlowClient;
use vaultflow_config::{ApiResponse, FlowConfiguration, FlowInput};
use vaultflow_store::{FlowDefinitionCache, SettingsStore};
use vaultflow_workspace::{Workspace, WorkspaceFile};

use crate::dispatcher::{ActionDispatcher, ActionOutcome};
use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::resolver::InputResolver;
use crate::ui::UserInterface;

/// Notice shown when a command runs without an API key.
pub const NOT_CONNECTED_NOTICE: &str = "Your plugin is not connected to an account";

/// Summary of one execution.
#[derive(Debug)]
pub struct ExecutionReport {
  pub execution_id: String,
  pub command_id: String,
  pub input: FlowInput,
  pub response: ApiResponse,
  pub outcomes: Vec<ActionOutcome>,
}

impl ExecutionReport {
  pub fn failures(&self) -> impl Iterator<Item = &EngineError> {
    self.outcomes.iter().filter_map(|outcome| match outcome {
      ActionOutcome::Failed(e) => Some(e),
      _ => None,
    })
  }
}

/// Resolves inputs, calls the flow and dispatches the result.
///
/// Executions of the same command are serialized; different commands run
/// concurrently.
pub struct Executor {
  store: Arc<SettingsStore>,
  cache: FlowDefinitionCache,
  client: FlowClient,
  workspace: Arc<dyn Workspace>,
  ui: Arc<dyn UserInterface>,
  resolver: InputResolver,
  dispatcher: ActionDispatcher,
  notifier: Arc<dyn ExecutionNotifier>,
  running: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Executor {
  pub fn new(
    store: Arc<SettingsStore>,
    client: FlowClient,
    workspace: Arc<dyn Workspace>,
    ui: Arc<dyn UserInterface>,
  ) -> Self {
    Self {
      cache: FlowDefinitionCache::new(store.clone(), client.clone()),
      resolver: InputResolver::new(workspace.clone(), ui.clone()),
      dispatcher: ActionDispatcher::new(workspace.clone(), ui.clone()),
      notifier: Arc::new(NoopNotifier),
      running: Mutex::new(HashMap::new()),
      store,
      client,
      workspace,
      ui,
    }
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn cache(&self) -> &FlowDefinitionCache {
    &self.cache
  }

  async fn command_lock(&self, command_id: &str) -> Arc<Mutex<()>> {
    self
      .running
      .lock()
      .await
      .entry(command_id.to_string())
      .or_default()
      .clone()
  }

  /// Run `configuration` once against the document that is active when
  /// the run starts.
  ///
  /// Only an unresolvable flow definition is an `Err`; remote failures end
  /// up in the response and action failures in the report.
  pub async fn execute(&self, configuration: &FlowConfiguration) -> Result<ExecutionReport, EngineError> {
    self.run(configuration, None).await
  }

  /// Run `configuration` once with `active` as the active document, however
  /// long the run waits behind other runs of the same command.
  pub async fn execute_with_active(
    &self,
    configuration: &FlowConfiguration,
    active: WorkspaceFile,
  ) -> Result<ExecutionReport, EngineError> {
    self.run(configuration, Some(active)).await
  }

  #[instrument(
    name = "execute_configuration",
    skip_all,
    fields(command_id = %configuration.command.id, command = %configuration.command.name)
  )]
  async fn run(
    &self,
    configuration: &FlowConfiguration,
    captured: Option<WorkspaceFile>,
  ) -> Result<ExecutionReport, EngineError> {
    let lock = self.command_lock(&configuration.command.id).await;
    let _guard = lock.lock().await;

    let execution_id = uuid::Uuid::new_v4().to_string();
    let command = &configuration.command;
    info!(execution_id = %execution_id, "execution started");
    self.notifier.notify(ExecutionEvent::Started {
      execution_id: execution_id.clone(),
      command_id: command.id.clone(),
    });

    let active = match captured {
      Some(file) => Some(file),
      None => self.workspace.active_file().await,
    };

    let definition = match self.cache.resolve(&configuration.flow).await {
      Ok(definition) => definition,
      Err(source) => {
        let err = EngineError::FlowDefinition {
          flow: configuration.flow.clone(),
          command: command.name.clone(),
          source,
        };
        error!(execution_id = %execution_id, error = %err, "execution aborted");
        self.ui.notice(&err.to_string());
        self.notifier.notify(ExecutionEvent::Finished { execution_id });
        return Err(err);
      }
    };

    let input = self
      .resolver
      .resolve(configuration, &definition, active.as_ref())
      .await;
    self.notifier.notify(ExecutionEvent::InputsResolved {
      execution_id: execution_id.clone(),
      keys: input.constants.keys().cloned().collect(),
    });

    let settings = self.store.get().await;
    let api_key = settings.api_key();
    if api_key.is_none() {
      warn!("no api key configured");
      self.ui.notice(NOT_CONNECTED_NOTICE);
    }

    self.ui.status(&format!("Running: {}", command.name));
    let response = self
      .client
      .execute(&input, &definition.url, api_key, &settings.base_url)
      .await;
    self.ui.status(&format!("Finished: {}", command.name));
    self.notifier.notify(ExecutionEvent::ResponseReceived {
      execution_id: execution_id.clone(),
      errors: response.errors().to_vec(),
    });

    let outcomes = self
      .dispatcher
      .dispatch(
        &command.name,
        &configuration.result_actions,
        &input,
        &response,
        active.as_ref(),
      )
      .await;

    for (action, outcome) in configuration.result_actions.iter().zip(&outcomes) {
      if let ActionOutcome::Failed(e) = outcome {
        error!(action = action.kind.name(), error = %e, "result action failed");
        self.ui.notice(&format!("{}: {}", command.name, e));
        self.notifier.notify(ExecutionEvent::ActionFailed {
          execution_id: execution_id.clone(),
          action: action.kind.name().to_string(),
          error: e.to_string(),
        });
      }
    }

    info!(execution_id = %execution_id, errors = response.errors().len(), "execution finished");
    self.notifier.notify(ExecutionEvent::Finished {
      execution_id: execution_id.clone(),
    });

    Ok(ExecutionReport {
      execution_id,
      command_id: command.id.clone(),
      input,
      response,
      outcomes,
    })
  }
}
