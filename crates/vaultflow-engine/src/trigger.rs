//! Event-triggered execution.
//!
//! On a file-open event every configuration's triggers are walked in order.
//! Only the first trigger is ever decisive: a trigger for another event, a
//! false or failing condition, an already-fired `oncePerFileAndSession` key
//! or a successful fire all end the walk for that configuration.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::{Mutex, broadcast};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use vaultflow_config::{FlowConfiguration, Settings, TriggerEvent, TriggerFrequency};
use vaultflow_expr::Condition;
use vaultflow_store::SettingsStore;
use vaultflow_workspace::{Workspace, WorkspaceError, WorkspaceFile};

use crate::executor::Executor;

const DEDUP_SEPARATOR: &str = "______";

/// `{command_id}______{file_path}`
pub fn dedup_key(command_id: &str, file_path: &str) -> String {
  format!("{}{}{}", command_id, DEDUP_SEPARATOR, file_path)
}

/// Event kinds declared by any configuration in `settings`.
pub fn list_trigger_events(settings: &Settings) -> Vec<TriggerEvent> {
  let mut events = Vec::new();
  for trigger in settings
    .flow_configurations
    .iter()
    .flat_map(|configuration| configuration.triggers())
  {
    if !events.contains(&trigger.event) {
      events.push(trigger.event);
    }
  }
  events
}

/// What a file-open event did to one configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
  /// An execution was spawned.
  Fired,
  /// The condition held but this file already fired in this session.
  Suppressed,
  /// The first trigger did not apply or its condition did not hold.
  Skipped,
}

pub struct TriggerEngine {
  store: Arc<SettingsStore>,
  executor: Arc<Executor>,
  workspace: Arc<dyn Workspace>,
  fired: Mutex<HashSet<String>>,
  executions: Mutex<JoinSet<()>>,
  listeners: Mutex<Vec<(CancellationToken, JoinHandle<()>)>>,
}

impl TriggerEngine {
  pub fn new(store: Arc<SettingsStore>, executor: Arc<Executor>, workspace: Arc<dyn Workspace>) -> Self {
    Self {
      store,
      executor,
      workspace,
      fired: Mutex::new(HashSet::new()),
      executions: Mutex::new(JoinSet::new()),
      listeners: Mutex::new(Vec::new()),
    }
  }

  /// Evaluate every configuration's triggers for an opened file.
  ///
  /// Executions are spawned, not awaited; use [`TriggerEngine::drain`] to
  /// wait for them. Each execution treats `file` as the active document.
  /// Returns one decision per configuration that declares triggers.
  #[instrument(name = "file_open", skip(self), fields(path = %file.path))]
  pub async fn handle_file_open(&self, file: &WorkspaceFile) -> Vec<(String, TriggerDecision)> {
    let settings = self.store.get().await;
    let configurations: Vec<&FlowConfiguration> = settings
      .flow_configurations
      .iter()
      .filter(|configuration| !configuration.triggers().is_empty())
      .collect();
    if configurations.is_empty() {
      return Vec::new();
    }

    let content = match self.workspace.read(file).await {
      Ok(content) => content,
      Err(WorkspaceError::NotText { .. }) => String::new(),
      Err(e) => {
        warn!(error = %e, "cannot read opened file");
        return Vec::new();
      }
    };
    let context = json!({
      "content": content,
      "file": {
        "path": file.path,
        "basename": file.basename,
        "extension": file.extension,
      }
    });

    let mut decisions = Vec::with_capacity(configurations.len());
    for configuration in configurations {
      let decision = self.evaluate(configuration, file, &context).await;
      decisions.push((configuration.command.id.clone(), decision));
    }
    decisions
  }

  async fn evaluate(
    &self,
    configuration: &FlowConfiguration,
    file: &WorkspaceFile,
    context: &serde_json::Value,
  ) -> TriggerDecision {
    let command_id = &configuration.command.id;

    // First-match policy: only the first trigger is considered.
    let Some(trigger) = configuration.triggers().first() else {
      return TriggerDecision::Skipped;
    };
    if trigger.event != TriggerEvent::FileOpen {
      return TriggerDecision::Skipped;
    }

    let holds = Condition::compile(&trigger.condition).and_then(|condition| condition.evaluate(context));
    match holds {
      Ok(true) => {}
      Ok(false) => {
        debug!(command_id = %command_id, "condition not met");
        return TriggerDecision::Skipped;
      }
      Err(e) => {
        warn!(command_id = %command_id, condition = %trigger.condition, error = %e, "condition failed");
        return TriggerDecision::Skipped;
      }
    }

    match trigger.frequency {
      TriggerFrequency::OncePerFileAndSession => {
        let key = dedup_key(command_id, &file.path);
        if !self.fired.lock().await.insert(key.clone()) {
          debug!(key = %key, "already triggered in this session");
          return TriggerDecision::Suppressed;
        }
      }
    }

    info!(command_id = %command_id, "trigger fired");
    let executor = self.executor.clone();
    let configuration = configuration.clone();
    let opened = file.clone();
    self.executions.lock().await.spawn(async move {
      if let Err(e) = executor.execute_with_active(&configuration, opened).await {
        error!(command_id = %configuration.command.id, error = %e, "triggered execution failed");
      }
    });
    TriggerDecision::Fired
  }

  /// Wait for every spawned execution to finish.
  pub async fn drain(&self) {
    let mut executions = self.executions.lock().await;
    while let Some(result) = executions.join_next().await {
      if let Err(e) = result {
        error!(error = %e, "triggered execution panicked");
      }
    }
  }

  /// Subscribe to `events` when any configuration declares a `fileOpen`
  /// trigger. Returns whether a listener was started.
  ///
  /// Existing listeners are stopped first, so a session has at most one.
  pub async fn register(self: &Arc<Self>, events: &broadcast::Sender<WorkspaceFile>) -> bool {
    self.stop_listeners().await;

    let settings = self.store.get().await;
    if !list_trigger_events(&settings).contains(&TriggerEvent::FileOpen) {
      debug!("no fileOpen triggers, not listening");
      return false;
    }

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(self.clone().listen(events.subscribe(), cancel.clone()));
    self.listeners.lock().await.push((cancel, handle));
    info!("listening for file-open events");
    true
  }

  async fn listen(self: Arc<Self>, mut events: broadcast::Receiver<WorkspaceFile>, cancel: CancellationToken) {
    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          debug!("file-open listener cancelled");
          break;
        }
        event = events.recv() => {
          match event {
            Ok(file) => {
              self.handle_file_open(&file).await;
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
              warn!(skipped, "file-open listener lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
              debug!("file-open channel closed");
              break;
            }
          }
        }
      }
    }
  }

  async fn stop_listeners(&self) {
    let listeners = std::mem::take(&mut *self.listeners.lock().await);
    for (cancel, handle) in listeners {
      cancel.cancel();
      if let Err(e) = handle.await {
        error!(error = %e, "file-open listener panicked");
      }
    }
  }

  /// Stop listening and forget which files already fired.
  pub async fn teardown(&self) {
    self.stop_listeners().await;
    self.fired.lock().await.clear();
    info!("triggers torn down");
  }

  pub async fn is_listening(&self) -> bool {
    !self.listeners.lock().await.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_dedup_key() {
    assert_eq!(dedup_key("cmd", "notes/a.md"), "cmd______notes/a.md");
  }

  #[test]
  fn test_list_trigger_events() {
    let settings: Settings = serde_json::from_value(json!({
      "baseUrl": "https://app.taskbone.com",
      "version": "0.1.0",
      "flowDefinitions": [],
      "flowConfigurations": [
        {
          "flow": "f",
          "command": { "id": "a", "name": "A", "description": "" },
          "inputConfigurations": [],
          "resultActions": []
        },
        {
          "flow": "f",
          "command": { "id": "b", "name": "B", "description": "" },
          "inputConfigurations": [],
          "resultActions": [],
          "triggers": [
            { "event": "fileOpen", "condition": "", "frequency": "oncePerFileAndSession" },
            { "event": "fileOpen", "condition": "true", "frequency": "oncePerFileAndSession" }
          ]
        }
      ]
    }))
    .unwrap();

    assert_eq!(list_trigger_events(&settings), vec![TriggerEvent::FileOpen]);
    assert!(list_trigger_events(&Settings::default()).is_empty());
  }
}
