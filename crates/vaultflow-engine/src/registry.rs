use std::collections::BTreeMap;

use tokio::sync::RwLock;
use tracing::debug;
use vaultflow_config::Command;

/// Commands exposed to the host, keyed by command id.
#[derive(Debug, Default)]
pub struct CommandRegistry {
  commands: RwLock<BTreeMap<String, Command>>,
}

impl CommandRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub async fn register(&self, command: Command) {
    debug!(command_id = %command.id, command = %command.name, "register command");
    self.commands.write().await.insert(command.id.clone(), command);
  }

  /// Returns the removed command, if it was registered.
  pub async fn unregister(&self, command_id: &str) -> Option<Command> {
    self.commands.write().await.remove(command_id)
  }

  /// Drop every registration and register `commands` instead.
  pub async fn replace_all(&self, commands: impl IntoIterator<Item = Command>) {
    let mut registered = self.commands.write().await;
    registered.clear();
    for command in commands {
      registered.insert(command.id.clone(), command);
    }
    debug!(count = registered.len(), "registered commands");
  }

  pub async fn get(&self, command_id: &str) -> Option<Command> {
    self.commands.read().await.get(command_id).cloned()
  }

  pub async fn list(&self) -> Vec<Command> {
    self.commands.read().await.values().cloned().collect()
  }
}
