//! Execution events and notifiers for observability.
//!
//! Every command execution emits events so consumers can follow progress,
//! record history or drive a UI without coupling to the executor.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while executing a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// An execution has started.
  Started {
    execution_id: String,
    command_id: String,
  },

  /// Inputs were resolved; `keys` lists the resolved constant names.
  InputsResolved {
    execution_id: String,
    keys: Vec<String>,
  },

  /// The flow server answered (or the call failed and was folded into errors).
  ResponseReceived {
    execution_id: String,
    errors: Vec<String>,
  },

  /// A result action failed. Dispatch continues with the next action.
  ActionFailed {
    execution_id: String,
    action: String,
    error: String,
  },

  /// The execution is over.
  Finished { execution_id: String },
}

impl ExecutionEvent {
  pub fn execution_id(&self) -> &str {
    match self {
      ExecutionEvent::Started { execution_id, .. }
      | ExecutionEvent::InputsResolved { execution_id, .. }
      | ExecutionEvent::ResponseReceived { execution_id, .. }
      | ExecutionEvent::ActionFailed { execution_id, .. }
      | ExecutionEvent::Finished { execution_id } => execution_id,
    }
  }
}

/// Receives execution events.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
///
/// Event volume is a handful per execution, so an unbounded channel never
/// holds back the executor.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
