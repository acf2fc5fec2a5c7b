//! Vaultflow Engine
//!
//! The execution path shared by manual commands and triggers:
//!
//! 1. [`InputResolver`] turns input configurations into a `FlowInput`.
//! 2. The flow client calls the remote flow.
//! 3. [`ActionDispatcher`] routes the response into result actions.
//!
//! [`Executor`] runs that path for one configuration, [`TriggerEngine`]
//! starts executions from file-open events and [`Engine`] ties them to the
//! settings store and the [`CommandRegistry`].

mod dispatcher;
mod engine;
mod error;
mod events;
mod executor;
mod registry;
mod resolver;
mod trigger;
mod ui;

pub use dispatcher::{ACTION_LOG_TARGET, ActionDispatcher, ActionOutcome, project_output};
pub use engine::Engine;
pub use error::EngineError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use executor::{ExecutionReport, Executor, NOT_CONNECTED_NOTICE};
pub use registry::CommandRegistry;
pub use resolver::{InputResolver, auxiliary_key};
pub use trigger::{TriggerDecision, TriggerEngine, dedup_key, list_trigger_events};
pub use ui::{FilePick, PromptField, UserInterface};
