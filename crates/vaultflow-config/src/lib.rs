//! Vaultflow Config
//!
//! This crate contains the serializable types shared by every vaultflow
//! component: remote flow definitions, user-authored flow configurations,
//! remote responses and the persisted settings document.
//!
//! Documents arrive from untrusted places (the network, a settings file on
//! disk, an import URL), so each one is structurally checked with the
//! functions in [`validate`] before it is decoded into the typed model.
//! The `parse_*` helpers combine both steps.

mod configuration;
mod defaults;
mod error;
mod flow;
mod response;
mod settings;
pub mod validate;

pub use configuration::{
  Action, ActionKind, ActionSource, Command, FlowConfiguration, InputConfiguration, InputSource,
  Trigger, TriggerEvent, TriggerFrequency,
};
pub use defaults::{
  default_action, default_input_configuration, default_trigger, duplicate_with_new_command,
  new_command_id,
};
pub use error::SchemaError;
pub use flow::{FlowDefinition, InputDefinition, OutputDefinition, ValueType};
pub use response::{ApiResponse, FlowInput};
pub use settings::{DEFAULT_BASE_URL, Settings};
pub use validate::{
  DocumentKind, Validation, Violation, parse_api_response, parse_flow_configuration,
  parse_flow_definition, parse_settings,
};
