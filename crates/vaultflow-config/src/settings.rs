use serde::{Deserialize, Serialize};

use crate::configuration::FlowConfiguration;
use crate::flow::FlowDefinition;

/// Server used when the settings document does not name one.
pub const DEFAULT_BASE_URL: &str = "https://app.taskbone.com";

/// The persisted settings document.
///
/// `flow_definitions` doubles as the flow definition cache, keyed by
/// [`FlowDefinition::url`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub api_key: Option<String>,
  pub base_url: String,
  pub version: String,
  pub flow_definitions: Vec<FlowDefinition>,
  pub flow_configurations: Vec<FlowConfiguration>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      api_key: None,
      base_url: DEFAULT_BASE_URL.to_string(),
      version: env!("CARGO_PKG_VERSION").to_string(),
      flow_definitions: Vec::new(),
      flow_configurations: Vec::new(),
    }
  }
}

impl Settings {
  /// The configured API key, ignoring an empty string.
  pub fn api_key(&self) -> Option<&str> {
    self.api_key.as_deref().filter(|key| !key.is_empty())
  }

  pub fn flow_definition(&self, url: &str) -> Option<&FlowDefinition> {
    self.flow_definitions.iter().find(|d| d.url == url)
  }

  pub fn configuration(&self, command_id: &str) -> Option<&FlowConfiguration> {
    self
      .flow_configurations
      .iter()
      .find(|c| c.command.id == command_id)
  }
}
