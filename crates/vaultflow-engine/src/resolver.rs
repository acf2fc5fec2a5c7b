//! Input resolution.
//!
//! Turns a configuration's declared input sources into the flat `constants`
//! map sent to the flow. Gaps (no active file, missing fixed file, cancelled
//! picker or prompt, unreadable file) omit the input instead of failing.

use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use tracing::{debug, info, instrument, warn};
use vaultflow_config::{FlowConfiguration, FlowDefinition, FlowInput, InputConfiguration, InputSource, ValueType};
use vaultflow_workspace::{Workspace, WorkspaceError, WorkspaceFile};

use crate::ui::{FilePick, PromptField, UserInterface};

/// Auxiliary key for `name`: `{name}/workspace/{field}`.
pub fn auxiliary_key(name: &str, field: &str) -> String {
  format!("{}/workspace/{}", name, field)
}

pub struct InputResolver {
  workspace: Arc<dyn Workspace>,
  ui: Arc<dyn UserInterface>,
}

impl InputResolver {
  pub fn new(workspace: Arc<dyn Workspace>, ui: Arc<dyn UserInterface>) -> Self {
    Self { workspace, ui }
  }

  /// Resolve every input of `configuration`.
  ///
  /// Sources are visited in order; prompts are collected on the way and
  /// asked for in a single batch at the end. `active` is the document that
  /// was active when the execution started.
  #[instrument(name = "resolve_inputs", skip_all, fields(command_id = %configuration.command.id))]
  pub async fn resolve(
    &self,
    configuration: &FlowConfiguration,
    definition: &FlowDefinition,
    active: Option<&WorkspaceFile>,
  ) -> FlowInput {
    let mut input = FlowInput::default();
    let mut prompts = Vec::new();

    for entry in &configuration.input_configurations {
      match &entry.source {
        InputSource::Constant { value } => {
          input.constants.insert(entry.name.clone(), value.clone());
        }
        InputSource::ActiveFile => match active {
          Some(file) => self.extract_into(entry, file, &mut input.constants).await,
          None => {
            debug!(input = %entry.name, "no active file");
            input.constants.insert(entry.name.clone(), String::new());
          }
        },
        InputSource::FixedFile { path } => match self.workspace.file(path).await {
          Ok(Some(file)) => self.extract_into(entry, &file, &mut input.constants).await,
          Ok(None) => debug!(input = %entry.name, path = %path, "fixed file does not exist"),
          Err(e) => warn!(input = %entry.name, path = %path, error = %e, "cannot look up fixed file"),
        },
        InputSource::SelectFile {
          pattern,
          is_regular_expression,
          ..
        } => {
          let description = describe(definition, &entry.name);
          if let Some(file) = self
            .select_file(&entry.name, description, pattern, *is_regular_expression)
            .await
          {
            self.extract_into(entry, &file, &mut input.constants).await;
          }
        }
        InputSource::Prompt => prompts.push(PromptField {
          name: entry.name.clone(),
          description: describe(definition, &entry.name),
        }),
      }
    }

    if !prompts.is_empty() {
      match self.ui.prompt_text(&prompts).await {
        Some(values) => {
          for (name, value) in values {
            input.constants.insert(name, value);
          }
        }
        None => info!(count = prompts.len(), "prompt cancelled"),
      }
    }

    input
  }

  async fn select_file(
    &self,
    name: &str,
    description: String,
    pattern: &str,
    is_regular_expression: bool,
  ) -> Option<WorkspaceFile> {
    let source = if is_regular_expression {
      pattern.to_string()
    } else {
      regex::escape(pattern)
    };
    let regex = match Regex::new(&source) {
      Ok(regex) => regex,
      Err(e) => {
        warn!(input = %name, pattern = %pattern, error = %e, "invalid file pattern");
        return None;
      }
    };

    let candidates: Vec<WorkspaceFile> = match self.workspace.list_files().await {
      Ok(files) => files.into_iter().filter(|f| regex.is_match(&f.path)).collect(),
      Err(e) => {
        warn!(input = %name, error = %e, "cannot list workspace files");
        return None;
      }
    };

    if candidates.is_empty() {
      info!(input = %name, pattern = %pattern, "no files match");
      return None;
    }

    let picked = self
      .ui
      .pick_file(FilePick {
        input_name: name.to_string(),
        description,
        pattern: pattern.to_string(),
        candidates,
      })
      .await;
    if picked.is_none() {
      info!(input = %name, "file selection cancelled");
    }
    picked
  }

  async fn extract_into(
    &self,
    entry: &InputConfiguration,
    file: &WorkspaceFile,
    constants: &mut BTreeMap<String, String>,
  ) {
    match self.extract(entry, file).await {
      Ok(values) => constants.extend(values),
      Err(e) => warn!(input = %entry.name, path = %file.path, error = %e, "cannot read input file"),
    }
  }

  /// Content of `file` under `entry.name` plus the auxiliary file keys.
  async fn extract(
    &self,
    entry: &InputConfiguration,
    file: &WorkspaceFile,
  ) -> Result<BTreeMap<String, String>, WorkspaceError> {
    let content = match entry.value_type {
      ValueType::String => self.workspace.read(file).await?,
      ValueType::Base64 => STANDARD.encode(self.workspace.read_binary(file).await?),
    };
    let metadata = self.workspace.metadata(file).await?.unwrap_or_default();

    let name = &entry.name;
    let mut values = BTreeMap::new();
    values.insert(name.clone(), content);
    values.insert(auxiliary_key(name, "vaultName"), self.workspace.name());
    values.insert(auxiliary_key(name, "metadata"), metadata.to_string());
    values.insert(auxiliary_key(name, "filePath"), file.path.clone());
    values.insert(auxiliary_key(name, "fileBaseName"), file.basename.clone());
    values.insert(auxiliary_key(name, "fileExtension"), file.extension.clone());
    if let Some(parent) = &file.parent {
      values.insert(auxiliary_key(name, "fileParentPath"), parent.clone());
    }
    Ok(values)
  }
}

fn describe(definition: &FlowDefinition, name: &str) -> String {
  definition
    .input_definition(name)
    .map(|d| d.description.clone())
    .unwrap_or_default()
}
