use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use vaultflow_client::FlowClient;
use vaultflow_config::DocumentKind;
use vaultflow_config::validate::validate;
use vaultflow_engine::{Engine, FilePick, PromptField, TriggerDecision, UserInterface};
use vaultflow_store::{FsSettingsBackend, SettingsStore};
use vaultflow_workspace::{FsWorkspace, WorkspaceFile};

/// Vaultflow - run remote flows against a folder of documents
#[derive(Parser)]
#[command(name = "vaultflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the settings file (default: ~/.vaultflow/settings.json)
  #[arg(long, global = true)]
  settings: Option<PathBuf>,

  /// Workspace directory (default: current directory)
  #[arg(long, global = true)]
  workspace: Option<PathBuf>,

  /// Flow server to use instead of the stored base URL
  #[arg(long, global = true)]
  base_url: Option<String>,

  /// Workspace path of the active document
  #[arg(long, global = true)]
  active: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// List configured commands
  List,

  /// Run a command
  Run {
    /// The command id
    command_id: String,
  },

  /// Open a document and run the triggers it matches
  Open {
    /// Workspace path of the document
    path: String,
  },

  /// Validate a JSON document
  Validate {
    /// settings, flow-definition, flow-configuration or api-response
    kind: DocumentKind,
    /// Path to the JSON file
    file: PathBuf,
  },

  /// Store an API key and import the account's configurations
  Connect { api_key: String },

  /// Import a configuration from a URL
  Import { url: String },

  /// Copy a configuration under a new command id
  Duplicate { command_id: String },

  /// Remove a configuration
  Remove { command_id: String },

  /// Fetch a flow definition again and update the cache
  Refresh { flow_url: String },
}

fn main() -> Result<()> {
  let Cli {
    settings,
    workspace,
    base_url,
    active,
    command,
  } = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let Some(command) = command else {
    println!("vaultflow - use --help to see available commands");
    return Ok(());
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async move {
    if let Commands::Validate { kind, file } = &command {
      return validate_file(*kind, file).await;
    }
    let session = Session::open(settings, workspace, base_url, active.as_deref()).await?;
    let result = session.run(command).await;
    session.engine.teardown().await;
    result
  })
}

struct Session {
  engine: Engine,
  workspace: Arc<FsWorkspace>,
}

impl Session {
  async fn open(
    settings: Option<PathBuf>,
    workspace: Option<PathBuf>,
    base_url: Option<String>,
    active: Option<&str>,
  ) -> Result<Self> {
    let settings_path = match settings {
      Some(path) => path,
      None => dirs::home_dir()
        .context("could not determine home directory")?
        .join(".vaultflow")
        .join("settings.json"),
    };
    let workspace_dir = match workspace {
      Some(dir) => dir,
      None => std::env::current_dir().context("could not determine current directory")?,
    };
    let workspace_dir = tokio::fs::canonicalize(&workspace_dir)
      .await
      .with_context(|| format!("workspace directory not found: {}", workspace_dir.display()))?;

    let backend = Arc::new(FsSettingsBackend::new(&settings_path));
    let mut store = SettingsStore::load(backend.clone())
      .await
      .with_context(|| format!("failed to load settings: {}", settings_path.display()))?;
    if let Some(base_url) = base_url {
      let mut settings = store.get().await;
      settings.base_url = base_url;
      store = SettingsStore::with_settings(backend, settings);
    }
    info!(settings = %settings_path.display(), workspace = %workspace_dir.display(), "session opened");

    let workspace = Arc::new(FsWorkspace::new(workspace_dir));
    if let Some(path) = active {
      workspace
        .set_active_file(Some(path))
        .await
        .with_context(|| format!("active document not found: {}", path))?;
    }

    let engine = Engine::new(
      Arc::new(store),
      FlowClient::default(),
      workspace.clone(),
      Arc::new(TerminalUi::new()),
    );
    engine.apply_settings().await;

    Ok(Self { engine, workspace })
  }

  async fn run(&self, command: Commands) -> Result<()> {
    match command {
      Commands::List => {
        let settings = self.engine.store().get().await;
        if settings.flow_configurations.is_empty() {
          eprintln!("No commands configured");
        }
        for configuration in &settings.flow_configurations {
          println!(
            "{}\t{}\t{}",
            configuration.command.id, configuration.command.name, configuration.flow
          );
        }
      }
      Commands::Run { command_id } => {
        let report = self
          .engine
          .execute_command(&command_id)
          .await
          .with_context(|| format!("command '{}' failed", command_id))?
          .ok_or_else(|| anyhow!("unknown command '{}'", command_id))?;
        eprintln!(
          "Execution {} finished with {} error(s), {} failed action(s)",
          report.execution_id,
          report.response.errors().len(),
          report.failures().count()
        );
      }
      Commands::Open { path } => {
        self
          .workspace
          .set_active_file(Some(&path))
          .await
          .with_context(|| format!("document not found: {}", path))?;
        let decisions = self
          .engine
          .open_file(&path)
          .await
          .with_context(|| format!("failed to open {}", path))?;
        if decisions.is_empty() {
          eprintln!("No triggers configured");
        }
        for (command_id, decision) in decisions {
          let label = match decision {
            TriggerDecision::Fired => "fired",
            TriggerDecision::Suppressed => "already fired",
            TriggerDecision::Skipped => "skipped",
          };
          println!("{}\t{}", command_id, label);
        }
      }
      Commands::Validate { kind, file } => validate_file(kind, &file).await?,
      Commands::Connect { api_key } => {
        let imported = self
          .engine
          .connect_account(&api_key)
          .await
          .context("failed to connect account")?;
        eprintln!("Imported {} command(s)", imported.len());
        for configuration in imported {
          println!("{}\t{}", configuration.command.id, configuration.command.name);
        }
      }
      Commands::Import { url } => {
        let configuration = self
          .engine
          .import_configuration(&url)
          .await
          .with_context(|| format!("failed to import {}", url))?;
        println!("{}\t{}", configuration.command.id, configuration.command.name);
      }
      Commands::Duplicate { command_id } => {
        let copy = self
          .engine
          .duplicate_configuration(&command_id)
          .await
          .with_context(|| format!("failed to duplicate '{}'", command_id))?;
        println!("{}\t{}", copy.command.id, copy.command.name);
      }
      Commands::Remove { command_id } => {
        let removed = self
          .engine
          .remove_configuration(&command_id)
          .await
          .with_context(|| format!("failed to remove '{}'", command_id))?;
        eprintln!("Removed {}", removed.command.name);
      }
      Commands::Refresh { flow_url } => {
        let definition = self
          .engine
          .refresh_flow_definition(&flow_url)
          .await
          .with_context(|| format!("failed to refresh {}", flow_url))?;
        println!("{}", serde_json::to_string_pretty(&definition)?);
      }
    }
    Ok(())
  }
}

async fn validate_file(kind: DocumentKind, file: &Path) -> Result<()> {
  let content = tokio::fs::read_to_string(file)
    .await
    .with_context(|| format!("failed to read {}", file.display()))?;
  let document: serde_json::Value =
    serde_json::from_str(&content).with_context(|| format!("failed to parse {}", file.display()))?;

  let validation = validate(kind, &document).with_context(|| format!("cannot validate {} as {}", file.display(), kind))?;
  if validation.is_valid() {
    println!("{}: valid {}", file.display(), kind);
    return Ok(());
  }

  for violation in validation.violations() {
    println!("{}", violation);
  }
  bail!("{} violation(s) in {}", validation.violations().len(), file.display())
}

/// Prompts and pickers on stdin, popups on stdout, notices on stderr.
struct TerminalUi {
  lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl TerminalUi {
  fn new() -> Self {
    Self {
      lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
    }
  }

  /// `None` on end of input.
  async fn read_line(&self) -> Option<String> {
    match self.lines.lock().await.next_line().await {
      Ok(line) => line,
      Err(e) => {
        debug!(error = %e, "cannot read stdin");
        None
      }
    }
  }
}

#[async_trait]
impl UserInterface for TerminalUi {
  async fn prompt_text(&self, fields: &[PromptField]) -> Option<Vec<(String, String)>> {
    let mut values = Vec::with_capacity(fields.len());
    for field in fields {
      if field.description.is_empty() {
        eprint!("{}: ", field.name);
      } else {
        eprint!("{} ({}): ", field.name, field.description);
      }
      let value = self.read_line().await?;
      values.push((field.name.clone(), value));
    }
    Some(values)
  }

  async fn pick_file(&self, request: FilePick) -> Option<WorkspaceFile> {
    eprintln!("Select a file for {} ({}):", request.input_name, request.pattern);
    for (index, file) in request.candidates.iter().enumerate() {
      eprintln!("  {}) {}", index + 1, file.path);
    }
    eprint!("> ");

    let choice = self.read_line().await?;
    let index: usize = choice.trim().parse().ok()?;
    request.candidates.into_iter().nth(index.checked_sub(1)?)
  }

  async fn show_text(&self, title: &str, text: &str) {
    println!("== {} ==", title);
    println!("{}", text);
  }

  fn notice(&self, message: &str) {
    eprintln!("! {}", message);
  }

  fn status(&self, text: &str) {
    eprintln!("{}", text);
  }
}
