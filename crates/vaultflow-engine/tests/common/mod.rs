//! Fakes shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use vaultflow_client::{ClientError, FlowClient, HttpRequest, HttpResponse, HttpTransport};
use vaultflow_config::Settings;
use vaultflow_engine::{Engine, ExecutionNotifier, FilePick, PromptField, UserInterface};
use vaultflow_store::{MemorySettingsBackend, SettingsStore};
use vaultflow_workspace::{MemoryWorkspace, WorkspaceFile};

pub const BASE_URL: &str = "https://app.test";
pub const FLOW_URL: &str = "https://flows.test/summarize";

/// Records everything shown to the user and replays scripted answers.
#[derive(Default)]
pub struct FakeUi {
  pub prompt_answer: Mutex<Option<Vec<(String, String)>>>,
  pub prompts: Mutex<Vec<Vec<PromptField>>>,
  pub pick: Mutex<Option<String>>,
  pub picks: Mutex<Vec<FilePick>>,
  pub popups: Mutex<Vec<(String, String)>>,
  pub notices: std::sync::Mutex<Vec<String>>,
  pub statuses: std::sync::Mutex<Vec<String>>,
}

impl FakeUi {
  pub async fn answer_prompts(&self, answers: &[(&str, &str)]) {
    *self.prompt_answer.lock().await = Some(
      answers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect(),
    );
  }

  pub async fn pick(&self, path: &str) {
    *self.pick.lock().await = Some(path.to_string());
  }

  pub async fn popups(&self) -> Vec<(String, String)> {
    self.popups.lock().await.clone()
  }

  pub fn notices(&self) -> Vec<String> {
    self.notices.lock().unwrap().clone()
  }

  pub fn statuses(&self) -> Vec<String> {
    self.statuses.lock().unwrap().clone()
  }
}

#[async_trait]
impl UserInterface for FakeUi {
  async fn prompt_text(&self, fields: &[PromptField]) -> Option<Vec<(String, String)>> {
    self.prompts.lock().await.push(fields.to_vec());
    self.prompt_answer.lock().await.clone()
  }

  async fn pick_file(&self, request: FilePick) -> Option<WorkspaceFile> {
    let choice = self.pick.lock().await.clone();
    let picked = choice.and_then(|path| request.candidates.iter().find(|f| f.path == path).cloned());
    self.picks.lock().await.push(request);
    picked
  }

  async fn show_text(&self, title: &str, text: &str) {
    self.popups.lock().await.push((title.to_string(), text.to_string()));
  }

  fn notice(&self, message: &str) {
    self.notices.lock().unwrap().push(message.to_string());
  }

  fn status(&self, text: &str) {
    self.statuses.lock().unwrap().push(text.to_string());
  }
}

/// Serves the flow definition and answers executions with queued replies.
/// Once the queue is empty every execution gets `default_reply`.
pub struct FakeServer {
  pub definition: Value,
  pub replies: Mutex<VecDeque<HttpResponse>>,
  pub default_reply: HttpResponse,
  pub executions: Mutex<Vec<HttpRequest>>,
}

impl FakeServer {
  pub fn new(default_reply: Value) -> Arc<Self> {
    Arc::new(Self {
      definition: definition(),
      replies: Mutex::new(VecDeque::new()),
      default_reply: HttpResponse::new(200, default_reply.to_string()),
      executions: Mutex::new(Vec::new()),
    })
  }

  pub async fn reply_next(&self, response: HttpResponse) {
    self.replies.lock().await.push_back(response);
  }

  pub async fn executions(&self) -> Vec<HttpRequest> {
    self.executions.lock().await.clone()
  }

  /// The `constants` of the n-th execution request.
  pub async fn sent_constants(&self, n: usize) -> Value {
    let executions = self.executions.lock().await;
    executions[n]
      .body
      .as_ref()
      .map(|body| body["constants"].clone())
      .unwrap_or(Value::Null)
  }
}

#[async_trait]
impl HttpTransport for FakeServer {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
    if request.url == FLOW_URL {
      return Ok(HttpResponse::new(200, self.definition.to_string()));
    }
    if request.url.starts_with(&format!("{}/api/v1/execute", BASE_URL)) {
      self.executions.lock().await.push(request);
      let queued = self.replies.lock().await.pop_front();
      return Ok(queued.unwrap_or_else(|| self.default_reply.clone()));
    }
    Err(ClientError::Transport {
      message: format!("unexpected request to {}", request.url),
    })
  }
}

pub fn definition() -> Value {
  json!({
    "id": "flow-summarize",
    "name": "Summarize",
    "description": "Summarizes text",
    "url": FLOW_URL,
    "inputDefinitions": [
      { "name": "text", "description": "Text to summarize", "type": "string" },
      { "name": "title", "description": "Title of the note", "type": "string" },
      { "name": "image", "description": "An image", "type": "binary/base64" }
    ],
    "outputDefinitions": [{ "name": "summary", "description": "The summary" }]
  })
}

/// A configuration for the summarize flow with the given parts.
pub fn configuration(id: &str, inputs: Value, actions: Value, triggers: Option<Value>) -> Value {
  let mut configuration = json!({
    "flow": FLOW_URL,
    "command": { "id": id, "name": format!("Command {}", id), "description": "" },
    "inputConfigurations": inputs,
    "resultActions": actions
  });
  if let Some(triggers) = triggers {
    configuration["triggers"] = triggers;
  }
  configuration
}

pub struct Harness {
  pub engine: Engine,
  pub ui: Arc<FakeUi>,
  pub server: Arc<FakeServer>,
  pub workspace: Arc<MemoryWorkspace>,
  pub backend: Arc<MemorySettingsBackend>,
}

pub struct HarnessBuilder {
  configurations: Vec<Value>,
  api_key: Option<String>,
  reply: Value,
  notifier: Option<Arc<dyn ExecutionNotifier>>,
}

impl HarnessBuilder {
  pub fn new() -> Self {
    Self {
      configurations: Vec::new(),
      api_key: Some("test-key".to_string()),
      reply: json!({ "constants": { "summary": "hello" } }),
      notifier: None,
    }
  }

  pub fn configuration(mut self, configuration: Value) -> Self {
    self.configurations.push(configuration);
    self
  }

  pub fn without_api_key(mut self) -> Self {
    self.api_key = None;
    self
  }

  pub fn reply(mut self, reply: Value) -> Self {
    self.reply = reply;
    self
  }

  pub fn notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = Some(notifier);
    self
  }

  pub async fn build(self) -> Harness {
    let mut settings = Settings::default();
    settings.base_url = BASE_URL.to_string();
    settings.api_key = self.api_key;
    settings.flow_configurations = self
      .configurations
      .into_iter()
      .map(|c| serde_json::from_value(c).unwrap())
      .collect();

    let backend = Arc::new(MemorySettingsBackend::new());
    let store = Arc::new(SettingsStore::with_settings(backend.clone(), settings));
    let server = FakeServer::new(self.reply);
    let client = FlowClient::new(server.clone());
    let workspace = Arc::new(MemoryWorkspace::new("Test Vault"));
    let ui = Arc::new(FakeUi::default());

    let engine = match self.notifier {
      Some(notifier) => Engine::with_notifier(store, client, workspace.clone(), ui.clone(), notifier),
      None => Engine::new(store, client, workspace.clone(), ui.clone()),
    };
    engine.apply_settings().await;

    Harness {
      engine,
      ui,
      server,
      workspace,
      backend,
    }
  }
}
