use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use vaultflow_client::{
  ClientError, FlowClient, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MISSING_API_KEY,
};
use vaultflow_config::{ApiResponse, FlowInput, SchemaError};

/// Replays canned responses and records every request.
#[derive(Default)]
struct FakeTransport {
  responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
  requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
  fn replying(responses: Vec<Result<HttpResponse, String>>) -> Arc<Self> {
    Arc::new(Self {
      responses: Mutex::new(responses.into()),
      requests: Mutex::new(Vec::new()),
    })
  }

  async fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().await.clone()
  }
}

#[async_trait]
impl HttpTransport for FakeTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
    self.requests.lock().await.push(request);
    match self.responses.lock().await.pop_front() {
      Some(Ok(response)) => Ok(response),
      Some(Err(message)) => Err(ClientError::Transport { message }),
      None => Err(ClientError::Transport {
        message: "no response queued".to_string(),
      }),
    }
  }
}

fn input() -> FlowInput {
  let mut input = FlowInput::default();
  input.constants.insert("text".to_string(), "hello".to_string());
  input
}

#[tokio::test]
async fn test_execute_sends_bearer_post() {
  let transport = FakeTransport::replying(vec![Ok(HttpResponse::new(
    200,
    r#"{"constants":{"summary":"hi"}}"#,
  ))]);
  let client = FlowClient::new(transport.clone());

  let response = client
    .execute(&input(), "https://flows.example/sum", Some("key-1"), "https://app.taskbone.com")
    .await;
  assert_eq!(response.property("summary"), Some(&json!("hi")));

  let requests = transport.requests().await;
  assert_eq!(requests.len(), 1);
  assert_eq!(requests[0].method, HttpMethod::Post);
  assert_eq!(
    requests[0].url,
    "https://app.taskbone.com/api/v1/execute?id=https%3A%2F%2Fflows.example%2Fsum"
  );
  assert_eq!(requests[0].header("Authorization"), Some("Bearer key-1"));
  assert_eq!(
    requests[0].body,
    Some(json!({ "constants": { "text": "hello" }, "records": [] }))
  );
}

#[tokio::test]
async fn test_unauthorized_ignores_body() {
  let transport = FakeTransport::replying(vec![Ok(HttpResponse::new(
    401,
    r#"{"constants":{"summary":"should not leak"}}"#,
  ))]);
  let client = FlowClient::new(transport);

  let response = client
    .execute(&input(), "f", Some("bad"), "https://app.taskbone.com")
    .await;
  assert_eq!(
    serde_json::to_value(&response).unwrap(),
    json!({ "errors": ["Unauthorized"] })
  );
}

#[tokio::test]
async fn test_failures_fold_into_errors_without_retry() {
  let transport = FakeTransport::replying(vec![
    Ok(HttpResponse::new(500, "boom")),
    Err("connection refused".to_string()),
  ]);
  let client = FlowClient::new(transport.clone());

  let first = client.execute(&input(), "f", Some("k"), "https://h.example").await;
  assert_eq!(first.errors(), ["500 boom".to_string()]);

  let second = client.execute(&input(), "f", Some("k"), "https://h.example").await;
  assert_eq!(second.errors(), ["connection refused".to_string()]);

  assert_eq!(transport.requests().await.len(), 2);
}

#[tokio::test]
async fn test_missing_api_key_fails_fast() {
  let transport = FakeTransport::replying(vec![]);
  let client = FlowClient::new(transport.clone());

  for key in [None, Some("")] {
    let response = client.execute(&input(), "f", key, "https://h.example").await;
    assert_eq!(response, ApiResponse::error(MISSING_API_KEY));
  }
  assert!(transport.requests().await.is_empty());
}

#[tokio::test]
async fn test_fetch_flow_definition_validates() {
  let definition = json!({
    "id": "flow-1",
    "name": "Summarize",
    "description": "",
    "url": "https://flows.example/sum",
    "inputDefinitions": [{ "name": "text", "description": "Text", "type": "string" }],
    "outputDefinitions": [{ "name": "summary", "description": "Summary" }]
  });
  let mut broken = definition.clone();
  broken.as_object_mut().unwrap().remove("url");

  let transport = FakeTransport::replying(vec![
    Ok(HttpResponse::new(200, definition.to_string())),
    Ok(HttpResponse::new(200, broken.to_string())),
    Ok(HttpResponse::new(404, "missing")),
  ]);
  let client = FlowClient::new(transport.clone());

  let fetched = client
    .fetch_flow_definition("https://flows.example/sum")
    .await
    .unwrap();
  assert_eq!(fetched.input_definitions[0].name, "text");

  assert!(matches!(
    client.fetch_flow_definition("https://flows.example/sum").await,
    Err(ClientError::Schema(SchemaError::Invalid { .. }))
  ));
  assert!(matches!(
    client.fetch_flow_definition("https://flows.example/sum").await,
    Err(ClientError::Status { status: 404, .. })
  ));

  let requests = transport.requests().await;
  assert_eq!(requests[0].method, HttpMethod::Get);
  assert_eq!(requests[0].header("authorization"), None);
}

#[tokio::test]
async fn test_list_commands() {
  let transport = FakeTransport::replying(vec![
    Ok(HttpResponse::new(
      200,
      r#"["https://cfg.example/a.json","https://cfg.example/b.json"]"#,
    )),
    Ok(HttpResponse::new(200, r#"{"error":"nope"}"#)),
    Err("offline".to_string()),
  ]);
  let client = FlowClient::new(transport.clone());

  let urls = client.list_commands("https://app.taskbone.com", "key").await;
  assert_eq!(urls.len(), 2);
  assert!(client.list_commands("https://app.taskbone.com", "key").await.is_empty());
  assert!(client.list_commands("https://app.taskbone.com", "key").await.is_empty());

  let requests = transport.requests().await;
  assert_eq!(
    requests[0].url,
    "https://app.taskbone.com/integrations/obsidian/commands"
  );
  assert_eq!(requests[0].header("authorization"), Some("Bearer key"));
}
