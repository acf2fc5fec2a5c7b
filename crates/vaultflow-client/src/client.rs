use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;
use vaultflow_config::{
  ApiResponse, FlowConfiguration, FlowDefinition, FlowInput, parse_api_response,
  parse_flow_configuration, parse_flow_definition,
};

use crate::error::ClientError;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

pub const EXECUTE_PATH: &str = "/api/v1/execute";
pub const COMMANDS_PATH: &str = "/integrations/obsidian/commands";

pub const UNAUTHORIZED: &str = "Unauthorized";
pub const NO_RESPONSE: &str = "No Response";
pub const MISSING_API_KEY: &str = "Missing API key";

/// Client for the flow server.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct FlowClient {
  transport: Arc<dyn HttpTransport>,
}

impl Default for FlowClient {
  fn default() -> Self {
    Self::new(Arc::new(ReqwestTransport::default()))
  }
}

impl FlowClient {
  pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
    Self { transport }
  }

  /// `{base_url}/api/v1/execute?id={flow_url}`
  pub fn execute_url(base_url: &str, flow_url: &str) -> Result<Url, ClientError> {
    let mut url = join(base_url, EXECUTE_PATH)?;
    url.query_pairs_mut().append_pair("id", flow_url);
    Ok(url)
  }

  /// Execute a flow once.
  ///
  /// Every outcome is folded into the returned response: `401` becomes
  /// `["Unauthorized"]`, other statuses become `["{status} {body}"]`,
  /// transport failures carry their message and a `200` whose body is not
  /// a valid response becomes `["No Response"]`. Without an API key nothing
  /// is sent and the response is `["Missing API key"]`. There are no retries.
  #[instrument(name = "execute_flow", skip(self, input, api_key), fields(flow = %flow_url))]
  pub async fn execute(
    &self,
    input: &FlowInput,
    flow_url: &str,
    api_key: Option<&str>,
    base_url: &str,
  ) -> ApiResponse {
    let Some(api_key) = api_key.filter(|key| !key.is_empty()) else {
      warn!("no api key configured, not calling the flow server");
      return ApiResponse::error(MISSING_API_KEY);
    };

    let url = match Self::execute_url(base_url, flow_url) {
      Ok(url) => url,
      Err(e) => return ApiResponse::error(e.to_string()),
    };

    let body = match serde_json::to_value(input) {
      Ok(body) => body,
      Err(e) => return ApiResponse::error(e.to_string()),
    };

    let request = HttpRequest::post(url.as_str(), body).bearer(api_key);
    let response = match self.transport.send(request).await {
      Ok(response) => response,
      Err(e) => {
        warn!(error = %e, "flow request failed");
        return ApiResponse::error(e.to_string());
      }
    };

    info!(status = response.status, "flow responded");
    classify(response)
  }

  /// Download and validate a flow definition.
  #[instrument(name = "fetch_flow_definition", skip(self))]
  pub async fn fetch_flow_definition(&self, url: &str) -> Result<FlowDefinition, ClientError> {
    let document = self.get_json(HttpRequest::get(url)).await?;
    Ok(parse_flow_definition(&document)?)
  }

  /// Download and validate a flow configuration.
  #[instrument(name = "fetch_configuration", skip(self))]
  pub async fn fetch_configuration(&self, url: &str) -> Result<FlowConfiguration, ClientError> {
    let document = self.get_json(HttpRequest::get(url)).await?;
    Ok(parse_flow_configuration(&document)?)
  }

  /// Configuration URLs published for the account behind `api_key`.
  ///
  /// Any failure yields an empty list.
  #[instrument(name = "list_commands", skip(self, api_key))]
  pub async fn list_commands(&self, base_url: &str, api_key: &str) -> Vec<String> {
    let url = match join(base_url, COMMANDS_PATH) {
      Ok(url) => url,
      Err(e) => {
        warn!(error = %e, "cannot build command list url");
        return Vec::new();
      }
    };

    let document = match self.get_json(HttpRequest::get(url.as_str()).bearer(api_key)).await {
      Ok(document) => document,
      Err(e) => {
        warn!(error = %e, "failed to list commands");
        return Vec::new();
      }
    };

    match serde_json::from_value::<Vec<String>>(document) {
      Ok(urls) => {
        debug!(count = urls.len(), "listed commands");
        urls
      }
      Err(e) => {
        warn!(error = %e, "command list is not an array of urls");
        Vec::new()
      }
    }
  }

  async fn get_json(&self, request: HttpRequest) -> Result<Value, ClientError> {
    let url = request.url.clone();
    let response = self.transport.send(request).await?;
    if response.status != 200 {
      return Err(ClientError::Status {
        url,
        status: response.status,
      });
    }
    serde_json::from_str(&response.body).map_err(|source| ClientError::Decode { url, source })
  }
}

fn join(base_url: &str, path: &str) -> Result<Url, ClientError> {
  Url::parse(base_url)
    .and_then(|base| base.join(path))
    .map_err(|source| ClientError::InvalidUrl {
      url: base_url.to_string(),
      source,
    })
}

fn classify(response: HttpResponse) -> ApiResponse {
  match response.status {
    200 => {
      let parsed = serde_json::from_str::<Value>(&response.body)
        .map_err(|e| e.to_string())
        .and_then(|document| parse_api_response(&document).map_err(|e| e.to_string()));
      match parsed {
        Ok(result) => result,
        Err(e) => {
          warn!(error = %e, "flow returned an invalid response body");
          ApiResponse::error(NO_RESPONSE)
        }
      }
    }
    401 => ApiResponse::error(UNAUTHORIZED),
    status => ApiResponse::error(format!("{} {}", status, response.body)),
  }
}
