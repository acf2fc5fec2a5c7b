use async_trait::async_trait;
use reqwest::{Client, Method};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
  Get,
  Post,
}

/// An outgoing request. Bodies are always JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
  pub method: HttpMethod,
  pub url: String,
  pub headers: Vec<(String, String)>,
  pub body: Option<serde_json::Value>,
}

impl HttpRequest {
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method: HttpMethod::Get,
      url: url.into(),
      headers: Vec::new(),
      body: None,
    }
  }

  pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
    Self {
      method: HttpMethod::Post,
      url: url.into(),
      headers: Vec::new(),
      body: Some(body),
    }
  }

  pub fn bearer(mut self, token: &str) -> Self {
    self
      .headers
      .push(("authorization".to_string(), format!("Bearer {}", token)));
    self
  }

  /// Value of a header, matched case-insensitively.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .iter()
      .find(|(key, _)| key.eq_ignore_ascii_case(name))
      .map(|(_, value)| value.as_str())
  }
}

/// A response as seen by the client: status code and raw body text.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
  pub status: u16,
  pub body: String,
}

impl HttpResponse {
  pub fn new(status: u16, body: impl Into<String>) -> Self {
    Self {
      status,
      body: body.into(),
    }
  }
}

/// Sends HTTP requests.
///
/// Non-2xx statuses are responses, not errors. `Err` is reserved for
/// requests that produced no response at all.
#[async_trait]
pub trait HttpTransport: Send + Sync {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError>;
}

/// [`HttpTransport`] over a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
  client: Client,
}

impl ReqwestTransport {
  pub fn new(client: Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
    let method = match request.method {
      HttpMethod::Get => Method::GET,
      HttpMethod::Post => Method::POST,
    };

    let mut builder = self.client.request(method, &request.url);

    for (key, value) in &request.headers {
      builder = builder.header(key, value);
    }

    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    let response = builder.send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;

    Ok(HttpResponse { status, body })
  }
}
