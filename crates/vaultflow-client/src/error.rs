use thiserror::Error;
use vaultflow_config::SchemaError;

/// Errors raised while talking to the flow server.
#[derive(Debug, Error)]
pub enum ClientError {
  /// The request never produced a response (DNS, TLS, connection reset...).
  #[error("{message}")]
  Transport { message: String },

  #[error("invalid url '{url}': {source}")]
  InvalidUrl {
    url: String,
    #[source]
    source: url::ParseError,
  },

  #[error("unexpected status {status} from {url}")]
  Status { url: String, status: u16 },

  #[error("response from {url} is not JSON: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },

  #[error(transparent)]
  Schema(#[from] SchemaError),
}

impl From<reqwest::Error> for ClientError {
  fn from(e: reqwest::Error) -> Self {
    ClientError::Transport {
      message: e.to_string(),
    }
  }
}
