//! Vaultflow Client
//!
//! Talks to the flow server:
//!
//! - [`FlowClient::execute`] posts a resolved [`FlowInput`] to the flow
//!   endpoint and classifies the reply into an [`ApiResponse`]. Failures
//!   never surface as `Err`; they become entries in `errors`.
//! - [`FlowClient::fetch_flow_definition`] and
//!   [`FlowClient::fetch_configuration`] download and validate documents.
//! - [`FlowClient::list_commands`] lists configuration URLs for an account.
//!
//! All traffic goes through the [`HttpTransport`] trait so that tests can
//! substitute a fake server.
//!
//! [`FlowInput`]: vaultflow_config::FlowInput
//! [`ApiResponse`]: vaultflow_config::ApiResponse

mod client;
mod error;
mod transport;

pub use client::{COMMANDS_PATH, EXECUTE_PATH, FlowClient, MISSING_API_KEY, NO_RESPONSE, UNAUTHORIZED};
pub use error::ClientError;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
