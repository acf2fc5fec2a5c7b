//! Vaultflow Store
//!
//! This crate owns the process-wide [`Settings`] state:
//!
//! - [`SettingsBackend`] persists the settings document ([`FsSettingsBackend`]
//!   writes a JSON file, [`MemorySettingsBackend`] keeps it in memory).
//! - [`SettingsStore`] loads the document once and hands out copies. Every
//!   mutation replaces the whole value and persists it immediately
//!   (last writer wins).
//! - [`FlowDefinitionCache`] resolves flow definitions from the cached list
//!   in the settings, fetching and persisting on a miss.
//! - [`add_configuration_from_url`] and [`connect_account`] import
//!   configurations from the flow server.
//!
//! [`Settings`]: vaultflow_config::Settings

mod backend;
mod cache;
mod error;
mod import;
mod settings;

pub use backend::{FsSettingsBackend, MemorySettingsBackend, SettingsBackend};
pub use cache::FlowDefinitionCache;
pub use error::StoreError;
pub use import::{add_configuration_from_url, connect_account};
pub use settings::SettingsStore;
