use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;

/// Where the settings document lives.
#[async_trait]
pub trait SettingsBackend: Send + Sync {
  /// Read the stored document. `None` when nothing was saved yet.
  async fn load(&self) -> Result<Option<Value>, StoreError>;

  /// Replace the stored document.
  async fn save(&self, document: &Value) -> Result<(), StoreError>;
}

/// Settings stored as a pretty-printed JSON file.
///
/// Writes go to a sibling temp file that is then renamed over the target,
/// so a crash never leaves a half-written document behind.
#[derive(Debug, Clone)]
pub struct FsSettingsBackend {
  path: PathBuf,
}

impl FsSettingsBackend {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn display(&self) -> String {
    self.path.display().to_string()
  }

  fn io(&self, source: std::io::Error) -> StoreError {
    StoreError::Io {
      path: self.display(),
      source,
    }
  }
}

#[async_trait]
impl SettingsBackend for FsSettingsBackend {
  async fn load(&self) -> Result<Option<Value>, StoreError> {
    let raw = match tokio::fs::read_to_string(&self.path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(self.io(e)),
    };

    if raw.trim().is_empty() {
      return Ok(None);
    }

    serde_json::from_str(&raw)
      .map(Some)
      .map_err(|source| StoreError::Decode {
        path: self.display(),
        source,
      })
  }

  async fn save(&self, document: &Value) -> Result<(), StoreError> {
    if let Some(parent) = self.path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| self.io(e))?;
    }

    let encoded = serde_json::to_string_pretty(document)?;
    let mut tmp = self.path.clone().into_os_string();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, encoded.as_bytes())
      .await
      .map_err(|e| self.io(e))?;
    tokio::fs::rename(&tmp, &self.path)
      .await
      .map_err(|e| self.io(e))?;

    debug!(path = %self.display(), bytes = encoded.len(), "saved settings");
    Ok(())
  }
}

/// Settings kept in memory. Counts saves so tests can assert persistence.
#[derive(Debug, Default)]
pub struct MemorySettingsBackend {
  document: Mutex<Option<Value>>,
  saves: AtomicUsize,
}

impl MemorySettingsBackend {
  pub fn new() -> Self {
    Self::default()
  }

  /// Start from an existing document.
  pub fn with_document(document: Value) -> Self {
    Self {
      document: Mutex::new(Some(document)),
      saves: AtomicUsize::new(0),
    }
  }

  /// The last saved (or initial) document.
  pub async fn document(&self) -> Option<Value> {
    self.document.lock().await.clone()
  }

  pub fn save_count(&self) -> usize {
    self.saves.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl SettingsBackend for MemorySettingsBackend {
  async fn load(&self) -> Result<Option<Value>, StoreError> {
    Ok(self.document.lock().await.clone())
  }

  async fn save(&self, document: &Value) -> Result<(), StoreError> {
    *self.document.lock().await = Some(document.clone());
    self.saves.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}
