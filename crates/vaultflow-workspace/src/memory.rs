use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::WorkspaceError;
use crate::file::{WorkspaceFile, normalize};
use crate::metadata::parse_front_matter;
use crate::Workspace;

#[derive(Default)]
struct State {
  files: BTreeMap<String, Vec<u8>>,
  active: Option<String>,
  has_editor: bool,
  selections: Vec<String>,
}

/// An in-memory workspace.
///
/// The active file is open in an editor unless [`MemoryWorkspace::close_editor`]
/// was called; text sent to `replace_selection` is recorded and can be read
/// back with [`MemoryWorkspace::selections`].
pub struct MemoryWorkspace {
  name: String,
  state: RwLock<State>,
}

impl MemoryWorkspace {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      state: RwLock::new(State::default()),
    }
  }

  /// Insert or replace a file.
  pub async fn insert(&self, path: &str, content: impl Into<Vec<u8>>) -> Result<WorkspaceFile, WorkspaceError> {
    let path = normalize(path)?;
    self.state.write().await.files.insert(path.clone(), content.into());
    WorkspaceFile::from_path(&path)
  }

  /// Mark `path` as the active document, opened in an editor.
  pub async fn open(&self, path: &str) -> Result<(), WorkspaceError> {
    let path = normalize(path)?;
    let mut state = self.state.write().await;
    if !state.files.contains_key(&path) {
      return Err(WorkspaceError::NotFound { path });
    }
    state.active = Some(path);
    state.has_editor = true;
    Ok(())
  }

  /// Keep the active file but drop the editor (e.g. an image preview).
  pub async fn close_editor(&self) {
    self.state.write().await.has_editor = false;
  }

  /// Current content of `path` as text, if present.
  pub async fn contents(&self, path: &str) -> Option<String> {
    let path = normalize(path).ok()?;
    let state = self.state.read().await;
    state
      .files
      .get(&path)
      .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
  }

  /// Every text passed to `replace_selection`, in order.
  pub async fn selections(&self) -> Vec<String> {
    self.state.read().await.selections.clone()
  }

  async fn bytes(&self, path: &str) -> Result<Vec<u8>, WorkspaceError> {
    let state = self.state.read().await;
    state
      .files
      .get(path)
      .cloned()
      .ok_or_else(|| WorkspaceError::NotFound {
        path: path.to_string(),
      })
  }
}

#[async_trait]
impl Workspace for MemoryWorkspace {
  fn name(&self) -> String {
    self.name.clone()
  }

  async fn active_file(&self) -> Option<WorkspaceFile> {
    let state = self.state.read().await;
    let path = state.active.as_ref()?;
    WorkspaceFile::from_path(path).ok()
  }

  async fn file(&self, path: &str) -> Result<Option<WorkspaceFile>, WorkspaceError> {
    let path = normalize(path)?;
    if self.state.read().await.files.contains_key(&path) {
      Ok(Some(WorkspaceFile::from_path(&path)?))
    } else {
      Ok(None)
    }
  }

  async fn list_files(&self) -> Result<Vec<WorkspaceFile>, WorkspaceError> {
    let state = self.state.read().await;
    state
      .files
      .keys()
      .map(|path| WorkspaceFile::from_path(path))
      .collect()
  }

  async fn read(&self, file: &WorkspaceFile) -> Result<String, WorkspaceError> {
    String::from_utf8(self.bytes(&file.path).await?).map_err(|_| WorkspaceError::NotText {
      path: file.path.clone(),
    })
  }

  async fn read_binary(&self, file: &WorkspaceFile) -> Result<Vec<u8>, WorkspaceError> {
    self.bytes(&file.path).await
  }

  async fn metadata(&self, file: &WorkspaceFile) -> Result<Option<serde_json::Value>, WorkspaceError> {
    match self.read(file).await {
      Ok(content) => Ok(parse_front_matter(&content)),
      Err(WorkspaceError::NotText { .. }) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn exists(&self, path: &str) -> Result<bool, WorkspaceError> {
    let path = normalize(path)?;
    let state = self.state.read().await;
    let folder = format!("{}/", path);
    Ok(state.files.contains_key(&path) || state.files.keys().any(|p| p.starts_with(&folder)))
  }

  async fn create(&self, path: &str, content: &str) -> Result<WorkspaceFile, WorkspaceError> {
    let path = normalize(path)?;
    let mut state = self.state.write().await;
    if state.files.contains_key(&path) {
      return Err(WorkspaceError::AlreadyExists { path });
    }
    state.files.insert(path.clone(), content.as_bytes().to_vec());
    WorkspaceFile::from_path(&path)
  }

  async fn modify(&self, file: &WorkspaceFile, content: &str) -> Result<(), WorkspaceError> {
    let mut state = self.state.write().await;
    match state.files.get_mut(&file.path) {
      Some(bytes) => {
        *bytes = content.as_bytes().to_vec();
        Ok(())
      }
      None => Err(WorkspaceError::NotFound {
        path: file.path.clone(),
      }),
    }
  }

  async fn append(&self, file: &WorkspaceFile, content: &str) -> Result<(), WorkspaceError> {
    let mut state = self.state.write().await;
    match state.files.get_mut(&file.path) {
      Some(bytes) => {
        bytes.extend_from_slice(content.as_bytes());
        Ok(())
      }
      None => Err(WorkspaceError::NotFound {
        path: file.path.clone(),
      }),
    }
  }

  async fn replace_selection(&self, text: &str) -> Result<bool, WorkspaceError> {
    let mut state = self.state.write().await;
    if state.active.is_none() || !state.has_editor {
      return Ok(false);
    }
    state.selections.push(text.to_string());
    Ok(true)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_open_requires_existing_file() {
    let workspace = MemoryWorkspace::new("vault");
    assert!(matches!(
      workspace.open("missing.md").await,
      Err(WorkspaceError::NotFound { .. })
    ));
  }

  #[tokio::test]
  async fn test_exists_covers_folders() {
    let workspace = MemoryWorkspace::new("vault");
    workspace.insert("notes/demo.md", "x").await.unwrap();
    assert!(workspace.exists("notes").await.unwrap());
    assert!(workspace.exists("notes/demo.md").await.unwrap());
    assert!(!workspace.exists("note").await.unwrap());
  }

  #[tokio::test]
  async fn test_selection_needs_an_editor() {
    let workspace = MemoryWorkspace::new("vault");
    workspace.insert("a.md", "x").await.unwrap();
    assert!(!workspace.replace_selection("nope").await.unwrap());

    workspace.open("a.md").await.unwrap();
    assert!(workspace.replace_selection("one").await.unwrap());

    workspace.close_editor().await;
    assert!(!workspace.replace_selection("two").await.unwrap());
    assert_eq!(workspace.selections().await, vec!["one".to_string()]);
  }
}
