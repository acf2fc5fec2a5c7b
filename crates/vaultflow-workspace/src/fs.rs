use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::WorkspaceError;
use crate::file::{WorkspaceFile, normalize};
use crate::metadata::parse_front_matter;
use crate::Workspace;

/// A workspace backed by a directory on disk.
///
/// There is no editor, so the active file is whatever the host sets with
/// [`FsWorkspace::set_active_file`] and the cursor sits at the end of it:
/// `replace_selection` appends to the active file.
pub struct FsWorkspace {
  root: PathBuf,
  name: String,
  active: RwLock<Option<WorkspaceFile>>,
}

impl FsWorkspace {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    let name = root
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| "workspace".to_string());
    Self {
      root,
      name,
      active: RwLock::new(None),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Set (or clear) the active document.
  pub async fn set_active_file(&self, path: Option<&str>) -> Result<(), WorkspaceError> {
    let file = match path {
      Some(path) => Some(
        self
          .file(path)
          .await?
          .ok_or_else(|| WorkspaceError::NotFound {
            path: path.to_string(),
          })?,
      ),
      None => None,
    };
    *self.active.write().await = file;
    Ok(())
  }

  fn resolve(&self, path: &str) -> Result<(String, PathBuf), WorkspaceError> {
    let relative = normalize(path)?;
    let full = relative
      .split('/')
      .fold(self.root.clone(), |acc, segment| acc.join(segment));
    Ok((relative, full))
  }

  async fn collect(&self, dir: PathBuf, prefix: String, files: &mut Vec<WorkspaceFile>) -> Result<(), WorkspaceError> {
    let mut pending = vec![(dir, prefix)];

    while let Some((dir, prefix)) = pending.pop() {
      let mut entries = tokio::fs::read_dir(&dir)
        .await
        .map_err(|e| WorkspaceError::io(&prefix, e))?;

      while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| WorkspaceError::io(&prefix, e))?
      {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
          continue;
        }
        let relative = if prefix.is_empty() {
          name
        } else {
          format!("{}/{}", prefix, name)
        };

        let file_type = entry
          .file_type()
          .await
          .map_err(|e| WorkspaceError::io(&relative, e))?;
        if file_type.is_dir() {
          pending.push((entry.path(), relative));
        } else if file_type.is_file() {
          files.push(WorkspaceFile::from_path(&relative)?);
        }
      }
    }

    Ok(())
  }
}

#[async_trait]
impl Workspace for FsWorkspace {
  fn name(&self) -> String {
    self.name.clone()
  }

  async fn active_file(&self) -> Option<WorkspaceFile> {
    self.active.read().await.clone()
  }

  async fn file(&self, path: &str) -> Result<Option<WorkspaceFile>, WorkspaceError> {
    let (relative, full) = self.resolve(path)?;
    match tokio::fs::metadata(&full).await {
      Ok(meta) if meta.is_file() => Ok(Some(WorkspaceFile::from_path(&relative)?)),
      Ok(_) => Ok(None),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(WorkspaceError::io(&relative, e)),
    }
  }

  async fn list_files(&self) -> Result<Vec<WorkspaceFile>, WorkspaceError> {
    let mut files = Vec::new();
    self.collect(self.root.clone(), String::new(), &mut files).await?;
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
  }

  async fn read(&self, file: &WorkspaceFile) -> Result<String, WorkspaceError> {
    let bytes = self.read_binary(file).await?;
    String::from_utf8(bytes).map_err(|_| WorkspaceError::NotText {
      path: file.path.clone(),
    })
  }

  async fn read_binary(&self, file: &WorkspaceFile) -> Result<Vec<u8>, WorkspaceError> {
    let (relative, full) = self.resolve(&file.path)?;
    tokio::fs::read(&full)
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))
  }

  async fn metadata(&self, file: &WorkspaceFile) -> Result<Option<serde_json::Value>, WorkspaceError> {
    match self.read(file).await {
      Ok(content) => Ok(parse_front_matter(&content)),
      Err(WorkspaceError::NotText { .. }) => Ok(None),
      Err(e) => Err(e),
    }
  }

  async fn exists(&self, path: &str) -> Result<bool, WorkspaceError> {
    let (relative, full) = self.resolve(path)?;
    tokio::fs::try_exists(&full)
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))
  }

  async fn create(&self, path: &str, content: &str) -> Result<WorkspaceFile, WorkspaceError> {
    let (relative, full) = self.resolve(path)?;

    if let Some(parent) = full.parent() {
      tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| WorkspaceError::io(&relative, e))?;
    }

    let mut handle = tokio::fs::OpenOptions::new()
      .write(true)
      .create_new(true)
      .open(&full)
      .await
      .map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
          WorkspaceError::AlreadyExists {
            path: relative.clone(),
          }
        } else {
          WorkspaceError::io(&relative, e)
        }
      })?;
    handle
      .write_all(content.as_bytes())
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))?;
    handle
      .flush()
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))?;

    debug!(path = %relative, bytes = content.len(), "created file");
    WorkspaceFile::from_path(&relative)
  }

  async fn modify(&self, file: &WorkspaceFile, content: &str) -> Result<(), WorkspaceError> {
    let (relative, full) = self.resolve(&file.path)?;
    if !tokio::fs::try_exists(&full)
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))?
    {
      return Err(WorkspaceError::NotFound { path: relative });
    }
    tokio::fs::write(&full, content)
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))?;
    debug!(path = %relative, bytes = content.len(), "modified file");
    Ok(())
  }

  async fn append(&self, file: &WorkspaceFile, content: &str) -> Result<(), WorkspaceError> {
    let (relative, full) = self.resolve(&file.path)?;
    let mut handle = tokio::fs::OpenOptions::new()
      .append(true)
      .open(&full)
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))?;
    handle
      .write_all(content.as_bytes())
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))?;
    handle
      .flush()
      .await
      .map_err(|e| WorkspaceError::io(&relative, e))?;
    debug!(path = %relative, bytes = content.len(), "appended to file");
    Ok(())
  }

  async fn replace_selection(&self, text: &str) -> Result<bool, WorkspaceError> {
    let Some(active) = self.active_file().await else {
      return Ok(false);
    };
    self.append(&active, text).await?;
    Ok(true)
  }
}
