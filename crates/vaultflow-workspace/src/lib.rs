//! Vaultflow Workspace
//!
//! The document workspace is the host-side collaborator the engine reads
//! inputs from and writes results into. The engine only depends on the
//! [`Workspace`] trait; two implementations ship here:
//!
//! - [`FsWorkspace`] maps workspace paths onto a directory on disk.
//! - [`MemoryWorkspace`] keeps everything in memory, for tests and embedding.
//!
//! Workspace paths are relative, `/`-separated and never escape the root.

mod error;
mod file;
mod fs;
mod memory;
mod metadata;

pub use error::WorkspaceError;
pub use file::WorkspaceFile;
pub use fs::FsWorkspace;
pub use memory::MemoryWorkspace;
pub use metadata::parse_front_matter;

use async_trait::async_trait;

/// Operations the engine needs from the document workspace.
#[async_trait]
pub trait Workspace: Send + Sync {
  /// Display name of the workspace (the vault name).
  fn name(&self) -> String;

  /// The document currently open in the editor, if any.
  async fn active_file(&self) -> Option<WorkspaceFile>;

  /// Look up an existing file. Returns `None` when nothing exists at `path`.
  async fn file(&self, path: &str) -> Result<Option<WorkspaceFile>, WorkspaceError>;

  /// All files in the workspace, sorted by path.
  async fn list_files(&self) -> Result<Vec<WorkspaceFile>, WorkspaceError>;

  /// Read a file as UTF-8 text.
  async fn read(&self, file: &WorkspaceFile) -> Result<String, WorkspaceError>;

  /// Read a file's raw bytes.
  async fn read_binary(&self, file: &WorkspaceFile) -> Result<Vec<u8>, WorkspaceError>;

  /// Metadata for a file (front matter for text documents), or `None`.
  async fn metadata(&self, file: &WorkspaceFile) -> Result<Option<serde_json::Value>, WorkspaceError>;

  /// Whether anything exists at `path`.
  async fn exists(&self, path: &str) -> Result<bool, WorkspaceError>;

  /// Create a new file. Fails if the path already exists.
  async fn create(&self, path: &str, content: &str) -> Result<WorkspaceFile, WorkspaceError>;

  /// Overwrite an existing file.
  async fn modify(&self, file: &WorkspaceFile, content: &str) -> Result<(), WorkspaceError>;

  /// Append to an existing file.
  async fn append(&self, file: &WorkspaceFile, content: &str) -> Result<(), WorkspaceError>;

  /// Replace the editor selection with `text`.
  ///
  /// Returns `false` when there is no active editor.
  async fn replace_selection(&self, text: &str) -> Result<bool, WorkspaceError>;
}
