use crate::error::WorkspaceError;

/// A file inside the workspace, identified by its relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkspaceFile {
  /// Relative, `/`-separated path (`notes/demo.md`).
  pub path: String,
  /// File name without its extension (`demo`).
  pub basename: String,
  /// Extension without the dot, empty when there is none (`md`).
  pub extension: String,
  /// Path of the containing folder. Top-level files live in `/`.
  pub parent: Option<String>,
}

impl WorkspaceFile {
  /// Build a file handle from a workspace path, normalizing separators.
  pub fn from_path(path: &str) -> Result<Self, WorkspaceError> {
    let path = normalize(path)?;

    let (parent, name) = match path.rsplit_once('/') {
      Some((parent, name)) => (parent.to_string(), name),
      None => ("/".to_string(), path.as_str()),
    };

    let (basename, extension) = match name.rsplit_once('.') {
      Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), ext.to_string()),
      _ => (name.to_string(), String::new()),
    };

    Ok(Self {
      basename,
      extension,
      parent: Some(parent),
      path,
    })
  }
}

/// Normalize a workspace path: `\` becomes `/`, `.` segments and empty
/// segments are dropped. Absolute paths and `..` are rejected.
pub(crate) fn normalize(path: &str) -> Result<String, WorkspaceError> {
  let outside = || WorkspaceError::OutsideWorkspace {
    path: path.to_string(),
  };

  let unified = path.replace('\\', "/");
  if unified.starts_with('/') || has_drive_prefix(&unified) {
    return Err(outside());
  }

  let mut segments = Vec::new();
  for segment in unified.split('/') {
    match segment {
      "" | "." => continue,
      ".." => return Err(outside()),
      s => segments.push(s),
    }
  }

  if segments.is_empty() {
    return Err(outside());
  }
  Ok(segments.join("/"))
}

/// `C:` or `C:/...`; a name such as `1:1 notes.md` is not a drive.
fn has_drive_prefix(path: &str) -> bool {
  let mut chars = path.chars();
  match (chars.next(), chars.next(), chars.next()) {
    (Some(letter), Some(':'), None | Some('/')) => letter.is_ascii_alphabetic(),
    _ => false,
  }
}
