use serde_json::json;
use vaultflow_workspace::{FsWorkspace, Workspace, WorkspaceError};

#[tokio::test]
async fn test_create_modify_append() {
  let dir = tempfile::tempdir().unwrap();
  let workspace = FsWorkspace::new(dir.path());

  assert!(!workspace.exists("notes/demo.md").await.unwrap());
  let file = workspace.create("notes/demo.md", "first").await.unwrap();
  assert_eq!(file.path, "notes/demo.md");
  assert!(workspace.exists("notes/demo.md").await.unwrap());

  workspace.append(&file, "\nsecond").await.unwrap();
  assert_eq!(workspace.read(&file).await.unwrap(), "first\nsecond");

  workspace.modify(&file, "replaced").await.unwrap();
  assert_eq!(
    std::fs::read_to_string(dir.path().join("notes/demo.md")).unwrap(),
    "replaced"
  );

  assert!(matches!(
    workspace.create("notes/demo.md", "again").await,
    Err(WorkspaceError::AlreadyExists { .. })
  ));
}

#[tokio::test]
async fn test_list_files_skips_hidden_entries() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::create_dir_all(dir.path().join("scans")).unwrap();
  std::fs::create_dir_all(dir.path().join(".trash")).unwrap();
  std::fs::write(dir.path().join("index.md"), "# Index").unwrap();
  std::fs::write(dir.path().join("scans/receipt.png"), [0x89, 0x50]).unwrap();
  std::fs::write(dir.path().join(".trash/old.md"), "gone").unwrap();

  let workspace = FsWorkspace::new(dir.path());
  let paths: Vec<String> = workspace
    .list_files()
    .await
    .unwrap()
    .into_iter()
    .map(|f| f.path)
    .collect();

  assert_eq!(paths, vec!["index.md", "scans/receipt.png"]);
}

#[tokio::test]
async fn test_binary_and_metadata() {
  let dir = tempfile::tempdir().unwrap();
  let bytes = vec![0u8, 159, 146, 150, 255];
  std::fs::write(dir.path().join("blob.bin"), &bytes).unwrap();
  std::fs::write(dir.path().join("note.md"), "---\ntags: [ocr]\n---\nbody").unwrap();

  let workspace = FsWorkspace::new(dir.path());
  let blob = workspace.file("blob.bin").await.unwrap().unwrap();
  assert_eq!(workspace.read_binary(&blob).await.unwrap(), bytes);
  assert!(matches!(
    workspace.read(&blob).await,
    Err(WorkspaceError::NotText { .. })
  ));
  assert_eq!(workspace.metadata(&blob).await.unwrap(), None);

  let note = workspace.file("note.md").await.unwrap().unwrap();
  assert_eq!(
    workspace.metadata(&note).await.unwrap(),
    Some(json!({ "frontmatter": { "tags": ["ocr"] } }))
  );
}

#[tokio::test]
async fn test_active_file_and_selection() {
  let dir = tempfile::tempdir().unwrap();
  std::fs::write(dir.path().join("today.md"), "Line").unwrap();

  let workspace = FsWorkspace::new(dir.path());
  assert!(workspace.active_file().await.is_none());
  assert!(workspace.file("missing.md").await.unwrap().is_none());
  assert!(workspace.set_active_file(Some("missing.md")).await.is_err());

  workspace.set_active_file(Some("today.md")).await.unwrap();
  let active = workspace.active_file().await.unwrap();
  assert_eq!(active.basename, "today");

  assert!(workspace.replace_selection(" appended").await.unwrap());
  assert_eq!(workspace.read(&active).await.unwrap(), "Line appended");
}
