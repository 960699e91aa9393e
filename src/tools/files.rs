//! Local file tools.
//!
//! - `read_file`: reads a UTF-8 file (truncated if large).
//! - `list_files`: lists a directory as a JSON array, directories first.
//! - `edit_file`: string replacement edits, also used to create or append.
//!
//! Relative paths resolve against the tool root, normally the working
//! directory of the process.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{Tool, ToolRegistry};
use crate::error::{RegistryError, ToolError};
use crate::textutil::truncate_with_suffix_by_bytes;
use crate::types::{ToolArguments, ToolDefinition};

/// Maximum bytes returned when reading a file.
const MAX_READ_BYTES: usize = 100_000;

/// Register `read_file`, `list_files` and `edit_file` rooted at `root`.
pub fn register_file_tools(
    registry: &mut ToolRegistry,
    root: impl Into<PathBuf>,
) -> Result<(), RegistryError> {
    let root = root.into();
    registry.register(ReadFileTool::new(root.clone()))?;
    registry.register(ListFilesTool::new(root.clone()))?;
    registry.register(EditFileTool::new(root))?;
    Ok(())
}

fn parse_args<T: for<'de> Deserialize<'de>>(arguments: &ToolArguments) -> Result<T, ToolError> {
    serde_json::from_value(serde_json::Value::Object(arguments.clone()))
        .map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}

fn require_path(path: &str) -> Result<(), ToolError> {
    if path.is_empty() {
        return Err(ToolError::InvalidArguments("path is required".into()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ReadFile
// ---------------------------------------------------------------------------

/// Tool that reads the contents of a file.
pub struct ReadFileTool {
    root: PathBuf,
}

impl ReadFileTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[derive(Deserialize)]
struct ReadArgs {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_file".into(),
            description: "Read the contents of a given relative file path. Use this when you want to see what's inside a file.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The relative path of a file in the working directory."
                    }
                },
                "required": ["path"]
            }),
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let args: ReadArgs = parse_args(arguments)?;
        require_path(&args.path)?;

        let content = tokio::fs::read_to_string(resolve(&self.root, &args.path))
            .await
            .map_err(|e| {
                ToolError::ExecutionFailed(format!("error reading file {}: {e}", args.path))
            })?;

        Ok(truncate_with_suffix_by_bytes(
            &content,
            MAX_READ_BYTES,
            "\n...[truncated]",
        ))
    }
}

// ---------------------------------------------------------------------------
// ListFiles
// ---------------------------------------------------------------------------

/// Tool that lists the entries of a directory.
pub struct ListFilesTool {
    root: PathBuf,
}

impl ListFilesTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[derive(Deserialize)]
struct ListArgs {
    #[serde(default = "default_list_path")]
    path: String,
}

fn default_list_path() -> String {
    ".".into()
}

#[async_trait]
impl Tool for ListFilesTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_files".into(),
            description: "List files and directories at a given path. If no path is provided, lists files in the current directory.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "Optional relative path to list files from. Defaults to current directory if not provided."
                    }
                },
                "required": []
            }),
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let args: ListArgs = parse_args(arguments)?;
        let dir = resolve(&self.root, &args.path);
        let failed =
            |e: std::io::Error| ToolError::ExecutionFailed(format!("error listing files in {}: {e}", args.path));

        if !tokio::fs::try_exists(&dir).await.map_err(failed)? {
            return Err(ToolError::ExecutionFailed(format!(
                "path {} does not exist",
                args.path
            )));
        }

        let mut directories = Vec::new();
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(failed)?;
        while let Some(entry) = entries.next_entry().await.map_err(failed)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let file_type = entry.file_type().await.map_err(failed)?;
            if file_type.is_dir() {
                directories.push(format!("{name}/"));
            } else if file_type.is_file() {
                files.push(name);
            }
        }
        directories.sort();
        files.sort();
        directories.extend(files);

        serde_json::to_string(&directories).map_err(|e| ToolError::ExecutionFailed(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// EditFile
// ---------------------------------------------------------------------------

/// Tool that edits, creates or appends to a text file.
pub struct EditFileTool {
    root: PathBuf,
}

impl EditFileTool {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[derive(Deserialize)]
struct EditArgs {
    path: String,
    old_str: String,
    new_str: String,
}

#[async_trait]
impl Tool for EditFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "edit_file".into(),
            description: "Make edits to a text file. Replaces all occurrences of 'old_str' with 'new_str' in the given file. 'old_str' and 'new_str' MUST be different from each other. If the file specified with path doesn't exist and 'old_str' is empty, it will be created.".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "The path to the file" },
                    "old_str": {
                        "type": "string",
                        "description": "Text to search for - must match exactly"
                    },
                    "new_str": {
                        "type": "string",
                        "description": "Text to replace old_str with"
                    }
                },
                "required": ["path", "old_str", "new_str"]
            }),
        }
    }

    async fn execute(&self, arguments: &ToolArguments) -> Result<String, ToolError> {
        let args: EditArgs = parse_args(arguments)?;
        require_path(&args.path)?;
        if args.old_str == args.new_str {
            return Err(ToolError::InvalidArguments(
                "old_str and new_str must be different".into(),
            ));
        }

        let target = resolve(&self.root, &args.path);
        let exists = tokio::fs::try_exists(&target).await.unwrap_or(false);

        if !exists && args.old_str.is_empty() {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ToolError::ExecutionFailed(format!("error creating directories for {}: {e}", args.path))
                })?;
            }
            tokio::fs::write(&target, &args.new_str).await.map_err(|e| {
                ToolError::ExecutionFailed(format!("error writing to file {}: {e}", args.path))
            })?;
            return Ok(format!("Successfully created file {}", args.path));
        }

        let content = tokio::fs::read_to_string(&target).await.map_err(|e| {
            ToolError::ExecutionFailed(format!("error reading file {}: {e}", args.path))
        })?;

        let updated = if args.old_str.is_empty() {
            format!("{content}{}", args.new_str)
        } else if content.contains(&args.old_str) {
            content.replace(&args.old_str, &args.new_str)
        } else {
            return Err(ToolError::ExecutionFailed(format!(
                "old_str not found in file {}",
                args.path
            )));
        };

        tokio::fs::write(&target, updated).await.map_err(|e| {
            ToolError::ExecutionFailed(format!("error writing to file {}: {e}", args.path))
        })?;
        Ok("OK".into())
    }
}
