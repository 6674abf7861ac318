//! File Management Tools
//!
//! Create files, create directories and list the working directory. All
//! failures are encoded into the result string; nothing propagates.

use async_trait::async_trait;

use valet_core::{
    tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolSchema,
};

/// Tool that creates a file, optionally writing content into it
pub struct CreateFileTool;

#[async_trait]
impl Tool for CreateFileTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_file".into(),
            description: "Create a new file and optionally write content to it. Returns a success or error message.".into(),
            parameters: vec![
                ParameterSchema::required_string("filename", "Path of the file to create"),
                ParameterSchema::optional_string("content", "Text content to write into the file"),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<String> {
        let filename = call.str_arg("filename").unwrap_or_default();
        let content = call.str_arg("content").unwrap_or_default();

        Ok(match tokio::fs::write(filename, content).await {
            Ok(()) => format!("SUCCESS: File '{filename}' created and content written."),
            Err(e) => format!("ERROR: Could not create file '{filename}'. Reason: {e}"),
        })
    }
}

/// Tool that creates a directory (and any missing parents)
pub struct CreateDirectoryTool;

#[async_trait]
impl Tool for CreateDirectoryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "create_directory".into(),
            description: "Create a new directory (folder). Returns a success or error message.".into(),
            parameters: vec![ParameterSchema::required_string(
                "dirname",
                "Path of the directory to create",
            )],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<String> {
        let dirname = call.str_arg("dirname").unwrap_or_default();

        Ok(match tokio::fs::create_dir_all(dirname).await {
            Ok(()) => format!("SUCCESS: Directory '{dirname}' created successfully."),
            Err(e) => format!("ERROR: Could not create directory '{dirname}'. Reason: {e}"),
        })
    }
}

/// Tool that lists the current working directory
pub struct ListDirectoryTool;

#[async_trait]
impl Tool for ListDirectoryTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "list_current_directory_contents".into(),
            description: "List all files and directories in the current working directory.".into(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _call: &ToolCall) -> CoreResult<String> {
        Ok(match list_entries().await {
            Ok(items) => format!("SUCCESS: Current directory contents: {}", items.join(", ")),
            Err(e) => format!("ERROR: Could not list directory contents. Reason: {e}"),
        })
    }
}

async fn list_entries() -> std::io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(".").await?;
    let mut items = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        items.push(entry.file_name().to_string_lossy().into_owned());
    }
    items.sort();
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn call(args: &[(&str, &str)]) -> ToolCall {
        ToolCall::new(
            "test",
            args.iter()
                .map(|(k, v)| ((*k).to_string(), serde_json::json!(v)))
                .collect::<HashMap<_, _>>(),
        )
    }

    fn scratch_dir(label: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("valet-{label}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[tokio::test]
    async fn create_file_writes_content() {
        let dir = scratch_dir("create-file");
        let path = dir.join("note.txt");
        let path_str = path.to_string_lossy().into_owned();

        let result = CreateFileTool
            .execute(&call(&[("filename", &path_str), ("content", "hello")]))
            .await
            .unwrap();

        assert!(result.starts_with("SUCCESS:"), "{result}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn create_file_reports_failure_as_error_string() {
        let result = CreateFileTool
            .execute(&call(&[("filename", "/no/such/dir/note.txt")]))
            .await
            .unwrap();

        assert!(result.starts_with("ERROR:"), "{result}");
    }

    #[tokio::test]
    async fn create_directory_is_recursive() {
        let dir = scratch_dir("create-dir");
        let nested = dir.join("a/b/c");
        let nested_str = nested.to_string_lossy().into_owned();

        let result = CreateDirectoryTool
            .execute(&call(&[("dirname", &nested_str)]))
            .await
            .unwrap();

        assert!(result.starts_with("SUCCESS:"), "{result}");
        assert!(nested.is_dir());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn list_directory_reports_entries() {
        let result = ListDirectoryTool.execute(&call(&[])).await.unwrap();
        assert!(result.starts_with("SUCCESS: Current directory contents:"));
    }
}
