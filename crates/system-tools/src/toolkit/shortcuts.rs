//! Keyboard Shortcut Tool
//!
//! Persists user-chosen shortcut assignments for discovered applications in
//! a JSON file next to the assistant.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;

use valet_core::{
    tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolSchema,
};

use crate::error::Result;

/// Where shortcut assignments are persisted, relative to the working directory.
pub const SHORTCUTS_FILE: &str = "shortcuts.json";

/// Tool that assigns a keyboard shortcut to an application
pub struct AssignShortcutTool {
    path: PathBuf,
}

impl Default for AssignShortcutTool {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignShortcutTool {
    pub fn new() -> Self {
        Self {
            path: PathBuf::from(SHORTCUTS_FILE),
        }
    }

    /// Persist to a fixed path instead of the default file
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    async fn upsert(&self, app_name: &str, shortcut: &str) -> Result<()> {
        let mut shortcuts: BTreeMap<String, String> =
            match tokio::fs::read_to_string(&self.path).await {
                Ok(raw) => serde_json::from_str(&raw)?,
                Err(_) => BTreeMap::new(),
            };

        shortcuts.insert(app_name.to_lowercase(), shortcut.to_string());

        let json = serde_json::to_string_pretty(&shortcuts)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl Tool for AssignShortcutTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "assign_keyboard_shortcut".into(),
            description: "Assign a user-defined keyboard shortcut (e.g. 'Ctrl+Alt+C') to a discovered application and persist the mapping.".into(),
            parameters: vec![
                ParameterSchema::required_string(
                    "app_name",
                    "The clean name of the application (e.g. 'chrome', 'notepad')",
                ),
                ParameterSchema::required_string(
                    "shortcut",
                    "The keyboard shortcut string (e.g. 'Ctrl+Shift+E')",
                ),
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<String> {
        let app_name = call.str_arg("app_name").unwrap_or_default();
        let shortcut = call.str_arg("shortcut").unwrap_or_default();

        Ok(match self.upsert(app_name, shortcut).await {
            Ok(()) => format!(
                "SUCCESS: Shortcut '{shortcut}' assigned to application '{app_name}'. Saved to {}.",
                self.path.display()
            ),
            Err(e) => format!("ERROR assigning shortcut for '{app_name}': {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn call(app: &str, shortcut: &str) -> ToolCall {
        let mut map: HashMap<String, serde_json::Value> = HashMap::new();
        map.insert("app_name".into(), serde_json::json!(app));
        map.insert("shortcut".into(), serde_json::json!(shortcut));
        ToolCall::new("assign_keyboard_shortcut", map)
    }

    #[tokio::test]
    async fn assignments_accumulate_in_the_file() {
        let dir = std::env::temp_dir().join(format!("valet-shortcuts-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("shortcuts.json");

        let tool = AssignShortcutTool::with_path(path.clone());

        let result = tool.execute(&call("Chrome", "Ctrl+Alt+C")).await.unwrap();
        assert!(result.starts_with("SUCCESS:"), "{result}");

        tool.execute(&call("code", "Ctrl+Alt+V")).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let saved: BTreeMap<String, String> = serde_json::from_str(&raw).unwrap();
        assert_eq!(saved.get("chrome").map(String::as_str), Some("Ctrl+Alt+C"));
        assert_eq!(saved.get("code").map(String::as_str), Some("Ctrl+Alt+V"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
