//! Executable Scanner Tool
//!
//! Walks the platform's common application directories, records every
//! executable it finds under a cleaned-up name, and persists the index to a
//! JSON file. The assistant reads that index at startup to advertise the
//! discovered applications in its system instruction.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use valet_core::{
    tool::ParameterSchema, Result as CoreResult, Tool, ToolCall, ToolSchema,
};

use crate::apps::DISCOVERED_APPS_FILE;

/// Common application directories for the current platform.
fn scan_roots() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        ["PROGRAMFILES", "LOCALAPPDATA"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(PathBuf::from)
            .collect()
    } else {
        vec![
            PathBuf::from("/usr/bin"),
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/Applications"),
        ]
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("exe") | Some("lnk")
    )
}

/// Walk the given roots one level deep and index executables by clean name.
/// The first occurrence of a name wins.
fn scan_into(roots: &[PathBuf]) -> BTreeMap<String, String> {
    let mut discovered = BTreeMap::new();

    for root in roots {
        for entry in WalkDir::new(root)
            .max_depth(1)
            .into_iter()
            .filter_map(std::result::Result::ok)
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !is_executable(path) {
                continue;
            }

            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let clean = file_name
                .split('.')
                .next()
                .unwrap_or_default()
                .to_lowercase();
            if clean.is_empty() {
                continue;
            }

            discovered
                .entry(clean)
                .or_insert_with(|| path.to_string_lossy().into_owned());
        }
    }

    discovered
}

/// Tool that scans the system for launchable executables
pub struct ScanExecutablesTool {
    roots: Vec<PathBuf>,
}

impl Default for ScanExecutablesTool {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanExecutablesTool {
    pub fn new() -> Self {
        Self {
            roots: scan_roots(),
        }
    }

    /// Scan a fixed set of directories instead of the platform defaults
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }
}

#[async_trait]
impl Tool for ScanExecutablesTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "scan_system_for_executables".into(),
            description: "Scan common application directories for executables and save their names and paths to a JSON file.".into(),
            parameters: vec![ParameterSchema::optional_string(
                "output_file",
                "Where to save the discovered application index (default: discovered_apps.json)",
            )],
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<String> {
        let output_file = call.str_arg("output_file").unwrap_or(DISCOVERED_APPS_FILE);

        let discovered = scan_into(&self.roots);
        tracing::info!(count = discovered.len(), "executable scan finished");

        let persist = async {
            let json = serde_json::to_string_pretty(&discovered)?;
            tokio::fs::write(output_file, json).await?;
            Ok::<_, crate::error::SystemToolError>(())
        };

        Ok(match persist.await {
            Ok(()) => format!(
                "SUCCESS: Found {} potential applications. List saved to '{}'. Relaunch assistant to load them.",
                discovered.len(),
                output_file
            ),
            Err(e) => format!("ERROR during system scan: {e}"),
        })
    }
}
