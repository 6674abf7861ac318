//! # system-tools
//!
//! Local-system automation tools for the valet assistant: file management,
//! command execution, application/URL launching, phone number lookup,
//! executable discovery, shortcut persistence and web messaging.
//!
//! Every tool follows the same contract: it never lets a failure escape its
//! own boundary, and instead encodes the outcome into the result string it
//! returns (`SUCCESS: …` / `ERROR: …` / `INFO: …`). The conversation loop
//! forwards that string to the model verbatim.

pub mod apps;
pub mod error;
pub mod toolkit;

pub use apps::{load_discovered_apps, DISCOVERED_APPS_FILE};
pub use error::{Result, SystemToolError};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::toolkit::{
        AssignShortcutTool, CreateDirectoryTool, CreateFileTool, ExecuteCommandTool,
        ListDirectoryTool, OpenTargetTool, PhoneLookupTool, ScanExecutablesTool,
        SendWebMessageTool,
    };
}

/// Base system instruction for the automation assistant
const BASE_INSTRUCTION: &str = "You are an expert system automation assistant. Your goal is to help the user control \
their local system (file creation, running commands, opening apps or sites, etc.) by using the provided tools. \
ALWAYS use the tools when the user asks for a system action. \
If multiple tools need to be called, prioritize the most relevant one first. \
Do not perform the action yourself; always respond with the function call.";

/// Build the full system instruction, folding in the names of previously
/// discovered applications so the model knows what it can ask to open.
pub fn system_instruction(discovered_apps: &[String]) -> String {
    let mut instruction = BASE_INSTRUCTION.to_string();

    if !discovered_apps.is_empty() {
        instruction.push_str(&format!(
            "\n[HINT: The following common apps were previously discovered: {}. Use open_application_or_url for these.]",
            discovered_apps.join(", ")
        ));
    }

    instruction
}
