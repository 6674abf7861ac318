//! Tool Kit - Local System Tools
//!
//! Domain-specific tools that implement `valet_core::Tool` for the assistant.

mod command;
mod file_ops;
mod launcher;
mod phone;
mod scanner;
mod shortcuts;
mod web_message;

pub use command::ExecuteCommandTool;
pub use file_ops::{CreateDirectoryTool, CreateFileTool, ListDirectoryTool};
pub use launcher::OpenTargetTool;
pub use phone::PhoneLookupTool;
pub use scanner::ScanExecutablesTool;
pub use shortcuts::{AssignShortcutTool, SHORTCUTS_FILE};
pub use web_message::{
    load_web_config, SendWebMessageTool, WebMessageConfig, TELEGRAM_CONFIG_FILE,
    WHATSAPP_CONFIG_FILE,
};
