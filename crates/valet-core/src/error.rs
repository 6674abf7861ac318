//! Error Types

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Assistant error types
#[derive(Error, Debug)]
pub enum AssistantError {
    /// No API key configured at all; the assistant refuses to start
    #[error("no API keys configured")]
    NoCredentials,

    /// Every configured key has been tried and failed
    #[error("all {0} API keys exhausted")]
    KeysExhausted(usize),

    /// A single key failed to establish a session (non-fatal, triggers rotation)
    #[error("session initialization failed with key {position}: {reason}")]
    SessionInit { position: usize, reason: String },

    /// Backend reported overload or was otherwise unreachable (server-unavailable class)
    #[error("backend overloaded: {0}")]
    Overloaded(String),

    /// Any other failure surfaced while talking to the backend
    #[error("backend error: {0}")]
    Backend(String),

    /// The backend asked for a tool that is not in the registry
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments did not match the declared schema
    #[error("invalid tool arguments: {0}")]
    ToolValidation(String),

    /// A turn was driven before any session was initialized
    #[error("no active session")]
    NoSession,

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AssistantError {
    /// Whether this failure is in the server-unavailable class.
    ///
    /// Rotation happens on any backend error either way; the classification
    /// only changes the wording of the notices spoken to the user.
    pub fn is_overload(&self) -> bool {
        matches!(self, AssistantError::Overloaded(_))
    }

    /// Convert to a user-facing message; raw errors never reach the user
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::NoCredentials => {
                "Fatal error: no API key is configured. Shutting down.".into()
            }
            AssistantError::KeysExhausted(_) => {
                "Fatal error: could not initialize the assistant with any provided API key. Shutting down.".into()
            }
            AssistantError::SessionInit { position, .. } => {
                format!("API key {position} failed during initialization.")
            }
            AssistantError::Overloaded(_) => {
                "The AI service is overloaded with the current key.".into()
            }
            AssistantError::Backend(msg) => {
                format!("An unexpected API error occurred: {msg}.")
            }
            AssistantError::UnknownTool(name) => {
                format!("The tool '{name}' is not available.")
            }
            AssistantError::ToolValidation(msg) => format!("Invalid tool input: {msg}."),
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AssistantError {
    fn from(err: anyhow::Error) -> Self {
        AssistantError::Backend(err.to_string())
    }
}
