//! # valet-runtime
//!
//! Runtime backends for the valet assistant.
//!
//! ## Backends
//!
//! - **Gemini** (default): Google Gemini over the `generateContent` REST API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use valet_runtime::GeminiBackend;
//!
//! let backend = Arc::new(GeminiBackend::from_env());
//! let runtime = AssistantRuntime::new(backend, tools, output, config, rotation);
//! ```

pub mod gemini;

pub use gemini::{GeminiBackend, GeminiConfig};

// Re-export core types for convenience
pub use valet_core::{
    AssistantRuntime, AssistantError, ChatBackend, KeyRing, KeyRotation, Message, ModelReply,
    Result, Role, SessionConfig, Tool, ToolRegistry, TurnOutcome,
};
