//! # valet-core
//!
//! Core assistant logic: the tool-calling conversation loop, chat sessions
//! and multi-key failover.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   AssistantRuntime                           │
//! │  ┌──────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ Conversation │  │    Tool     │  │    ChatBackend      │  │
//! │  │     Loop     │──│   Registry  │  │    (Strategy)       │  │
//! │  └──────┬───────┘  └─────────────┘  └──────────┬──────────┘  │
//! │  ┌──────┴───────┐                   ┌──────────┴──────────┐  │
//! │  │ KeyRotation  │───── binds ──────▶│     ChatSession     │  │
//! │  └──────────────┘                   └─────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `ChatBackend` trait keeps the loop independent of any concrete LLM
//! service; a session is always bound to the credential at the rotation
//! cursor, and any backend failure rotates to the next credential until the
//! ring is exhausted.

pub mod backend;
pub mod channel;
pub mod error;
pub mod keyring;
pub mod message;
pub mod runtime;
pub mod session;
pub mod tool;

pub use backend::{ChatBackend, ModelReply, SessionConfig};
pub use channel::{ControlPhrase, NullOutput, OutputChannel};
pub use error::{AssistantError, Result};
pub use keyring::{ApiKey, KeyRing, KeyRotation};
pub use message::{Conversation, Message, Role};
pub use runtime::{AssistantRuntime, TurnOutcome, DEFAULT_PACING};
pub use session::ChatSession;
pub use tool::{ParameterSchema, Tool, ToolCall, ToolOutcome, ToolRegistry, ToolSchema};
