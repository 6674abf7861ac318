//! Chat Backend Boundary
//!
//! Defines the interface the conversation loop uses to talk to an LLM
//! service, keeping the core independent of any concrete API.
//!
//! Two exchange shapes exist: plain user-text submissions and batched
//! tool-result submissions, both expressed through `generate` over the full
//! session history. `open` is the cheap per-credential probe the session
//! initializer uses before binding a session to a key.

use async_trait::async_trait;

use crate::error::Result;
use crate::keyring::ApiKey;
use crate::message::Message;
use crate::tool::{ToolCall, ToolSchema};

/// Immutable per-session configuration: the model, the system instruction
/// and the tool declarations advertised to it.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Model identifier (e.g. "gemini-2.5-flash")
    pub model: String,

    /// System instruction string
    pub system_instruction: String,

    /// Tool declarations derived from the registry
    pub tools: Vec<ToolSchema>,
}

impl SessionConfig {
    pub fn new(model: impl Into<String>, system_instruction: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_instruction: system_instruction.into(),
            tools: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSchema>) -> Self {
        self.tools = tools;
        self
    }
}

/// One backend exchange's result: plain text, tool-call requests, or both.
#[derive(Clone, Debug, Default)]
pub struct ModelReply {
    /// Natural-language answer, if any
    pub text: Option<String>,

    /// Tool calls requested by the model, in request order
    pub tool_calls: Vec<ToolCall>,
}

impl ModelReply {
    /// A reply consisting only of text
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            text: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply consisting only of tool calls
    pub fn calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }

    /// Whether the model asked for at least one tool invocation
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Boundary trait for the LLM service
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Probe whether a session can be established with this credential.
    /// Called once per candidate key by the session initializer.
    async fn open(&self, key: &ApiKey, config: &SessionConfig) -> Result<()>;

    /// Produce the model's next reply given the full session history.
    async fn generate(
        &self,
        key: &ApiKey,
        config: &SessionConfig,
        history: &[Message],
    ) -> Result<ModelReply>;
}
