//! Chat Sessions
//!
//! A session is bound to exactly one credential and one configuration for
//! its whole life, and owns the full message history. When rotation moves to
//! another key the session is abandoned and a fresh one is bound; histories
//! are never carried across credentials.

use std::sync::Arc;

use crate::backend::{ChatBackend, ModelReply, SessionConfig};
use crate::error::Result;
use crate::keyring::ApiKey;
use crate::message::{Conversation, Message};
use crate::tool::ToolOutcome;

/// A conversational session bound to one credential.
pub struct ChatSession {
    backend: Arc<dyn ChatBackend>,
    key: ApiKey,
    /// Rotation-cursor position at the time of binding (zero-based)
    key_position: usize,
    config: Arc<SessionConfig>,
    history: Conversation,
}

impl ChatSession {
    pub(crate) fn bind(
        backend: Arc<dyn ChatBackend>,
        key: ApiKey,
        key_position: usize,
        config: Arc<SessionConfig>,
    ) -> Self {
        Self {
            backend,
            key,
            key_position,
            config,
            history: Conversation::new(),
        }
    }

    /// Submit one unit of user text and record both sides of the exchange.
    pub async fn submit_user(&mut self, text: &str) -> Result<ModelReply> {
        self.history.push(Message::user(text));
        self.exchange().await
    }

    /// Submit a batch of tool outcomes as a single message group, in the
    /// order the calls were requested. Outputs are forwarded verbatim.
    pub async fn submit_outcomes(&mut self, outcomes: &[ToolOutcome]) -> Result<ModelReply> {
        for outcome in outcomes {
            self.history
                .push(Message::tool(&outcome.name, &outcome.output));
        }
        self.exchange().await
    }

    async fn exchange(&mut self) -> Result<ModelReply> {
        let reply = self
            .backend
            .generate(&self.key, &self.config, self.history.messages())
            .await?;

        self.history.push(
            Message::assistant(reply.text.clone().unwrap_or_default())
                .with_tool_calls(reply.tool_calls.clone()),
        );

        Ok(reply)
    }

    /// Zero-based rotation position of the bound credential
    pub fn key_position(&self) -> usize {
        self.key_position
    }

    /// The session's message history
    pub fn history(&self) -> &Conversation {
        &self.history
    }
}
