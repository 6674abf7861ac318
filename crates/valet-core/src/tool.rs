//! Tool System
//!
//! Typed registry mapping tool names to handlers. The registry serves two
//! roles: its schemas are advertised to the backend as function declarations,
//! and incoming tool calls are dispatched through it.
//!
//! Dispatch never fails from the conversation loop's point of view: a handler
//! error, a schema violation or an unknown tool name all come back as an
//! `ERROR:`-prefixed result string, the same convention the handlers use for
//! their own failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AssistantError, Result};

/// Tool call request emitted by the backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool identifier
    pub name: String,

    /// Arguments as key-value pairs
    pub arguments: HashMap<String, serde_json::Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: HashMap<String, serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Convenience accessor for a string argument
    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.arguments.get(name).and_then(|v| v.as_str())
    }
}

/// Result of executing one tool call.
///
/// `output` is exactly the handler's return string (or the dispatcher's
/// error-string encoding); the conversation loop forwards it byte-for-byte.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolOutcome {
    /// Tool that was called
    pub name: String,

    /// The result string, verbatim
    pub output: String,
}

impl ToolOutcome {
    pub fn new(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
        }
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Enum of allowed values
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
}

impl ParameterSchema {
    /// Shorthand for a required string parameter
    pub fn required_string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: "string".into(),
            description: description.into(),
            required: true,
            enum_values: None,
        }
    }

    /// Shorthand for an optional string parameter
    pub fn optional_string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required_string(name, description)
        }
    }
}

/// Tool definition schema, advertised to the backend as a function declaration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for function calling
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments.
    ///
    /// Handlers are expected to catch their own failures and encode them as
    /// `ERROR: …` result strings; an `Err` here is a handler defect and is
    /// converted to the same shape by the dispatcher rather than crashing
    /// the conversation loop.
    async fn execute(&self, call: &ToolCall) -> Result<String>;

    /// Validate arguments before execution (optional)
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(AssistantError::ToolValidation(format!(
                    "missing required parameter: {}",
                    param.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name.clone(), Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Dispatch one tool call, always producing an outcome.
    ///
    /// Failures of any kind are encoded into the outcome's string; nothing
    /// propagates past this boundary.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutcome {
        match self.run(call).await {
            Ok(output) => ToolOutcome::new(&call.name, output),
            Err(err) => {
                tracing::warn!(tool = %call.name, error = %err, "tool dispatch failed");
                ToolOutcome::new(&call.name, format!("ERROR: {err}"))
            }
        }
    }

    async fn run(&self, call: &ToolCall) -> Result<String> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AssistantError::UnknownTool(call.name.clone()))?;

        tool.validate(call)?;
        tool.execute(call).await
    }

    /// Schemas advertised to the backend
    pub fn declarations(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo the input back".into(),
                parameters: vec![ParameterSchema::required_string("text", "Text to echo")],
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<String> {
            Ok(call.str_arg("text").unwrap_or_default().to_string())
        }
    }

    fn call(name: &str, args: &[(&str, &str)]) -> ToolCall {
        ToolCall::new(
            name,
            args.iter()
                .map(|(k, v)| ((*k).to_string(), serde_json::json!(v)))
                .collect(),
        )
    }

    #[tokio::test]
    async fn dispatch_passes_handler_output_through_verbatim() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let outcome = registry.dispatch(&call("echo", &[("text", "exact \n bytes")])).await;
        assert_eq!(outcome.name, "echo");
        assert_eq!(outcome.output, "exact \n bytes");
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_outcome() {
        let registry = ToolRegistry::new();
        let outcome = registry.dispatch(&call("nope", &[])).await;
        assert!(outcome.output.starts_with("ERROR: unknown tool: nope"));
    }

    #[tokio::test]
    async fn missing_required_argument_is_rejected() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        let outcome = registry.dispatch(&call("echo", &[])).await;
        assert!(outcome.output.starts_with("ERROR:"));
        assert!(outcome.output.contains("text"));
    }

    #[test]
    fn registry_bookkeeping() {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);

        assert_eq!(registry.len(), 1);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.declarations().len(), 1);
    }
}
