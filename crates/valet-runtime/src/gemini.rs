//! Gemini Chat Backend
//!
//! Implementation of `ChatBackend` for the Gemini `generateContent` REST API
//! (v1beta). Conversation history is replayed on every exchange; tool calls
//! arrive as `functionCall` parts and tool results are sent back as
//! `functionResponse` parts tagged with the tool name.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use valet_core::{
    ApiKey, AssistantError, ChatBackend, Message, ModelReply, Result, Role, SessionConfig,
    ToolCall, ToolSchema,
};

/// Gemini backend configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// Base URL for the API
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            timeout_secs: 120,
        }
    }
}

impl GeminiConfig {
    pub fn from_env() -> Self {
        let base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| GeminiConfig::default().base_url);

        Self {
            base_url,
            ..Default::default()
        }
    }
}

/// Gemini chat backend
pub struct GeminiBackend {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl Default for GeminiBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GeminiBackend {
    /// Create with default configuration
    pub fn new() -> Self {
        Self::from_config(GeminiConfig::default())
    }

    /// Create from configuration
    pub fn from_config(config: GeminiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { http, config }
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_config(GeminiConfig::from_env())
    }

    /// Convert session history to Gemini contents.
    ///
    /// Consecutive tool-result messages collapse into one content so a
    /// resolved batch goes back to the model as a single submission, the
    /// same grouping in which the calls were requested.
    fn convert_history(history: &[Message]) -> Vec<GeminiContent> {
        let mut contents: Vec<GeminiContent> = Vec::new();
        let mut last_was_tool = false;

        for msg in history {
            match msg.role {
                Role::User => {
                    contents.push(GeminiContent {
                        role: Some("user".into()),
                        parts: vec![GeminiPart::text(&msg.content)],
                    });
                    last_was_tool = false;
                }
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !msg.content.is_empty() {
                        parts.push(GeminiPart::text(&msg.content));
                    }
                    for call in &msg.tool_calls {
                        parts.push(GeminiPart::function_call(call));
                    }
                    // An empty assistant message carries no information the
                    // model needs back.
                    if !parts.is_empty() {
                        contents.push(GeminiContent {
                            role: Some("model".into()),
                            parts,
                        });
                    }
                    last_was_tool = false;
                }
                Role::Tool => {
                    let part = GeminiPart::function_response(
                        msg.tool_name.as_deref().unwrap_or_default(),
                        &msg.content,
                    );
                    match contents.last_mut() {
                        Some(group) if last_was_tool => group.parts.push(part),
                        _ => contents.push(GeminiContent {
                            role: Some("user".into()),
                            parts: vec![part],
                        }),
                    }
                    last_was_tool = true;
                }
            }
        }

        contents
    }

    /// Build the JSON-schema object advertised for one tool
    fn parameters_schema(schema: &ToolSchema) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &schema.parameters {
            let mut prop = serde_json::Map::new();
            prop.insert("type".into(), serde_json::json!(param.param_type));
            prop.insert("description".into(), serde_json::json!(param.description));
            if let Some(values) = &param.enum_values {
                prop.insert("enum".into(), serde_json::json!(values));
            }
            properties.insert(param.name.clone(), serde_json::Value::Object(prop));
            if param.required {
                required.push(param.name.clone());
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Build the request payload for one exchange
    fn build_request(config: &SessionConfig, history: &[Message]) -> GeminiRequest {
        let tools = if config.tools.is_empty() {
            None
        } else {
            Some(vec![GeminiTool {
                function_declarations: config
                    .tools
                    .iter()
                    .map(|schema| GeminiFunctionDeclaration {
                        name: schema.name.clone(),
                        description: schema.description.clone(),
                        parameters: Self::parameters_schema(schema),
                    })
                    .collect(),
            }])
        };

        let tool_config = tools.as_ref().map(|_| GeminiToolConfig {
            function_calling_config: GeminiFunctionCallingConfig {
                mode: "auto".into(),
            },
        });

        GeminiRequest {
            contents: Self::convert_history(history),
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(&config.system_instruction)],
            }),
            tools,
            tool_config,
        }
    }

    /// Convert a Gemini response body to the loop's reply shape
    fn parse_reply(response: GeminiResponse) -> ModelReply {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return ModelReply::default();
        };
        let Some(content) = candidate.content else {
            return ModelReply::default();
        };

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in content.parts {
            if let Some(chunk) = part.text {
                text.push_str(&chunk);
            }
            if let Some(call) = part.function_call {
                let arguments: HashMap<String, serde_json::Value> = match call.args {
                    serde_json::Value::Object(map) => map.into_iter().collect(),
                    _ => HashMap::new(),
                };
                tool_calls.push(ToolCall::new(call.name, arguments));
            }
        }

        ModelReply {
            text: (!text.is_empty()).then_some(text),
            tool_calls,
        }
    }

    /// Classify an error body returned by the API.
    ///
    /// 5xx, 429 and the matching gRPC statuses fall into the
    /// server-unavailable class; everything else is unclassified.
    fn classify_api_error(http_status: u16, body: &str) -> AssistantError {
        let detail = serde_json::from_str::<GeminiErrorResponse>(body)
            .ok()
            .and_then(|e| e.error);

        let message = detail
            .as_ref()
            .map_or_else(|| body.trim().to_string(), |e| e.message.clone());
        let grpc_status = detail.map(|e| e.status).unwrap_or_default();

        if http_status >= 500
            || http_status == 429
            || grpc_status == "UNAVAILABLE"
            || grpc_status == "RESOURCE_EXHAUSTED"
        {
            AssistantError::Overloaded(message)
        } else {
            AssistantError::Backend(message)
        }
    }

    /// Classify a transport-level failure from reqwest
    fn classify_transport(err: &reqwest::Error) -> AssistantError {
        let unavailable = err.is_timeout()
            || err.is_connect()
            || err
                .status()
                .is_some_and(|s| s.is_server_error() || s.as_u16() == 429);

        if unavailable {
            AssistantError::Overloaded(err.to_string())
        } else {
            AssistantError::Backend(err.to_string())
        }
    }
}

#[async_trait]
impl ChatBackend for GeminiBackend {
    async fn open(&self, key: &ApiKey, config: &SessionConfig) -> Result<()> {
        let url = format!(
            "{}/models/{}?key={}",
            self.config.base_url,
            config.model,
            key.expose()
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(model = %config.model, "credential probe succeeded");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::classify_api_error(status.as_u16(), &body))
    }

    async fn generate(
        &self,
        key: &ApiKey,
        config: &SessionConfig,
        history: &[Message],
    ) -> Result<ModelReply> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.config.base_url,
            config.model,
            key.expose()
        );

        let payload = Self::build_request(config, history);
        tracing::debug!(
            model = %config.model,
            contents = payload.contents.len(),
            "sending generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        if !status.is_success() {
            return Err(Self::classify_api_error(status.as_u16(), &body));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)?;
        let reply = Self::parse_reply(parsed);
        tracing::debug!(
            has_text = reply.text.is_some(),
            tool_calls = reply.tool_calls.len(),
            "received reply"
        );

        Ok(reply)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// A content part in Gemini API format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "functionCall")]
    function_call: Option<GeminiFunctionCall>,

    #[serde(skip_serializing_if = "Option::is_none", rename = "functionResponse")]
    function_response: Option<GeminiFunctionResponse>,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            function_call: None,
            function_response: None,
        }
    }

    fn function_call(call: &ToolCall) -> Self {
        Self {
            text: None,
            function_call: Some(GeminiFunctionCall {
                name: call.name.clone(),
                args: serde_json::Value::Object(
                    call.arguments
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                ),
            }),
            function_response: None,
        }
    }

    fn function_response(name: &str, result: &str) -> Self {
        Self {
            text: None,
            function_call: None,
            function_response: Some(GeminiFunctionResponse {
                name: name.to_string(),
                response: serde_json::json!({ "result": result }),
            }),
        }
    }
}

/// A function call requested by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: serde_json::Value,
}

/// A tool result sent back to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

/// A content object (one conversational unit) in Gemini API format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

/// A function declaration advertised to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// The tool set in Gemini API format
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiTool {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

/// Tool config for the Gemini API
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiToolConfig {
    function_calling_config: GeminiFunctionCallingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiFunctionCallingConfig {
    mode: String,
}

/// A generateContent request
#[derive(Debug, Serialize, Deserialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<GeminiToolConfig>,
}

/// A generateContent response
#[derive(Debug, Serialize, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "finishReason")]
    finish_reason: Option<String>,
}

/// An error body returned by the API
#[derive(Debug, Serialize, Deserialize)]
struct GeminiErrorResponse {
    error: Option<GeminiError>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiError {
    code: i32,
    message: String,
    #[serde(default)]
    status: String,
}
