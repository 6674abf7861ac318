//! Conversation Loop
//!
//! The top-level control flow of the assistant: user input goes to the
//! current session, requested tool calls are dispatched through the
//! registry, results are fed back, and the cycle repeats until the model
//! yields a plain-text answer - all wrapped in the key-rotation failover
//! policy.
//!
//! Failure handling is deliberately coarse: the backend does not tell us
//! whether a failure is credential-specific (quota, billing) or transient
//! (overload), so ANY backend error rotates to the next key. The only
//! distinction kept is the wording of the notices.

use std::sync::Arc;
use std::time::Duration;

use crate::backend::{ChatBackend, SessionConfig};
use crate::channel::OutputChannel;
use crate::error::{AssistantError, Result};
use crate::keyring::KeyRotation;
use crate::session::ChatSession;
use crate::tool::ToolRegistry;

/// Pause applied after every backend exchange (rate-limit courtesy).
pub const DEFAULT_PACING: Duration = Duration::from_secs(3);

const ALL_KEYS_OVERLOADED: &str =
    "All API keys have failed due to server overload. Please try again later.";
const ALL_KEYS_FAILED: &str = "All API keys have failed. Please check your keys and try again.";
const BACKUP_KEY_FAILED: &str = "Backup key failed during switch. Stopping attempts.";
const UNKNOWN_ERROR: &str = "An unknown error occurred after processing the request.";

/// How a turn ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A plain-text answer was delivered; back to idle.
    Answered(String),
    /// Credentials are exhausted; the terminal notice was delivered and no
    /// further turns should reach the LLM.
    Shutdown(String),
    /// The turn was abandoned with a generic notice; back to idle.
    Abandoned,
}

/// Owns all mutable assistant state: the rotation cursor and the current
/// session. One runtime, one session, one turn in flight at a time.
pub struct AssistantRuntime {
    backend: Arc<dyn ChatBackend>,
    tools: Arc<ToolRegistry>,
    output: Arc<dyn OutputChannel>,
    config: Arc<SessionConfig>,
    rotation: KeyRotation,
    session: Option<ChatSession>,
    pacing: Duration,
}

impl AssistantRuntime {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        tools: Arc<ToolRegistry>,
        output: Arc<dyn OutputChannel>,
        config: SessionConfig,
        rotation: KeyRotation,
    ) -> Self {
        Self {
            backend,
            tools,
            output,
            config: Arc::new(config),
            rotation,
            session: None,
            pacing: DEFAULT_PACING,
        }
    }

    /// Override the post-exchange pause (tests use zero).
    #[must_use]
    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Establish a session with the current credential, rotating past any
    /// key that fails to open. Every rotation event in the assistant flows
    /// through here - both startup and mid-turn failover.
    ///
    /// Returns `KeysExhausted` once no credential remains; the caller must
    /// stop the assistant rather than retry.
    pub async fn initialize_session(&mut self) -> Result<()> {
        loop {
            let position = self.rotation.cursor();
            let key = self.rotation.current()?.clone();

            match self.backend.open(&key, &self.config).await {
                Ok(()) => {
                    tracing::info!(key = position + 1, "session initialized");
                    self.session = Some(ChatSession::bind(
                        Arc::clone(&self.backend),
                        key,
                        position,
                        Arc::clone(&self.config),
                    ));
                    return Ok(());
                }
                Err(err) => {
                    let failure = AssistantError::SessionInit {
                        position: position + 1,
                        reason: err.to_string(),
                    };
                    tracing::warn!(error = %failure, "rotating to next key");
                    if !self.rotation.advance() {
                        return Err(AssistantError::KeysExhausted(self.rotation.ring().len()));
                    }
                }
            }
        }
    }

    /// One-based position of the key the active session is bound to.
    pub fn active_key_position(&self) -> usize {
        self.session
            .as_ref()
            .map_or(self.rotation.cursor(), ChatSession::key_position)
            + 1
    }

    /// Current rotation cursor (zero-based), exposed for status reporting.
    pub fn cursor(&self) -> usize {
        self.rotation.cursor()
    }

    /// Run one full turn: submit the input, resolve however many tool
    /// rounds the model asks for, and deliver the final answer.
    ///
    /// The retry budget is the number of keys not yet consumed, recomputed
    /// here because the cursor may have advanced in a previous turn.
    pub async fn run_turn(&mut self, input: &str) -> TurnOutcome {
        let input = input.trim();
        if input.is_empty() {
            return TurnOutcome::Abandoned;
        }

        let max_retries = self.rotation.remaining();
        let mut retries = 0;

        while retries < max_retries {
            match self.drive_exchange(input).await {
                Ok(Some(answer)) => {
                    self.output.deliver(&answer);
                    return TurnOutcome::Answered(answer);
                }
                // Reply with neither text nor tool calls: fall through to
                // the generic notice rather than burning a key on it.
                Ok(None) => break,
                Err(err) => {
                    retries += 1;
                    let position = self.active_key_position();
                    tracing::warn!(key = position, error = %err, "turn failed");

                    if retries >= max_retries {
                        let notice = if err.is_overload() {
                            ALL_KEYS_OVERLOADED
                        } else {
                            ALL_KEYS_FAILED
                        };
                        self.output.deliver(notice);
                        return TurnOutcome::Shutdown(notice.to_string());
                    }

                    let notice = if err.is_overload() {
                        format!(
                            "API error: server overloaded with the current key (key {position}). Switching to the next key."
                        )
                    } else {
                        format!("An unexpected API error occurred: {err}. Switching to the next key.")
                    };
                    self.output.deliver(&notice);

                    self.rotation.advance();
                    if self.initialize_session().await.is_err() {
                        self.output.deliver(BACKUP_KEY_FAILED);
                        return TurnOutcome::Shutdown(BACKUP_KEY_FAILED.to_string());
                    }
                }
            }
        }

        self.output.deliver(UNKNOWN_ERROR);
        TurnOutcome::Abandoned
    }

    /// Submit the input and resolve tool rounds until the model yields a
    /// plain-text answer. `Ok(None)` means the final reply carried neither
    /// text nor tool calls.
    async fn drive_exchange(&mut self, input: &str) -> Result<Option<String>> {
        let mut reply = {
            let session = self.session.as_mut().ok_or(AssistantError::NoSession)?;
            session.submit_user(input).await?
        };
        tokio::time::sleep(self.pacing).await;

        while reply.has_tool_calls() {
            // All calls in this reply are resolved before resubmission, in
            // request order, as one batch.
            let mut outcomes = Vec::with_capacity(reply.tool_calls.len());
            for call in &reply.tool_calls {
                self.output.deliver(&format!("Calling tool {}.", call.name));
                tracing::info!(tool = %call.name, args = ?call.arguments, "dispatching tool call");
                outcomes.push(self.tools.dispatch(call).await);
            }

            reply = {
                let session = self.session.as_mut().ok_or(AssistantError::NoSession)?;
                session.submit_outcomes(&outcomes).await?
            };
            tokio::time::sleep(self.pacing).await;
        }

        Ok(reply.text.filter(|text| !text.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ModelReply;
    use crate::channel::OutputChannel;
    use crate::keyring::{ApiKey, KeyRing};
    use crate::message::{Message, Role};
    use crate::tool::{ParameterSchema, Tool, ToolCall, ToolSchema};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockBackend {
        opens: Mutex<VecDeque<Result<()>>>,
        replies: Mutex<VecDeque<Result<ModelReply>>>,
        open_count: AtomicUsize,
        generate_count: AtomicUsize,
        histories: Mutex<Vec<Vec<Message>>>,
    }

    impl MockBackend {
        fn scripted(replies: Vec<Result<ModelReply>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            }
        }

        fn with_opens(mut self, opens: Vec<Result<()>>) -> Self {
            self.opens = Mutex::new(opens.into());
            self
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn open(&self, _key: &ApiKey, _config: &SessionConfig) -> Result<()> {
            self.open_count.fetch_add(1, Ordering::SeqCst);
            self.opens.lock().unwrap().pop_front().unwrap_or(Ok(()))
        }

        async fn generate(
            &self,
            _key: &ApiKey,
            _config: &SessionConfig,
            history: &[Message],
        ) -> Result<ModelReply> {
            self.generate_count.fetch_add(1, Ordering::SeqCst);
            self.histories.lock().unwrap().push(history.to_vec());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AssistantError::Backend("script exhausted".into())))
        }
    }

    #[derive(Default)]
    struct RecordingOutput {
        delivered: Mutex<Vec<String>>,
    }

    impl OutputChannel for RecordingOutput {
        fn deliver(&self, text: &str) {
            self.delivered.lock().unwrap().push(text.to_string());
        }
    }

    struct UpperTool;

    #[async_trait]
    impl Tool for UpperTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "upper".into(),
                description: "Uppercase the input".into(),
                parameters: vec![ParameterSchema::required_string("text", "Input text")],
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<String> {
            Ok(call.str_arg("text").unwrap_or_default().to_uppercase())
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "broken".into(),
                description: "Always fails".into(),
                parameters: vec![],
            }
        }

        async fn execute(&self, _call: &ToolCall) -> Result<String> {
            Err(AssistantError::Backend("handler blew up".into()))
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

    fn harness(
        keys: usize,
        backend: MockBackend,
    ) -> (AssistantRuntime, Arc<MockBackend>, Arc<RecordingOutput>) {
        let backend = Arc::new(backend);
        let output = Arc::new(RecordingOutput::default());

        let mut tools = ToolRegistry::new();
        tools.register(UpperTool);
        tools.register(BrokenTool);

        let ring =
            KeyRing::new((0..keys).map(|i| ApiKey::new(format!("key-{i}"))).collect()).unwrap();

        let runtime = AssistantRuntime::new(
            Arc::clone(&backend) as Arc<dyn ChatBackend>,
            Arc::new(tools),
            Arc::clone(&output) as Arc<dyn OutputChannel>,
            SessionConfig::new("test-model", "be useful"),
            KeyRotation::new(ring),
        )
        .with_pacing(Duration::ZERO);

        (runtime, backend, output)
    }

    #[tokio::test]
    async fn plain_answer_is_delivered() {
        let (mut runtime, backend, output) =
            harness(1, MockBackend::scripted(vec![Ok(ModelReply::text("hi"))]));

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("hello").await;

        assert_eq!(outcome, TurnOutcome::Answered("hi".into()));
        assert_eq!(backend.generate_count.load(Ordering::SeqCst), 1);
        assert_eq!(*output.delivered.lock().unwrap(), vec!["hi".to_string()]);
    }

    #[tokio::test]
    async fn two_calls_in_one_reply_resolve_as_one_batch() {
        let (mut runtime, backend, _output) = harness(
            1,
            MockBackend::scripted(vec![
                Ok(ModelReply::calls(vec![
                    call("upper", &[("text", "first")]),
                    call("upper", &[("text", "second")]),
                ])),
                Ok(ModelReply::text("done")),
            ]),
        );

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("do both").await;

        assert_eq!(outcome, TurnOutcome::Answered("done".into()));
        // One request batch, one result batch.
        assert_eq!(backend.generate_count.load(Ordering::SeqCst), 2);

        // The second exchange saw both results, in request order, verbatim.
        let histories = backend.histories.lock().unwrap();
        let resubmission = &histories[1];
        let tool_messages: Vec<_> = resubmission
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_messages.len(), 2);
        assert_eq!(tool_messages[0].content, "FIRST");
        assert_eq!(tool_messages[1].content, "SECOND");
    }

    #[tokio::test]
    async fn k_tool_rounds_make_k_result_batches() {
        let (mut runtime, backend, _output) = harness(
            1,
            MockBackend::scripted(vec![
                Ok(ModelReply::calls(vec![call("upper", &[("text", "a")])])),
                Ok(ModelReply::calls(vec![call("upper", &[("text", "b")])])),
                Ok(ModelReply::calls(vec![call("upper", &[("text", "c")])])),
                Ok(ModelReply::text("after three rounds")),
            ]),
        );

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("go").await;

        assert_eq!(outcome, TurnOutcome::Answered("after three rounds".into()));
        // K=3 rounds: the user submission plus exactly three resubmissions.
        assert_eq!(backend.generate_count.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn overload_rotates_to_next_key_and_recovers() {
        let (mut runtime, backend, output) = harness(
            2,
            MockBackend::scripted(vec![
                Err(AssistantError::Overloaded("503".into())),
                Ok(ModelReply::text("recovered")),
            ]),
        );

        runtime.initialize_session().await.unwrap();
        assert_eq!(runtime.active_key_position(), 1);

        let outcome = runtime.run_turn("hello").await;

        assert_eq!(outcome, TurnOutcome::Answered("recovered".into()));
        assert_eq!(runtime.cursor(), 1);
        assert_eq!(runtime.active_key_position(), 2);

        let delivered = output.delivered.lock().unwrap();
        assert!(delivered[0].contains("key 1"));
        assert_eq!(delivered.last().unwrap(), "recovered");

        // The fresh session started from an empty history: its first
        // exchange saw only the resubmitted user message.
        let histories = backend.histories.lock().unwrap();
        assert_eq!(histories[1].len(), 1);
        assert_eq!(histories[1][0].role, Role::User);
    }

    #[tokio::test]
    async fn overload_on_every_key_is_exactly_n_attempts() {
        let (mut runtime, backend, output) = harness(
            3,
            MockBackend::scripted(vec![
                Err(AssistantError::Overloaded("503".into())),
                Err(AssistantError::Overloaded("503".into())),
                Err(AssistantError::Overloaded("503".into())),
            ]),
        );

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("hello").await;

        assert_eq!(outcome, TurnOutcome::Shutdown(ALL_KEYS_OVERLOADED.into()));
        assert_eq!(backend.generate_count.load(Ordering::SeqCst), 3);
        assert_eq!(output.delivered.lock().unwrap().last().unwrap(), ALL_KEYS_OVERLOADED);
    }

    #[tokio::test]
    async fn non_overload_exhaustion_uses_generic_terminal_notice() {
        let (mut runtime, _backend, output) = harness(
            1,
            MockBackend::scripted(vec![Err(AssistantError::Backend("400 bad".into()))]),
        );

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("hello").await;

        assert_eq!(outcome, TurnOutcome::Shutdown(ALL_KEYS_FAILED.into()));
        assert!(!output.delivered.lock().unwrap().last().unwrap().contains("overload"));
    }

    #[tokio::test]
    async fn every_key_failing_to_open_makes_exactly_n_attempts() {
        let (mut runtime, backend, _output) = harness(
            3,
            MockBackend::scripted(vec![]).with_opens(vec![
                Err(AssistantError::Backend("rejected".into())),
                Err(AssistantError::Backend("rejected".into())),
                Err(AssistantError::Backend("rejected".into())),
            ]),
        );

        let err = runtime.initialize_session().await.unwrap_err();
        assert!(matches!(err, AssistantError::KeysExhausted(3)));
        assert_eq!(backend.open_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn first_key_failing_to_open_falls_through_to_second() {
        let (mut runtime, backend, _output) = harness(
            2,
            MockBackend::scripted(vec![Ok(ModelReply::text("ok"))]).with_opens(vec![
                Err(AssistantError::Backend("bad key".into())),
                Ok(()),
            ]),
        );

        runtime.initialize_session().await.unwrap();

        assert_eq!(runtime.cursor(), 1);
        assert_eq!(runtime.active_key_position(), 2);
        assert_eq!(backend.open_count.load(Ordering::SeqCst), 2);

        let outcome = runtime.run_turn("hello").await;
        assert_eq!(outcome, TurnOutcome::Answered("ok".into()));
    }

    #[tokio::test]
    async fn unknown_tool_is_forwarded_as_error_outcome() {
        let (mut runtime, backend, _output) = harness(
            1,
            MockBackend::scripted(vec![
                Ok(ModelReply::calls(vec![call("not_a_tool", &[])])),
                Ok(ModelReply::text("noted")),
            ]),
        );

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("try it").await;

        assert_eq!(outcome, TurnOutcome::Answered("noted".into()));
        let histories = backend.histories.lock().unwrap();
        let forwarded = histories[1].iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(forwarded.content.starts_with("ERROR: unknown tool: not_a_tool"));
    }

    #[tokio::test]
    async fn handler_error_is_encoded_not_fatal() {
        let (mut runtime, backend, _output) = harness(
            1,
            MockBackend::scripted(vec![
                Ok(ModelReply::calls(vec![call("broken", &[])])),
                Ok(ModelReply::text("survived")),
            ]),
        );

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("break it").await;

        assert_eq!(outcome, TurnOutcome::Answered("survived".into()));
        let histories = backend.histories.lock().unwrap();
        let forwarded = histories[1].iter().find(|m| m.role == Role::Tool).unwrap();
        assert!(forwarded.content.starts_with("ERROR:"));
    }

    #[tokio::test]
    async fn empty_input_is_discarded_without_a_backend_call() {
        let (mut runtime, backend, output) =
            harness(1, MockBackend::scripted(vec![Ok(ModelReply::text("hi"))]));

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("   ").await;

        assert_eq!(outcome, TurnOutcome::Abandoned);
        assert_eq!(backend.generate_count.load(Ordering::SeqCst), 0);
        assert!(output.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reply_with_neither_text_nor_calls_abandons_with_notice() {
        let (mut runtime, _backend, output) =
            harness(2, MockBackend::scripted(vec![Ok(ModelReply::default())]));

        runtime.initialize_session().await.unwrap();
        let outcome = runtime.run_turn("hello").await;

        assert_eq!(outcome, TurnOutcome::Abandoned);
        assert_eq!(
            *output.delivered.lock().unwrap(),
            vec![UNKNOWN_ERROR.to_string()]
        );
        // No key was burned on it.
        assert_eq!(runtime.cursor(), 0);
    }
}
