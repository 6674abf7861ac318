//! valet - personal system-automation assistant
//!
//! Wires the Gemini backend, the tool kit and the conversation loop into an
//! interactive REPL with keyboard and voice input modes.

mod config;
mod input;
mod voice;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use system_tools::tools::{
    AssignShortcutTool, CreateDirectoryTool, CreateFileTool, ExecuteCommandTool,
    ListDirectoryTool, OpenTargetTool, PhoneLookupTool, ScanExecutablesTool, SendWebMessageTool,
};
use valet_core::{
    AssistantRuntime, ControlPhrase, KeyRing, KeyRotation, OutputChannel, SessionConfig,
    ToolRegistry, TurnOutcome,
};
use valet_runtime::GeminiBackend;

use crate::config::{AssistantConfig, KEY_PREFIX};
use crate::input::{InputError, InputMode};
use crate::voice::SpokenOutput;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();
    let config = AssistantConfig::from_env();

    let output: Arc<SpokenOutput> = Arc::new(SpokenOutput::new(config.tts_enabled));
    output.deliver("Hello, your assistant is starting up.");

    // The credential set: at least one key or the process refuses to start.
    let ring = match KeyRing::from_env(KEY_PREFIX) {
        Ok(ring) => ring,
        Err(err) => {
            output.deliver(&err.user_message());
            anyhow::bail!("at least one {KEY_PREFIX}N environment variable must be set");
        }
    };
    tracing::info!(keys = ring.len(), "loaded API keys");

    // Register all system tools
    let mut tools = ToolRegistry::new();
    tools.register(CreateFileTool);
    tools.register(CreateDirectoryTool);
    tools.register(ListDirectoryTool);
    tools.register(ExecuteCommandTool);
    tools.register(OpenTargetTool);
    tools.register(PhoneLookupTool);
    tools.register(ScanExecutablesTool::new());
    tools.register(AssignShortcutTool::new());
    tools.register(SendWebMessageTool);

    tracing::info!("registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {name}");
    }

    // Fold previously discovered applications into the system instruction.
    let discovered = system_tools::load_discovered_apps();
    if !discovered.is_empty() {
        tracing::info!(apps = discovered.len(), "loaded discovered applications");
    }

    let session_config = SessionConfig::new(&config.model, system_tools::system_instruction(&discovered))
        .with_tools(tools.declarations());

    let backend = Arc::new(GeminiBackend::from_env());
    let mut runtime = AssistantRuntime::new(
        backend,
        Arc::new(tools),
        Arc::clone(&output) as Arc<dyn OutputChannel>,
        session_config,
        KeyRotation::new(ring),
    )
    .with_pacing(config.pacing);

    // Startup session boot; exhaustion here is fatal.
    if let Err(err) = runtime.initialize_session().await {
        output.deliver(&err.user_message());
        return Ok(());
    }

    output.deliver(&format!(
        "Assistant is running in keyboard mode using key {}. Type 'enable voice assistant' to start listening.",
        runtime.active_key_position()
    ));

    let mut mode = InputMode::Keyboard;

    loop {
        let user_input = match input::acquire(mode, &config).await {
            Ok(text) => text,
            // Nothing heard: keep listening without a word.
            Err(InputError::NoSpeech) => continue,
            Err(err @ InputError::NotConfigured) => {
                output.deliver(&err.to_string());
                mode = InputMode::Keyboard;
                continue;
            }
            Err(err) => {
                output.deliver(&err.to_string());
                continue;
            }
        };

        // Control phrases are handled here and never reach the session.
        if let Some(phrase) = ControlPhrase::parse(&user_input) {
            if handle_control(phrase, &mut mode, output.as_ref()) {
                break;
            }
            continue;
        }

        if user_input.trim().is_empty() {
            continue;
        }

        match runtime.run_turn(&user_input).await {
            TurnOutcome::Answered(_) | TurnOutcome::Abandoned => {}
            // Credentials exhausted: stop talking to the LLM entirely.
            TurnOutcome::Shutdown(_) => break,
        }
    }

    Ok(())
}

/// Apply a control phrase. Returns true when the assistant should exit.
/// Mode toggles speak a confirmation only when the mode actually changes.
fn handle_control(phrase: ControlPhrase, mode: &mut InputMode, output: &dyn OutputChannel) -> bool {
    match phrase {
        ControlPhrase::EnableVoice => {
            if *mode != InputMode::Voice {
                *mode = InputMode::Voice;
                output.deliver("Voice assistant enabled. I am now listening for your commands.");
            }
            false
        }
        ControlPhrase::DisableVoice => {
            if *mode == InputMode::Voice {
                *mode = InputMode::Keyboard;
                output.deliver("Voice assistant deactivated. Switching back to keyboard input.");
            }
            false
        }
        ControlPhrase::Exit => {
            output.deliver("Assistant shutting down. Goodbye!");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingOutput {
        delivered: Mutex<Vec<String>>,
    }

    impl OutputChannel for RecordingOutput {
        fn deliver(&self, text: &str) {
            self.delivered.lock().unwrap().push(text.to_string());
        }
    }

    #[test]
    fn exit_speaks_exactly_one_farewell_and_terminates() {
        let output = RecordingOutput::default();
        let mut mode = InputMode::Keyboard;

        let should_exit = handle_control(ControlPhrase::Exit, &mut mode, &output);

        assert!(should_exit);
        assert_eq!(
            *output.delivered.lock().unwrap(),
            vec!["Assistant shutting down. Goodbye!".to_string()]
        );
    }

    #[test]
    fn enabling_voice_twice_confirms_only_once() {
        let output = RecordingOutput::default();
        let mut mode = InputMode::Keyboard;

        assert!(!handle_control(ControlPhrase::EnableVoice, &mut mode, &output));
        assert_eq!(mode, InputMode::Voice);
        assert!(!handle_control(ControlPhrase::EnableVoice, &mut mode, &output));

        assert_eq!(output.delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn deactivating_voice_in_keyboard_mode_is_silent() {
        let output = RecordingOutput::default();
        let mut mode = InputMode::Keyboard;

        assert!(!handle_control(ControlPhrase::DisableVoice, &mut mode, &output));
        assert_eq!(mode, InputMode::Keyboard);
        assert!(output.delivered.lock().unwrap().is_empty());
    }
}
