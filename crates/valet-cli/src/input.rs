//! Input Acquisition
//!
//! Supplies one text unit per turn, from the keyboard or from a speech
//! capture command. Transient capture failures abandon the turn; they never
//! touch session or rotation state.

use std::io::Write;

use thiserror::Error;

use crate::config::AssistantConfig;

/// Where the next turn's text comes from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Keyboard,
    Voice,
}

/// Transient input-acquisition failures
#[derive(Error, Debug)]
pub enum InputError {
    /// Nothing was heard within the listen window; handled silently
    #[error("no speech detected")]
    NoSpeech,

    /// Audio was captured but produced no usable transcript
    #[error("Sorry, I could not understand the audio. Please try again.")]
    NotUnderstood,

    /// Voice mode is on but no capture command is configured
    #[error("Speech capture is not configured. Set VALET_STT_COMMAND or deactivate voice.")]
    NotConfigured,

    /// The capture command failed
    #[error("Speech service is currently unavailable. Please try again.")]
    Service(String),
}

/// Acquire one unit of user input in the given mode.
pub async fn acquire(mode: InputMode, config: &AssistantConfig) -> Result<String, InputError> {
    match mode {
        InputMode::Keyboard => read_line(),
        InputMode::Voice => listen(config).await,
    }
}

/// Blocking keyboard read. EOF is treated as an exit request so a closed
/// stdin still shuts the assistant down cleanly.
fn read_line() -> Result<String, InputError> {
    print!("You: ");
    std::io::stdout().flush().ok();

    let mut line = String::new();
    match std::io::stdin().read_line(&mut line) {
        Ok(0) => Ok("exit".into()),
        Ok(_) => Ok(line.trim_end().to_string()),
        Err(err) => Err(InputError::Service(err.to_string())),
    }
}

/// Run the configured speech-capture command and take its stdout as the
/// transcript. One invocation is one listen window.
async fn listen(config: &AssistantConfig) -> Result<String, InputError> {
    let Some(command) = config.stt_command.as_deref() else {
        return Err(InputError::NotConfigured);
    };

    println!("\nListening... (say 'deactivate voice' or 'exit')");

    let mut capture = tokio::process::Command::new("sh");
    capture.arg("-c").arg(command);

    let output = match tokio::time::timeout(config.listen_timeout, capture.output()).await {
        Err(_) => return Err(InputError::NoSpeech),
        Ok(Err(err)) => return Err(InputError::Service(err.to_string())),
        Ok(Ok(output)) => output,
    };

    if !output.status.success() {
        return Err(InputError::Service(
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ));
    }

    let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if transcript.is_empty() {
        return Err(InputError::NotUnderstood);
    }

    println!("You said: {transcript}");
    Ok(transcript)
}
