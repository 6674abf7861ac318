//! Spoken Output Channel
//!
//! Prints every delivered line and, when enabled, pipes a filtered copy to
//! the platform's text-to-speech command. TTS failures are logged and
//! swallowed; speech is a convenience, not a dependency.

use valet_core::OutputChannel;

/// Output channel that prints and optionally speaks
pub struct SpokenOutput {
    tts_enabled: bool,
}

impl SpokenOutput {
    pub fn new(tts_enabled: bool) -> Self {
        Self { tts_enabled }
    }
}

impl OutputChannel for SpokenOutput {
    fn deliver(&self, text: &str) {
        println!("Assistant: {text}");
        if self.tts_enabled {
            speak(text);
        }
    }
}

/// Strip everything the TTS engine stumbles over: markdown asterisks and
/// any character that is not a word character, whitespace or basic
/// sentence punctuation.
fn filter_for_speech(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace() || ",.?!".contains(*c))
        .collect()
}

fn speak(text: &str) {
    let filtered = filter_for_speech(text);
    if filtered.trim().is_empty() {
        return;
    }

    let program = if cfg!(target_os = "macos") {
        "say"
    } else {
        "espeak"
    };

    match std::process::Command::new(program).arg(&filtered).status() {
        Ok(status) if status.success() => {}
        Ok(status) => tracing::debug!(%program, ?status, "TTS command reported failure"),
        Err(err) => tracing::debug!(%program, error = %err, "TTS command unavailable"),
    }
}
