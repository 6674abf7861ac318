//! Runtime Configuration
//!
//! Everything tunable about the assistant, collected from environment
//! variables (optionally via a `.env` file) at startup.

use std::time::Duration;

/// Environment prefix for the ordered API key slots
/// (`GEMINI_API_KEY_0` … `GEMINI_API_KEY_4`).
pub const KEY_PREFIX: &str = "GEMINI_API_KEY_";

/// Assistant configuration
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// Model identifier
    pub model: String,

    /// Pause after every backend exchange
    pub pacing: Duration,

    /// Whether answers are also spoken via the platform TTS command
    pub tts_enabled: bool,

    /// Shell command whose stdout is one transcribed utterance
    pub stt_command: Option<String>,

    /// How long one listen attempt may take
    pub listen_timeout: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".into(),
            pacing: Duration::from_secs(3),
            tts_enabled: true,
            stt_command: None,
            listen_timeout: Duration::from_secs(5),
        }
    }
}

impl AssistantConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let model = std::env::var("VALET_MODEL").unwrap_or(defaults.model);
        let pacing = std::env::var("VALET_API_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(defaults.pacing, Duration::from_secs);
        let tts_enabled = std::env::var("VALET_TTS")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "off"))
            .unwrap_or(defaults.tts_enabled);
        let stt_command = std::env::var("VALET_STT_COMMAND")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let listen_timeout = std::env::var("VALET_LISTEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map_or(defaults.listen_timeout, Duration::from_secs);

        Self {
            model,
            pacing,
            tts_enabled,
            stt_command,
            listen_timeout,
        }
    }
}
