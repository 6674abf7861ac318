//! User-Facing Boundaries
//!
//! The output channel renders assistant text (printed and/or spoken), and
//! the reserved control phrases are the input-side commands the conversation
//! loop intercepts before anything reaches the LLM.

/// Renders one text string to the user. Implementations must not block
/// subsequent input acquisition indefinitely.
pub trait OutputChannel: Send + Sync {
    fn deliver(&self, text: &str);
}

/// Output channel that discards everything. Useful in tests and for
/// headless embedding.
pub struct NullOutput;

impl OutputChannel for NullOutput {
    fn deliver(&self, _text: &str) {}
}

/// Reserved control phrases, matched case-insensitively after trimming.
/// These are handled entirely before any LLM interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlPhrase {
    /// Switch to continuous-listening (voice) input
    EnableVoice,
    /// Switch back to keyboard input
    DisableVoice,
    /// Terminate the assistant
    Exit,
}

impl ControlPhrase {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "enable voice assistant" => Some(Self::EnableVoice),
            "deactivate voice" => Some(Self::DisableVoice),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrases_match_after_trim_and_case_fold() {
        assert_eq!(ControlPhrase::parse("exit"), Some(ControlPhrase::Exit));
        assert_eq!(ControlPhrase::parse("  EXIT  "), Some(ControlPhrase::Exit));
        assert_eq!(
            ControlPhrase::parse("Enable Voice Assistant"),
            Some(ControlPhrase::EnableVoice)
        );
        assert_eq!(
            ControlPhrase::parse("deactivate voice"),
            Some(ControlPhrase::DisableVoice)
        );
    }

    #[test]
    fn ordinary_input_is_not_a_phrase() {
        assert_eq!(ControlPhrase::parse("please exit the building"), None);
        assert_eq!(ControlPhrase::parse(""), None);
    }
}
