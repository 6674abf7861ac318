//! API Key Management
//!
//! An ordered ring of candidate credentials plus the rotation cursor that
//! advances through it. The cursor is monotonic for the life of the process:
//! a key that has failed is never retried.

use crate::error::{AssistantError, Result};

/// Highest `{PREFIX}{N}` environment slot probed when loading the ring.
const MAX_KEY_SLOTS: usize = 5;

/// An opaque API credential.
///
/// Debug and Display are redacted so keys cannot leak into logs or
/// user-facing notices.
#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the raw token for use in an outgoing request.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("••••••")
    }
}

/// The ordered, immutable set of credentials collected at startup.
#[derive(Clone, Debug)]
pub struct KeyRing {
    keys: Vec<ApiKey>,
}

impl KeyRing {
    /// Build a ring from explicit keys. Empty input is a startup-exhaustion
    /// error: the process must refuse to run without at least one key.
    pub fn new(keys: Vec<ApiKey>) -> Result<Self> {
        if keys.is_empty() {
            return Err(AssistantError::NoCredentials);
        }
        Ok(Self { keys })
    }

    /// Collect keys from `{prefix}0..{prefix}4` environment variables.
    /// Unset slots are skipped; slot order is preserved.
    pub fn from_env(prefix: &str) -> Result<Self> {
        let keys = (0..MAX_KEY_SLOTS)
            .filter_map(|i| std::env::var(format!("{prefix}{i}")).ok())
            .filter(|v| !v.trim().is_empty())
            .map(ApiKey::new)
            .collect();
        Self::new(keys)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ApiKey> {
        self.keys.get(index)
    }
}

/// The ring plus the process-wide rotation cursor.
///
/// Single-threaded by design: exactly one session is active at a time, so
/// the cursor is owned by the one conversation loop and needs no locking.
#[derive(Debug)]
pub struct KeyRotation {
    ring: KeyRing,
    cursor: usize,
}

impl KeyRotation {
    pub fn new(ring: KeyRing) -> Self {
        Self { ring, cursor: 0 }
    }

    /// The credential at the cursor, or `KeysExhausted` once every key has
    /// been consumed.
    pub fn current(&self) -> Result<&ApiKey> {
        self.ring
            .get(self.cursor)
            .ok_or(AssistantError::KeysExhausted(self.ring.len()))
    }

    /// Advance the cursor by one. Returns whether any key remains.
    /// The cursor never decreases and never resets.
    pub fn advance(&mut self) -> bool {
        self.cursor += 1;
        self.cursor < self.ring.len()
    }

    /// Zero-based position of the current credential.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Keys not yet consumed, the one at the cursor included. This is the
    /// per-turn retry budget.
    pub fn remaining(&self) -> usize {
        self.ring.len().saturating_sub(self.cursor)
    }

    pub fn ring(&self) -> &KeyRing {
        &self.ring
    }
}
