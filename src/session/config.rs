use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a recognition session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a single-shot recognition waits for a result before
    /// falling back to a no-match result
    /// Default: 5000 ms
    pub recognize_timeout_ms: u64,

    /// Prefix for the names of operation worker threads
    pub thread_name_prefix: String,
}

impl SessionConfig {
    pub fn recognize_timeout(&self) -> Duration {
        Duration::from_millis(self.recognize_timeout_ms)
    }

    /// Convenience for tests and callers that only care about the timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            recognize_timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            recognize_timeout_ms: 5000,
            thread_name_prefix: "loqa-reco".to_string(),
        }
    }
}
