use super::rendezvous::Delivery;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Snapshot of a session's activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// Whether a single-shot attempt is waiting for its result
    pub waiting: bool,

    /// Single-shot attempts started
    pub attempts: usize,

    /// Results accepted for an in-flight attempt (real or no-match)
    pub results_accepted: usize,

    /// No-match results synthesized because nothing arrived
    pub no_match_fallbacks: usize,

    /// Results broadcast while no attempt was in flight
    pub unsolicited_results: usize,

    /// Late or duplicate completions that were dropped
    pub discarded_completions: usize,

    /// Registered listener entries, including dropped listeners
    pub registered_listeners: usize,

    /// Registered listeners that are still alive
    pub live_listeners: usize,
}

#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    pub(crate) attempts: AtomicUsize,
    pub(crate) accepted: AtomicUsize,
    pub(crate) no_match_fallbacks: AtomicUsize,
    pub(crate) unsolicited: AtomicUsize,
    pub(crate) discarded: AtomicUsize,
}

impl SessionCounters {
    pub(crate) fn record(&self, delivery: Delivery) {
        let counter = match delivery {
            Delivery::Accepted => &self.accepted,
            Delivery::Discarded => &self.discarded,
            Delivery::Unsolicited => &self.unsolicited,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}
