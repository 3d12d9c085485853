use super::kind::RecognitionKind;
use super::result::{RecognitionResult, ResultType};
use crate::session::EngineSink;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use tracing::{debug, info};

/// Recognition engine hooks driven by a session
///
/// Hooks are synchronous, may block for an arbitrary time, and are always
/// called from a session worker thread. Results and lifecycle events flow back
/// through the [`EngineSink`], which may be cloned and used from any thread.
pub trait RecognitionEngine: Send + Sync {
    /// Start recognizing in the given mode
    fn start_recognizing(
        &self,
        sink: &EngineSink,
        kind: RecognitionKind,
        keyword: Option<&str>,
    ) -> Result<()>;

    /// Stop recognizing in the given mode
    fn stop_recognizing(&self, sink: &EngineSink, kind: RecognitionKind) -> Result<()>;

    /// Engine name for logging
    fn name(&self) -> &str;
}

/// Configuration for [`SimulatedEngine`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Time spent inside `start_recognizing`
    pub start_delay_ms: u64,

    /// Time spent inside `stop_recognizing`
    pub stop_delay_ms: u64,

    /// Text delivered after each start, if any
    pub utterance: Option<String>,

    /// Delay between the end of a start and the utterance delivery
    pub utterance_delay_ms: u64,

    /// Report session started/stopped from the start/stop hooks
    pub lifecycle_events: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_delay_ms: 500,
            stop_delay_ms: 1000,
            utterance: None,
            utterance_delay_ms: 250,
            lifecycle_events: true,
        }
    }
}

/// Stand-in engine that sleeps instead of recognizing
///
/// With an utterance configured it behaves like a cooperative engine and
/// delivers one recognized result per start; without one every single-shot
/// attempt ends in the no-match fallback.
#[derive(Debug, Clone, Default)]
pub struct SimulatedEngine {
    config: EngineConfig,
}

impl SimulatedEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn schedule_utterance(&self, sink: &EngineSink, kind: RecognitionKind, text: String) -> Result<()> {
        let sink = sink.clone();
        let delay = Duration::from_millis(self.config.utterance_delay_ms);

        thread::Builder::new()
            .name("simulated-utterance".to_string())
            .spawn(move || {
                thread::sleep(delay);

                let mut result = RecognitionResult::recognized(text, Some(0.9));
                if kind == RecognitionKind::Keyword {
                    result.result_type = ResultType::Keyword;
                }
                let delivery = sink.complete(result);
                debug!("Simulated utterance delivered: {:?}", delivery);
            })
            .context("Failed to spawn simulated utterance thread")?;

        Ok(())
    }
}

impl RecognitionEngine for SimulatedEngine {
    fn start_recognizing(
        &self,
        sink: &EngineSink,
        kind: RecognitionKind,
        keyword: Option<&str>,
    ) -> Result<()> {
        info!(
            "Simulated start ({}, keyword={:?}): sleeping for {}ms",
            kind, keyword, self.config.start_delay_ms
        );
        thread::sleep(Duration::from_millis(self.config.start_delay_ms));

        if self.config.lifecycle_events {
            sink.fire_session_started();
        }

        if let Some(text) = &self.config.utterance {
            self.schedule_utterance(sink, kind, text.clone())?;
        }

        Ok(())
    }

    fn stop_recognizing(&self, sink: &EngineSink, kind: RecognitionKind) -> Result<()> {
        info!(
            "Simulated stop ({}): sleeping for {}ms",
            kind, self.config.stop_delay_ms
        );
        thread::sleep(Duration::from_millis(self.config.stop_delay_ms));

        if self.config.lifecycle_events {
            sink.fire_session_stopped();
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
