use super::config::SessionConfig;
use super::rendezvous::{Delivery, Rendezvous};
use super::stats::{SessionCounters, SessionStats};
use crate::async_op::{launch, AsyncOp};
use crate::listeners::{ListenerHandle, ListenerRegistry, RecognitionListener};
use crate::recognition::{
    DefaultResultFactory, RecognitionEngine, RecognitionKind, RecognitionResult, ResultFactory,
    ResultType,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Globally unique session identifier, fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A recognition session coordinating engine calls, waiters and listeners
///
/// Cloning is cheap and every clone refers to the same session. Each launched
/// operation holds its own reference, so the session outlives in-flight work
/// even if the caller drops every handle.
///
/// Recognition kinds are independent: concurrent start/stop calls for
/// different kinds are not serialized against each other.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    session_id: SessionId,
    config: SessionConfig,
    created_at: DateTime<Utc>,
    engine: Arc<dyn RecognitionEngine>,
    factory: Arc<dyn ResultFactory>,
    listeners: ListenerRegistry,
    rendezvous: Rendezvous,
    counters: SessionCounters,
    // Set from just before the engine starts until its stop hook returns
    continuous_active: AtomicBool,
    keyword_active: AtomicBool,
}

impl Session {
    /// Create a session that synthesizes no-match results with [`DefaultResultFactory`]
    pub fn new(config: SessionConfig, engine: Arc<dyn RecognitionEngine>) -> Self {
        Self::with_factory(config, engine, Arc::new(DefaultResultFactory))
    }

    pub fn with_factory(
        config: SessionConfig,
        engine: Arc<dyn RecognitionEngine>,
        factory: Arc<dyn ResultFactory>,
    ) -> Self {
        let session_id = SessionId::new();
        info!(
            "Creating recognition session {} (engine={}, timeout={:?})",
            session_id,
            engine.name(),
            config.recognize_timeout()
        );

        Self {
            inner: Arc::new(SessionInner {
                session_id,
                config,
                created_at: Utc::now(),
                engine,
                factory,
                listeners: ListenerRegistry::new(),
                rendezvous: Rendezvous::new(),
                counters: SessionCounters::default(),
                continuous_active: AtomicBool::new(false),
                keyword_active: AtomicBool::new(false),
            }),
        }
    }

    pub fn session_id(&self) -> &SessionId {
        &self.inner.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Recognize a single utterance
    ///
    /// The worker starts single-shot recognition, waits up to the configured
    /// timeout for a result (falling back to a no-match result), then stops
    /// recognition and yields the result.
    pub fn recognize_async(&self) -> AsyncOp<RecognitionResult> {
        let inner = Arc::clone(&self.inner);
        info!("Launching single-shot recognition for session {}", inner.session_id);
        launch(self.thread_name("recognize"), move || inner.recognize_once())
    }

    pub fn start_continuous_recognition_async(&self) -> AsyncOp<()> {
        self.start_recognition_async(RecognitionKind::Continuous, None)
    }

    pub fn stop_continuous_recognition_async(&self) -> AsyncOp<()> {
        self.stop_recognition_async(RecognitionKind::Continuous)
    }

    /// Start keyword-triggered recognition
    ///
    /// The keyword is passed to the engine as is; an empty keyword is only
    /// logged.
    pub fn start_keyword_recognition_async(&self, keyword: impl Into<String>) -> AsyncOp<()> {
        let keyword = keyword.into();
        if keyword.trim().is_empty() {
            warn!("Starting keyword recognition with an empty keyword");
        }
        self.start_recognition_async(RecognitionKind::Keyword, Some(keyword))
    }

    pub fn stop_keyword_recognition_async(&self) -> AsyncOp<()> {
        self.stop_recognition_async(RecognitionKind::Keyword)
    }

    fn start_recognition_async(&self, kind: RecognitionKind, keyword: Option<String>) -> AsyncOp<()> {
        let inner = Arc::clone(&self.inner);
        info!("Launching start of {} recognition for session {}", kind, inner.session_id);

        launch(self.thread_name("start"), move || {
            let sink = inner.sink();
            // The engine may deliver before start_recognizing returns
            inner.set_streaming(kind, true);
            let started = inner
                .engine
                .start_recognizing(&sink, kind, keyword.as_deref());
            if started.is_err() {
                inner.set_streaming(kind, false);
            }
            started.with_context(|| format!("Failed to start {} recognition", kind))
        })
    }

    fn stop_recognition_async(&self, kind: RecognitionKind) -> AsyncOp<()> {
        let inner = Arc::clone(&self.inner);
        info!("Launching stop of {} recognition for session {}", kind, inner.session_id);

        launch(self.thread_name("stop"), move || {
            let sink = inner.sink();
            let stopped = inner.engine.stop_recognizing(&sink, kind);
            inner.set_streaming(kind, false);
            stopped.with_context(|| format!("Failed to stop {} recognition", kind))
        })
    }

    fn thread_name(&self, operation: &str) -> String {
        format!("{}-{}", self.inner.config.thread_name_prefix, operation)
    }

    /// Register a listener; the session does not keep it alive
    pub fn add_listener<L: RecognitionListener + 'static>(&self, listener: &Arc<L>) -> ListenerHandle {
        self.inner.listeners.add(listener)
    }

    pub fn add_shared_listener(&self, listener: &Arc<dyn RecognitionListener>) -> ListenerHandle {
        self.inner.listeners.add_shared(listener)
    }

    /// Unregister a listener, whether or not it is still alive
    pub fn remove_listener(&self, handle: &ListenerHandle) -> bool {
        self.inner.listeners.remove(handle)
    }

    pub fn remove_listener_arc<L: RecognitionListener + ?Sized>(&self, listener: &Arc<L>) -> bool {
        self.inner.listeners.remove_arc(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.live_count()
    }

    /// Deliver a result for the current attempt
    ///
    /// The first result of an attempt wakes the waiter and is broadcast to
    /// listeners; later ones for the same attempt are dropped. Results that
    /// arrive with no attempt in flight are broadcast without being stored
    /// while continuous or keyword recognition is running, and dropped
    /// otherwise.
    pub fn complete(&self, result: RecognitionResult) -> Delivery {
        self.inner.complete(result)
    }

    /// Conclude a waiting attempt with a no-match result if nothing arrived
    pub fn ensure_delivered(&self) {
        self.inner.ensure_delivered()
    }

    pub fn fire_session_started(&self) {
        self.inner.fire_session_started()
    }

    /// Notify listeners that the session stopped, after concluding any waiting
    /// attempt
    pub fn fire_session_stopped(&self) {
        self.inner.fire_session_stopped()
    }

    /// Handle through which engines report back to this session
    pub fn engine_sink(&self) -> EngineSink {
        self.inner.sink()
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        let inner = &self.inner;
        let counters = &inner.counters;

        SessionStats {
            session_id: inner.session_id.to_string(),
            created_at: inner.created_at,
            waiting: inner.rendezvous.is_waiting(),
            attempts: counters.attempts.load(Ordering::SeqCst),
            results_accepted: counters.accepted.load(Ordering::SeqCst),
            no_match_fallbacks: counters.no_match_fallbacks.load(Ordering::SeqCst),
            unsolicited_results: counters.unsolicited.load(Ordering::SeqCst),
            discarded_completions: counters.discarded.load(Ordering::SeqCst),
            registered_listeners: inner.listeners.len(),
            live_listeners: inner.listeners.live_count(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("session_id", &self.inner.session_id)
            .field("engine", &self.inner.engine.name())
            .field("phase", &self.inner.rendezvous.phase())
            .finish()
    }
}

impl SessionInner {
    fn sink(self: &Arc<Self>) -> EngineSink {
        EngineSink {
            session: Arc::downgrade(self),
            session_id: self.session_id.clone(),
        }
    }

    fn recognize_once(self: &Arc<Self>) -> Result<RecognitionResult> {
        let sink = self.sink();
        self.counters.attempts.fetch_add(1, Ordering::SeqCst);

        // The attempt is open before the engine can possibly deliver
        self.rendezvous.begin();

        if let Err(e) = self
            .engine
            .start_recognizing(&sink, RecognitionKind::SingleShot, None)
        {
            self.ensure_delivered();
            self.rendezvous.finish();
            return Err(e.context("Failed to start single-shot recognition"));
        }

        let timeout = self.config.recognize_timeout();
        let result = self.rendezvous.wait(timeout, || self.ensure_delivered());
        debug!(
            "Single-shot attempt for session {} concluded ({:?})",
            self.session_id, result.reason
        );

        let stopped = self
            .engine
            .stop_recognizing(&sink, RecognitionKind::SingleShot);
        self.rendezvous.finish();
        stopped.context("Failed to stop single-shot recognition")?;

        Ok(result)
    }

    fn complete(&self, result: RecognitionResult) -> Delivery {
        let delivery = match self.rendezvous.complete(result.clone()) {
            // Late result of a concluded single-shot attempt
            Delivery::Unsolicited if !self.is_streaming() => Delivery::Discarded,
            delivery => delivery,
        };
        self.counters.record(delivery);

        match delivery {
            Delivery::Accepted | Delivery::Unsolicited => self.fire_result(&result),
            Delivery::Discarded => debug!(
                "Discarded late result {} for session {}",
                result.result_id, self.session_id
            ),
        }

        delivery
    }

    fn set_streaming(&self, kind: RecognitionKind, active: bool) {
        let flag = match kind {
            RecognitionKind::Continuous => &self.continuous_active,
            RecognitionKind::Keyword => &self.keyword_active,
            RecognitionKind::SingleShot => return,
        };
        flag.store(active, Ordering::SeqCst);
        debug!("{} recognition active={} for session {}", kind, active, self.session_id);
    }

    fn is_streaming(&self) -> bool {
        self.continuous_active.load(Ordering::SeqCst) || self.keyword_active.load(Ordering::SeqCst)
    }

    fn ensure_delivered(&self) {
        if !self.rendezvous.is_waiting() {
            return;
        }

        // A real result may still win the race; the no-match is then dropped
        let no_match = self.factory.create_no_match(ResultType::Speech);
        let delivery = self.rendezvous.complete_if_waiting(no_match.clone());
        self.counters.record(delivery);

        if delivery == Delivery::Accepted {
            info!("No result for session {}; delivered no-match", self.session_id);
            self.counters.no_match_fallbacks.fetch_add(1, Ordering::SeqCst);
            self.fire_result(&no_match);
        }
    }

    fn fire_session_started(&self) {
        info!("Session started: {}", self.session_id);
        self.listeners
            .dispatch("session_started", |l| l.on_session_started(&self.session_id));
    }

    fn fire_session_stopped(&self) {
        self.ensure_delivered();

        info!("Session stopped: {}", self.session_id);
        self.listeners
            .dispatch("session_stopped", |l| l.on_session_stopped(&self.session_id));
    }

    // Broadcast to every listener, regardless of which attempt produced it
    fn fire_result(&self, result: &RecognitionResult) {
        self.listeners
            .dispatch("result", |l| l.on_result(&self.session_id, result));
    }
}

/// Engine-side handle to a session
///
/// Holds the session weakly: once the session is gone, deliveries are ignored.
#[derive(Clone)]
pub struct EngineSink {
    session: Weak<SessionInner>,
    session_id: SessionId,
}

impl EngineSink {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Whether the session behind this sink still exists
    pub fn is_attached(&self) -> bool {
        self.session.strong_count() > 0
    }

    /// Deliver a result; see [`Session::complete`]
    pub fn complete(&self, result: RecognitionResult) -> Delivery {
        match self.session.upgrade() {
            Some(session) => session.complete(result),
            None => {
                debug!("Session {} is gone; dropping result", self.session_id);
                Delivery::Discarded
            }
        }
    }

    pub fn fire_session_started(&self) {
        match self.session.upgrade() {
            Some(session) => session.fire_session_started(),
            None => debug!("Session {} is gone; dropping session started", self.session_id),
        }
    }

    pub fn fire_session_stopped(&self) {
        match self.session.upgrade() {
            Some(session) => session.fire_session_stopped(),
            None => debug!("Session {} is gone; dropping session stopped", self.session_id),
        }
    }
}

impl fmt::Debug for EngineSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSink")
            .field("session_id", &self.session_id)
            .field("attached", &self.is_attached())
            .finish()
    }
}
