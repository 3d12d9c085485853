// Shared fakes for integration tests
#![allow(dead_code)]

use anyhow::{bail, Result};
use loqa_recognizer::{
    Delivery, EngineSink, RecognitionEngine, RecognitionKind, RecognitionListener,
    RecognitionResult, ResultFactory, ResultType, SessionId,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Ordered record of everything engines and listeners observed
#[derive(Default)]
pub struct EventLog {
    events: Mutex<Vec<String>>,
}

impl EventLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.events.lock().iter().position(|e| e == event)
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }

    /// Poll until `event` shows up or `timeout` elapses
    pub fn wait_for(&self, event: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.position(event).is_some() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }
}

/// What the scripted engine does when single-shot or continuous recognition starts
#[derive(Clone)]
pub enum OnStart {
    /// Deliver nothing
    Silent,
    /// Deliver `text` from a helper thread after a delay
    Deliver { text: String, delay: Duration },
    /// Deliver from `count` threads racing through a barrier, joined before returning
    Race { count: usize },
}

/// Engine fake that logs every hook call
pub struct ScriptedEngine {
    log: Arc<EventLog>,
    on_start: OnStart,
    late_on_stop: Option<String>,
    lifecycle_events: bool,
    fail_start: AtomicBool,
    fail_stop: AtomicBool,
    keywords: Mutex<Vec<Option<String>>>,
    deliveries: Arc<Mutex<Vec<Delivery>>>,
}

impl ScriptedEngine {
    pub fn new(log: Arc<EventLog>, on_start: OnStart) -> Self {
        Self {
            log,
            on_start,
            late_on_stop: None,
            lifecycle_events: false,
            fail_start: AtomicBool::new(false),
            fail_stop: AtomicBool::new(false),
            keywords: Mutex::new(Vec::new()),
            deliveries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Deliver `text` from inside `stop_recognizing`
    pub fn with_late_result(mut self, text: &str) -> Self {
        self.late_on_stop = Some(text.to_string());
        self
    }

    pub fn with_lifecycle_events(mut self) -> Self {
        self.lifecycle_events = true;
        self
    }

    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    pub fn fail_stop(&self) {
        self.fail_stop.store(true, Ordering::SeqCst);
    }

    pub fn keywords(&self) -> Vec<Option<String>> {
        self.keywords.lock().clone()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    fn deliver(&self, sink: &EngineSink, text: &str) {
        deliver(&self.log, &self.deliveries, sink, text);
    }
}

fn deliver(log: &EventLog, deliveries: &Mutex<Vec<Delivery>>, sink: &EngineSink, text: &str) {
    log.push(format!("deliver:{}", text));
    let delivery = sink.complete(RecognitionResult::recognized(text, Some(0.9)));
    deliveries.lock().push(delivery);
}

impl RecognitionEngine for ScriptedEngine {
    fn start_recognizing(
        &self,
        sink: &EngineSink,
        kind: RecognitionKind,
        keyword: Option<&str>,
    ) -> Result<()> {
        self.log.push(format!("start:{}", kind));
        self.keywords.lock().push(keyword.map(str::to_string));

        if self.fail_start.load(Ordering::SeqCst) {
            bail!("microphone unavailable");
        }

        if self.lifecycle_events {
            sink.fire_session_started();
        }

        match &self.on_start {
            OnStart::Silent => {}
            OnStart::Deliver { text, delay } => {
                let log = Arc::clone(&self.log);
                let deliveries = Arc::clone(&self.deliveries);
                let sink = sink.clone();
                let text = text.clone();
                let delay = *delay;
                thread::spawn(move || {
                    thread::sleep(delay);
                    deliver(&log, &deliveries, &sink, &text);
                });
            }
            OnStart::Race { count } => {
                let barrier = Arc::new(std::sync::Barrier::new(*count));
                let racers: Vec<_> = (0..*count)
                    .map(|i| {
                        let log = Arc::clone(&self.log);
                        let deliveries = Arc::clone(&self.deliveries);
                        let sink = sink.clone();
                        let barrier = Arc::clone(&barrier);
                        thread::spawn(move || {
                            barrier.wait();
                            deliver(&log, &deliveries, &sink, &format!("racer-{}", i));
                        })
                    })
                    .collect();
                for racer in racers {
                    racer.join().expect("racer thread panicked");
                }
            }
        }

        Ok(())
    }

    fn stop_recognizing(&self, sink: &EngineSink, kind: RecognitionKind) -> Result<()> {
        if let Some(text) = &self.late_on_stop {
            self.deliver(sink, text);
        }

        self.log.push(format!("stop:{}", kind));

        if self.lifecycle_events {
            sink.fire_session_stopped();
        }

        if self.fail_stop.load(Ordering::SeqCst) {
            bail!("engine refused to stop");
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Listener that logs its notifications into the shared event log
pub struct LoggingListener {
    label: String,
    log: Arc<EventLog>,
    pub started: AtomicUsize,
    pub stopped: AtomicUsize,
    pub results: Mutex<Vec<RecognitionResult>>,
}

impl LoggingListener {
    pub fn new(label: &str, log: Arc<EventLog>) -> Arc<Self> {
        Arc::new(Self {
            label: label.to_string(),
            log,
            started: AtomicUsize::new(0),
            stopped: AtomicUsize::new(0),
            results: Mutex::new(Vec::new()),
        })
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn results(&self) -> Vec<RecognitionResult> {
        self.results.lock().clone()
    }
}

impl RecognitionListener for LoggingListener {
    fn on_session_started(&self, _session_id: &SessionId) {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("{}:started", self.label));
    }

    fn on_session_stopped(&self, _session_id: &SessionId) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("{}:stopped", self.label));
    }

    fn on_result(&self, _session_id: &SessionId, result: &RecognitionResult) {
        self.results.lock().push(result.clone());
        let text = result.text.as_deref().unwrap_or("no-match");
        self.log.push(format!("{}:result:{}", self.label, text));
    }
}

/// Factory that tags its no-match results so tests can recognize them
#[derive(Default)]
pub struct CountingFactory {
    pub calls: AtomicUsize,
}

impl CountingFactory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ResultFactory for CountingFactory {
    fn create_no_match(&self, result_type: ResultType) -> RecognitionResult {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let mut result = RecognitionResult::no_match(result_type);
        result.result_id = format!("no-match-{}", n);
        result
    }
}
