use crate::recognition::RecognitionResult;
use crate::session::SessionId;
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};
use tracing::{debug, error};

/// Receives session lifecycle and result notifications
///
/// Callbacks run on whichever thread triggered the event, with no session lock
/// held, so they may add or remove listeners themselves.
pub trait RecognitionListener: Send + Sync {
    fn on_session_started(&self, _session_id: &SessionId) {}

    fn on_session_stopped(&self, _session_id: &SessionId) {}

    fn on_result(&self, _session_id: &SessionId, _result: &RecognitionResult) {}
}

/// Non-owning reference to a registered listener
///
/// Used to unregister the listener later, even after it has been dropped.
#[derive(Clone)]
pub struct ListenerHandle(Weak<dyn RecognitionListener>);

impl ListenerHandle {
    /// Whether the listener behind this handle is still alive
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("target", &target_of(&self.0))
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Weakly-held listeners plus snapshot dispatch
///
/// The registry never keeps a listener alive. Dead entries are skipped during
/// dispatch and can still be removed by identity.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<Weak<dyn RecognitionListener>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener without taking ownership of it
    pub fn add<L: RecognitionListener + 'static>(&self, listener: &Arc<L>) -> ListenerHandle {
        let weak: Weak<L> = Arc::downgrade(listener);
        self.add_weak(weak)
    }

    /// Register an already type-erased listener
    pub fn add_shared(&self, listener: &Arc<dyn RecognitionListener>) -> ListenerHandle {
        self.add_weak(Arc::downgrade(listener))
    }

    fn add_weak(&self, weak: Weak<dyn RecognitionListener>) -> ListenerHandle {
        let handle = ListenerHandle(weak.clone());
        let mut listeners = self.listeners.lock();
        listeners.push(weak);
        debug!("Listener added ({} registered)", listeners.len());
        handle
    }

    /// Unregister by handle; works whether or not the listener is still alive
    pub fn remove(&self, handle: &ListenerHandle) -> bool {
        self.remove_target(target_of(&handle.0))
    }

    /// Unregister by the listener itself
    pub fn remove_arc<L: RecognitionListener + ?Sized>(&self, listener: &Arc<L>) -> bool {
        self.remove_target(Arc::as_ptr(listener).cast::<()>())
    }

    fn remove_target(&self, target: *const ()) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|weak| target_of(weak) != target);
        let removed = listeners.len() != before;
        debug!("Listener removed={} ({} registered)", removed, listeners.len());
        removed
    }

    /// Number of registered entries, including dead ones
    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Number of registered listeners that are still alive
    pub fn live_count(&self) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Invoke `notify` on every live listener
    ///
    /// The listener list is copied under the lock and iterated after the lock is
    /// released. A panicking listener is logged and skipped. Returns the number
    /// of listeners notified successfully.
    pub fn dispatch<F>(&self, event: &str, notify: F) -> usize
    where
        F: Fn(&dyn RecognitionListener),
    {
        let snapshot: Vec<Weak<dyn RecognitionListener>> = self.listeners.lock().clone();

        let mut notified = 0;
        for weak in &snapshot {
            let Some(listener) = weak.upgrade() else {
                continue;
            };

            match panic::catch_unwind(AssertUnwindSafe(|| notify(listener.as_ref()))) {
                Ok(()) => notified += 1,
                Err(_) => error!("Listener panicked while handling {}", event),
            }
        }

        debug!(
            "Dispatched {} to {}/{} listeners",
            event,
            notified,
            snapshot.len()
        );
        notified
    }
}

// Allocation identity, stable even after the listener is dropped
fn target_of(weak: &Weak<dyn RecognitionListener>) -> *const () {
    weak.as_ptr().cast::<()>()
}
