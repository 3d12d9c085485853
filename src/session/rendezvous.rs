use crate::recognition::RecognitionResult;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const IDLE: u8 = 0;
const WAITING: u8 = 1;
const DELIVERED: u8 = 2;

/// Re-check interval once the deadline has passed and a fallback ran
const SETTLE_INTERVAL: Duration = Duration::from_millis(10);

/// Where the current recognition attempt stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendezvousPhase {
    /// No attempt in flight
    Idle,
    /// An attempt is in flight and no result has been accepted yet
    Waiting,
    /// The attempt has its result; it ends with [`Rendezvous::finish`]
    Delivered,
}

/// Outcome of handing a result to the rendezvous
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// First result for the in-flight attempt; stored and waiters woken
    Accepted,
    /// The attempt already had its result; this one was dropped
    Discarded,
    /// No attempt in flight; nothing stored
    Unsolicited,
}

/// Single-slot hand-off between the thread producing a result and the one
/// waiting for it
///
/// The phase moves `Waiting -> Delivered` through a compare-and-set, so of any
/// number of racing completions exactly one is accepted.
pub struct Rendezvous {
    phase: AtomicU8,
    slot: Mutex<Option<RecognitionResult>>,
    delivered: Condvar,
}

impl Default for Rendezvous {
    fn default() -> Self {
        Self::new()
    }
}

impl Rendezvous {
    pub fn new() -> Self {
        Self {
            phase: AtomicU8::new(IDLE),
            slot: Mutex::new(None),
            delivered: Condvar::new(),
        }
    }

    pub fn phase(&self) -> RendezvousPhase {
        match self.phase.load(Ordering::SeqCst) {
            IDLE => RendezvousPhase::Idle,
            WAITING => RendezvousPhase::Waiting,
            _ => RendezvousPhase::Delivered,
        }
    }

    pub fn is_waiting(&self) -> bool {
        self.phase() == RendezvousPhase::Waiting
    }

    /// Open a new attempt, dropping whatever the previous one left behind
    pub fn begin(&self) {
        let mut slot = self.slot.lock();
        self.open(&mut slot);
    }

    fn open(&self, slot: &mut MutexGuard<'_, Option<RecognitionResult>>) {
        if self.phase.swap(WAITING, Ordering::SeqCst) == WAITING {
            warn!("Recognition attempt opened while another was still waiting");
        }
        **slot = None;
    }

    /// Hand a result to the rendezvous
    ///
    /// Results arriving while no attempt is open are reported as
    /// [`Delivery::Unsolicited`] and not stored.
    pub fn complete(&self, result: RecognitionResult) -> Delivery {
        match self.try_accept(result) {
            Ok(()) => Delivery::Accepted,
            Err(DELIVERED) => Delivery::Discarded,
            Err(_) => Delivery::Unsolicited,
        }
    }

    /// Like [`complete`](Self::complete), but a result arriving while no
    /// attempt is open is discarded instead of reported as unsolicited
    pub fn complete_if_waiting(&self, result: RecognitionResult) -> Delivery {
        match self.try_accept(result) {
            Ok(()) => Delivery::Accepted,
            Err(_) => Delivery::Discarded,
        }
    }

    fn try_accept(&self, result: RecognitionResult) -> Result<(), u8> {
        let mut slot = self.slot.lock();
        self.phase
            .compare_exchange(WAITING, DELIVERED, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| {
                *slot = Some(result);
                self.delivered.notify_all();
            })
    }

    /// Block until the attempt has a result or `timeout` elapses
    ///
    /// On timeout `on_timeout` runs without the lock held and is expected to
    /// complete the attempt (typically with a no-match result). A real result
    /// racing with it may still win. Either way the accepted result is
    /// returned; this never returns without one.
    pub fn wait<F: FnMut()>(&self, timeout: Duration, mut on_timeout: F) -> RecognitionResult {
        let deadline = Instant::now() + timeout;
        let mut slot = self.slot.lock();

        if self.phase() == RendezvousPhase::Idle {
            debug!("Wait called with no attempt open; opening one");
            self.open(&mut slot);
        }

        while slot.is_none() {
            if self.delivered.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }

        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }

            match self.phase() {
                RendezvousPhase::Idle => self.open(&mut slot),
                RendezvousPhase::Waiting => {
                    debug!("No result after {:?}; running fallback", timeout);
                    MutexGuard::unlocked(&mut slot, &mut on_timeout);
                }
                RendezvousPhase::Delivered => {}
            }

            if slot.is_none() {
                self.delivered.wait_for(&mut slot, SETTLE_INTERVAL);
            }
        }
    }

    /// End the current attempt once its result has been delivered
    pub fn finish(&self) {
        let _slot = self.slot.lock();
        if self
            .phase
            .compare_exchange(DELIVERED, IDLE, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Finish called with no delivered attempt");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recognition::ResultType;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_complete_before_wait() {
        let rendezvous = Rendezvous::new();
        rendezvous.begin();

        let result = RecognitionResult::recognized("hello", None);
        assert_eq!(rendezvous.complete(result.clone()), Delivery::Accepted);

        let waited = rendezvous.wait(Duration::from_secs(5), || panic!("fallback must not run"));
        assert_eq!(waited, result);
        assert_eq!(rendezvous.phase(), RendezvousPhase::Delivered);
    }

    #[test]
    fn test_second_completion_is_discarded() {
        let rendezvous = Rendezvous::new();
        rendezvous.begin();

        let first = RecognitionResult::recognized("first", None);
        let second = RecognitionResult::recognized("second", None);
        assert_eq!(rendezvous.complete(first.clone()), Delivery::Accepted);
        assert_eq!(rendezvous.complete(second), Delivery::Discarded);

        assert_eq!(rendezvous.wait(Duration::from_millis(10), || {}), first);
    }

    #[test]
    fn test_complete_without_attempt_is_unsolicited() {
        let rendezvous = Rendezvous::new();
        let result = RecognitionResult::recognized("stray", None);

        assert_eq!(rendezvous.complete(result.clone()), Delivery::Unsolicited);
        assert_eq!(rendezvous.complete_if_waiting(result), Delivery::Discarded);
        assert_eq!(rendezvous.phase(), RendezvousPhase::Idle);
    }

    #[test]
    fn test_timeout_runs_fallback_once() {
        let rendezvous = Arc::new(Rendezvous::new());
        rendezvous.begin();

        let calls = AtomicUsize::new(0);
        let fallback_target = Arc::clone(&rendezvous);
        let started = Instant::now();
        let result = rendezvous.wait(Duration::from_millis(100), || {
            calls.fetch_add(1, Ordering::SeqCst);
            fallback_target.complete_if_waiting(RecognitionResult::no_match(ResultType::Speech));
        });

        assert!(result.is_no_match());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(started.elapsed() >= Duration::from_millis(100));

        let late = RecognitionResult::recognized("late", None);
        assert_eq!(rendezvous.complete(late), Delivery::Discarded);
    }

    #[test]
    fn test_waiter_woken_by_other_thread() {
        let rendezvous = Arc::new(Rendezvous::new());
        rendezvous.begin();

        let producer = Arc::clone(&rendezvous);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            producer.complete(RecognitionResult::recognized("from thread", Some(0.8)))
        });

        let result = rendezvous.wait(Duration::from_secs(5), || panic!("fallback must not run"));
        assert_eq!(result.text.as_deref(), Some("from thread"));
        assert_eq!(handle.join().unwrap(), Delivery::Accepted);
    }

    #[test]
    fn test_finish_returns_to_idle() {
        let rendezvous = Rendezvous::new();
        rendezvous.begin();
        rendezvous.complete(RecognitionResult::recognized("done", None));
        rendezvous.finish();

        assert_eq!(rendezvous.phase(), RendezvousPhase::Idle);
        assert_eq!(
            rendezvous.complete(RecognitionResult::recognized("after", None)),
            Delivery::Unsolicited
        );
    }
}
