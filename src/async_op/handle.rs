use crate::error::{AsyncOpError, AsyncOpResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot::{self, error::TryRecvError};

/// Lifecycle status of an asynchronous operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AsyncOpStatus {
    /// Work was launched and has not finished yet
    Started,
    /// Work finished and produced a value
    Completed,
    /// Work failed, panicked, or could not be spawned
    Error,
}

impl AsyncOpStatus {
    fn to_u8(self) -> u8 {
        match self {
            Self::Started => 0,
            Self::Completed => 1,
            Self::Error => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Started,
            1 => Self::Completed,
            _ => Self::Error,
        }
    }
}

impl fmt::Display for AsyncOpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Started => "started",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Status shared between a handle and its worker thread
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) fn new(status: AsyncOpStatus) -> Self {
        Self(AtomicU8::new(status.to_u8()))
    }

    pub(crate) fn set(&self, status: AsyncOpStatus) {
        self.0.store(status.to_u8(), Ordering::SeqCst);
    }

    pub(crate) fn get(&self) -> AsyncOpStatus {
        AsyncOpStatus::from_u8(self.0.load(Ordering::SeqCst))
    }
}

/// Handle to a unit of work running on its own thread
///
/// The value is handed out exactly once. [`get`](Self::get) and
/// [`join`](Self::join) consume the handle; [`try_get`](Self::try_get) returns
/// the value on the first call that observes completion and
/// [`AsyncOpError::Consumed`] on every call after that.
///
/// Dropping the handle does not stop the work.
pub struct AsyncOp<T> {
    name: String,
    status: Arc<StatusCell>,
    outcome: Option<oneshot::Receiver<AsyncOpResult<T>>>,
}

impl<T> AsyncOp<T> {
    pub(crate) fn new(
        name: String,
        status: Arc<StatusCell>,
        outcome: oneshot::Receiver<AsyncOpResult<T>>,
    ) -> Self {
        Self {
            name,
            status,
            outcome: Some(outcome),
        }
    }

    /// Name of the worker thread running this operation
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current status of the operation
    pub fn status(&self) -> AsyncOpStatus {
        self.status.get()
    }

    /// Whether the work has finished (successfully or not)
    pub fn is_finished(&self) -> bool {
        self.status() != AsyncOpStatus::Started
    }

    /// Poll for the outcome without blocking
    ///
    /// Returns `None` while the work is still running.
    pub fn try_get(&mut self) -> Option<AsyncOpResult<T>> {
        let Some(rx) = self.outcome.as_mut() else {
            return Some(Err(AsyncOpError::Consumed));
        };

        match rx.try_recv() {
            Ok(outcome) => {
                self.outcome = None;
                Some(outcome)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => {
                self.outcome = None;
                Some(Err(AsyncOpError::Abandoned))
            }
        }
    }

    /// Block the current thread until the work finishes
    ///
    /// Must not be called from within an async runtime; use [`join`](Self::join) there.
    pub fn get(self) -> AsyncOpResult<T> {
        match self.outcome {
            Some(rx) => rx
                .blocking_recv()
                .unwrap_or_else(|_| Err(AsyncOpError::Abandoned)),
            None => Err(AsyncOpError::Consumed),
        }
    }

    /// Wait for the work to finish without blocking the runtime
    pub async fn join(self) -> AsyncOpResult<T> {
        match self.outcome {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(AsyncOpError::Abandoned)),
            None => Err(AsyncOpError::Consumed),
        }
    }
}

impl<T> fmt::Debug for AsyncOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncOp")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish()
    }
}
