use super::handle::{AsyncOp, AsyncOpStatus, StatusCell};
use crate::error::AsyncOpError;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

/// Run `work` on a new, detached thread and return a handle to its outcome
///
/// The handle comes back with status [`AsyncOpStatus::Started`] before `work`
/// necessarily begins. Each call creates one OS thread; nothing is pooled or
/// bounded, so callers must not launch operations in a tight loop.
///
/// Errors returned by `work` and panics inside it are captured in the handle.
/// If the handle was already dropped, failures are only logged.
pub fn launch<T, F>(name: impl Into<String>, work: F) -> AsyncOp<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    let name = name.into();
    let status = Arc::new(StatusCell::new(AsyncOpStatus::Started));
    let (tx, rx) = oneshot::channel();

    let worker_status = Arc::clone(&status);
    let worker_name = name.clone();

    let spawned = thread::Builder::new().name(name.clone()).spawn(move || {
        debug!("*** {} thread started ***", worker_name);

        let outcome = match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AsyncOpError::Failed(e)),
            Err(payload) => Err(AsyncOpError::Panicked(panic_message(payload.as_ref()))),
        };

        // Status is final before the value becomes observable
        worker_status.set(if outcome.is_ok() {
            AsyncOpStatus::Completed
        } else {
            AsyncOpStatus::Error
        });

        if let Err(Err(e)) = tx.send(outcome) {
            warn!("{} failed after its handle was dropped: {}", worker_name, e);
        }

        debug!("*** {} thread stopped ***", worker_name);
    });

    match spawned {
        Ok(_detached) => AsyncOp::new(name, status, rx),
        Err(e) => {
            error!("Failed to spawn {}: {}", name, e);
            status.set(AsyncOpStatus::Error);

            let (tx, rx) = oneshot::channel();
            // The receiver is still in scope, so this cannot fail
            let _ = tx.send(Err(AsyncOpError::Spawn(e)));
            AsyncOp::new(name, status, rx)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
