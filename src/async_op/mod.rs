//! Asynchronous operation handles
//!
//! Every public session operation runs on its own worker thread and hands the
//! caller an [`AsyncOp`] immediately. The handle reports a status and yields the
//! eventual value once, either blocking ([`AsyncOp::get`]), polling
//! ([`AsyncOp::try_get`]) or awaiting ([`AsyncOp::join`]).

mod handle;
mod launcher;

pub use handle::{AsyncOp, AsyncOpStatus};
pub use launcher::launch;
