//! Recognition session management
//!
//! This module provides the `Session` orchestrator that manages:
//! - Launching start/stop/recognize operations off the caller's thread
//! - The single-result rendezvous with timeout and no-match fallback
//! - Session lifecycle and result notifications to listeners
//! - Session statistics

mod config;
mod rendezvous;
#[allow(clippy::module_inception)]
mod session;
mod stats;

pub use config::SessionConfig;
pub use rendezvous::{Delivery, Rendezvous, RendezvousPhase};
pub use session::{EngineSink, Session, SessionId};
pub use stats::SessionStats;
