//! Recognition vocabulary and the engine/factory seams
//!
//! The session never recognizes anything itself. It sequences calls into a
//! [`RecognitionEngine`] and asks a [`ResultFactory`] for no-match results.

mod engine;
mod kind;
mod result;

pub use engine::{EngineConfig, RecognitionEngine, SimulatedEngine};
pub use kind::RecognitionKind;
pub use result::{DefaultResultFactory, RecognitionResult, ResultFactory, ResultReason, ResultType};
