pub mod async_op;
pub mod config;
pub mod error;
pub mod listeners;
pub mod recognition;
pub mod session;

pub use async_op::{launch, AsyncOp, AsyncOpStatus};
pub use config::Config;
pub use error::{AsyncOpError, AsyncOpResult};
pub use listeners::{ListenerHandle, ListenerRegistry, RecognitionListener};
pub use recognition::{
    DefaultResultFactory, EngineConfig, RecognitionEngine, RecognitionKind, RecognitionResult,
    ResultFactory, ResultReason, ResultType, SimulatedEngine,
};
pub use session::{
    Delivery, EngineSink, Rendezvous, RendezvousPhase, Session, SessionConfig, SessionId,
    SessionStats,
};
