//! Error types for asynchronous recognition operations

use thiserror::Error;

/// Result type yielded by an [`AsyncOp`](crate::async_op::AsyncOp)
pub type AsyncOpResult<T> = std::result::Result<T, AsyncOpError>;

/// Why an asynchronous operation did not produce a value
#[derive(Error, Debug)]
pub enum AsyncOpError {
    /// The work itself returned an error (e.g. an engine hook failed)
    #[error("Operation failed: {0:#}")]
    Failed(anyhow::Error),

    /// The work panicked on its worker thread
    #[error("Operation panicked: {0}")]
    Panicked(String),

    /// The worker thread could not be created
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The value was already handed out by an earlier `try_get`
    #[error("Operation result was already taken")]
    Consumed,

    /// The worker went away without reporting an outcome
    #[error("Operation was abandoned before completing")]
    Abandoned,
}
