//! Dispatcher error types.

/// Ways a dispatched call can fail.
///
/// Every variant is recoverable by the caller through the inline fallback.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The background context could not be constructed. Terminal for the dispatcher.
    #[error("UNAVAILABLE: background context not available: {0}")]
    Unavailable(String),

    /// No response arrived before the deadline.
    #[error("TIMEOUT: task {id} timed out after {millis}ms")]
    Timeout { id: String, millis: u64 },

    /// The background context died; every pending task is rejected with this.
    #[error("CONTEXT_ERROR: {0}")]
    ContextError(String),

    /// The dispatcher was shut down.
    #[error("TERMINATED: dispatcher terminated")]
    Terminated,

    /// The task itself reported an error.
    #[error("TASK_ERROR: {0}")]
    Task(String),

    /// Payloads could not be encoded or decoded.
    #[error("PROTOCOL_ERROR: {0}")]
    Protocol(String),
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        DispatchError::Protocol(err.to_string())
    }
}
