use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors produced by the wizard engine or by steps.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("step not found: {0}")]
    StepNotFound(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// A step's entry precondition was not satisfied. Raised before the step
    /// runs, e.g. when a request arrives for a step the session has not
    /// reached yet.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// User-supplied input was rejected by local validation. No external
    /// call is made when this is raised.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("step execution failed: {0}")]
    StepExecutionFailed(String),

    #[error("context error: {0}")]
    ContextError(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
