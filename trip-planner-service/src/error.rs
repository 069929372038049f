use thiserror::Error;
use trip_flow::FlowError;

/// Failure taxonomy for the planner domain.
///
/// `Validation` blocks a step transition before any network call is made.
/// `Upstream` covers transport failures, non-2xx responses, and undecodable
/// payloads from the itinerary backend or the enrichment providers; how an
/// `Upstream` error is handled depends on the `FailurePolicy` declared at
/// the call site.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("upstream call failed: {0}")]
    Upstream(String),
}

impl From<reqwest::Error> for PlannerError {
    fn from(err: reqwest::Error) -> Self {
        PlannerError::Upstream(err.to_string())
    }
}

impl From<PlannerError> for FlowError {
    fn from(err: PlannerError) -> Self {
        match err {
            PlannerError::Validation(msg) => FlowError::InvalidInput(msg),
            PlannerError::Upstream(msg) => FlowError::StepExecutionFailed(msg),
        }
    }
}
