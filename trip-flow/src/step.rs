use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{context::Context, error::Result};

/// What the wizard should do after a step finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepAction {
    /// Move the session cursor to the next step in order.
    Advance,
    /// Keep the session at the current step, e.g. after a recoverable
    /// failure the user may retry manually.
    Stay,
    /// Fail closed: return the session to the first step and clear the
    /// session context.
    Reset,
    /// The flow has produced its final output. The cursor stays on the
    /// current step, which may be re-entered to render the output again.
    Complete,
}

/// Outcome of one step execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// Payload for the caller (questions, plan, alert message, ...).
    pub response: Option<Value>,
    pub action: StepAction,
    /// Filled in by the wizard with the id of the step that produced this.
    #[serde(default)]
    pub step_id: String,
}

impl StepResult {
    pub fn new(response: Option<Value>, action: StepAction) -> Self {
        Self {
            response,
            action,
            step_id: String::new(),
        }
    }

    pub fn advance(response: impl Serialize) -> Result<Self> {
        Ok(Self::new(
            Some(serde_json::to_value(response)?),
            StepAction::Advance,
        ))
    }

    pub fn stay(response: impl Serialize) -> Result<Self> {
        Ok(Self::new(
            Some(serde_json::to_value(response)?),
            StepAction::Stay,
        ))
    }

    pub fn reset(response: impl Serialize) -> Result<Self> {
        Ok(Self::new(
            Some(serde_json::to_value(response)?),
            StepAction::Reset,
        ))
    }

    pub fn complete(response: impl Serialize) -> Result<Self> {
        Ok(Self::new(
            Some(serde_json::to_value(response)?),
            StepAction::Complete,
        ))
    }
}

/// One step of a wizard flow.
#[async_trait]
pub trait Step: Send + Sync {
    /// Unique identifier for this step.
    fn id(&self) -> &str;

    /// Entry precondition, checked before [`run`](Self::run). The default
    /// accepts everything; steps that depend on state produced earlier in
    /// the flow verify it here.
    fn guard(&self, _context: &Context) -> Result<()> {
        Ok(())
    }

    /// Execute the step against the session context.
    async fn run(&self, context: Context) -> Result<StepResult>;
}
