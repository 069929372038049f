use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::{
    context::Context,
    error::{FlowError, Result},
    step::{Step, StepAction, StepResult},
    storage::Session,
};

/// A fixed, linear sequence of steps.
///
/// Unlike a general task graph there are no edges or branch conditions:
/// each step's successor is simply the next step in insertion order, and the
/// only backwards movement is the fail-closed [`StepAction::Reset`] to the
/// first step. A session's cursor can therefore never skip ahead, which
/// doubles as the idempotency guard against double-submission — replaying a
/// request for a step the session has already left executes the *current*
/// step's guard instead, and fails.
pub struct Wizard {
    pub id: String,
    steps: Vec<Arc<dyn Step>>,
}

impl Wizard {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            steps: Vec::new(),
        }
    }

    pub fn first_step_id(&self) -> Option<&str> {
        self.steps.first().map(|s| s.id())
    }

    /// Create a fresh session positioned at the first step.
    pub fn new_session(&self, session_id: impl Into<String>) -> Result<Session> {
        let first = self
            .first_step_id()
            .ok_or_else(|| FlowError::StepNotFound("wizard has no steps".to_string()))?;
        Ok(Session::new(session_id, first))
    }

    fn position_of(&self, step_id: &str) -> Result<usize> {
        self.steps
            .iter()
            .position(|s| s.id() == step_id)
            .ok_or_else(|| FlowError::StepNotFound(step_id.to_string()))
    }

    /// Execute exactly the session's current step and move the cursor
    /// according to the action it returns.
    pub async fn execute_session(&self, session: &mut Session) -> Result<ExecutionResult> {
        let position = self.position_of(&session.current_step_id)?;
        let step = &self.steps[position];

        step.guard(&session.context)?;

        let mut result = step.run(session.context.clone()).await?;
        result.step_id = step.id().to_string();

        info!(
            wizard_id = %self.id,
            session_id = %session.id,
            step_id = %result.step_id,
            action = ?result.action,
            "step executed"
        );

        self.apply(session, position, result).await
    }

    async fn apply(
        &self,
        session: &mut Session,
        position: usize,
        result: StepResult,
    ) -> Result<ExecutionResult> {
        let status = match result.action {
            StepAction::Advance => match self.steps.get(position + 1) {
                Some(next) => {
                    session.current_step_id = next.id().to_string();
                    ExecutionStatus::WaitingForInput
                }
                // Advancing past the last step ends the flow.
                None => ExecutionStatus::Completed,
            },
            StepAction::Stay => ExecutionStatus::WaitingForInput,
            StepAction::Reset => {
                warn!(
                    wizard_id = %self.id,
                    session_id = %session.id,
                    from_step = %result.step_id,
                    "flow reset to first step"
                );
                session.current_step_id = self
                    .first_step_id()
                    .ok_or_else(|| FlowError::StepNotFound("wizard has no steps".to_string()))?
                    .to_string();
                session.context.clear().await;
                ExecutionStatus::ResetToStart
            }
            StepAction::Complete => ExecutionStatus::Completed,
        };

        Ok(ExecutionResult {
            response: result.response,
            step_id: result.step_id,
            status,
        })
    }
}

/// Builder for assembling a wizard step by step.
pub struct WizardBuilder {
    wizard: Wizard,
}

impl WizardBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            wizard: Wizard::new(id),
        }
    }

    pub fn add_step(mut self, step: Arc<dyn Step>) -> Self {
        self.wizard.steps.push(step);
        self
    }

    pub fn build(self) -> Wizard {
        self.wizard
    }
}

/// Outcome of running one step of a session.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub response: Option<Value>,
    pub step_id: String,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// The session advanced (or stayed put) and waits for the next request.
    WaitingForInput,
    /// The flow reached its terminal step.
    Completed,
    /// A strict step failed; the session was returned to the first step.
    ResetToStart,
}
