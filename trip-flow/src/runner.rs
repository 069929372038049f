//! `WizardRunner` – loads a session, executes exactly one step, and persists
//! the updated session back to storage.
//!
//! Interactive services usually run one step per HTTP request: the handler
//! writes the request inputs into the session context, the runner executes
//! the current step and saves, and the response goes back to the client.
//! The runner makes that load → execute → save pattern a one-liner and makes
//! it impossible to forget the save, so the cursor move and the state write
//! always land together (no navigate-before-persist races).
//!
//! Callers that need custom persistence (batching, transactions) can still
//! use [`Wizard::execute_session`] directly.

use std::sync::Arc;

use crate::{
    error::{FlowError, Result},
    storage::SessionStorage,
    wizard::{ExecutionResult, Wizard},
};

#[derive(Clone)]
pub struct WizardRunner {
    wizard: Arc<Wizard>,
    storage: Arc<dyn SessionStorage>,
}

impl WizardRunner {
    pub fn new(wizard: Arc<Wizard>, storage: Arc<dyn SessionStorage>) -> Self {
        Self { wizard, storage }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn storage(&self) -> Arc<dyn SessionStorage> {
        self.storage.clone()
    }

    /// Execute exactly one step for `session_id` and persist the result.
    pub async fn run(&self, session_id: &str) -> Result<ExecutionResult> {
        let mut session = self
            .storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))?;

        let result = self.wizard.execute_session(&mut session).await?;

        // Persist only after the step settled so the next request starts
        // from consistent state.
        self.storage.save(session).await?;

        Ok(result)
    }
}
