use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use trip_flow::{Context, FlowError, Result, Step, StepResult};

use crate::models::{CityInfo, session_keys};

pub const STEP_ID: &str = "activity_selection";

/// Selection step: the user picks a non-empty subset of the fetched
/// activities. No network calls; only local validation and persistence.
pub struct ActivitySelectionStep;

#[async_trait]
impl Step for ActivitySelectionStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    fn guard(&self, context: &Context) -> Result<()> {
        if context.contains(session_keys::CITY_INFO) {
            Ok(())
        } else {
            Err(FlowError::PreconditionFailed(
                "city information is missing, start a new search".to_string(),
            ))
        }
    }

    async fn run(&self, context: Context) -> Result<StepResult> {
        let selection: Vec<String> = context.require(session_keys::SELECTION_INPUT).await?;
        context.remove(session_keys::SELECTION_INPUT).await;

        if selection.is_empty() {
            return Err(FlowError::InvalidInput(
                "Please select at least one activity".to_string(),
            ));
        }

        let info: CityInfo = context.require(session_keys::CITY_INFO).await?;
        if let Some(unknown) = selection.iter().find(|a| !info.activities.contains(a)) {
            return Err(FlowError::InvalidInput(format!(
                "'{unknown}' is not one of the offered activities"
            )));
        }

        info!(selected = selection.len(), "activities selected");
        context
            .set(session_keys::SELECTED_ACTIVITIES, &selection)
            .await?;

        StepResult::advance(json!({ "selected_activities": selection }))
    }
}
