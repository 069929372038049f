use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};
use trip_flow::{Context, FailurePolicy, FlowError, Result, Step, StepResult};

use crate::{
    clients::PlannerBackend,
    decode::{MAX_UNWRAP_DEPTH, unwrap_nested},
    models::{SurveyResponse, SurveySubmission, TravelPlan, session_keys},
    steps::alert_on_failure,
};

pub const STEP_ID: &str = "survey";

/// Survey step, a waiting step with two entry modes.
///
/// Entered without responses (survey page load): fetch the question set for
/// the city — fresh on every entry, never cached — and stay. A failed
/// fetch serves an empty question list; re-entering the step is the manual
/// retry.
///
/// Entered with responses (submission): bundle the city, dates, persisted
/// selection, and answers; post them; persist any plan the backend returns
/// and advance. A failed submission alerts and stays
/// (`FailurePolicy::InlineRetry`); nothing is retried automatically.
pub struct SurveyStep {
    backend: Arc<dyn PlannerBackend>,
}

impl SurveyStep {
    pub fn new(backend: Arc<dyn PlannerBackend>) -> Self {
        Self { backend }
    }

    async fn fetch_questions(&self, context: &Context) -> Result<StepResult> {
        let city: String = context.require(session_keys::CITY).await?;

        // FailurePolicy::InlineRetry with an empty list: the survey page
        // still renders and a reload re-fetches.
        let questions = match self.backend.survey_questions(&city).await {
            Ok(questions) => questions,
            Err(err) => {
                warn!(city = %city, error = %err, "survey question fetch failed");
                Vec::new()
            }
        };

        info!(city = %city, count = questions.len(), "survey questions fetched");
        StepResult::stay(json!({ "city": city, "questions": questions }))
    }

    async fn submit(&self, context: &Context, responses: Vec<SurveyResponse>) -> Result<StepResult> {
        if responses.is_empty() {
            return Err(FlowError::InvalidInput(
                "no survey responses provided".to_string(),
            ));
        }

        let submission = SurveySubmission {
            city: context.require(session_keys::CITY).await?,
            start_date: context.require(session_keys::START_DATE).await?,
            end_date: context.require(session_keys::END_DATE).await?,
            selected_activities: context.require(session_keys::SELECTED_ACTIVITIES).await?,
            survey_responses: responses,
        };

        let payload = match self.backend.submit_survey(&submission).await {
            Ok(payload) => payload,
            Err(err) => {
                error!(city = %submission.city, error = %err, "survey submission failed");
                return alert_on_failure(
                    FailurePolicy::InlineRetry,
                    "Failed to submit survey answers. Please try again.",
                );
            }
        };

        // The success payload may already carry the generated plan; persist
        // it so the display step can skip its fetch.
        if let Some(raw_plan) = payload.get("travel_plan") {
            if let Some(body) = unwrap_nested(raw_plan.clone(), MAX_UNWRAP_DEPTH) {
                let body = serde_json::from_value(body).unwrap_or_default();
                let travelers: u32 = context.require(session_keys::TRAVELERS).await?;
                let plan = TravelPlan::from_body(
                    &submission.city,
                    &submission.start_date,
                    &submission.end_date,
                    travelers,
                    body,
                );
                context.set(session_keys::TRAVEL_PLAN, plan).await?;
            }
        }

        info!(city = %submission.city, "survey submitted");
        StepResult::advance(json!({
            "message": "Survey submitted, travel plan is being prepared",
        }))
    }
}

#[async_trait]
impl Step for SurveyStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    fn guard(&self, context: &Context) -> Result<()> {
        if context.contains(session_keys::SELECTED_ACTIVITIES) {
            Ok(())
        } else {
            Err(FlowError::PreconditionFailed(
                "activities have not been selected yet".to_string(),
            ))
        }
    }

    async fn run(&self, context: Context) -> Result<StepResult> {
        match context.remove(session_keys::SURVEY_RESPONSES_INPUT).await {
            None => self.fetch_questions(&context).await,
            Some(raw) => {
                let responses: Vec<SurveyResponse> = serde_json::from_value(raw)?;
                self.submit(&context, responses).await
            }
        }
    }
}
