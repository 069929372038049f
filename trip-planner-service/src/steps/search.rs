use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info};
use trip_flow::{Context, FailurePolicy, Result, Step, StepResult};

use crate::{
    clients::PlannerBackend,
    models::{TripQuery, session_keys},
    steps::alert_on_failure,
};

pub const STEP_ID: &str = "search";

/// Landing step: validate the trip query, fetch the city description and
/// candidate activities, and persist both for the selection step.
///
/// Validation failures are raised before any network call. The city-info
/// call is declared `FailurePolicy::Abort`: an upstream failure or a city
/// without activities alerts the user and resets the flow.
pub struct SearchStep {
    backend: Arc<dyn PlannerBackend>,
}

impl SearchStep {
    pub fn new(backend: Arc<dyn PlannerBackend>) -> Self {
        Self { backend }
    }
}

const CITY_INFO_POLICY: FailurePolicy = FailurePolicy::Abort;

#[async_trait]
impl Step for SearchStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    async fn run(&self, context: Context) -> Result<StepResult> {
        let query: TripQuery = context.require(session_keys::TRIP_QUERY_INPUT).await?;
        context.remove(session_keys::TRIP_QUERY_INPUT).await;

        let query = query.normalized().map_err(trip_flow::FlowError::from)?;

        info!(
            city = %query.city,
            start = %query.start_date,
            end = %query.end_date,
            travelers = query.travelers,
            "starting trip"
        );

        let info = match self.backend.city_info(&query).await {
            Ok(info) => info,
            Err(err) => {
                error!(city = %query.city, error = %err, "city info fetch failed");
                return alert_on_failure(
                    CITY_INFO_POLICY,
                    "Failed to fetch activities. Please try another destination.",
                );
            }
        };

        if info.activities.is_empty() {
            return alert_on_failure(CITY_INFO_POLICY, "No activities found for this city.");
        }

        context.set(session_keys::CITY, &query.city).await?;
        context.set(session_keys::START_DATE, &query.start_date).await?;
        context.set(session_keys::END_DATE, &query.end_date).await?;
        context.set(session_keys::TRAVELERS, query.travelers).await?;
        context.set(session_keys::CITY_INFO, &info).await?;

        StepResult::advance(json!({
            "city": query.city,
            "description": info.description,
            "country": info.country,
            "activities": info.activities,
        }))
    }
}
