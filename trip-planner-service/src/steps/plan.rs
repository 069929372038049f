use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};
use trip_flow::{Context, FlowError, Result, Step, StepResult};

use crate::{
    clients::{HotelProvider, ImageSearch, PlannerBackend, hero_image, mock_hotels},
    decode::{MAX_UNWRAP_DEPTH, unwrap_nested},
    models::{TravelPlan, TravelPlanBody, session_keys},
};

pub const STEP_ID: &str = "plan";

/// Terminal display step: resolve the travel plan, enrich it with hotel
/// cards and a hero image, and complete. Re-entering the step re-renders
/// the same plan.
///
/// The plan itself is core content — a plan already in the session is
/// preferred, otherwise it is fetched and decoded defensively, and an
/// undecodable payload degrades to a placeholder plan rather than an
/// error. Hotels and the hero image are enrichment
/// (`FailurePolicy::SilentFallback`): their failures never surface.
pub struct PlanStep {
    backend: Arc<dyn PlannerBackend>,
    hotels: Arc<dyn HotelProvider>,
    images: Arc<dyn ImageSearch>,
}

impl PlanStep {
    pub fn new(
        backend: Arc<dyn PlannerBackend>,
        hotels: Arc<dyn HotelProvider>,
        images: Arc<dyn ImageSearch>,
    ) -> Self {
        Self {
            backend,
            hotels,
            images,
        }
    }

    async fn resolve_plan(
        &self,
        context: &Context,
        city: &str,
        start_date: &str,
        end_date: &str,
        travelers: u32,
    ) -> Result<TravelPlan> {
        if let Some(plan) = context.get::<TravelPlan>(session_keys::TRAVEL_PLAN).await {
            return Ok(plan);
        }

        let plan = match self.backend.fetch_plan(city).await {
            Ok(payload) => {
                let body = payload
                    .get("travel_plan")
                    .and_then(|raw| unwrap_nested(raw.clone(), MAX_UNWRAP_DEPTH))
                    .and_then(|obj| serde_json::from_value::<TravelPlanBody>(obj).ok());
                match body {
                    Some(body) => TravelPlan::from_body(city, start_date, end_date, travelers, body),
                    None => {
                        warn!(city = %city, "stored plan payload could not be decoded");
                        TravelPlan::placeholder(city, start_date, end_date, travelers)
                    }
                }
            }
            Err(err) => {
                warn!(city = %city, error = %err, "plan fetch failed");
                TravelPlan::placeholder(city, start_date, end_date, travelers)
            }
        };

        context.set(session_keys::TRAVEL_PLAN, &plan).await?;
        Ok(plan)
    }
}

#[async_trait]
impl Step for PlanStep {
    fn id(&self) -> &str {
        STEP_ID
    }

    fn guard(&self, context: &Context) -> Result<()> {
        if context.contains(session_keys::SELECTED_ACTIVITIES) {
            Ok(())
        } else {
            Err(FlowError::PreconditionFailed(
                "no activities have been selected for this trip".to_string(),
            ))
        }
    }

    async fn run(&self, context: Context) -> Result<StepResult> {
        let city: String = context.require(session_keys::CITY).await?;
        let start_date: String = context.require(session_keys::START_DATE).await?;
        let end_date: String = context.require(session_keys::END_DATE).await?;
        let travelers: u32 = context.require(session_keys::TRAVELERS).await?;

        let plan = self
            .resolve_plan(&context, &city, &start_date, &end_date, travelers)
            .await?;

        // FailurePolicy::SilentFallback: an empty or failed hotel lookup
        // renders the fixed mock list, never an error.
        let hotels = match self.hotels.search(&city, &start_date, &end_date).await {
            Ok(list) if !list.is_empty() => list,
            Ok(_) => mock_hotels(&city),
            Err(err) => {
                warn!(city = %city, error = %err, "hotel lookup failed, using mock list");
                mock_hotels(&city)
            }
        };

        let hero_image_url = hero_image(self.images.as_ref(), &city).await;

        info!(city = %city, days = plan.itinerary.len(), hotels = hotels.len(), "plan rendered");

        StepResult::complete(json!({
            "plan": plan,
            "hotels": hotels,
            "hero_image_url": hero_image_url,
        }))
    }
}
