use std::sync::Arc;

use trip_flow::{Result, Session, SessionStorage, Wizard, WizardBuilder, WizardRunner};
use uuid::Uuid;

use crate::{
    clients::{HotelProvider, ImageSearch, PlannerBackend},
    models::{TripQuery, session_keys},
    steps::{ActivitySelectionStep, PlanStep, SearchStep, SurveyStep},
};

/// Assemble the four-stage trip wizard:
/// search → activity selection → survey → plan display.
pub fn build_trip_wizard(
    backend: Arc<dyn PlannerBackend>,
    hotels: Arc<dyn HotelProvider>,
    images: Arc<dyn ImageSearch>,
) -> Wizard {
    WizardBuilder::new("trip_planner")
        .add_step(Arc::new(SearchStep::new(backend.clone())))
        .add_step(Arc::new(ActivitySelectionStep))
        .add_step(Arc::new(SurveyStep::new(backend.clone())))
        .add_step(Arc::new(PlanStep::new(backend, hotels, images)))
        .build()
}

/// Create a fresh session seeded with the user's trip query, positioned at
/// the search step.
pub async fn create_trip_session(wizard: &Wizard, query: TripQuery) -> Result<Session> {
    let session = wizard.new_session(Uuid::new_v4().to_string())?;
    session
        .context
        .set(session_keys::TRIP_QUERY_INPUT, query)
        .await?;
    Ok(session)
}

pub fn create_runner(
    backend: Arc<dyn PlannerBackend>,
    hotels: Arc<dyn HotelProvider>,
    images: Arc<dyn ImageSearch>,
    storage: Arc<dyn SessionStorage>,
) -> WizardRunner {
    let wizard = Arc::new(build_trip_wizard(backend, hotels, images));
    WizardRunner::new(wizard, storage)
}
