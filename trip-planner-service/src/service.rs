use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use trip_flow::{
    ExecutionResult, ExecutionStatus, FlowError, InMemorySessionStorage, Session, SessionStorage,
    WizardRunner,
};
use uuid::Uuid;

use crate::{
    clients::{HotelProvider, ImageSearch, PlannerBackend},
    models::{
        SelectActivitiesRequest, SessionResponse, SubmitSurveyRequest, TripQuery, UnlockState,
        package_catalog, session_keys,
    },
    steps,
    workflow::{create_runner, create_trip_session},
};

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub runner: WizardRunner,
}

/// Build the application router with an in-memory session store (the
/// per-process analogue of browser-local storage).
pub fn create_app(
    backend: Arc<dyn PlannerBackend>,
    hotels: Arc<dyn HotelProvider>,
    images: Arc<dyn ImageSearch>,
) -> Router {
    let session_storage: Arc<dyn SessionStorage> = Arc::new(InMemorySessionStorage::new());
    let runner = create_runner(backend, hotels, images, session_storage.clone());
    build_router(AppState {
        session_storage,
        runner,
    })
}

fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/trip", post(start_trip))
        .route("/trip/{session_id}/activities", post(select_activities))
        .route("/trip/{session_id}/survey", get(get_survey).post(submit_survey))
        .route("/trip/{session_id}/plan", get(get_plan))
        .route("/packages/{city}", get(get_packages))
        .route(
            "/session/{session_id}",
            get(get_session).delete(delete_session),
        )
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Middleware that tags every request with a correlation id and wraps it in
/// a tracing span.
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Trip Planner Service",
        "version": "0.1.0",
        "description": "Linear trip-planning wizard: search, activity selection, survey, plan display",
        "endpoints": {
            "POST /trip": "Start a new trip session from a city/date query",
            "POST /trip/{session_id}/activities": "Select activities for the trip",
            "GET /trip/{session_id}/survey": "Fetch the survey questions",
            "POST /trip/{session_id}/survey": "Submit survey answers",
            "GET /trip/{session_id}/plan": "Render the travel plan (unlocked=true removes the blur flag)",
            "GET /packages/{city}": "Package tiers for the mock purchase flow",
            "GET /session/{session_id}": "Inspect a session",
            "DELETE /session/{session_id}": "Delete a session to start over",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn start_trip(State(state): State<AppState>, Json(query): Json<TripQuery>) -> ApiResult<Value> {
    info!(city = %query.city, "starting trip session");

    let session = create_trip_session(state.runner.wizard(), query)
        .await
        .map_err(flow_error)?;
    let session_id = session.id.clone();

    state
        .session_storage
        .save(session)
        .await
        .map_err(flow_error)?;

    let result = state.runner.run(&session_id).await.map_err(flow_error)?;
    Ok(Json(execution_response(&session_id, result)))
}

async fn select_activities(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SelectActivitiesRequest>,
) -> ApiResult<Value> {
    let session =
        expect_current_step(&state, &session_id, steps::activity_selection::STEP_ID).await?;

    session
        .context
        .set(session_keys::SELECTION_INPUT, &request.activities)
        .await
        .map_err(flow_error)?;
    state
        .session_storage
        .save(session)
        .await
        .map_err(flow_error)?;

    let result = state.runner.run(&session_id).await.map_err(flow_error)?;
    Ok(Json(execution_response(&session_id, result)))
}

async fn get_survey(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    expect_current_step(&state, &session_id, steps::survey::STEP_ID).await?;

    let result = state.runner.run(&session_id).await.map_err(flow_error)?;
    Ok(Json(execution_response(&session_id, result)))
}

async fn submit_survey(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<SubmitSurveyRequest>,
) -> ApiResult<Value> {
    let session = expect_current_step(&state, &session_id, steps::survey::STEP_ID).await?;

    session
        .context
        .set(session_keys::SURVEY_RESPONSES_INPUT, &request.responses)
        .await
        .map_err(flow_error)?;
    state
        .session_storage
        .save(session)
        .await
        .map_err(flow_error)?;

    let result = state.runner.run(&session_id).await.map_err(flow_error)?;
    Ok(Json(execution_response(&session_id, result)))
}

#[derive(Debug, Deserialize)]
struct PlanQuery {
    unlocked: Option<bool>,
}

async fn get_plan(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<PlanQuery>,
) -> ApiResult<Value> {
    expect_current_step(&state, &session_id, steps::plan::STEP_ID).await?;

    let result = state.runner.run(&session_id).await.map_err(flow_error)?;

    // Presentation gate only: the content is always in the response and the
    // flag just tells the client whether to obscure it.
    let unlock = UnlockState::from_flag(query.unlocked);
    let mut response = execution_response(&session_id, result);
    response["is_blurred"] = json!(unlock.is_blurred);
    Ok(Json(response))
}

async fn get_packages(Path(city): Path<String>) -> Json<Value> {
    Json(json!({ "city": city, "packages": package_catalog(&city) }))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionResponse> {
    match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => Ok(Json(SessionResponse {
            session_id: session.id.clone(),
            current_step: session.current_step_id.clone(),
            context: session.context.snapshot(),
        })),
        Ok(None) => Err(not_found(&session_id)),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to load session");
            Err(flow_error(e))
        }
    }
}

/// Drop a session, the equivalent of clearing browser storage to start
/// over. Deleting an unknown session succeeds; the outcome is the same.
async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    state
        .session_storage
        .delete(&session_id)
        .await
        .map_err(flow_error)?;
    info!(session_id = %session_id, "session deleted");
    Ok(Json(json!({ "session_id": session_id, "deleted": true })))
}

/// Load the session and verify the request targets its current step.
/// Requests for a step the session has already left (double-submission) or
/// has not reached yet are rejected instead of executed.
async fn expect_current_step(
    state: &AppState,
    session_id: &str,
    expected_step: &str,
) -> Result<Session, ApiError> {
    let session = state
        .session_storage
        .get(session_id)
        .await
        .map_err(flow_error)?
        .ok_or_else(|| not_found(session_id))?;

    if session.current_step_id != expected_step {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({
                "error": format!("session is at step '{}', not '{expected_step}'", session.current_step_id),
                "current_step": session.current_step_id,
            })),
        ));
    }
    Ok(session)
}

fn execution_response(session_id: &str, result: ExecutionResult) -> Value {
    json!({
        "session_id": session_id,
        "step": result.step_id,
        "status": status_label(&result.status),
        "response": result.response,
    })
}

fn status_label(status: &ExecutionStatus) -> &'static str {
    match status {
        ExecutionStatus::WaitingForInput => "waiting_for_input",
        ExecutionStatus::Completed => "completed",
        ExecutionStatus::ResetToStart => "reset_to_start",
    }
}

fn not_found(session_id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Session not found",
            "session_id": session_id,
        })),
    )
}

fn flow_error(err: FlowError) -> ApiError {
    let status = match &err {
        FlowError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        FlowError::PreconditionFailed(_) => StatusCode::CONFLICT,
        FlowError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!(error = %err, "request failed");
    }
    (status, Json(json!({ "error": err.to_string() })))
}
