//! End-to-end wizard tests against in-memory fake collaborators.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use async_trait::async_trait;
use serde_json::{Value, json};
use trip_flow::{ExecutionStatus, FlowError, SessionStorage, WizardRunner};
use trip_planner_service::{
    PlannerError,
    clients::{HotelProvider, ImageSearch, ImageHit, PlannerBackend},
    models::{CityInfo, HotelOption, SurveyQuestion, SurveyResponse, SurveySubmission, TripQuery,
        session_keys},
    workflow::{create_runner, create_trip_session},
};

const PARIS_ACTIVITIES: [&str; 8] = [
    "Louvre Museum",
    "Eiffel Tower",
    "Seine River Cruise",
    "Montmartre Walk",
    "Musee d'Orsay",
    "Luxembourg Gardens",
    "Catacombs Tour",
    "Versailles Day Trip",
];

#[derive(Default)]
struct FakeBackend {
    fail_city_info: bool,
    empty_activities: bool,
    fail_questions: bool,
    fail_submit: AtomicBool,
    submit_payload: Value,
    plan_payload: Value,
    city_info_calls: AtomicUsize,
    question_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    plan_calls: AtomicUsize,
}

#[async_trait]
impl PlannerBackend for FakeBackend {
    async fn city_info(&self, query: &TripQuery) -> Result<CityInfo, PlannerError> {
        self.city_info_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_city_info {
            return Err(PlannerError::Upstream("city info unavailable".to_string()));
        }
        Ok(CityInfo {
            description: format!("{} is lovely this time of year", query.city),
            country: "France".to_string(),
            activities: if self.empty_activities {
                Vec::new()
            } else {
                PARIS_ACTIVITIES.iter().map(|a| a.to_string()).collect()
            },
        })
    }

    async fn survey_questions(&self, _city: &str) -> Result<Vec<SurveyQuestion>, PlannerError> {
        self.question_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_questions {
            return Err(PlannerError::Upstream("questions unavailable".to_string()));
        }
        Ok((1..=5)
            .map(|i| SurveyQuestion {
                question: format!("Question {i}?"),
                options: vec!["Yes".to_string(), "No".to_string()],
            })
            .collect())
    }

    async fn submit_survey(&self, _submission: &SurveySubmission) -> Result<Value, PlannerError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(PlannerError::Upstream("submission failed".to_string()));
        }
        Ok(self.submit_payload.clone())
    }

    async fn fetch_plan(&self, _city: &str) -> Result<Value, PlannerError> {
        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.plan_payload.clone())
    }
}

struct FailingHotels;

#[async_trait]
impl HotelProvider for FailingHotels {
    async fn search(
        &self,
        _city: &str,
        _start_date: &str,
        _end_date: &str,
    ) -> Result<Vec<HotelOption>, PlannerError> {
        // Simulated 500 from the provider.
        Err(PlannerError::Upstream("internal server error".to_string()))
    }
}

struct NoImages;

#[async_trait]
impl ImageSearch for NoImages {
    async fn first_image(&self, _query: &str) -> Result<Option<ImageHit>, PlannerError> {
        Ok(None)
    }
}

fn five_day_plan_body() -> Value {
    json!({
        "itinerary": (1..=5).map(|day| json!({
            "day": format!("Day {day}"),
            "morning": "Cafe and stroll",
            "afternoon": "Museum visit",
            "evening": "Dinner in the old town",
        })).collect::<Vec<_>>(),
        "travel_tips": "Buy museum tickets in advance",
        "local_food_recommendations": "Try the croissants",
        "estimated_costs": "$2400 for 2 travelers",
    })
}

fn paris_query() -> TripQuery {
    TripQuery {
        city: "Paris".to_string(),
        start_date: "2025-09-10".to_string(),
        end_date: "2025-09-15".to_string(),
        travelers: 2,
    }
}

fn setup(backend: FakeBackend) -> (WizardRunner, Arc<FakeBackend>) {
    let backend = Arc::new(backend);
    let storage: Arc<dyn SessionStorage> = Arc::new(trip_flow::InMemorySessionStorage::new());
    let runner = create_runner(
        backend.clone(),
        Arc::new(FailingHotels),
        Arc::new(NoImages),
        storage,
    );
    (runner, backend)
}

async fn start_session(runner: &WizardRunner, query: TripQuery) -> String {
    let session = create_trip_session(runner.wizard(), query).await.unwrap();
    let id = session.id.clone();
    runner.storage().save(session).await.unwrap();
    id
}

async fn set_input(runner: &WizardRunner, session_id: &str, key: &str, value: Value) {
    let session = runner.storage().get(session_id).await.unwrap().unwrap();
    session.context.set(key, value).await.unwrap();
    runner.storage().save(session).await.unwrap();
}

async fn current_step(runner: &WizardRunner, session_id: &str) -> String {
    runner
        .storage()
        .get(session_id)
        .await
        .unwrap()
        .unwrap()
        .current_step_id
}

#[tokio::test]
async fn paris_end_to_end_flow() {
    let backend = FakeBackend {
        // Plan is returned double-encoded by the submission payload.
        submit_payload: json!({
            "message": "Travel plan generated successfully",
            "travel_plan": Value::String(five_day_plan_body().to_string()).to_string(),
        }),
        ..Default::default()
    };
    let (runner, backend) = setup(backend);

    // Search
    let session_id = start_session(&runner, paris_query()).await;
    let result = runner.run(&session_id).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::WaitingForInput);
    let activities = result.response.unwrap()["activities"]
        .as_array()
        .unwrap()
        .len();
    assert_eq!(activities, 8);
    assert_eq!(current_step(&runner, &session_id).await, "activity_selection");

    // Selection
    set_input(
        &runner,
        &session_id,
        session_keys::SELECTION_INPUT,
        json!(["Louvre Museum", "Eiffel Tower", "Seine River Cruise"]),
    )
    .await;
    runner.run(&session_id).await.unwrap();
    assert_eq!(current_step(&runner, &session_id).await, "survey");

    // Survey page load fetches questions and stays.
    let result = runner.run(&session_id).await.unwrap();
    let questions = result.response.unwrap()["questions"].as_array().unwrap().len();
    assert_eq!(questions, 5);
    assert_eq!(current_step(&runner, &session_id).await, "survey");

    // Submission advances to the plan step.
    let responses: Vec<SurveyResponse> = (1..=5)
        .map(|i| SurveyResponse {
            question: format!("Question {i}?"),
            selected_option: "Yes".to_string(),
        })
        .collect();
    set_input(
        &runner,
        &session_id,
        session_keys::SURVEY_RESPONSES_INPUT,
        serde_json::to_value(&responses).unwrap(),
    )
    .await;
    runner.run(&session_id).await.unwrap();
    assert_eq!(current_step(&runner, &session_id).await, "plan");

    // Plan display: 5-day itinerary from the submission payload, mock
    // hotels because the provider fails, static default hero image.
    let result = runner.run(&session_id).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    let response = result.response.unwrap();
    assert_eq!(response["plan"]["itinerary"].as_array().unwrap().len(), 5);
    assert_eq!(response["plan"]["travelers"], json!(2));
    let hotels = response["hotels"].as_array().unwrap();
    assert!((3..=6).contains(&hotels.len()));
    assert_eq!(response["hero_image_url"], json!("/mountains.jpg"));

    // The stored plan was reused: no plan fetch, one submission.
    assert_eq!(backend.plan_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.city_info_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_city_is_rejected_without_a_network_call() {
    let (runner, backend) = setup(FakeBackend::default());
    let session_id = start_session(
        &runner,
        TripQuery {
            city: "   ".to_string(),
            ..paris_query()
        },
    )
    .await;

    let err = runner.run(&session_id).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidInput(_)));
    assert_eq!(backend.city_info_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn equal_dates_are_rejected() {
    let (runner, backend) = setup(FakeBackend::default());
    let session_id = start_session(
        &runner,
        TripQuery {
            start_date: "2025-06-01".to_string(),
            end_date: "2025-06-01".to_string(),
            ..paris_query()
        },
    )
    .await;

    let err = runner.run(&session_id).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidInput(_)));
    assert_eq!(backend.city_info_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn city_without_activities_resets_the_flow() {
    let (runner, _backend) = setup(FakeBackend {
        empty_activities: true,
        ..Default::default()
    });
    let session_id = start_session(&runner, paris_query()).await;

    let result = runner.run(&session_id).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::ResetToStart);
    assert!(
        result.response.unwrap()["alert"]
            .as_str()
            .unwrap()
            .contains("No activities")
    );

    // Back at the search step with a clean slate.
    assert_eq!(current_step(&runner, &session_id).await, "search");
    let session = runner.storage().get(&session_id).await.unwrap().unwrap();
    assert!(session.context.snapshot().is_empty());
}

#[tokio::test]
async fn upstream_failure_on_search_resets_with_an_alert() {
    let (runner, _backend) = setup(FakeBackend {
        fail_city_info: true,
        ..Default::default()
    });
    let session_id = start_session(&runner, paris_query()).await;

    let result = runner.run(&session_id).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::ResetToStart);
    assert!(
        result.response.unwrap()["alert"]
            .as_str()
            .unwrap()
            .contains("Failed to fetch activities")
    );
}

#[tokio::test]
async fn empty_selection_does_not_advance() {
    let (runner, _backend) = setup(FakeBackend::default());
    let session_id = start_session(&runner, paris_query()).await;
    runner.run(&session_id).await.unwrap();

    set_input(&runner, &session_id, session_keys::SELECTION_INPUT, json!([])).await;
    let err = runner.run(&session_id).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidInput(_)));
    assert_eq!(current_step(&runner, &session_id).await, "activity_selection");
}

#[tokio::test]
async fn unknown_activity_is_rejected() {
    let (runner, _backend) = setup(FakeBackend::default());
    let session_id = start_session(&runner, paris_query()).await;
    runner.run(&session_id).await.unwrap();

    set_input(
        &runner,
        &session_id,
        session_keys::SELECTION_INPUT,
        json!(["Helicopter Tour"]),
    )
    .await;
    let err = runner.run(&session_id).await.unwrap_err();
    assert!(matches!(err, FlowError::InvalidInput(_)));
}

#[tokio::test]
async fn failed_question_fetch_serves_an_empty_list() {
    let (runner, backend) = setup(FakeBackend {
        fail_questions: true,
        ..Default::default()
    });
    let session_id = start_session(&runner, paris_query()).await;
    runner.run(&session_id).await.unwrap();
    set_input(
        &runner,
        &session_id,
        session_keys::SELECTION_INPUT,
        json!(["Louvre Museum"]),
    )
    .await;
    runner.run(&session_id).await.unwrap();

    let result = runner.run(&session_id).await.unwrap();
    let response = result.response.unwrap();
    assert_eq!(response["questions"].as_array().unwrap().len(), 0);
    // Still on the survey step; re-entry is the manual retry.
    assert_eq!(current_step(&runner, &session_id).await, "survey");
    assert_eq!(backend.question_calls.load(Ordering::SeqCst), 1);

    // Each re-entry fetches fresh.
    runner.run(&session_id).await.unwrap();
    assert_eq!(backend.question_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_submission_stays_on_survey_until_retried() {
    let backend = FakeBackend {
        submit_payload: json!({"message": "ok"}),
        plan_payload: json!({"travel_plan": five_day_plan_body()}),
        ..Default::default()
    };
    backend.fail_submit.store(true, Ordering::SeqCst);
    let (runner, backend) = setup(backend);

    let session_id = start_session(&runner, paris_query()).await;
    runner.run(&session_id).await.unwrap();
    set_input(
        &runner,
        &session_id,
        session_keys::SELECTION_INPUT,
        json!(["Louvre Museum"]),
    )
    .await;
    runner.run(&session_id).await.unwrap();

    let responses = json!([{"question": "Question 1?", "selected_option": "Yes"}]);
    set_input(
        &runner,
        &session_id,
        session_keys::SURVEY_RESPONSES_INPUT,
        responses.clone(),
    )
    .await;
    let result = runner.run(&session_id).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::WaitingForInput);
    assert!(result.response.unwrap()["alert"].as_str().is_some());
    assert_eq!(current_step(&runner, &session_id).await, "survey");

    // Manual retry succeeds and advances.
    backend.fail_submit.store(false, Ordering::SeqCst);
    set_input(&runner, &session_id, session_keys::SURVEY_RESPONSES_INPUT, responses).await;
    runner.run(&session_id).await.unwrap();
    assert_eq!(current_step(&runner, &session_id).await, "plan");
}

#[tokio::test]
async fn plan_is_fetched_and_double_decoded_when_not_in_session() {
    // Submission payload carries no plan, so the plan step fetches it; the
    // stored payload is double-encoded.
    let double_encoded =
        Value::String(Value::String(five_day_plan_body().to_string()).to_string());
    let (runner, backend) = setup(FakeBackend {
        submit_payload: json!({"message": "ok"}),
        plan_payload: json!({"city": "Paris", "travel_plan": double_encoded}),
        ..Default::default()
    });

    let session_id = start_session(&runner, paris_query()).await;
    runner.run(&session_id).await.unwrap();
    set_input(
        &runner,
        &session_id,
        session_keys::SELECTION_INPUT,
        json!(["Louvre Museum"]),
    )
    .await;
    runner.run(&session_id).await.unwrap();
    set_input(
        &runner,
        &session_id,
        session_keys::SURVEY_RESPONSES_INPUT,
        json!([{"question": "Question 1?", "selected_option": "Yes"}]),
    )
    .await;
    runner.run(&session_id).await.unwrap();

    let result = runner.run(&session_id).await.unwrap();
    let response = result.response.unwrap();
    assert_eq!(response["plan"]["itinerary"].as_array().unwrap().len(), 5);
    assert_eq!(
        response["plan"]["travel_tips"],
        json!("Buy museum tickets in advance")
    );
    assert_eq!(backend.plan_calls.load(Ordering::SeqCst), 1);

    // Re-entry renders the persisted plan without another fetch.
    runner.run(&session_id).await.unwrap();
    assert_eq!(backend.plan_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn undecodable_plan_payload_degrades_to_placeholders() {
    let (runner, _backend) = setup(FakeBackend {
        submit_payload: json!({"message": "ok"}),
        plan_payload: json!({"travel_plan": 42}),
        ..Default::default()
    });

    let session_id = start_session(&runner, paris_query()).await;
    runner.run(&session_id).await.unwrap();
    set_input(
        &runner,
        &session_id,
        session_keys::SELECTION_INPUT,
        json!(["Louvre Museum"]),
    )
    .await;
    runner.run(&session_id).await.unwrap();
    set_input(
        &runner,
        &session_id,
        session_keys::SURVEY_RESPONSES_INPUT,
        json!([{"question": "Question 1?", "selected_option": "Yes"}]),
    )
    .await;
    runner.run(&session_id).await.unwrap();

    let result = runner.run(&session_id).await.unwrap();
    let response = result.response.unwrap();
    assert_eq!(response["plan"]["itinerary"].as_array().unwrap().len(), 0);
    assert_eq!(response["plan"]["estimated_costs"], json!("Contact for pricing"));
}

#[tokio::test]
async fn plan_step_requires_a_selection() {
    let (runner, _backend) = setup(FakeBackend::default());

    // A session parked on the plan step with no selection in its context
    // is blocked by the guard instead of running the step.
    let session = trip_flow::Session::new("stale-plan", "plan");
    runner.storage().save(session).await.unwrap();

    let err = runner.run("stale-plan").await.unwrap_err();
    assert!(matches!(err, FlowError::PreconditionFailed(_)));
}

#[tokio::test]
async fn replayed_submission_is_not_resubmitted() {
    let (runner, backend) = setup(FakeBackend {
        submit_payload: json!({
            "travel_plan": five_day_plan_body().to_string(),
        }),
        ..Default::default()
    });

    let session_id = start_session(&runner, paris_query()).await;
    runner.run(&session_id).await.unwrap();
    set_input(
        &runner,
        &session_id,
        session_keys::SELECTION_INPUT,
        json!(["Louvre Museum"]),
    )
    .await;
    runner.run(&session_id).await.unwrap();
    set_input(
        &runner,
        &session_id,
        session_keys::SURVEY_RESPONSES_INPUT,
        json!([{"question": "Question 1?", "selected_option": "Yes"}]),
    )
    .await;
    runner.run(&session_id).await.unwrap();
    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);

    // A duplicate submission after the cursor moved on executes the plan
    // step, not a second backend submission.
    set_input(
        &runner,
        &session_id,
        session_keys::SURVEY_RESPONSES_INPUT,
        json!([{"question": "Question 1?", "selected_option": "Yes"}]),
    )
    .await;
    let result = runner.run(&session_id).await.unwrap();
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert_eq!(backend.submit_calls.load(Ordering::SeqCst), 1);
}
