use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::PlannerError,
    models::{CityInfo, SurveyQuestion, SurveySubmission, TripQuery},
};

/// Every outbound call carries a timeout; the backend is not trusted to
/// answer promptly.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// The itinerary backend, treated as a black box: city descriptions,
/// survey questions, survey submission, and stored plan retrieval.
#[async_trait]
pub trait PlannerBackend: Send + Sync {
    async fn city_info(&self, query: &TripQuery) -> Result<CityInfo, PlannerError>;

    async fn survey_questions(&self, city: &str) -> Result<Vec<SurveyQuestion>, PlannerError>;

    /// Returns the raw success payload; it may or may not carry the plan.
    async fn submit_survey(&self, submission: &SurveySubmission) -> Result<Value, PlannerError>;

    /// Raw stored-plan payload for `city`. The `travel_plan` field inside
    /// may be JSON-encoded-as-string and is decoded defensively by the
    /// caller.
    async fn fetch_plan(&self, city: &str) -> Result<Value, PlannerError>;
}

#[derive(Debug, Deserialize)]
struct SurveyQuestionsResponse {
    #[serde(default)]
    questions: Vec<SurveyQuestion>,
}

/// HTTP implementation against the real backend service.
pub struct HttpPlannerBackend {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPlannerBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PlannerError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PlannerBackend for HttpPlannerBackend {
    async fn city_info(&self, query: &TripQuery) -> Result<CityInfo, PlannerError> {
        debug!(city = %query.city, "fetching city info");
        let info = self
            .http
            .post(self.url("get_city_info"))
            .json(query)
            .send()
            .await?
            .error_for_status()?
            .json::<CityInfo>()
            .await?;
        Ok(info)
    }

    async fn survey_questions(&self, city: &str) -> Result<Vec<SurveyQuestion>, PlannerError> {
        debug!(city = %city, "fetching survey questions");
        let response = self
            .http
            .post(self.url("get_survey_questions"))
            .json(&serde_json::json!({ "city": city }))
            .send()
            .await?
            .error_for_status()?
            .json::<SurveyQuestionsResponse>()
            .await?;
        Ok(response.questions)
    }

    async fn submit_survey(&self, submission: &SurveySubmission) -> Result<Value, PlannerError> {
        debug!(city = %submission.city, "submitting survey answers");
        let payload = self
            .http
            .post(self.url("submit_survey_answers"))
            .json(submission)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(payload)
    }

    async fn fetch_plan(&self, city: &str) -> Result<Value, PlannerError> {
        debug!(city = %city, "fetching stored travel plan");
        let payload = self
            .http
            .get(self.url("get_travel_plan"))
            .query(&[("city", city)])
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(payload)
    }
}
