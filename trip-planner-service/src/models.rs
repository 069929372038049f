use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;

/// Keys under which flow state is persisted in the session context.
/// These names are the storage contract; tooling that inspects sessions
/// relies on them.
pub mod session_keys {
    pub const CITY: &str = "city";
    pub const START_DATE: &str = "start_date";
    pub const END_DATE: &str = "end_date";
    pub const TRAVELERS: &str = "travelers";
    pub const CITY_INFO: &str = "cityInfo";
    pub const SELECTED_ACTIVITIES: &str = "selected_activities";
    pub const TRAVEL_PLAN: &str = "travelPlan";

    // Transient per-request inputs, consumed by the step that reads them.
    pub const TRIP_QUERY_INPUT: &str = "trip_query_input";
    pub const SELECTION_INPUT: &str = "selection_input";
    pub const SURVEY_RESPONSES_INPUT: &str = "survey_responses_input";
}

/// What the user asked for on the landing step. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripQuery {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    pub travelers: u32,
}

impl TripQuery {
    /// Validate the query and normalize a reversed date range by swapping
    /// the endpoints (date-picker behavior). A blank city, an unparsable
    /// date, equal dates, or zero travelers are rejected; nothing is sent
    /// over the network for a query that fails here.
    pub fn normalized(mut self) -> Result<Self, PlannerError> {
        if self.city.trim().is_empty() {
            return Err(PlannerError::Validation(
                "Please enter a destination city".to_string(),
            ));
        }
        if self.travelers == 0 {
            return Err(PlannerError::Validation(
                "Traveler count must be at least 1".to_string(),
            ));
        }

        let start = parse_date(&self.start_date)?;
        let end = parse_date(&self.end_date)?;

        let (start, end) = if end < start { (end, start) } else { (start, end) };
        if start == end {
            return Err(PlannerError::Validation(
                "Please select a date range of at least one day".to_string(),
            ));
        }

        self.city = self.city.trim().to_string();
        self.start_date = start.to_string();
        self.end_date = end.to_string();
        Ok(self)
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, PlannerError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| PlannerError::Validation(format!("invalid date: {raw}")))
}

/// Backend description of a destination. Read-only once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityInfo {
    pub description: String,
    #[serde(default)]
    pub country: String,
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyQuestion {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyResponse {
    pub question: String,
    pub selected_option: String,
}

/// Wire shape posted to the survey-submission endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveySubmission {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    pub selected_activities: Vec<String>,
    pub survey_responses: Vec<SurveyResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub morning: String,
    #[serde(default)]
    pub afternoon: String,
    #[serde(default)]
    pub evening: String,
}

/// The generated itinerary shown on the final step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPlan {
    pub city: String,
    pub start_date: String,
    pub end_date: String,
    pub travelers: u32,
    #[serde(default)]
    pub itinerary: Vec<DayPlan>,
    #[serde(default)]
    pub travel_tips: String,
    #[serde(default)]
    pub local_food_recommendations: String,
    #[serde(default)]
    pub estimated_costs: String,
}

/// The decodable inner body of a plan payload: what the backend generates,
/// without the query fields the session already holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TravelPlanBody {
    #[serde(default)]
    pub itinerary: Vec<DayPlan>,
    #[serde(default)]
    pub travel_tips: String,
    #[serde(default)]
    pub local_food_recommendations: String,
    #[serde(default)]
    pub estimated_costs: String,
}

impl TravelPlan {
    /// Combine the session's trip query with a decoded plan body, filling
    /// placeholders for anything the backend left empty.
    pub fn from_body(
        city: &str,
        start_date: &str,
        end_date: &str,
        travelers: u32,
        body: TravelPlanBody,
    ) -> Self {
        Self {
            city: city.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            travelers,
            itinerary: body.itinerary,
            travel_tips: body.travel_tips,
            local_food_recommendations: body.local_food_recommendations,
            estimated_costs: body.estimated_costs,
        }
        .with_placeholders()
    }

    /// Empty plan with placeholder text, used when the backend payload
    /// cannot be decoded. The display step renders this rather than failing.
    pub fn placeholder(city: &str, start_date: &str, end_date: &str, travelers: u32) -> Self {
        Self {
            city: city.to_string(),
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
            travelers,
            itinerary: Vec::new(),
            travel_tips: "Travel tips will be provided upon booking.".to_string(),
            local_food_recommendations: "Local food recommendations will be provided upon booking."
                .to_string(),
            estimated_costs: "Contact for pricing".to_string(),
        }
    }

    /// Fill any field the backend left empty with its placeholder text.
    pub fn with_placeholders(mut self) -> Self {
        let defaults = TravelPlan::placeholder(
            &self.city,
            &self.start_date,
            &self.end_date,
            self.travelers,
        );
        if self.travel_tips.trim().is_empty() {
            self.travel_tips = defaults.travel_tips;
        }
        if self.local_food_recommendations.trim().is_empty() {
            self.local_food_recommendations = defaults.local_food_recommendations;
        }
        if self.estimated_costs.trim().is_empty() {
            self.estimated_costs = defaults.estimated_costs;
        }
        self
    }
}

/// Canonical hotel record. Raw provider records use varying field names and
/// are normalized into this shape at the client boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelOption {
    pub name: String,
    pub address: String,
    pub price: String,
    pub rating: Option<f64>,
}

/// Whether the plan content is visually obscured. This is a presentation
/// gate driven by a URL flag after the mock purchase flow, not an
/// access-control boundary; the server does not verify any purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockState {
    pub is_blurred: bool,
}

impl Default for UnlockState {
    fn default() -> Self {
        Self { is_blurred: true }
    }
}

impl UnlockState {
    /// Blurred unless the explicit unlock flag is present and true.
    pub fn from_flag(unlocked: Option<bool>) -> Self {
        Self {
            is_blurred: !unlocked.unwrap_or(false),
        }
    }
}

/// One purchasable package tier fronting the mock paywall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageOffer {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub duration: String,
    pub features: Vec<String>,
    pub popularity: String,
}

/// Fixed three-tier catalog, personalized with the destination name.
pub fn package_catalog(city: &str) -> Vec<PackageOffer> {
    vec![
        PackageOffer {
            id: "basic".to_string(),
            name: "Essential Explorer".to_string(),
            price: 29.99,
            description: format!(
                "See the best of {city} with our basic package. Includes standard itinerary and minimal customization."
            ),
            duration: "Access for 30 days".to_string(),
            features: vec![
                "Full itinerary access".to_string(),
                "PDF download option".to_string(),
                "Basic restaurant recommendations".to_string(),
                "Standard attractions".to_string(),
            ],
            popularity: "high".to_string(),
        },
        PackageOffer {
            id: "premium".to_string(),
            name: "Premium Explorer".to_string(),
            price: 49.99,
            description: format!(
                "Experience {city} like a local with our premium package. Includes customized itinerary and off-the-beaten-path locations."
            ),
            duration: "Access for 60 days".to_string(),
            features: vec![
                "Everything in Essential".to_string(),
                "Customizable itinerary".to_string(),
                "Hidden gem locations".to_string(),
                "Premium restaurant bookings".to_string(),
                "Transportation guidance".to_string(),
                "Priority customer support".to_string(),
            ],
            popularity: "medium".to_string(),
        },
        PackageOffer {
            id: "luxury".to_string(),
            name: "Luxury Experience".to_string(),
            price: 99.99,
            description: format!(
                "The ultimate {city} experience. Fully personalized plans with exclusive access and VIP treatment."
            ),
            duration: "Lifetime access".to_string(),
            features: vec![
                "Everything in Premium".to_string(),
                "Personal travel assistant".to_string(),
                "VIP attraction access".to_string(),
                "Luxury dining reservations".to_string(),
                "Hotel upgrade assistance".to_string(),
                "24/7 travel support".to_string(),
                "Personalized souvenir guide".to_string(),
            ],
            popularity: "low".to_string(),
        },
    ]
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectActivitiesRequest {
    pub activities: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitSurveyRequest {
    pub responses: Vec<SurveyResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub current_step: String,
    pub context: std::collections::HashMap<String, serde_json::Value>,
}
