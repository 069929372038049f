pub mod activity_selection;
pub mod plan;
pub mod search;
pub mod survey;

pub use activity_selection::ActivitySelectionStep;
pub use plan::PlanStep;
pub use search::SearchStep;
pub use survey::SurveyStep;

use serde_json::json;
use trip_flow::{FailurePolicy, Result, StepResult};

/// Turn a failed external call into the step outcome its declared policy
/// prescribes: `Abort` resets the flow fail-closed, `InlineRetry` stays on
/// the current step so the user can retry manually. `SilentFallback` sites
/// never reach this function; they substitute fallback content at the call
/// site and surface nothing.
pub(crate) fn alert_on_failure(policy: FailurePolicy, alert: &str) -> Result<StepResult> {
    let payload = json!({ "alert": alert });
    match policy {
        FailurePolicy::Abort => StepResult::reset(payload),
        _ => StepResult::stay(payload),
    }
}
