//! cheapestPlan: three-tier step pricing over the trip duration.
//!
//! Ties go to the monthly plan whenever the trip is longer than six days,
//! regardless of which plan is numerically cheaper.

use crate::webhook::protocol::{param_i64, WebhookRequest, WebhookResponse};
use serde_json::{json, Map};

const DAILY_RATE: i64 = 10;
const MONTHLY_RATE: i64 = 70;
const DAYS_PER_MONTH: i64 = 30;
/// Trips longer than this get the monthly suggestion.
const DAILY_PLAN_MAX_DAYS: i64 = 6;

/// Handle the `cheapestPlan` tag.
///
/// A non-positive (or missing) duration should never reach this handler, but
/// it is answered defensively with `suggested_plan = "null"` — the literal
/// string, with no costs emitted.
pub fn cheapest_plan(req: &WebhookRequest) -> WebhookResponse {
    let trip_duration = param_i64(&req.session_info.parameters, "trip_duration").unwrap_or(0);

    let mut parameters = Map::new();
    if trip_duration > 0 {
        let daily_cost = trip_duration * DAILY_RATE;
        // Whole months are billed above 30 days; the 7..=30 band is one flat
        // month; at six days or less the floor evaluates to zero.
        let monthly_cost = if trip_duration > DAILY_PLAN_MAX_DAYS && trip_duration <= DAYS_PER_MONTH
        {
            MONTHLY_RATE
        } else {
            (trip_duration / DAYS_PER_MONTH) * MONTHLY_RATE
        };
        let suggested_plan = if trip_duration > DAILY_PLAN_MAX_DAYS {
            "monthly"
        } else {
            "daily"
        };
        parameters.insert("monthly_cost".to_string(), json!(monthly_cost));
        parameters.insert("daily_cost".to_string(), json!(daily_cost));
        parameters.insert("suggested_plan".to_string(), json!(suggested_plan));
    } else {
        parameters.insert("suggested_plan".to_string(), json!("null"));
    }

    WebhookResponse::with_parameters(parameters)
}
