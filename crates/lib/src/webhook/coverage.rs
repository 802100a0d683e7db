//! cruisePlanCoverage and internationalCoverage: destination membership
//! tests against the configured coverage lists. Matching is
//! case-insensitive; the lists are stored lowercase.

use crate::webhook::protocol::{
    param_str, ParameterInfo, ParameterState, WebhookRequest, WebhookResponse,
};
use serde_json::{json, Map};

fn contains(list: &[String], destination: &str) -> bool {
    list.iter().any(|entry| entry == destination)
}

/// Handle the `cruisePlanCoverage` tag: is the cruise port covered?
pub fn cruise_plan_coverage(req: &WebhookRequest, covered_ports: &[String]) -> WebhookResponse {
    let port = param_str(&req.session_info.parameters, "destination")
        .unwrap_or_default()
        .to_lowercase();
    let covered = contains(covered_ports, &port);
    let state = if covered {
        ParameterState::Valid
    } else {
        ParameterState::Invalid
    };

    let mut parameters = Map::new();
    parameters.insert("port_is_covered".to_string(), json!(covered.to_string()));

    WebhookResponse::with_parameters(parameters).with_parameter_info(ParameterInfo {
        display_name: Some("destination".to_string()),
        state: Some(state),
        ..Default::default()
    })
}

/// Handle the `internationalCoverage` tag: classify a destination against
/// the monthly and daily plan lists.
///
/// The daily list is a subset of the monthly list by construction, so the
/// daily-only combination is unreachable with well-formed data; it exists
/// only as a defensive default and logs when hit.
pub fn international_coverage(
    req: &WebhookRequest,
    covered_by_monthly: &[String],
    covered_by_daily: &[String],
) -> WebhookResponse {
    let destination = param_str(&req.session_info.parameters, "destination")
        .unwrap_or_default()
        .to_lowercase();
    let monthly = contains(covered_by_monthly, &destination);
    let daily = contains(covered_by_daily, &destination);
    let coverage = match (monthly, daily) {
        (true, true) => "both",
        (true, false) => "monthly_only",
        (false, false) => "neither",
        (false, true) => {
            log::warn!(
                "destination {:?} covered daily but not monthly; daily list must be a subset of monthly",
                destination
            );
            "daily_only"
        }
    };

    let mut parameters = Map::new();
    parameters.insert("coverage".to_string(), json!(coverage));
    WebhookResponse::with_parameters(parameters)
}
