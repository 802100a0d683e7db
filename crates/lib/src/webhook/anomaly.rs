//! detectCustomerAnomaly: derive billing-period parameters from the wall
//! clock and flag the one known-anomalous phone line.

use crate::webhook::protocol::{param_str, WebhookRequest, WebhookResponse};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Map, Value};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Phone line that triggers anomaly detection.
const ANOMALOUS_LINE: &str = "9999999999";

const DEFAULT_PURCHASE: &str = "The Godfather";
const ANOMALOUS_PURCHASE: &str = "device protection";
const DEFAULT_PURCHASE_AMOUNT: f64 = 9.99;
const BILL_WITHOUT_PURCHASE: f64 = 54.34;
const DEFAULT_TOTAL_BILL: f64 = 64.33;

/// Transition routing payload: page ids for the two possible target pages,
/// plus the agent/flow ids needed to build the page resource path. Present
/// only in the transition-enabled variant of the sample agent.
#[derive(Debug, Deserialize)]
struct TransitionPayload {
    fields: TransitionFields,
}

#[derive(Debug, Deserialize)]
struct TransitionFields {
    #[serde(rename = "agentId")]
    agent_id: String,
    #[serde(rename = "flowId")]
    flow_id: String,
    show_bill_details_page_id: String,
    suggest_service_cancellation_page_id: String,
}

/// Month name and first-of-month strings for the requested bill period.
/// Returns `(month_name, first_of_month, previous_month_name)`.
///
/// Month indices wrap across year boundaries (January's previous month is
/// December). The printed year is always `today`'s year, even for a
/// December-of-last-year period.
pub(crate) fn date_details(bill_state: &str, today: NaiveDate) -> (String, String, String) {
    let month0 = today.month0() as usize;
    let prev = (month0 + 11) % 12;
    let prev2 = (month0 + 10) % 12;
    let first_of = |m: usize| format!("{} 01, {}", MONTH_NAMES[m], today.year());

    if bill_state == "current" {
        (
            MONTH_NAMES[month0].to_string(),
            first_of(month0),
            MONTH_NAMES[prev].to_string(),
        )
    } else {
        // Any other bill_state means the previous month's bill.
        (
            MONTH_NAMES[prev].to_string(),
            first_of(prev),
            MONTH_NAMES[prev2].to_string(),
        )
    }
}

/// Handle the `detectCustomerAnomaly` tag.
///
/// The anomalous line gets `anomaly_detect="true"`, the device-protection
/// purchase, and (in the transition variant) the suggest-cancellation target
/// page; every other line gets the default purchase. A `bill_amount`
/// parameter overrides the purchase amount and recomputes the total.
pub fn detect_customer_anomaly(req: &WebhookRequest, today: NaiveDate) -> WebhookResponse {
    let parameters = &req.session_info.parameters;
    let phone_number = param_str(parameters, "phone_number").unwrap_or_default();
    // Missing bill_state is treated as "previous", the non-"current" branch.
    let bill_state = param_str(parameters, "bill_state").unwrap_or_default();

    let (month_name, first_of_month, last_month_name) = date_details(&bill_state, today);

    let anomaly = phone_number == ANOMALOUS_LINE;
    let mut purchase = DEFAULT_PURCHASE;
    let mut updated = Map::new();
    if anomaly {
        purchase = ANOMALOUS_PURCHASE;
        updated.insert("product_line".to_string(), json!("phone"));
        updated.insert("bill_month".to_string(), json!(month_name));
        updated.insert("last_month".to_string(), json!(last_month_name));
    }

    let mut purchase_amount = DEFAULT_PURCHASE_AMOUNT;
    let mut total_bill = DEFAULT_TOTAL_BILL;
    if let Some(amount) = parameters
        .get("bill_amount")
        .and_then(|b| b.get("amount"))
        .and_then(Value::as_f64)
    {
        purchase_amount = amount;
        total_bill = BILL_WITHOUT_PURCHASE + amount;
    }

    updated.insert(
        "anomaly_detect".to_string(),
        json!(if anomaly { "true" } else { "false" }),
    );
    updated.insert("purchase".to_string(), json!(purchase));
    updated.insert("purchase_amount".to_string(), json!(purchase_amount));
    updated.insert(
        "bill_without_purchase".to_string(),
        json!(BILL_WITHOUT_PURCHASE),
    );
    updated.insert("total_bill".to_string(), json!(total_bill));
    updated.insert("first_month".to_string(), json!(first_of_month));

    let message = format!(
        "Thanks! I'm going to pull up your {} bill. The billing period began on {}.",
        bill_state, first_of_month
    );
    let mut response = WebhookResponse::with_parameters(updated).with_text(message);

    // Transition variant: the payload carries the page ids; anomalies go to
    // the suggest-cancellation page instead of the bill-details page.
    if let Some(t) = req
        .payload
        .as_ref()
        .and_then(|p| serde_json::from_value::<TransitionPayload>(p.clone()).ok())
    {
        let page = if anomaly {
            t.fields.suggest_service_cancellation_page_id
        } else {
            t.fields.show_bill_details_page_id
        };
        response.target_page = Some(format!(
            "{}/flows/{}/pages/{}",
            t.fields.agent_id, t.fields.flow_id, page
        ));
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn june_15() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn request(parameters: Value, payload: Option<Value>) -> WebhookRequest {
        serde_json::from_value(json!({
            "fulfillmentInfo": { "tag": "detectCustomerAnomaly" },
            "sessionInfo": { "parameters": parameters },
            "payload": payload,
        }))
        .unwrap()
    }

    fn session_param(res: &WebhookResponse, key: &str) -> Value {
        res.session_info
            .as_ref()
            .unwrap()
            .parameters
            .get(key)
            .cloned()
            .unwrap_or(Value::Null)
    }

    #[test]
    fn current_bill_uses_current_month() {
        let (name, first, last) = date_details("current", june_15());
        assert_eq!(name, "June");
        assert_eq!(first, "June 01, 2024");
        assert_eq!(last, "May");
    }

    #[test]
    fn non_current_bill_uses_previous_month() {
        // Any bill_state other than "current" reports the previous month.
        let (name, first, last) = date_details("previous", june_15());
        assert_eq!(name, "May");
        assert_eq!(first, "May 01, 2024");
        assert_eq!(last, "April");
    }

    #[test]
    fn month_indices_wrap_in_january() {
        let january = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let (name, first, last) = date_details("previous", january);
        assert_eq!(name, "December");
        // The printed year is always today's, even across the year boundary.
        assert_eq!(first, "December 01, 2024");
        assert_eq!(last, "November");
    }

    #[test]
    fn month_indices_wrap_in_february() {
        let february = NaiveDate::from_ymd_opt(2024, 2, 3).unwrap();
        let (name, _, last) = date_details("previous", february);
        assert_eq!(name, "January");
        assert_eq!(last, "December");
    }

    #[test]
    fn anomalous_line_is_flagged() {
        let req = request(
            json!({ "phone_number": "9999999999", "bill_state": "current" }),
            None,
        );
        let res = detect_customer_anomaly(&req, june_15());
        assert_eq!(session_param(&res, "anomaly_detect"), json!("true"));
        assert_eq!(session_param(&res, "purchase"), json!("device protection"));
        assert_eq!(session_param(&res, "product_line"), json!("phone"));
        assert_eq!(session_param(&res, "bill_month"), json!("June"));
        assert_eq!(session_param(&res, "last_month"), json!("May"));
    }

    #[test]
    fn normal_line_gets_default_purchase() {
        let req = request(
            json!({ "phone_number": "5555555555", "bill_state": "current" }),
            None,
        );
        let res = detect_customer_anomaly(&req, june_15());
        assert_eq!(session_param(&res, "anomaly_detect"), json!("false"));
        assert_eq!(session_param(&res, "purchase"), json!("The Godfather"));
        assert_eq!(session_param(&res, "purchase_amount"), json!(9.99));
        assert_eq!(session_param(&res, "total_bill"), json!(64.33));
        assert_eq!(session_param(&res, "product_line"), Value::Null);
        assert!(res.target_page.is_none());
    }

    #[test]
    fn bill_amount_overrides_purchase_amount() {
        let req = request(
            json!({
                "phone_number": "5555555555",
                "bill_state": "current",
                "bill_amount": { "amount": 20.0, "currency": "USD" },
            }),
            None,
        );
        let res = detect_customer_anomaly(&req, june_15());
        assert_eq!(session_param(&res, "purchase_amount"), json!(20.0));
        assert_eq!(session_param(&res, "total_bill"), json!(54.34 + 20.0));
    }

    #[test]
    fn transition_payload_builds_target_page() {
        let payload = json!({
            "fields": {
                "agentId": "projects/p/locations/l/agents/a",
                "flowId": "f",
                "show_bill_details_page_id": "bill-details",
                "suggest_service_cancellation_page_id": "cancel",
            }
        });
        let req = request(
            json!({ "phone_number": "5555555555", "bill_state": "current" }),
            Some(payload.clone()),
        );
        let res = detect_customer_anomaly(&req, june_15());
        assert_eq!(
            res.target_page.as_deref(),
            Some("projects/p/locations/l/agents/a/flows/f/pages/bill-details")
        );

        let req = request(
            json!({ "phone_number": "9999999999", "bill_state": "current" }),
            Some(payload),
        );
        let res = detect_customer_anomaly(&req, june_15());
        assert_eq!(
            res.target_page.as_deref(),
            Some("projects/p/locations/l/agents/a/flows/f/pages/cancel")
        );
    }

    #[test]
    fn message_references_first_of_month() {
        let req = request(
            json!({ "phone_number": "5555555555", "bill_state": "previous" }),
            None,
        );
        let res = detect_customer_anomaly(&req, june_15());
        let messages = &res.fulfillment_response.as_ref().unwrap().messages;
        let text = &messages[0].text.as_ref().unwrap().text[0];
        assert!(text.contains("May 01, 2024"), "message was: {}", text);
    }
}
