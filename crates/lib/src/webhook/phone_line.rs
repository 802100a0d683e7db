//! validatePhoneLine: verify a phone line against the covered-lines
//! allow-list.
//!
//! Two request shapes exist in the wild and both are handled: the flat
//! session-parameter variant, and the form-parameter variant where the
//! number arrives in `pageInfo.formInfo.parameterInfo[0].value` and an
//! invalid entry must be reset to null so the agent re-prompts.

use crate::webhook::protocol::{
    param_str, ParameterInfo, ParameterState, WebhookRequest, WebhookResponse,
};
use serde_json::{json, Map, Value};

/// Allow-list position that fails verification (the anomalous line).
const UNVERIFIED_INDEX: usize = 3;
/// Allow-list position that carries domestic coverage.
const DOMESTIC_COVERAGE_INDEX: usize = 2;

const VALID_MESSAGE: &str = "Thanks for providing your phone number!";
const INVALID_MESSAGE: &str = "Sorry, we do not recognize that number. Please try again later!";

/// Position of the first covered line containing `phone` as a substring, so
/// callers may supply just the last digits. An empty phone matches nothing.
fn line_index(covered_lines: &[String], phone: &str) -> Option<usize> {
    if phone.is_empty() {
        return None;
    }
    covered_lines.iter().position(|line| line.contains(phone))
}

/// Handle the `validatePhoneLine` tag, auto-selecting the request variant.
pub fn validate_phone_line(req: &WebhookRequest, covered_lines: &[String]) -> WebhookResponse {
    let form_parameter = req
        .page_info
        .as_ref()
        .and_then(|p| p.form_info.parameter_info.first());
    match form_parameter {
        Some(info) => validate_form_parameter(info.clone(), covered_lines),
        None => validate_session_parameter(req, covered_lines),
    }
}

/// Flat variant: the number is the `phone_number` session parameter.
fn validate_session_parameter(req: &WebhookRequest, covered_lines: &[String]) -> WebhookResponse {
    let phone = param_str(&req.session_info.parameters, "phone_number").unwrap_or_default();
    let index = line_index(covered_lines, &phone);

    // No match counts as unverified; only the unverified slot fails among matches.
    let verified = matches!(index, Some(i) if i != UNVERIFIED_INDEX);
    let domestic = index == Some(DOMESTIC_COVERAGE_INDEX);
    let state = if verified {
        ParameterState::Valid
    } else {
        ParameterState::Invalid
    };

    let mut parameters = Map::new();
    parameters.insert(
        "phone_line_verified".to_string(),
        json!(verified.to_string()),
    );
    parameters.insert("domestic_coverage".to_string(), json!(domestic.to_string()));

    WebhookResponse::with_parameters(parameters).with_parameter_info(ParameterInfo {
        display_name: Some("phone_number".to_string()),
        state: Some(state),
        ..Default::default()
    })
}

/// Form variant: the number arrives as the first form parameter's value and
/// the `required` flag is echoed back. An unrecognized number is reset to
/// null so the agent re-prompts for it.
fn validate_form_parameter(info: ParameterInfo, covered_lines: &[String]) -> WebhookResponse {
    let phone = info
        .value
        .as_ref()
        .and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_default();
    let index = line_index(covered_lines, &phone);

    let verified = matches!(index, Some(i) if i != UNVERIFIED_INDEX);
    let domestic = index == Some(DOMESTIC_COVERAGE_INDEX);
    let (state, message, phone_value) = match index {
        None => (ParameterState::Invalid, INVALID_MESSAGE, Value::Null),
        Some(UNVERIFIED_INDEX) => (ParameterState::Invalid, VALID_MESSAGE, json!(phone)),
        Some(_) => (ParameterState::Valid, VALID_MESSAGE, json!(phone)),
    };

    let mut parameters = Map::new();
    parameters.insert(
        "phone_line_verified".to_string(),
        json!(verified.to_string()),
    );
    parameters.insert("domestic_coverage".to_string(), json!(domestic.to_string()));
    parameters.insert("phone".to_string(), phone_value);

    WebhookResponse::with_parameters(parameters)
        .with_text(message)
        .with_parameter_info(ParameterInfo {
            display_name: Some("phone_number".to_string()),
            required: info.required,
            state: Some(state),
            ..Default::default()
        })
}
