//! Dialogflow CX webhook wire types (WebhookRequest / WebhookResponse).
//!
//! Field names are fixed by the Dialogflow CX webhook contract
//! (`fulfillmentInfo`, `sessionInfo`, `pageInfo`, `payload`, `targetPage`,
//! `fulfillmentResponse.messages[].text.text`). Parameter maps keep
//! insertion order so computed parameters serialize in a stable order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Incoming webhook request. Every section is optional on the wire; absent
/// sections deserialize to empty defaults so handlers can stay permissive.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRequest {
    #[serde(default)]
    pub fulfillment_info: FulfillmentInfo,
    #[serde(default)]
    pub session_info: SessionInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    /// Free-form routing payload (e.g. target page ids, telephony caller id).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Selects the fulfillment behavior via `tag`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FulfillmentInfo {
    #[serde(default)]
    pub tag: String,
}

/// Session parameters collected by the agent so far.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

/// Current page's form state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub form_info: FormInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInfo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter_info: Vec<ParameterInfo>,
}

/// One form parameter descriptor. Requests carry `value`; responses update
/// `state` (and echo `required` so the agent knows whether to re-prompt).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ParameterState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Form parameter validity as Dialogflow expects it on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterState {
    Valid,
    Invalid,
}

/// Outgoing webhook response. Sections are omitted entirely when unset, so
/// the default value serializes as `{}` (the empty-200 path for unknown tags).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment_response: Option<FulfillmentResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_info: Option<SessionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_info: Option<PageInfo>,
    /// Fully-qualified page resource path to transition to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_page: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FulfillmentResponse {
    #[serde(default)]
    pub messages: Vec<ResponseMessage>,
}

/// One response message: literal text or a rich-content payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextMessage {
    #[serde(default)]
    pub text: Vec<String>,
}

impl WebhookResponse {
    /// Response carrying only updated session parameters.
    pub fn with_parameters(parameters: Map<String, Value>) -> Self {
        Self {
            session_info: Some(SessionInfo { parameters }),
            ..Default::default()
        }
    }

    /// Attach a single literal-text fulfillment message.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.fulfillment_response = Some(FulfillmentResponse {
            messages: vec![ResponseMessage {
                text: Some(TextMessage {
                    text: vec![text.into()],
                }),
                payload: None,
            }],
        });
        self
    }

    /// Attach a single form-parameter state update.
    pub fn with_parameter_info(mut self, info: ParameterInfo) -> Self {
        self.page_info = Some(PageInfo {
            form_info: FormInfo {
                parameter_info: vec![info],
            },
        });
        self
    }
}

/// Session parameter as a string. Dialogflow sends numeric entities as JSON
/// numbers, so numbers and booleans are stringified rather than rejected.
pub fn param_str(parameters: &Map<String, Value>, key: &str) -> Option<String> {
    match parameters.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Session parameter as an integer; floats are truncated (Dialogflow's
/// `@sys.number` arrives as a double) and numeric strings are parsed.
pub fn param_i64(parameters: &Map<String, Value>, key: &str) -> Option<i64> {
    match parameters.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
