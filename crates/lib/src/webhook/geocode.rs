//! geocode: look up a free-text location and answer with a channel-specific
//! rich-content map payload.
//!
//! The only handler with a side effect: one outbound lookup per invocation.

use crate::geocoding::{GeocodingClient, GeocodingError};
use crate::webhook::protocol::{
    param_str, FulfillmentResponse, ResponseMessage, SessionInfo, WebhookRequest, WebhookResponse,
};
use serde_json::{json, Map, Value};

/// Caller id reported when the request did not come in over telephony.
const NO_CALLER_ID: &str = "<no-number>";

/// Geocode failures and their HTTP mapping; every other handler is
/// infallible at this layer.
#[derive(Debug, thiserror::Error)]
pub enum GeocodeHandlerError {
    /// Required session parameters absent — answered 404 per the contract.
    #[error("Not enough information.")]
    MissingParameters,
    /// Downstream lookup failed — answered 500, no retry, no partial result.
    #[error(transparent)]
    Lookup(#[from] GeocodingError),
}

/// Handle the `geocode` tag.
///
/// A single geocoder match builds the static-map rich content for the active
/// channel. Zero matches answer with an empty `formatted_address`. Several
/// matches defer disambiguation entirely to the agent: no address and no map
/// are chosen here.
pub async fn geocode(
    req: &WebhookRequest,
    client: &GeocodingClient,
) -> Result<WebhookResponse, GeocodeHandlerError> {
    let parameters = &req.session_info.parameters;
    // The location parameter is a compound entity; `original` carries the
    // raw user text (place name or address).
    let location = parameters
        .get("location")
        .and_then(|l| l.get("original"))
        .and_then(Value::as_str)
        .ok_or(GeocodeHandlerError::MissingParameters)?;
    let channel = param_str(parameters, "channel").unwrap_or_default();
    let caller_id = req
        .payload
        .as_ref()
        .and_then(|p| p.get("telephony"))
        .and_then(|t| t.get("caller_id"))
        .and_then(Value::as_str)
        .unwrap_or(NO_CALLER_ID)
        .to_string();

    let results = client.lookup(location).await?;

    let mut payload = json!({});
    let formatted_address = match results.as_slice() {
        [] => Some(String::new()),
        [single] => {
            let lat = single.geometry.location.lat;
            let lng = single.geometry.location.lng;
            let map_img = client.static_map_url(&single.formatted_address, lat, lng);
            payload = rich_content_payload(&channel, &map_img);
            Some(single.formatted_address.clone())
        }
        _ => None,
    };

    let mut parameters = Map::new();
    if let Some(address) = formatted_address {
        parameters.insert("formatted_address".to_string(), json!(address));
    }
    parameters.insert("caller_id".to_string(), json!(caller_id));

    Ok(WebhookResponse {
        fulfillment_response: Some(FulfillmentResponse {
            messages: vec![ResponseMessage {
                text: None,
                payload: Some(payload),
            }],
        }),
        session_info: Some(SessionInfo { parameters }),
        ..Default::default()
    })
}

/// Rich-content image payload in the shape each channel renders. Unknown
/// channels get an empty payload; the session parameters still carry the
/// formatted address.
fn rich_content_payload(channel: &str, map_img: &str) -> Value {
    match channel {
        "call-companion" => json!({
            "richContent": [
                { "type": "image", "imageUrl": map_img }
            ]
        }),
        "df-messenger" => json!({
            "richContent": [[
                { "type": "image", "rawUrl": map_img, "accessibilityText": "Map image" }
            ]]
        }),
        _ => json!({}),
    }
}
