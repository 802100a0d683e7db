//! Tag dispatch: map `fulfillmentInfo.tag` to a handler.
//!
//! One enum variant per known tag instead of stringly-typed routing, so a
//! new handler cannot be added without the match below noticing.

use crate::config::FulfillmentConfig;
use crate::geocoding::GeocodingClient;
use crate::webhook::protocol::{WebhookRequest, WebhookResponse};
use crate::webhook::{anomaly, coverage, geocode, phone_line, plan, GeocodeHandlerError};
use chrono::NaiveDate;

/// Known fulfillment tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    DetectCustomerAnomaly,
    ValidatePhoneLine,
    CruisePlanCoverage,
    InternationalCoverage,
    CheapestPlan,
    Geocode,
}

impl Tag {
    /// Parse the wire tag. Unknown tags are None (answered with an empty 200).
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "detectCustomerAnomaly" => Some(Self::DetectCustomerAnomaly),
            "validatePhoneLine" => Some(Self::ValidatePhoneLine),
            "cruisePlanCoverage" => Some(Self::CruisePlanCoverage),
            "internationalCoverage" => Some(Self::InternationalCoverage),
            "cheapestPlan" => Some(Self::CheapestPlan),
            "geocode" => Some(Self::Geocode),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DetectCustomerAnomaly => "detectCustomerAnomaly",
            Self::ValidatePhoneLine => "validatePhoneLine",
            Self::CruisePlanCoverage => "cruisePlanCoverage",
            Self::InternationalCoverage => "internationalCoverage",
            Self::CheapestPlan => "cheapestPlan",
            Self::Geocode => "geocode",
        }
    }
}

/// Dispatch one webhook request to its handler.
///
/// An unknown or empty tag is not an error: the contract's default is a
/// silent-success empty response. `today` is injected so the billing-date
/// handler stays a pure function under test.
pub async fn fulfill(
    req: &WebhookRequest,
    fulfillment: &FulfillmentConfig,
    geocoder: &GeocodingClient,
    today: NaiveDate,
) -> Result<WebhookResponse, GeocodeHandlerError> {
    let Some(tag) = Tag::parse(&req.fulfillment_info.tag) else {
        log::debug!(
            "unknown tag {:?}, answering with empty response",
            req.fulfillment_info.tag
        );
        return Ok(WebhookResponse::default());
    };
    log::info!("{} was triggered", tag.as_str());
    Ok(match tag {
        Tag::DetectCustomerAnomaly => anomaly::detect_customer_anomaly(req, today),
        Tag::ValidatePhoneLine => phone_line::validate_phone_line(req, &fulfillment.covered_lines),
        Tag::CruisePlanCoverage => coverage::cruise_plan_coverage(req, &fulfillment.covered_ports),
        Tag::InternationalCoverage => coverage::international_coverage(
            req,
            &fulfillment.covered_by_monthly,
            &fulfillment.covered_by_daily,
        ),
        Tag::CheapestPlan => plan::cheapest_plan(req),
        Tag::Geocode => geocode::geocode(req, geocoder).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_tags() {
        for tag in [
            Tag::DetectCustomerAnomaly,
            Tag::ValidatePhoneLine,
            Tag::CruisePlanCoverage,
            Tag::InternationalCoverage,
            Tag::CheapestPlan,
            Tag::Geocode,
        ] {
            assert_eq!(Tag::parse(tag.as_str()), Some(tag));
        }
    }

    #[test]
    fn parse_unknown_tag() {
        assert_eq!(Tag::parse(""), None);
        assert_eq!(Tag::parse("somethingElse"), None);
        // Tags are case-sensitive on the wire.
        assert_eq!(Tag::parse("CheapestPlan"), None);
    }

    #[tokio::test]
    async fn unknown_tag_answers_empty() {
        let req = WebhookRequest::default();
        let fulfillment = FulfillmentConfig::default();
        let geocoder = GeocodingClient::new(None, None);
        let today = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        let res = fulfill(&req, &fulfillment, &geocoder, today).await.unwrap();
        assert_eq!(serde_json::to_string(&res).unwrap(), "{}");
    }
}
