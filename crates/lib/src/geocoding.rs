//! Geocoding API client (Google Maps-compatible endpoints).
//!
//! One lookup per call; no retry, timeout, or caching — the webhook is
//! invoked under the hosting platform's request-concurrency ceiling and the
//! contract forwards downstream failures as-is.

use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Client for the geocode and static-map endpoints.
#[derive(Clone)]
pub struct GeocodingClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum GeocodingError {
    #[error("geocoding request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("geocoding api error: {0}")]
    Api(String),
}

/// One geocoder match.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeResult {
    #[serde(default)]
    pub formatted_address: String,
    #[serde(default)]
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Geometry {
    #[serde(default)]
    pub location: Coordinates,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Coordinates {
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

impl GeocodingClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key: api_key.unwrap_or_default(),
            client: reqwest::Client::new(),
        }
    }

    /// GET /maps/api/geocode/json — look up a free-text place or address.
    /// Reserved characters in the address are URL-encoded by the query builder.
    pub async fn lookup(&self, address: &str) -> Result<Vec<GeocodeResult>, GeocodingError> {
        let url = format!("{}/maps/api/geocode/json", self.base_url);
        let res = self
            .client
            .get(&url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(GeocodingError::Api(format!("{} {}", status, body)));
        }
        let data: GeocodeResponse = res.json().await?;
        Ok(data.results)
    }

    /// Static-map image URL centered on a geocoded match: zoom 14, 600x300,
    /// one red marker at the match coordinates.
    pub fn static_map_url(&self, center: &str, lat: f64, lng: f64) -> String {
        let endpoint = format!("{}/maps/api/staticmap", self.base_url);
        let params = [
            ("center", center.to_string()),
            ("zoom", "14".to_string()),
            ("size", "600x300".to_string()),
            ("markers", format!("color:red|{},{}", lat, lng)),
            ("key", self.api_key.clone()),
        ];
        match reqwest::Url::parse_with_params(&endpoint, &params) {
            Ok(url) => url.to_string(),
            // Only reachable with a malformed baseUrl override; the bare
            // endpoint at least points at the right service.
            Err(_) => endpoint,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_map_url_encodes_center() {
        let client = GeocodingClient::new(None, Some("test-key".to_string()));
        let url = client.static_map_url("Haight St & Ashbury St, San Francisco", 37.77, -122.45);
        assert!(url.starts_with("https://maps.googleapis.com/maps/api/staticmap?"));
        assert!(!url.contains(" & "), "spaces must be encoded: {}", url);
        assert!(url.contains("zoom=14"));
        assert!(url.contains("size=600x300"));
        assert!(url.contains("key=test-key"));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = GeocodingClient::new(Some("http://127.0.0.1:9/".to_string()), None);
        let url = client.static_map_url("x", 0.0, 0.0);
        assert!(url.starts_with("http://127.0.0.1:9/maps/api/staticmap?"));
    }

    #[test]
    fn geocode_response_parses() {
        let body = r#"{
            "results": [{
                "formatted_address": "Haight St & Ashbury St, San Francisco, CA 94117, USA",
                "geometry": { "location": { "lat": 37.7692591, "lng": -122.4463205 } }
            }],
            "status": "OK"
        }"#;
        let data: GeocodeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(data.results.len(), 1);
        assert!(data.results[0].formatted_address.starts_with("Haight St"));
        assert!((data.results[0].geometry.location.lat - 37.7692591).abs() < 1e-9);
    }

    #[test]
    fn zero_results_parse_to_empty() {
        let data: GeocodeResponse =
            serde_json::from_str(r#"{ "results": [], "status": "ZERO_RESULTS" }"#).unwrap();
        assert!(data.results.is_empty());
    }
}
