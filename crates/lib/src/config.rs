//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.cxhook/config.json`) and environment.
//! The fulfillment allow-lists default to the sample data so a missing file yields
//! a working gateway; override them in the file for other agents or for tests.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Fulfillment data: allow-lists consulted by the tag handlers.
    #[serde(default)]
    pub fulfillment: FulfillmentConfig,

    /// Geocoding lookup settings (API key, endpoint override).
    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

/// Gateway bind, port, and auth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// HTTP port (default 8080).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Auth settings. When absent, defaults to no auth for loopback bind.
    #[serde(default)]
    pub auth: GatewayAuthConfig,
}

/// Gateway auth: token or none (loopback-only when none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthConfig {
    /// "none" = no shared secret (only safe when bind is loopback).
    /// "token" = require the X-Webhook-Secret header to match the token.
    #[serde(default)]
    pub mode: GatewayAuthMode,

    /// Shared secret sent by the caller as X-Webhook-Secret (Dialogflow
    /// generic web services can attach custom request headers).
    /// Overridden by CXHOOK_GATEWAY_TOKEN env.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayAuthMode {
    /// No auth; allow only when bind is loopback.
    #[default]
    None,

    /// Require X-Webhook-Secret to match the configured token.
    Token,
}

fn default_gateway_port() -> u16 {
    8080
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            auth: GatewayAuthConfig::default(),
        }
    }
}

/// Resolve the gateway token: env CXHOOK_GATEWAY_TOKEN overrides config.
pub fn resolve_gateway_token(config: &Config) -> Option<String> {
    std::env::var("CXHOOK_GATEWAY_TOKEN")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .gateway
                .auth
                .token
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Allow-lists used by the fulfillment handlers. Immutable after load;
/// injected into handlers so tests can substitute their own data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentConfig {
    /// Covered phone lines. Matching is by substring containment, so a
    /// caller may supply just the last digits of a line.
    #[serde(default = "default_covered_lines")]
    pub covered_lines: Vec<String>,

    /// Cruise ports covered by the cruise plan (lowercase).
    #[serde(default = "default_covered_ports")]
    pub covered_ports: Vec<String>,

    /// Destinations covered by the monthly international plan (lowercase).
    /// Must be a superset of `coveredByDaily`.
    #[serde(default = "default_covered_by_monthly")]
    pub covered_by_monthly: Vec<String>,

    /// Destinations covered by the daily international plan (lowercase).
    #[serde(default = "default_covered_by_daily")]
    pub covered_by_daily: Vec<String>,
}

fn default_covered_lines() -> Vec<String> {
    ["5555555555", "5105105100", "1231231234", "9999999999"]
        .map(String::from)
        .to_vec()
}

fn default_covered_ports() -> Vec<String> {
    ["mexico", "canada", "anguilla"].map(String::from).to_vec()
}

fn default_covered_by_monthly() -> Vec<String> {
    [
        "anguilla",
        "australia",
        "brazil",
        "canada",
        "chile",
        "england",
        "france",
        "india",
        "japan",
        "mexico",
        "russia",
        "singapore",
    ]
    .map(String::from)
    .to_vec()
}

fn default_covered_by_daily() -> Vec<String> {
    [
        "anguilla",
        "australia",
        "brazil",
        "canada",
        "chile",
        "england",
        "france",
        "india",
        "japan",
        "mexico",
        "singapore",
    ]
    .map(String::from)
    .to_vec()
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            covered_lines: default_covered_lines(),
            covered_ports: default_covered_ports(),
            covered_by_monthly: default_covered_by_monthly(),
            covered_by_daily: default_covered_by_daily(),
        }
    }
}

/// Geocoding lookup settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodingConfig {
    /// API key for the geocoding and static-map services.
    /// Overridden by GEOCODING_API_KEY env when set.
    pub api_key: Option<String>,

    /// Endpoint base URL override (default https://maps.googleapis.com).
    /// Tests point this at a stub server.
    pub base_url: Option<String>,
}

/// Resolve the geocoding API key: env GEOCODING_API_KEY overrides config.
pub fn resolve_geocoding_api_key(config: &Config) -> Option<String> {
    std::env::var("GEOCODING_API_KEY")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .geocoding
                .api_key
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CXHOOK_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".cxhook").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or CXHOOK_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
