//! Integration tests: start the gateway on a free port and exercise the
//! webhook endpoint over HTTP. The geocode tests point the geocoding base
//! URL at a stub server so no network access is needed. Server tasks are
//! left running when a test ends.

use axum::{routing::get, Json, Router};
use lib::config::{Config, GatewayAuthMode};
use lib::gateway;
use serde_json::{json, Value};
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Spawn the gateway and wait until GET / answers.
async fn start_gateway(config: Config) -> String {
    let port = config.gateway.port;
    tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });
    let url = format!("http://127.0.0.1:{}/", port);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return url;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("gateway at {} did not come up within 5s", url);
}

fn local_config() -> Config {
    let mut config = Config::default();
    config.gateway.port = free_port();
    config.gateway.bind = "127.0.0.1".to_string();
    config
}

fn webhook_body(tag: &str, parameters: Value) -> Value {
    json!({
        "fulfillmentInfo": { "tag": tag },
        "sessionInfo": { "parameters": parameters },
    })
}

#[tokio::test]
async fn health_endpoint_reports_running() {
    let config = local_config();
    let port = config.gateway.port;
    let url = start_gateway(config).await;

    let json: Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
    assert_eq!(json.get("runtime").and_then(Value::as_str), Some("running"));
    assert_eq!(json.get("port").and_then(Value::as_u64), Some(port as u64));
}

#[tokio::test]
async fn cheapest_plan_over_http() {
    let url = start_gateway(local_config()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .json(&webhook_body("cheapestPlan", json!({ "trip_duration": 45 })))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let params = &body["sessionInfo"]["parameters"];
    assert_eq!(params["monthly_cost"], json!(70));
    assert_eq!(params["daily_cost"], json!(450));
    assert_eq!(params["suggested_plan"], json!("monthly"));
}

#[tokio::test]
async fn unknown_tag_answers_empty_object() {
    let url = start_gateway(local_config()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .json(&webhook_body("somethingElse", json!({})))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "{}");
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let url = start_gateway(local_config()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn webhook_secret_is_enforced() {
    let mut config = local_config();
    config.gateway.auth.mode = GatewayAuthMode::Token;
    config.gateway.auth.token = Some("test-secret".to_string());
    let url = start_gateway(config).await;

    let client = reqwest::Client::new();
    let body = webhook_body("cheapestPlan", json!({ "trip_duration": 4 }));

    let resp = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .post(&url)
        .header("X-Webhook-Secret", "wrong")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    let resp = client
        .post(&url)
        .header("X-Webhook-Secret", "test-secret")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["sessionInfo"]["parameters"]["suggested_plan"], json!("daily"));
}

/// Stub geocoder answering one fixed match for any address.
async fn start_geocode_stub() -> String {
    let port = free_port();
    let app = Router::new().route(
        "/maps/api/geocode/json",
        get(|| async {
            Json(json!({
                "results": [{
                    "formatted_address": "Haight St & Ashbury St, San Francisco, CA 94117, USA",
                    "geometry": { "location": { "lat": 37.7692591, "lng": -122.4463205 } }
                }],
                "status": "OK"
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("bind stub");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn geocode_over_http_with_stub_lookup() {
    let stub_url = start_geocode_stub().await;
    let mut config = local_config();
    config.geocoding.base_url = Some(stub_url);
    let url = start_gateway(config).await;

    let body = json!({
        "fulfillmentInfo": { "tag": "geocode" },
        "sessionInfo": {
            "parameters": {
                "location": { "original": "haight and ashbury" },
                "channel": "df-messenger",
            }
        },
        "payload": { "telephony": { "caller_id": "+15551230000" } },
    });
    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let res: Value = resp.json().await.unwrap();

    let params = &res["sessionInfo"]["parameters"];
    assert_eq!(
        params["formatted_address"],
        json!("Haight St & Ashbury St, San Francisco, CA 94117, USA")
    );
    assert_eq!(params["caller_id"], json!("+15551230000"));

    let image = &res["fulfillmentResponse"]["messages"][0]["payload"]["richContent"][0][0];
    assert_eq!(image["type"], json!("image"));
    assert_eq!(image["accessibilityText"], json!("Map image"));
    let raw_url = image["rawUrl"].as_str().unwrap();
    assert!(raw_url.contains("/maps/api/staticmap?"));
    assert!(raw_url.contains("zoom=14"));
}

#[tokio::test]
async fn geocode_without_location_is_not_found() {
    let url = start_gateway(local_config()).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(&url)
        .json(&webhook_body("geocode", json!({})))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], json!("Not enough information."));
}

#[tokio::test]
async fn geocode_with_unreachable_lookup_is_server_error() {
    let mut config = local_config();
    // Nothing listens on this port.
    config.geocoding.base_url = Some(format!("http://127.0.0.1:{}", free_port()));
    let url = start_gateway(config).await;

    let body = json!({
        "fulfillmentInfo": { "tag": "geocode" },
        "sessionInfo": {
            "parameters": { "location": { "original": "anywhere" } }
        },
    });
    let client = reqwest::Client::new();
    let resp = client.post(&url).json(&body).send().await.unwrap();
    assert_eq!(resp.status(), 500);
}
