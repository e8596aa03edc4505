//! Router-level tests for the analysis relay, with Gemini mocked by wiremock.

use analysis_core::providers::gemini::{GeminiConfig, API_KEY_HEADER};
use analysis_core::providers::GenerationParams;
use analysis_core::RetryConfig;
use analysis_service::config::RelayConfig;
use analysis_service::services::metrics::init_metrics;
use analysis_service::startup::{build_router, AppState};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const OPERATOR_TOKEN: &str = "operator-secret";
const ANALYZE: &str = "/functions/analyze-dog-health";

fn config(server: &MockServer, api_key: Option<&str>) -> RelayConfig {
    RelayConfig {
        common: service_core::config::Config {
            port: 0,
            log_level: "info".to_string(),
        },
        google_api_key: api_key.map(|k| Secret::new(k.to_string())),
        operator_token: Secret::new(OPERATOR_TOKEN.to_string()),
        gemini: GeminiConfig {
            api_base: server.uri(),
            ..Default::default()
        },
        generation: GenerationParams::default(),
        retry: RetryConfig::no_retry(),
        otlp_endpoint: None,
    }
}

fn app(server: &MockServer, api_key: Option<&str>) -> Router {
    init_metrics().unwrap();
    build_router(AppState::from_config(&config(server, api_key)).unwrap())
}

fn rex() -> Value {
    json!({
        "name": "Rex",
        "breed": "Beagle",
        "age": 5,
        "weight": 25,
        "sex": "male",
        "neutered": true,
        "activityLevel": "moderate",
        "previousHealthIssues": [],
        "currentMedications": [],
        "dietaryPreferences": "",
        "allergies": [],
        "environment": "apartment",
        "exerciseHours": 1,
        "symptoms": []
    })
}

fn analyze_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(ANALYZE)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {}", OPERATOR_TOKEN))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mount_reply(server: &MockServer, text: &str) {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-1.5-pro:generateContent"))
        .and(header(API_KEY_HEADER, "AIzaSyRelay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn analyze_returns_normalized_assessment() {
    let server = MockServer::start().await;
    mount_reply(&server, r#"{"confidence": 200, "generalAdvice": ["Daily walks"]}"#).await;

    let response = app(&server, Some("AIzaSyRelay"))
        .oneshot(analyze_request(json!({ "dogInfo": rex() })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = body_json(response).await;
    assert_eq!(body["dogInfo"]["name"], "Rex");
    assert_eq!(body["healthPredictions"]["riskLevel"], "moderate");
    assert_eq!(body["generalAdvice"], json!(["Daily walks"]));
    assert_eq!(body["vetVisitRecommended"], false);
    assert_eq!(body["confidence"], 100.0);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri(ANALYZE)
        .header("content-type", "application/json")
        .body(Body::from(json!({ "dogInfo": rex() }).to_string()))
        .unwrap();

    let response = app(&server, Some("AIzaSyRelay")).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Missing bearer token");
}

#[tokio::test]
async fn wrong_token_is_unauthorized() {
    let server = MockServer::start().await;

    let request = Request::builder()
        .method("POST")
        .uri(ANALYZE)
        .header("content-type", "application/json")
        .header("authorization", "Bearer not-the-token")
        .body(Body::from(json!({ "dogInfo": rex() }).to_string()))
        .unwrap();

    let response = app(&server, Some("AIzaSyRelay")).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let server = MockServer::start().await;

    let response = app(&server, Some("AIzaSyRelay"))
        .oneshot(analyze_request(json!({ "profile": "Rex" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn invalid_profile_is_unprocessable() {
    let server = MockServer::start().await;
    let mut dog = rex();
    dog["name"] = json!("");
    dog["weight"] = json!(0);

    let response = app(&server, Some("AIzaSyRelay"))
        .oneshot(analyze_request(json!({ "dogInfo": dog })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Validation error");
    assert!(body["details"].as_str().unwrap().contains("Name is required"));
}

#[tokio::test]
async fn provider_prose_is_reported_as_analysis_failure() {
    let server = MockServer::start().await;
    mount_reply(&server, "I think Rex is doing great!").await;

    let response = app(&server, Some("AIzaSyRelay"))
        .oneshot(analyze_request(json!({ "dogInfo": rex() })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Analysis failed: Invalid response format from AI service" })
    );
}

#[tokio::test]
async fn missing_provider_key_is_reported_as_analysis_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = app(&server, None)
        .oneshot(analyze_request(json!({ "dogInfo": rex() })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["error"],
        "Analysis failed: Google AI API key not configured"
    );
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let server = MockServer::start().await;

    let request = Request::builder()
        .method("OPTIONS")
        .uri(ANALYZE)
        .header("origin", "https://dogs.example.com")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "authorization, content-type, x-client-info")
        .body(Body::empty())
        .unwrap();

    let response = app(&server, Some("AIzaSyRelay")).oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
    let allowed = response.headers()["access-control-allow-headers"]
        .to_str()
        .unwrap()
        .to_ascii_lowercase();
    assert!(allowed.contains("x-client-info"));
    assert!(allowed.contains("apikey"));
}

#[tokio::test]
async fn ready_checks_the_provider_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(header(API_KEY_HEADER, "AIzaSyRelay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "models": [] })))
        .mount(&server)
        .await;

    let ok = app(&server, Some("AIzaSyRelay"))
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);

    let unconfigured = app(&server, None)
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(unconfigured.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn metrics_are_exposed() {
    let server = MockServer::start().await;
    let router = app(&server, Some("AIzaSyRelay"));

    let _ = router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let response = router
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("http_requests_total"));
}
