use analysis_core::models::{ActivityLevel, Environment, HealthProfile, RiskLevel, Sex};
use analysis_core::providers::gemini::{GeminiConfig, API_KEY_HEADER};
use analysis_core::providers::GenerationParams;
use analysis_core::relay::{RemoteConfig, RELAY_ANALYZE_PATH};
use analysis_core::{
    AnalysisError, AnalysisRelay, Backend, Credential, CredentialStore, RetryConfig,
    StaticCredential,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-1.5-pro:generateContent";

fn rex() -> HealthProfile {
    HealthProfile {
        name: "Rex".to_string(),
        breed: "Beagle".to_string(),
        age: 5.0,
        weight: 25.0,
        sex: Sex::Male,
        neutered: true,
        activity_level: ActivityLevel::Moderate,
        previous_health_issues: vec![],
        current_medications: vec![],
        dietary_preferences: String::new(),
        allergies: vec![],
        environment: Environment::Apartment,
        exercise_hours: 1.0,
        symptoms: vec![],
    }
}

fn gemini_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    }))
}

fn direct_relay(server: &MockServer, credential: Option<&str>, retry: RetryConfig) -> AnalysisRelay {
    let backend = Backend::Direct {
        gemini: GeminiConfig {
            api_base: server.uri(),
            ..Default::default()
        },
        params: GenerationParams::default(),
    };
    let credentials = Arc::new(StaticCredential::new(credential.map(Credential::new)));
    AnalysisRelay::from_backend(backend, credentials, retry).unwrap()
}

fn remote_relay(server: &MockServer) -> AnalysisRelay {
    relay_at(RemoteConfig::new(server.uri(), "operator-token"), RetryConfig::no_retry())
}

fn relay_at(config: RemoteConfig, retry: RetryConfig) -> AnalysisRelay {
    AnalysisRelay::from_backend(
        Backend::Relayed(config),
        Arc::new(StaticCredential::default()),
        retry,
    )
    .unwrap()
}

/// Consume one HTTP request: headers, then `content-length` bytes of body.
async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return;
            }
        }
    }
}

#[tokio::test]
async fn direct_analysis_fills_defaults_and_clamps_confidence() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header(API_KEY_HEADER, "AIzaSyTest"))
        .and(body_partial_json(json!({
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 3000 }
        })))
        .respond_with(gemini_reply(r#"{"confidence": 200}"#))
        .expect(1)
        .mount(&server)
        .await;

    let result = direct_relay(&server, Some("AIzaSyTest"), RetryConfig::no_retry())
        .analyze(&rex())
        .await
        .unwrap();

    assert_eq!(result.health_predictions.risk_level, RiskLevel::Moderate);
    assert!(result.health_predictions.conditions.is_empty());
    assert!(result.supplement_recommendations.is_empty());
    assert!(result.general_advice.is_empty());
    assert!(!result.vet_visit_recommended);
    assert_eq!(result.confidence, 100.0);
    assert_eq!(result.dog_info, rex());
}

#[tokio::test]
async fn direct_analysis_rejects_non_json_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(gemini_reply("Rex looks like a very healthy beagle!"))
        .mount(&server)
        .await;

    let err = direct_relay(&server, Some("AIzaSyTest"), RetryConfig::quick())
        .analyze(&rex())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Format { .. }));
    assert_eq!(err.to_string(), "Invalid response format from AI service");
}

#[tokio::test]
async fn missing_credential_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(gemini_reply("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let err = direct_relay(&server, None, RetryConfig::quick())
        .analyze(&rex())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Configuration(_)));
    assert_eq!(err.to_string(), "Google AI API key not found");
}

#[tokio::test]
async fn direct_analysis_reads_key_from_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header(API_KEY_HEADER, "AIzaSyStored"))
        .respond_with(gemini_reply(r#"{"vetVisitRecommended": true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(CredentialStore::new(dir.path()));
    let backend = Backend::Direct {
        gemini: GeminiConfig {
            api_base: server.uri(),
            ..Default::default()
        },
        params: GenerationParams::default(),
    };
    let relay = AnalysisRelay::from_backend(backend, store.clone(), RetryConfig::no_retry()).unwrap();

    // Set after the relay is built; picked up on the next call.
    store.set_credential(Credential::new("AIzaSyStored")).unwrap();

    let result = relay.analyze(&rex()).await.unwrap();
    assert!(result.vet_visit_recommended);
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(gemini_reply(r#"{"healthPredictions": {"riskLevel": "high"}}"#))
        .expect(1)
        .mount(&server)
        .await;

    let result = direct_relay(&server, Some("AIzaSyTest"), RetryConfig::quick())
        .analyze(&rex())
        .await
        .unwrap();

    assert_eq!(result.health_predictions.risk_level, RiskLevel::High);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let err = direct_relay(&server, Some("AIzaSyTest"), RetryConfig::quick())
        .analyze(&rex())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Transport { status: Some(403), .. }));
}

#[tokio::test]
async fn relay_error_message_is_passed_through() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RELAY_ANALYZE_PATH))
        .and(header("authorization", "Bearer operator-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "quota exceeded" })))
        .expect(1)
        .mount(&server)
        .await;

    let err = remote_relay(&server).analyze(&rex()).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Relay(_)));
    assert_eq!(err.to_string(), "quota exceeded");
}

#[tokio::test]
async fn relay_error_field_wins_over_server_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RELAY_ANALYZE_PATH))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({ "error": "Analysis failed: quota exceeded" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = relay_at(RemoteConfig::new(server.uri(), "operator-token"), RetryConfig::quick())
        .analyze(&rex())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Relay(_)));
    assert_eq!(err.to_string(), "Analysis failed: quota exceeded");
}

#[tokio::test]
async fn relay_structured_error_field_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RELAY_ANALYZE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "error": { "code": 429, "message": "slow down" } })),
        )
        .mount(&server)
        .await;

    let err = remote_relay(&server).analyze(&rex()).await.unwrap_err();

    match err {
        AnalysisError::Relay(message) => {
            assert!(message.contains("slow down"));
            assert!(message.contains("429"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn truncated_relay_body_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 500\r\n\r\n{\"dogInfo\":",
            )
            .await
            .unwrap();
        // Socket dropped here, well short of the announced length.
    });

    let err = relay_at(
        RemoteConfig::new(format!("http://{}", addr), "operator-token"),
        RetryConfig::no_retry(),
    )
    .analyze(&rex())
    .await
    .unwrap_err();

    assert!(
        matches!(err, AnalysisError::Transport { status: None, .. }),
        "unexpected error: {err:?}"
    );
    assert!(err.is_retryable());
}

#[tokio::test]
async fn relay_timeout_is_not_resubmitted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RELAY_ANALYZE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "confidence": 80 }))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = RemoteConfig::new(server.uri(), "operator-token");
    config.timeout = Duration::from_millis(100);

    let err = relay_at(config, RetryConfig::quick())
        .analyze(&rex())
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Timeout(_)), "unexpected error: {err:?}");
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn relay_failure_status_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RELAY_ANALYZE_PATH))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = remote_relay(&server).analyze(&rex()).await.unwrap_err();

    assert!(matches!(err, AnalysisError::Transport { status: Some(502), .. }));
}

#[tokio::test]
async fn relay_success_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(RELAY_ANALYZE_PATH))
        .and(body_partial_json(json!({ "dogInfo": { "name": "Rex", "breed": "Beagle" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dogInfo": { "name": "Someone else" },
            "healthPredictions": { "riskLevel": "low", "conditions": [] },
            "generalAdvice": ["Keep up the walks"],
            "confidence": -5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = remote_relay(&server).analyze(&rex()).await.unwrap();

    assert_eq!(result.dog_info, rex());
    assert_eq!(result.health_predictions.risk_level, RiskLevel::Low);
    assert_eq!(result.general_advice, vec!["Keep up the walks".to_string()]);
    assert_eq!(result.confidence, 0.0);
}
