//! OpenAI interpreter tests against a mocked chat-completions endpoint.

use jockey::services::openai::OpenAiInterpreter;
use jockey::services::QueryInterpreter;
use jockey::types::AppError;
use jockey::utils::toml_config::OpenAiConfig;
use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============= Helper Functions =============

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

fn interpreter(server: &MockServer) -> OpenAiInterpreter {
    let config = OpenAiConfig {
        api_key_env: "JOCKEY_TEST_OPENAI_KEY_UNSET".to_string(),
        api_base: format!("{}/v1", server.uri()),
        ..OpenAiConfig::default()
    };
    OpenAiInterpreter::new(reqwest::Client::new(), &config).with_api_key("sk-test")
}

async fn mount_detection(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("identify ALL components"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_extraction(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Extract the following information"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(content)))
        .expect(1)
        .mount(server)
        .await;
}

// ============= Tests =============

#[tokio::test]
async fn test_two_pass_extraction() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("Authorization", "Bearer sk-test"))
        .and(body_string_contains("identify ALL components"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"["industry", "location", "ticket_size", "new_project"]"#,
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_extraction(
        &server,
        "```json\n{\"industry\": \"fintech\", \"location\": \"Berlin\", \
         \"ticket_size\": {\"min\": 2000000, \"max\": \"5000000\"}, \
         \"new_project\": \"Berlin Q3\"}\n```",
    )
    .await;

    let parsed = interpreter(&server)
        .interpret("find fintech investors in Berlin with 2-5M tickets, save as Berlin Q3")
        .await
        .unwrap();

    assert_eq!(parsed.industry.as_deref(), Some("fintech"));
    assert_eq!(parsed.location.as_deref(), Some("Berlin"));
    assert_eq!(parsed.new_project.as_deref(), Some("Berlin Q3"));
    let ticket = parsed.ticket_size.unwrap();
    assert_eq!(ticket.minimum, Some(2_000_000.0));
    assert_eq!(ticket.maximum, Some(5_000_000.0));

    let metadata = parsed.metadata.unwrap();
    assert_eq!(metadata["query_complexity"], 4);
    assert_eq!(
        metadata["extraction_schema"],
        json!(["industry", "location", "ticket_size", "new_project"])
    );
}

#[tokio::test]
async fn test_detection_failure_uses_fallback_components() {
    let server = MockServer::start().await;
    mount_detection(&server, ResponseTemplate::new(500)).await;
    mount_extraction(&server, r#"{"industry": "biotech"}"#).await;

    let parsed = interpreter(&server).interpret("biotech funds").await.unwrap();

    assert_eq!(parsed.industry.as_deref(), Some("biotech"));
    let metadata = parsed.metadata.unwrap();
    assert_eq!(metadata["detected_components"], json!(["industry", "location"]));
    assert_eq!(metadata["query_complexity"], 2);
}

#[tokio::test]
async fn test_unparseable_detection_uses_fallback_components() {
    let server = MockServer::start().await;
    mount_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(completion("industry and location")),
    )
    .await;
    mount_extraction(&server, r#"{"location": "Paris"}"#).await;

    let parsed = interpreter(&server).interpret("investors in Paris").await.unwrap();
    assert_eq!(parsed.location.as_deref(), Some("Paris"));
    assert_eq!(
        parsed.metadata.unwrap()["detected_components"],
        json!(["industry", "location"])
    );
}

#[tokio::test]
async fn test_error_entry_is_parse_error() {
    let server = MockServer::start().await;
    mount_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(completion(r#"["industry"]"#)),
    )
    .await;
    mount_extraction(&server, r#"{"error": "query is not about investors"}"#).await;

    let err = interpreter(&server).interpret("what's the weather").await.unwrap_err();

    assert!(matches!(err, AppError::Interpretation(_)));
    assert!(err.to_string().contains("Parse error"));
    assert!(err.to_string().contains("not about investors"));
}

#[tokio::test]
async fn test_non_json_extraction_is_parse_error() {
    let server = MockServer::start().await;
    mount_detection(
        &server,
        ResponseTemplate::new(200).set_body_json(completion(r#"["industry"]"#)),
    )
    .await;
    mount_extraction(&server, "Sorry, I cannot help with that.").await;

    let err = interpreter(&server).interpret("???").await.unwrap_err();
    assert!(matches!(err, AppError::Interpretation(_)));
}

#[tokio::test]
async fn test_missing_api_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = OpenAiConfig {
        api_key_env: "JOCKEY_TEST_OPENAI_KEY_UNSET".to_string(),
        api_base: server.uri(),
        ..OpenAiConfig::default()
    };
    let err = OpenAiInterpreter::new(reqwest::Client::new(), &config)
        .interpret("fintech in Berlin")
        .await
        .unwrap_err();

    assert!(err.to_string().starts_with("Parse error"));
}
