//! Integration tests for streaming extraction
//!
//! These tests serve canned server-sent event streams from wiremock and run the
//! extraction engine and the pipeline against the real model backends.

use reqwest::Client;
use scrapesmart::backend::{BackendError, DeepSeekBackend, GeminiBackend, ModelBackend};
use scrapesmart::crawler::{Crawler, HtmlExtractor, HttpFetcher};
use scrapesmart::events::{EventSink, ExtractionEvent};
use scrapesmart::extraction::{Role, Turn};
use scrapesmart::output::{write_export, ExportFormat};
use scrapesmart::table::CellValue;
use scrapesmart::{
    Config, ConversationHistory, ExtractionEngine, ExtractionRequest, Pipeline, SessionState,
};
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GEMINI_PATH: &str = "/models/gemini-test:streamGenerateContent";

fn sse(payloads: &[&str]) -> ResponseTemplate {
    let body: String = payloads
        .iter()
        .map(|payload| format!("data: {}\n\n", payload))
        .collect();
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

fn gemini_chunk(text: &str) -> String {
    serde_json::json!({
        "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
    })
    .to_string()
}

fn deepseek_chunk(text: &str) -> String {
    serde_json::json!({"choices": [{"index": 0, "delta": {"content": text}}]}).to_string()
}

fn gemini(server: &MockServer) -> GeminiBackend {
    GeminiBackend::new(Client::new(), server.uri(), "gemini-test", "test-key")
}

fn product_table_stream() -> ResponseTemplate {
    let first = gemini_chunk("| name | price |\n");
    let second = gemini_chunk("|---|---|\n| Widget | 9.5 |");
    sse(&[&first, &second])
}

#[tokio::test]
async fn test_gemini_streams_fragments() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(query_param("alt", "sse"))
        .and(header("x-goog-api-key", "test-key"))
        .and(body_string_contains("systemInstruction"))
        .respond_with(product_table_stream())
        .expect(1)
        .mount(&mock_server)
        .await;

    let engine = ExtractionEngine::new(Box::new(gemini(&mock_server)));
    let (events, mut rx) = EventSink::channel();

    let result = engine
        .extract(
            &["Widget costs 9.5".to_string()],
            &ExtractionRequest::new("products", false),
            ConversationHistory::new(),
            &events,
        )
        .await;
    drop(events);

    assert!(result.is_complete());
    assert_eq!(
        result.combined_text,
        "| name | price |\n|---|---|\n| Widget | 9.5 |"
    );
    assert_eq!(result.history.len(), 2);
    assert_eq!(result.history.turns()[1].role, Role::Assistant);

    let mut fragments = Vec::new();
    while let Some(event) = rx.recv().await {
        if let ExtractionEvent::Fragment(fragment) = event {
            fragments.push(fragment);
        }
    }
    assert_eq!(fragments.len(), 2);
}

#[tokio::test]
async fn test_gemini_error_status_keeps_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("quota exceeded"))
        .mount(&mock_server)
        .await;

    let backend = gemini(&mock_server);
    match backend
        .stream_generate(&[Turn::user("hi")], "be brief")
        .await
    {
        Err(BackendError::Status { code, body }) => {
            assert_eq!(code, 500);
            assert!(body.contains("quota exceeded"));
        }
        Err(other) => panic!("expected status error, got {}", other),
        Ok(_) => panic!("expected status error, got a stream"),
    }

    let mut history = ConversationHistory::new();
    history.push_exchange(Turn::user("earlier"), Turn::assistant("answer"));

    let engine = ExtractionEngine::new(Box::new(backend));
    let result = engine
        .extract(
            &["a".to_string(), "b".to_string()],
            &ExtractionRequest::new("letters", true),
            history.clone(),
            &EventSink::none(),
        )
        .await;

    assert!(!result.is_complete());
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .starts_with("An error occurred during extraction:"));
    assert_eq!(result.combined_text, "");
    assert_eq!(result.history, history);
}

#[tokio::test]
async fn test_deepseek_chunked_extraction() {
    let mock_server = MockServer::start().await;

    let first = deepseek_chunk("| id |\n|---|\n");
    let second = deepseek_chunk("| 7 |");
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("\"stream\":true"))
        .respond_with(sse(&[&first, &second, "[DONE]"]))
        .expect(2)
        .mount(&mock_server)
        .await;

    let backend = DeepSeekBackend::new(
        Client::new(),
        mock_server.uri(),
        "deepseek/deepseek-chat-v3-0324:free",
        "sk-test",
    );
    let engine = ExtractionEngine::new(Box::new(backend));

    let result = engine
        .extract(
            &["first chunk".to_string(), "second chunk".to_string()],
            &ExtractionRequest::new("ids", true),
            ConversationHistory::new(),
            &EventSink::none(),
        )
        .await;

    assert!(result.is_complete());
    assert_eq!(result.combined_text, "| id |\n|---|\n| 7 |\n| id |\n|---|\n| 7 |");
    assert_eq!(result.history.len(), 4);
    assert_eq!(
        result.history.turns()[2],
        Turn::user("Text content: second chunk\n\nDescription: ids")
    );
}

#[tokio::test]
async fn test_scrape_ask_export_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>Widget costs 9.5</p></body></html>"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(GEMINI_PATH))
        .and(body_string_contains("Widget costs 9.5"))
        .respond_with(product_table_stream())
        .expect(1)
        .mount(&mock_server)
        .await;

    let out_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.output.directory = out_dir.path().display().to_string();

    let crawler = Crawler::new(
        Box::new(HttpFetcher::with_client(Client::new(), Duration::ZERO)),
        Box::new(HtmlExtractor::new()),
        config.fetcher.challenge_markers.clone(),
    );
    let engine = ExtractionEngine::new(Box::new(gemini(&mock_server)));
    let pipeline = Pipeline::with_parts(config, crawler, engine);

    let mut state = SessionState::new();
    pipeline
        .scrape(
            &mut state,
            &format!("{}/shop", mock_server.uri()),
            &EventSink::none(),
        )
        .await
        .unwrap();
    assert_eq!(state.corpus, "Widget costs 9.5");

    let answer = pipeline
        .ask(&mut state, "products", &EventSink::none())
        .await
        .unwrap();

    assert!(answer.error.is_none());
    assert_eq!(answer.table.columns(), ["name", "price"]);
    assert_eq!(
        answer.table.rows()[0],
        vec![CellValue::Text("Widget".to_string()), CellValue::Float(9.5)]
    );

    let path = write_export(
        out_dir.path(),
        "products",
        ExportFormat::Json,
        &answer.table,
        &answer.text,
    )
    .unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(
        written,
        serde_json::json!([{"name": "Widget", "price": 9.5}])
    );
}
