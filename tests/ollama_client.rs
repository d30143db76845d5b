mod common;

use common::{spawn_hanging_responder, spawn_http_responder};
use std::time::Duration;
use vidquery::llm::{CompletionProvider, OllamaClient, QueryGenerator, STOP_SEQUENCES};
use vidquery::prompt::ANSWER_SENTINEL;
use vidquery::{FailureKind, PipelineError};

#[tokio::test]
async fn test_request_uses_greedy_bounded_decoding() {
    let (url, seen) = spawn_http_responder(
        "200 OK",
        r#"{"model":"qwen2:1.5b","response":" SELECT COUNT(*) FROM videos;","done":true}"#.to_string(),
    )
    .await;
    let client = OllamaClient::new(&url, "qwen2:1.5b", Duration::from_secs(5), 120).unwrap();

    let completion = client.complete("Вопрос: Сколько всего видео?\nОтвет:").await.unwrap();
    assert_eq!(completion, " SELECT COUNT(*) FROM videos;");

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(body["model"], "qwen2:1.5b");
    assert_eq!(body["stream"], false);
    assert_eq!(body["prompt"], "Вопрос: Сколько всего видео?\nОтвет:");
    assert_eq!(body["options"]["temperature"], 0.0);
    assert_eq!(body["options"]["num_predict"], 120);

    let stop: Vec<&str> = body["options"]["stop"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s.as_str().unwrap())
        .collect();
    assert_eq!(stop, STOP_SEQUENCES);
}

#[tokio::test]
async fn test_generator_sends_full_prompt_and_extracts_sql() {
    let (url, seen) = spawn_http_responder(
        "200 OK",
        r#"{"response":"```sql\nSELECT COUNT(*) FROM videos WHERE views_count > 100000;\n```"}"#.to_string(),
    )
    .await;
    let client = OllamaClient::new(&url, "qwen2:1.5b", Duration::from_secs(5), 120).unwrap();
    let generator = QueryGenerator::new(std::sync::Arc::new(client));

    let sql = generator
        .generate("Сколько видео набрало больше 100 000 просмотров за всё время?")
        .await
        .unwrap();
    assert_eq!(sql, "SELECT COUNT(*) FROM videos WHERE views_count > 100000;");

    let bodies = seen.lock().unwrap();
    let body: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    let prompt = body["prompt"].as_str().unwrap();
    assert!(prompt.contains("video_snapshots"));
    assert!(prompt.ends_with(&format!(
        "Вопрос: Сколько видео набрало больше 100 000 просмотров за всё время?\n{}",
        ANSWER_SENTINEL
    )));
}

#[tokio::test]
async fn test_server_error_is_upstream_unavailable() {
    let (url, _) = spawn_http_responder("500 Internal Server Error", r#"{"error":"model not loaded"}"#.to_string()).await;
    let client = OllamaClient::new(&url, "qwen2:1.5b", Duration::from_secs(5), 120).unwrap();

    let err = client.complete("prompt").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::UpstreamUnavailable);
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn test_malformed_body_is_upstream_unavailable() {
    let (url, _) = spawn_http_responder("200 OK", "not json".to_string()).await;
    let client = OllamaClient::new(&url, "qwen2:1.5b", Duration::from_secs(5), 120).unwrap();

    let err = client.complete("prompt").await.unwrap_err();
    assert!(matches!(err, PipelineError::UpstreamUnavailable(_)));
}

#[tokio::test]
async fn test_missing_response_field_is_empty_completion() {
    let (url, _) = spawn_http_responder("200 OK", r#"{"done":true}"#.to_string()).await;
    let client = OllamaClient::new(&url, "qwen2:1.5b", Duration::from_secs(5), 120).unwrap();

    assert_eq!(client.complete("prompt").await.unwrap(), "");
}

#[tokio::test]
async fn test_timeout_is_upstream_unavailable() {
    let url = spawn_hanging_responder().await;
    let client = OllamaClient::new(&url, "qwen2:1.5b", Duration::from_millis(200), 120).unwrap();

    let started = std::time::Instant::now();
    let err = client.complete("prompt").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::UpstreamUnavailable);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_unreachable_host_is_upstream_unavailable() {
    // Bind then drop to get a port with nothing listening.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = OllamaClient::new(
        &format!("http://127.0.0.1:{}/", port),
        "qwen2:1.5b",
        Duration::from_secs(2),
        120,
    )
    .unwrap();

    let err = client.complete("prompt").await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::UpstreamUnavailable);
}
