//! Messages API adapter tests against a local canned HTTP server

use futures::StreamExt;
use rootcause::{AnthropicProvider, Error, GenerationConfig, LlmProvider};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Accepts one connection, writes `chunks` with a pause between them, and
/// returns the raw request it received
async fn serve_once(chunks: Vec<String>) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;

        for chunk in chunks {
            socket.write_all(chunk.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        socket.shutdown().await.ok();
        request
    });

    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&raw).into_owned()
}

fn provider(base_url: &str) -> AnthropicProvider {
    AnthropicProvider::new(Some("sk-test".to_string()), "claude-test").with_base_url(base_url)
}

#[tokio::test]
async fn test_generate_sends_request_and_joins_text_blocks() {
    let body = r#"{"content":[{"type":"text","text":"Hello"},{"type":"tool_use"},{"type":"text","text":" world"}]}"#;
    let (base_url, server) = serve_once(vec![format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    )])
    .await;

    let config = GenerationConfig::default()
        .with_system_prompt("be terse")
        .with_stop_sequence("END");
    let text = provider(&base_url).generate("why?", &config).await.unwrap();
    assert_eq!(text, "Hello world");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /v1/messages"));
    assert!(request.to_lowercase().contains("x-api-key: sk-test"));
    assert!(request.to_lowercase().contains("anthropic-version: 2023-06-01"));
    let json_start = request.find("\r\n\r\n").unwrap() + 4;
    let sent: serde_json::Value = serde_json::from_str(&request[json_start..]).unwrap();
    assert_eq!(sent["model"], "claude-test");
    assert_eq!(sent["system"], "be terse");
    assert_eq!(sent["stop_sequences"], serde_json::json!(["END"]));
    assert_eq!(sent["messages"][0]["content"], "why?");
    assert!(sent.get("stream").is_none());
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let (base_url, _server) = serve_once(vec![
        "HTTP/1.1 429 Too Many Requests\r\nretry-after: 30\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string(),
    ])
    .await;

    let err = provider(&base_url)
        .generate("hi", &GenerationConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RateLimited { retry_after: Some(30) }));
    assert!(err.is_retriable());
}

#[tokio::test]
async fn test_server_error_includes_status_and_body() {
    let (base_url, _server) = serve_once(vec![
        "HTTP/1.1 500 Internal Server Error\r\ncontent-type: text/plain\r\ncontent-length: 4\r\nconnection: close\r\n\r\nboom".to_string(),
    ])
    .await;

    let err = provider(&base_url)
        .generate("hi", &GenerationConfig::default())
        .await
        .unwrap_err();

    match err {
        Error::Provider(message) => assert_eq!(message, "500 Internal Server Error: boom"),
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unreadable_error_body_is_reported() {
    // Promises ten bytes, sends three, then closes
    let (base_url, _server) = serve_once(vec![
        "HTTP/1.1 502 Bad Gateway\r\ncontent-length: 10\r\nconnection: close\r\n\r\nbad".to_string(),
    ])
    .await;

    let err = provider(&base_url)
        .generate("hi", &GenerationConfig::default())
        .await
        .unwrap_err();

    match err {
        Error::Provider(message) => {
            assert!(message.starts_with("502 Bad Gateway (could not read response body:"), "{}", message)
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stream_reassembles_lines_split_across_chunks() {
    let (base_url, server) = serve_once(vec![
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n".to_string(),
        "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hel".to_string(),
        "lo\"}}\n\nevent: ping\ndata: {\"type\":\"ping\"}\n\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" world\"}}\n\n".to_string(),
        "data: {\"type\":\"message_stop\"}\n\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"ignored\"}}\n\n".to_string(),
    ])
    .await;

    let stream = provider(&base_url)
        .stream_generate("hi", &GenerationConfig::default())
        .await
        .unwrap();
    let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;

    assert_eq!(chunks, vec!["Hello", " world"]);

    let request = server.await.unwrap();
    let json_start = request.find("\r\n\r\n").unwrap() + 4;
    let sent: serde_json::Value = serde_json::from_str(&request[json_start..]).unwrap();
    assert_eq!(sent["stream"], true);
}

#[tokio::test]
async fn test_stream_error_event_ends_stream() {
    let (base_url, _server) = serve_once(vec![
        "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\nconnection: close\r\n\r\n".to_string(),
        "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"partial\"}}\n\ndata: {\"type\":\"error\",\"error\":{\"type\":\"overloaded_error\",\"message\":\"Overloaded\"}}\n\n".to_string(),
    ])
    .await;

    let stream = provider(&base_url)
        .stream_generate("hi", &GenerationConfig::default())
        .await
        .unwrap();
    let items: Vec<rootcause::Result<String>> = stream.collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "partial");
    assert!(matches!(&items[1], Err(Error::Provider(m)) if m == "Overloaded"));
}
