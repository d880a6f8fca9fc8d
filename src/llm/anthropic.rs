//! Anthropic Messages API adapter

use super::{GenerationConfig, LlmProvider};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Provider backed by the hosted Messages API
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "no_stop_sequences")]
    stop_sequences: &'a [String],
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

fn no_stop_sequences(stops: &&[String]) -> bool {
    stops.is_empty()
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    /// A provider without a key is constructible; every call then fails with
    /// [`Error::ProviderUnavailable`].
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn request(&self, prompt: &str, config: &GenerationConfig, stream: bool) -> Result<RequestBuilder> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::ProviderUnavailable(
                "no API key configured (set ANTHROPIC_API_KEY or llm.api_key)".to_string(),
            )
        })?;

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
            system: config.system_prompt.as_deref(),
            stop_sequences: &config.stop_sequences,
            stream,
        };

        Ok(self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .timeout(self.timeout)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::Provider(e.to_string()))?;
        check_status(response).await
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generation request");
        let response = self.send(self.request(prompt, config, false)?).await?;

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| Error::Provider(format!("could not decode response: {}", e)))?;

        Ok(body
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .map(|block| block.text)
            .collect())
    }

    async fn stream_generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<BoxStream<'static, Result<String>>> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "Opening streaming request");
        let response = self.send(self.request(prompt, config, true)?).await?;

        let state = SseState {
            body: response.bytes_stream().map(|chunk| chunk.map(|b| b.to_vec())).boxed(),
            pending: Vec::new(),
            exhausted: false,
            done: false,
        };

        Ok(stream::unfold(state, next_text_chunk).boxed())
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Map non-success statuses to typed errors
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        return Err(Error::RateLimited { retry_after });
    }

    match response.text().await {
        Ok(body) => Err(Error::Provider(format!("{}: {}", status, body))),
        Err(e) => Err(Error::Provider(format!(
            "{} (could not read response body: {})",
            status, e
        ))),
    }
}

struct SseState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    pending: Vec<u8>,
    exhausted: bool,
    done: bool,
}

impl SseState {
    fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).trim_end().to_string())
    }
}

async fn next_text_chunk(mut state: SseState) -> Option<(Result<String>, SseState)> {
    loop {
        if state.done {
            return None;
        }

        if let Some(line) = state.next_line() {
            match parse_sse_line(&line) {
                SseEvent::Text(text) => return Some((Ok(text), state)),
                SseEvent::Error(message) => {
                    state.done = true;
                    return Some((Err(Error::Provider(message)), state));
                }
                SseEvent::Stop => return None,
                SseEvent::Ignore => continue,
            }
        }

        if state.exhausted {
            return None;
        }

        match state.body.next().await {
            Some(Ok(chunk)) => state.pending.extend_from_slice(&chunk),
            Some(Err(e)) => {
                state.done = true;
                return Some((Err(Error::Provider(e.to_string())), state));
            }
            None => {
                state.exhausted = true;
                if !state.pending.is_empty() {
                    state.pending.push(b'\n');
                }
            }
        }
    }
}

#[derive(Debug, PartialEq)]
enum SseEvent {
    Text(String),
    Error(String),
    Stop,
    Ignore,
}

/// Interpret one line of the event stream. Only `data:` lines carry payloads.
fn parse_sse_line(line: &str) -> SseEvent {
    let Some(data) = line.strip_prefix("data:") else {
        return SseEvent::Ignore;
    };
    let Ok(event) = serde_json::from_str::<serde_json::Value>(data.trim()) else {
        return SseEvent::Ignore;
    };

    match event.get("type").and_then(|t| t.as_str()) {
        Some("content_block_delta") => event
            .pointer("/delta/text")
            .and_then(|t| t.as_str())
            .map_or(SseEvent::Ignore, |t| SseEvent::Text(t.to_string())),
        Some("error") => SseEvent::Error(
            event
                .pointer("/error/message")
                .and_then(|m| m.as_str())
                .unwrap_or("stream error")
                .to_string(),
        ),
        Some("message_stop") => SseEvent::Stop,
        _ => SseEvent::Ignore,
    }
}
