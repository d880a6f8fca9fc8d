//! LLM provider boundary and response parsing
//!
//! [`LlmProvider`] is the only seam through which natural-language work
//! leaves the process. Implementations surface credential, throttling and
//! upstream failures as distinct [`crate::Error`] variants and never retry.

mod anthropic;
mod parser;

pub use anthropic::{AnthropicProvider, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use parser::ResponseParser;

use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Rough characters-per-token ratio
const CHARS_PER_TOKEN: usize = 4;

/// Per-call generation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop_sequences: Vec<String>,
    pub system_prompt: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.3,
            stop_sequences: Vec::new(),
            system_prompt: None,
        }
    }
}

impl GenerationConfig {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_stop_sequence(mut self, stop: impl Into<String>) -> Self {
        self.stop_sequences.push(stop.into());
        self
    }
}

/// A hosted text-generation model
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a complete response for `prompt`
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Generate a response as a stream of text chunks
    async fn stream_generate(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<BoxStream<'static, Result<String>>>;

    /// Approximate token count (characters / 4). Not billing-accurate.
    fn token_count(&self, text: &str) -> usize {
        estimate_tokens(text)
    }

    /// Model identifier sent upstream
    fn model(&self) -> &str;
}

/// Characters / 4, the budgeting heuristic used across the crate
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}
