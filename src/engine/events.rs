//! Lifecycle events emitted by the engine

use tracing::{debug, info};

/// Characters of the error text included in the start event
const PREVIEW_CHARS: usize = 100;

/// Observability sink handed to [`super::DebuggingEngine`] at construction
pub trait EngineEvents: Send + Sync {
    fn analysis_started(&self, error_preview: &str);
    fn analysis_completed(&self, duration_ms: u64, confidence: f64);
    fn solutions_generated(&self, count: usize);
    fn llm_call(&self, prompt_tokens: usize, response_tokens: usize);
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEvents;

impl EngineEvents for TracingEvents {
    fn analysis_started(&self, error_preview: &str) {
        let preview: String = error_preview.chars().take(PREVIEW_CHARS).collect();
        info!(preview = %preview, "Starting error analysis");
    }

    fn analysis_completed(&self, duration_ms: u64, confidence: f64) {
        info!(duration_ms, confidence = %format!("{:.0}%", confidence * 100.0), "Analysis complete");
    }

    fn solutions_generated(&self, count: usize) {
        info!(count, "Generated solutions");
    }

    fn llm_call(&self, prompt_tokens: usize, response_tokens: usize) {
        debug!(prompt_tokens, response_tokens, "LLM call completed");
    }
}
