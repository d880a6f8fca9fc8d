//! rootcause - LLM-backed debugging assistant
//!
//! This library turns a raw error message or stack trace into a structured
//! root-cause analysis, ranked remediation options, and explanations at
//! several levels of detail.
//!
//! ## Pipeline
//!
//! - **Classify**: raw error text becomes a [`ClassifiedError`] (type, severity, stack trace)
//! - **Aggregate**: codebase, session, environment and custom context merge into one snapshot
//! - **Prompt**: static templates are filled with the error and a size-bounded context summary
//! - **Generate**: the prompt goes to the hosted model through an [`LlmProvider`]
//! - **Parse**: the (possibly malformed) JSON reply becomes typed analysis / solution records
//! - **Rank**: candidate solutions are validated and ordered by a deterministic score
//!
//! [`DebuggingEngine`] sequences the stages and exposes `analyze_error`,
//! `generate_solutions`, `explain_error` and `debug`.

pub mod classify;
pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod git;
pub mod llm;
pub mod model;
pub mod prompt;
pub mod scan;
pub mod solution;

pub use classify::ErrorClassifier;
pub use config::Settings;
pub use context::{ContextAggregator, ContextOptimizer, ContextUpdate};
pub use engine::{DebugReport, DebuggingEngine, EngineEvents, Explanation, ExplanationLevel};
pub use llm::{AnthropicProvider, GenerationConfig, LlmProvider, ResponseParser};
pub use model::{
    AggregatedContext, AnalysisResult, ClassifiedError, ErrorAnalysis, ErrorType, RankedSolution,
    RawError, SeverityLevel, Solution, StackFrame, StackTrace,
};
pub use prompt::PromptBuilder;
pub use solution::{SolutionRanker, SolutionValidator};

/// Result type for rootcause operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in rootcause operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("LLM provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("LLM rate limit exceeded{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<u64> },

    #[error("LLM provider error: {0}")]
    Provider(String),

    #[error("Invalid LLM response: {message} (preview: {preview:?})")]
    InvalidResponse { message: String, preview: String },

    #[error("Template '{template}' is missing a value for '{variable}'")]
    MissingTemplateVariable { template: String, variable: String },
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!(" (retry after {}s)", secs),
        None => String::new(),
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl Error {
    /// Maximum number of characters kept in an invalid-response preview
    pub const PREVIEW_LIMIT: usize = 200;

    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            Error::Io(_) => "IO_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::Git(_) => "GIT_ERROR",
            Error::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Error::RateLimited { .. } => "RATE_LIMIT_EXCEEDED",
            Error::Provider(_) => "LLM_ERROR",
            Error::InvalidResponse { .. } => "INVALID_LLM_RESPONSE",
            Error::MissingTemplateVariable { .. } => "TEMPLATE_ERROR",
        }
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        format!("[{}] {}", self.code(), self)
    }

    /// Whether the caller may reasonably retry later.
    /// Nothing in this crate retries automatically.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::RateLimited { .. })
    }

    /// Build an invalid-response error with a bounded preview of the text
    pub fn invalid_response(message: impl Into<String>, text: &str) -> Self {
        Error::InvalidResponse {
            message: message.into(),
            preview: text.chars().take(Self::PREVIEW_LIMIT).collect(),
        }
    }
}
