//! Analysis records produced from model responses

use super::{AggregatedContext, ClassifiedError, ErrorType, SeverityLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The underlying reason for an error, as identified by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootCause {
    pub description: String,
    /// Confidence in this determination (0.0-1.0)
    pub confidence: f64,
    /// Evidence supporting this cause
    pub evidence: Vec<String>,
}

impl RootCause {
    pub fn new(description: impl Into<String>, confidence: f64) -> Self {
        Self {
            description: description.into(),
            confidence,
            evidence: Vec::new(),
        }
    }
}

/// A contributing factor to an error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Factor {
    pub description: String,
    /// Impact level of this factor
    pub impact: String,
    pub is_primary: bool,
}

impl Factor {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            impact: "medium".to_string(),
            is_primary: false,
        }
    }
}

/// Parsed analysis of one error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorAnalysis {
    pub error_type: ErrorType,
    pub severity: SeverityLevel,
    pub root_cause: RootCause,
    pub contributing_factors: Vec<Factor>,
    pub affected_components: Vec<String>,
    /// Overall confidence (0.0-1.0)
    pub confidence: f64,
}

/// Everything an `analyze_error` call produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The classified error
    pub error: ClassifiedError,
    /// The model's analysis
    pub analysis: ErrorAnalysis,
    pub root_cause: RootCause,
    pub contributing_factors: Vec<Factor>,
    /// Context snapshot used for the prompt
    pub context: Option<AggregatedContext>,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub analysis_duration_ms: u64,
}

impl AnalysisResult {
    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "Error: {} | Severity: {} | Confidence: {:.0}%",
            self.error.error_type,
            self.analysis.severity,
            self.confidence * 100.0
        )
    }
}
