//! Prompt construction
//!
//! Fills the static templates in [`templates`] with classifier, analysis and
//! context data. Rendering fails with [`crate::Error::MissingTemplateVariable`]
//! instead of leaving a slot empty.

pub mod templates;

use crate::Result;
use crate::context::ContextOptimizer;
use crate::engine::ExplanationLevel;
use crate::model::{AggregatedContext, ClassifiedError, ErrorAnalysis};
use std::collections::BTreeMap;
use templates::Template;

const NO_STACK_TRACE: &str = "No stack trace available";
const NO_ANALYSIS_CONTEXT: &str = "No additional context available";
const NO_EXPLANATION_CONTEXT: &str = "No additional context";
const NO_CODEBASE_CONTEXT: &str = "No codebase context available";
const NO_GIT_CONTEXT: &str = "No Git context available";

/// Builds final prompt strings from templates
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    optimizer: ContextOptimizer,
}

impl PromptBuilder {
    /// `max_context_tokens` bounds the context block of analysis prompts
    pub fn new(max_context_tokens: usize) -> Self {
        Self {
            optimizer: ContextOptimizer::new(max_context_tokens),
        }
    }

    pub fn optimizer(&self) -> &ContextOptimizer {
        &self.optimizer
    }

    pub fn system_prompt(&self) -> &'static str {
        templates::SYSTEM_PROMPT.text
    }

    pub fn build_analysis_prompt(
        &self,
        error: &ClassifiedError,
        context: Option<&AggregatedContext>,
    ) -> Result<String> {
        let stack_trace = error
            .stack_trace
            .as_ref()
            .map(|t| t.raw_trace.as_str())
            .unwrap_or_default();
        let context = context.map(|c| self.optimizer.optimize(c)).unwrap_or_default();

        templates::ERROR_ANALYSIS.render(&BTreeMap::from([
            ("error_message", error.raw_message.clone()),
            ("stack_trace", or_placeholder(stack_trace, NO_STACK_TRACE)),
            ("context", or_placeholder(&context, NO_ANALYSIS_CONTEXT)),
        ]))
    }

    pub fn build_solution_prompt(
        &self,
        analysis: &ErrorAnalysis,
        codebase_context: &str,
        git_context: &str,
    ) -> Result<String> {
        templates::SOLUTION_GENERATION.render(&BTreeMap::from([
            ("analysis", format_analysis(analysis)),
            ("codebase_context", or_placeholder(codebase_context, NO_CODEBASE_CONTEXT)),
            ("git_context", or_placeholder(git_context, NO_GIT_CONTEXT)),
        ]))
    }

    /// Only the slots the level's template declares are filled
    pub fn build_explanation_prompt(
        &self,
        error: &ClassifiedError,
        root_cause: &str,
        level: ExplanationLevel,
        context: &str,
        stack_trace: &str,
    ) -> Result<String> {
        let template = explanation_template(level);
        let mut values = BTreeMap::from([
            ("error_message", error.raw_message.clone()),
            ("root_cause", root_cause.to_string()),
        ]);

        if template.declares("context") {
            values.insert("context", or_placeholder(context, NO_EXPLANATION_CONTEXT));
        }
        if template.declares("stack_trace") {
            values.insert("stack_trace", or_placeholder(stack_trace, NO_STACK_TRACE));
        }

        template.render(&values)
    }

    pub fn build_translation_prompt(&self, content: &str, target_language: &str) -> Result<String> {
        templates::TRANSLATION.render(&BTreeMap::from([
            ("content", content.to_string()),
            ("target_language", target_language.to_string()),
        ]))
    }
}

fn explanation_template(level: ExplanationLevel) -> &'static Template {
    match level {
        ExplanationLevel::Simple => &templates::SIMPLE_EXPLANATION,
        ExplanationLevel::Technical => &templates::TECHNICAL_EXPLANATION,
        ExplanationLevel::DeepDive => &templates::DEEP_DIVE_EXPLANATION,
    }
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// Deterministic multi-line rendering of an analysis
pub fn format_analysis(analysis: &ErrorAnalysis) -> String {
    let mut lines = vec![
        format!("Error Type: {}", analysis.error_type),
        format!("Severity: {}", analysis.severity),
        format!("Root Cause: {}", analysis.root_cause.description),
        format!("Confidence: {:.0}%", analysis.confidence * 100.0),
    ];

    if !analysis.contributing_factors.is_empty() {
        let factors: Vec<&str> = analysis
            .contributing_factors
            .iter()
            .map(|f| f.description.as_str())
            .collect();
        lines.push(format!("Contributing Factors: {}", factors.join(", ")));
    }

    if !analysis.affected_components.is_empty() {
        lines.push(format!(
            "Affected Components: {}",
            analysis.affected_components.join(", ")
        ));
    }

    lines.join("\n")
}
