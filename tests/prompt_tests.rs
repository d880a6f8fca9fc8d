//! Prompt template and builder tests

use rootcause::model::{
    AggregatedContext, CodebaseContext, ErrorAnalysis, Factor, ProjectType, RootCause,
};
use rootcause::prompt::{format_analysis, templates};
use rootcause::{Error, ErrorClassifier, ErrorType, ExplanationLevel, PromptBuilder, RawError, SeverityLevel};
use std::collections::BTreeMap;

const TRACEBACK: &str = "Traceback (most recent call last):\n  File \"/app/main.py\", line 9, in run\n    total = price * qty\nTypeError: can't multiply sequence by non-int of type 'str'";

fn sample_analysis() -> ErrorAnalysis {
    ErrorAnalysis {
        error_type: ErrorType::Type,
        severity: SeverityLevel::Medium,
        root_cause: RootCause::new("qty is read from the form as a string", 0.8),
        contributing_factors: vec![Factor::new("No input coercion"), Factor::new("Missing tests")],
        affected_components: vec!["checkout".to_string()],
        confidence: 0.8,
    }
}

#[test]
fn test_template_placeholders() {
    assert_eq!(
        templates::ERROR_ANALYSIS.placeholders(),
        vec!["error_message", "stack_trace", "context"]
    );
    assert_eq!(
        templates::SOLUTION_GENERATION.placeholders(),
        vec!["analysis", "codebase_context", "git_context"]
    );
    assert_eq!(
        templates::SIMPLE_EXPLANATION.placeholders(),
        vec!["error_message", "root_cause"]
    );
    assert_eq!(
        templates::TECHNICAL_EXPLANATION.placeholders(),
        vec!["error_message", "root_cause", "context"]
    );
    assert_eq!(
        templates::DEEP_DIVE_EXPLANATION.placeholders(),
        vec!["error_message", "root_cause", "context", "stack_trace"]
    );
    assert!(templates::SYSTEM_PROMPT.placeholders().is_empty());
}

#[test]
fn test_render_missing_variable_fails() {
    let values = BTreeMap::from([("error_message", "boom".to_string())]);

    let err = templates::SIMPLE_EXPLANATION.render(&values).unwrap_err();

    assert_eq!(err.code(), "TEMPLATE_ERROR");
    match err {
        Error::MissingTemplateVariable { template, variable } => {
            assert_eq!(template, "simple_explanation");
            assert_eq!(variable, "root_cause");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_render_keeps_schema_braces() {
    let values = BTreeMap::from([
        ("error_message", "boom".to_string()),
        ("stack_trace", "trace".to_string()),
        ("context", "ctx".to_string()),
    ]);

    let prompt = templates::ERROR_ANALYSIS.render(&values).unwrap();

    assert!(prompt.contains("\"error_type\""));
    assert!(prompt.contains('{'));
    assert!(!prompt.contains("{{"));
    assert!(!prompt.contains("{error_message}"));
}

#[test]
fn test_analysis_prompt_with_trace_and_context() {
    let error = ErrorClassifier::new().classify(&RawError::new(TRACEBACK));
    let context = AggregatedContext {
        codebase: Some(CodebaseContext::new(ProjectType::PythonPackage).with_framework("django")),
        ..Default::default()
    };

    let prompt = PromptBuilder::default()
        .build_analysis_prompt(&error, Some(&context))
        .unwrap();

    assert!(prompt.contains("can't multiply sequence"));
    assert!(prompt.contains("total = price * qty"));
    assert!(prompt.contains("Project Type: python_package"));
    assert!(prompt.contains("Frameworks: django"));
}

#[test]
fn test_analysis_prompt_placeholders() {
    let error = ErrorClassifier::new().classify(&RawError::new("ValueError: bad literal"));

    let prompt = PromptBuilder::default().build_analysis_prompt(&error, None).unwrap();

    assert!(prompt.contains("No stack trace available"));
    assert!(prompt.contains("No additional context available"));
}

#[test]
fn test_solution_prompt() {
    let builder = PromptBuilder::default();

    let prompt = builder
        .build_solution_prompt(&sample_analysis(), "Project Type: python_package", "")
        .unwrap();

    assert!(prompt.contains("Error Type: type"));
    assert!(prompt.contains("Confidence: 80%"));
    assert!(prompt.contains("Project Type: python_package"));
    assert!(prompt.contains("No Git context available"));
    assert!(prompt.contains("\"solutions\""));
}

#[test]
fn test_format_analysis() {
    assert_eq!(
        format_analysis(&sample_analysis()),
        "Error Type: type\nSeverity: medium\nRoot Cause: qty is read from the form as a string\nConfidence: 80%\nContributing Factors: No input coercion, Missing tests\nAffected Components: checkout"
    );

    let mut bare = sample_analysis();
    bare.contributing_factors.clear();
    bare.affected_components.clear();
    assert!(!format_analysis(&bare).contains("Contributing"));
}

#[test]
fn test_explanation_prompt_per_level() {
    let builder = PromptBuilder::default();
    let error = ErrorClassifier::new().classify(&RawError::new(TRACEBACK));
    let root_cause = "qty is a string";

    let simple = builder
        .build_explanation_prompt(&error, root_cause, ExplanationLevel::Simple, "ctx", "trace")
        .unwrap();
    assert!(simple.contains("beginner"));
    assert!(!simple.contains("ctx"));

    let technical = builder
        .build_explanation_prompt(&error, root_cause, ExplanationLevel::Technical, "", "trace")
        .unwrap();
    assert!(technical.contains("CONTEXT: No additional context"));
    assert!(!technical.contains("STACK TRACE"));

    let deep = builder
        .build_explanation_prompt(&error, root_cause, ExplanationLevel::DeepDive, "ctx", "")
        .unwrap();
    assert!(deep.contains("CONTEXT: ctx"));
    assert!(deep.contains("STACK TRACE: No stack trace available"));
    assert!(deep.contains(root_cause));
}

#[test]
fn test_translation_prompt() {
    let prompt = PromptBuilder::default()
        .build_translation_prompt("The key was missing.", "es")
        .unwrap();

    assert!(prompt.contains("to es."));
    assert!(prompt.contains("The key was missing."));
}

#[test]
fn test_explanation_level_parsing() {
    assert_eq!("deep_dive".parse::<ExplanationLevel>().unwrap(), ExplanationLevel::DeepDive);
    assert_eq!("Deep-Dive".parse::<ExplanationLevel>().unwrap(), ExplanationLevel::DeepDive);
    assert_eq!("technical".parse::<ExplanationLevel>().unwrap(), ExplanationLevel::Technical);
    assert!("verbose".parse::<ExplanationLevel>().is_err());
    assert_eq!(ExplanationLevel::default(), ExplanationLevel::Simple);
}
