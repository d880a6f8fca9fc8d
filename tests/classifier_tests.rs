//! Error classification tests

use rootcause::{ErrorClassifier, ErrorType, RawError, SeverityLevel};
use std::path::PathBuf;

const TRACEBACK: &str = r#"Traceback (most recent call last):
  File "/app/handlers.py", line 42, in handle_request
    result = process(payload)
  File "/app/service.py", line 17, in process
    return payload["id"]
  File "<stdin>", line 1, in <module>
KeyError: 'id'"#;

#[test]
fn test_name_error_is_medium() {
    let error = ErrorClassifier::new().classify(&RawError::new("NameError: name 'x' is not defined"));

    assert_eq!(error.error_type, ErrorType::Name);
    assert_eq!(error.severity, SeverityLevel::Medium);
    assert!(error.stack_trace.is_none());
    assert_eq!(error.location(), "unknown location");
}

#[test]
fn test_memory_error_is_critical() {
    let error = ErrorClassifier::new().classify(&RawError::new("MemoryError: unable to allocate 8 GiB"));

    assert_eq!(error.error_type, ErrorType::Memory);
    assert_eq!(error.severity, SeverityLevel::Critical);
}

#[test]
fn test_unmatched_message_is_unknown() {
    let error = ErrorClassifier::new().classify(&RawError::new("something went sideways"));

    assert_eq!(error.error_type, ErrorType::Unknown);
    assert_eq!(error.severity, SeverityLevel::Medium);
    assert!(error.metadata.get("exception_name").is_none());
}

#[test]
fn test_first_table_entry_wins() {
    // Both names appear; the earlier table entry decides
    let classifier = ErrorClassifier::new();
    assert_eq!(
        classifier.identify_error_type("ValueError raised while handling TypeError"),
        ErrorType::Type
    );
    assert_eq!(
        classifier.identify_error_type("ModuleNotFoundError: No module named 'yaml'"),
        ErrorType::Import
    );
    assert_eq!(
        classifier.identify_error_type("FileNotFoundError: [Errno 2] No such file"),
        ErrorType::Io
    );
}

#[test]
fn test_severity_table() {
    for error_type in ErrorType::ALL {
        let expected = match error_type {
            ErrorType::Memory | ErrorType::Permission | ErrorType::Database => SeverityLevel::Critical,
            ErrorType::Syntax | ErrorType::Import | ErrorType::Configuration => SeverityLevel::High,
            _ => SeverityLevel::Medium,
        };
        assert_eq!(
            ErrorClassifier::categorize_severity(error_type),
            expected,
            "severity of {}",
            error_type
        );
    }
}

#[test]
fn test_stack_trace_frames_in_order() {
    let error = ErrorClassifier::new().classify(&RawError::new(TRACEBACK));

    assert_eq!(error.error_type, ErrorType::Key);
    let trace = error.stack_trace.as_ref().expect("trace");
    assert_eq!(trace.frames.len(), 3);
    assert_eq!(trace.raw_trace, TRACEBACK);

    let top = trace.top_frame().unwrap();
    assert_eq!(top.file_path, Some(PathBuf::from("/app/handlers.py")));
    assert_eq!(top.line_number, Some(42));
    assert_eq!(top.function_name.as_deref(), Some("handle_request"));
    assert_eq!(top.code_context.as_deref(), Some("result = process(payload)"));

    let bottom = trace.bottom_frame().unwrap();
    assert_eq!(bottom.function_name.as_deref(), Some("<module>"));
    assert_eq!(bottom.code_context, None);

    assert_eq!(error.source_file, Some(PathBuf::from("/app/handlers.py")));
    assert_eq!(error.line_number, Some(42));
    assert_eq!(error.location(), "/app/handlers.py:42");
    assert!(error.has_stack_trace());
}

#[test]
fn test_frames_ignored_without_marker() {
    let text = r#"File "/app/a.py", line 3, in main"#;
    let error = ErrorClassifier::new().classify(&RawError::new(text));

    assert!(error.stack_trace.is_none());
    assert!(error.source_file.is_none());
}

#[test]
fn test_marker_without_frames_gives_empty_trace() {
    let error = ErrorClassifier::new().classify(&RawError::new("Traceback: nothing useful here"));

    let trace = error.stack_trace.as_ref().expect("trace");
    assert!(trace.frames.is_empty());
    assert!(!error.has_stack_trace());
}

#[test]
fn test_exception_metadata() {
    let raw = RawError::new(TRACEBACK).with_source("worker.log");
    let error = ErrorClassifier::new().classify(&raw);

    assert_eq!(error.metadata["exception_name"], "KeyError");
    assert_eq!(error.metadata["exception_message"], "'id'");
    assert_eq!(error.metadata["source"], "worker.log");
}

#[test]
fn test_classification_is_deterministic() {
    let classifier = ErrorClassifier::new();
    for message in [
        TRACEBACK,
        "NameError: name 'x' is not defined",
        "",
        "PermissionError: [Errno 13] Permission denied: '/etc/shadow'",
    ] {
        let raw = RawError::new(message);
        assert_eq!(classifier.classify(&raw), classifier.classify(&raw));
    }
}
