//! Error classification - raw error text into a structured record
//!
//! Classification is a pure function of the input: no I/O, no model calls.
//! Identical input always yields an identical [`ClassifiedError`].

use crate::model::{ClassifiedError, ErrorType, RawError, SeverityLevel, StackFrame, StackTrace};
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::debug;

/// Known error names, checked in order; the first substring match wins.
const ERROR_NAME_TABLE: &[(&str, ErrorType)] = &[
    ("SyntaxError", ErrorType::Syntax),
    ("TypeError", ErrorType::Type),
    ("ValueError", ErrorType::Value),
    ("NameError", ErrorType::Name),
    ("AttributeError", ErrorType::Attribute),
    ("IndexError", ErrorType::Index),
    ("KeyError", ErrorType::Key),
    ("ImportError", ErrorType::Import),
    ("ModuleNotFoundError", ErrorType::Import),
    ("FileNotFoundError", ErrorType::Io),
    ("IOError", ErrorType::Io),
    ("MemoryError", ErrorType::Memory),
    ("TimeoutError", ErrorType::Timeout),
    ("ConnectionError", ErrorType::Network),
    ("PermissionError", ErrorType::Permission),
    ("AssertionError", ErrorType::Assertion),
    ("RecursionError", ErrorType::Runtime),
    ("RuntimeError", ErrorType::Runtime),
    ("OSError", ErrorType::Io),
    ("ConnectionRefusedError", ErrorType::Network),
    ("ConnectionResetError", ErrorType::Network),
    ("OperationalError", ErrorType::Database),
    ("IntegrityError", ErrorType::Database),
    ("AuthenticationError", ErrorType::Authentication),
    ("ImproperlyConfigured", ErrorType::Configuration),
];

/// Error types classified as critical
const CRITICAL_TYPES: &[ErrorType] = &[ErrorType::Memory, ErrorType::Permission, ErrorType::Database];

/// Error types classified as high
const HIGH_TYPES: &[ErrorType] = &[ErrorType::Syntax, ErrorType::Import, ErrorType::Configuration];

/// Text that marks the presence of a stack trace
const TRACE_MARKER: &str = "Traceback";

static FRAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"File "([^"]+)", line (\d+), in (<\w+>|\w+)"#).expect("valid frame pattern")
});

static EXCEPTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(\w+Error|\w+Exception):\s*(.+)").expect("valid exception pattern")
});

/// Maps raw error text to a [`ClassifiedError`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a raw error
    pub fn classify(&self, raw: &RawError) -> ClassifiedError {
        let error_type = self.identify_error_type(&raw.message);
        let stack_trace = self.extract_stack_trace(&raw.message);
        let severity = Self::categorize_severity(error_type);

        let (source_file, line_number) = stack_trace
            .as_ref()
            .and_then(|t| t.top_frame())
            .map(|f| (f.file_path.clone(), f.line_number))
            .unwrap_or((None, None));

        debug!(
            %error_type,
            %severity,
            frames = stack_trace.as_ref().map_or(0, |t| t.frames.len()),
            "Classified error"
        );

        ClassifiedError {
            raw_message: raw.message.clone(),
            error_type,
            severity,
            stack_trace,
            source_file,
            line_number,
            timestamp: raw.timestamp,
            metadata: self.extract_metadata(raw),
        }
    }

    /// First entry of the name table found in the message, else `Unknown`
    pub fn identify_error_type(&self, message: &str) -> ErrorType {
        ERROR_NAME_TABLE
            .iter()
            .find(|(name, _)| message.contains(name))
            .map(|(_, error_type)| *error_type)
            .unwrap_or(ErrorType::Unknown)
    }

    /// Parse frames if the message carries a trace marker
    pub fn extract_stack_trace(&self, message: &str) -> Option<StackTrace> {
        if !message.contains(TRACE_MARKER) {
            return None;
        }

        Some(StackTrace {
            frames: parse_frames(message),
            raw_trace: message.to_string(),
        })
    }

    /// Severity depends only on the error type
    pub fn categorize_severity(error_type: ErrorType) -> SeverityLevel {
        if CRITICAL_TYPES.contains(&error_type) {
            SeverityLevel::Critical
        } else if HIGH_TYPES.contains(&error_type) {
            SeverityLevel::High
        } else {
            SeverityLevel::Medium
        }
    }

    fn extract_metadata(&self, raw: &RawError) -> BTreeMap<String, Value> {
        let mut metadata = BTreeMap::new();

        if let Some(ref source) = raw.source {
            metadata.insert("source".to_string(), Value::String(source.clone()));
        }

        // The last exception line is the one that was actually raised
        if let Some(caps) = EXCEPTION_PATTERN.captures_iter(&raw.message).last() {
            metadata.insert("exception_name".to_string(), Value::String(caps[1].to_string()));
            metadata.insert(
                "exception_message".to_string(),
                Value::String(caps[2].trim().to_string()),
            );
        }

        metadata
    }
}

fn parse_frames(text: &str) -> Vec<StackFrame> {
    FRAME_PATTERN
        .captures_iter(text)
        .map(|caps| {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            StackFrame {
                file_path: Some(PathBuf::from(&caps[1])),
                line_number: caps[2].parse().ok(),
                function_name: Some(caps[3].to_string()),
                code_context: code_line_after(text, whole.end),
            }
        })
        .collect()
}

/// The indented source line printed right after a frame header, if any
fn code_line_after(text: &str, offset: usize) -> Option<String> {
    let rest = &text[offset..];
    let next = rest.split_once('\n')?.1.lines().next()?;
    let trimmed = next.trim();

    if !next.starts_with(char::is_whitespace) || trimmed.is_empty() || trimmed.starts_with("File \"") {
        return None;
    }
    Some(trimmed.to_string())
}
