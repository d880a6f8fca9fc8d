//! Error records - raw input, stack traces and the classified error

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Classification of error types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    Syntax,
    Runtime,
    Type,
    Value,
    Name,
    Attribute,
    Index,
    Key,
    Import,
    Io,
    Memory,
    Timeout,
    Network,
    Database,
    Authentication,
    Permission,
    Configuration,
    Dependency,
    Assertion,
    Custom,
    #[default]
    Unknown,
}

impl ErrorType {
    /// Every variant, in declaration order
    pub const ALL: [ErrorType; 21] = [
        ErrorType::Syntax,
        ErrorType::Runtime,
        ErrorType::Type,
        ErrorType::Value,
        ErrorType::Name,
        ErrorType::Attribute,
        ErrorType::Index,
        ErrorType::Key,
        ErrorType::Import,
        ErrorType::Io,
        ErrorType::Memory,
        ErrorType::Timeout,
        ErrorType::Network,
        ErrorType::Database,
        ErrorType::Authentication,
        ErrorType::Permission,
        ErrorType::Configuration,
        ErrorType::Dependency,
        ErrorType::Assertion,
        ErrorType::Custom,
        ErrorType::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::Syntax => "syntax",
            ErrorType::Runtime => "runtime",
            ErrorType::Type => "type",
            ErrorType::Value => "value",
            ErrorType::Name => "name",
            ErrorType::Attribute => "attribute",
            ErrorType::Index => "index",
            ErrorType::Key => "key",
            ErrorType::Import => "import",
            ErrorType::Io => "io",
            ErrorType::Memory => "memory",
            ErrorType::Timeout => "timeout",
            ErrorType::Network => "network",
            ErrorType::Database => "database",
            ErrorType::Authentication => "authentication",
            ErrorType::Permission => "permission",
            ErrorType::Configuration => "configuration",
            ErrorType::Dependency => "dependency",
            ErrorType::Assertion => "assertion",
            ErrorType::Custom => "custom",
            ErrorType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ErrorType {
    type Err = String;

    /// Case-insensitive exact match against the variant names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ErrorType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("Unknown error type: {}", s))
    }
}

/// Severity levels for errors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    Critical,
    High,
    #[default]
    Medium,
    Low,
    Info,
}

impl SeverityLevel {
    pub const ALL: [SeverityLevel; 5] = [
        SeverityLevel::Critical,
        SeverityLevel::High,
        SeverityLevel::Medium,
        SeverityLevel::Low,
        SeverityLevel::Info,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeverityLevel::Critical => "critical",
            SeverityLevel::High => "high",
            SeverityLevel::Medium => "medium",
            SeverityLevel::Low => "low",
            SeverityLevel::Info => "info",
        }
    }
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SeverityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        SeverityLevel::ALL
            .into_iter()
            .find(|l| l.as_str() == wanted)
            .ok_or_else(|| format!("Unknown severity: {}", s))
    }
}

/// A single frame in a stack trace
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StackFrame {
    /// Path to the source file
    pub file_path: Option<PathBuf>,
    /// Line number in the file
    pub line_number: Option<u32>,
    /// Function or method name
    pub function_name: Option<String>,
    /// The source line shown for this frame
    pub code_context: Option<String>,
}

/// A parsed stack trace
///
/// Frames keep the order in which they appear in the trace text;
/// `frames[0]` is treated as the top (innermost) frame.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StackTrace {
    pub frames: Vec<StackFrame>,
    /// Original trace text
    pub raw_trace: String,
}

impl StackTrace {
    /// The topmost (innermost) frame
    pub fn top_frame(&self) -> Option<&StackFrame> {
        self.frames.first()
    }

    /// The bottommost (outermost) frame
    pub fn bottom_frame(&self) -> Option<&StackFrame> {
        self.frames.last()
    }
}

/// Raw unprocessed error input
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawError {
    /// The raw error message or output
    pub message: String,
    /// Where the error came from (file name, "stdin", ...)
    pub source: Option<String>,
    /// When the error was captured
    pub timestamp: DateTime<Utc>,
}

impl RawError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Structured, classified error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedError {
    /// Original error message
    pub raw_message: String,
    pub error_type: ErrorType,
    pub severity: SeverityLevel,
    pub stack_trace: Option<StackTrace>,
    /// File where the error occurred (from the top frame)
    pub source_file: Option<PathBuf>,
    /// Line of the error (from the top frame)
    pub line_number: Option<u32>,
    pub timestamp: DateTime<Utc>,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl ClassifiedError {
    /// Formatted "file:line" location
    pub fn location(&self) -> String {
        match (&self.source_file, self.line_number) {
            (Some(file), Some(line)) => format!("{}:{}", file.display(), line),
            (Some(file), None) => file.display().to_string(),
            _ => "unknown location".to_string(),
        }
    }

    pub fn has_stack_trace(&self) -> bool {
        self.stack_trace.as_ref().is_some_and(|t| !t.frames.is_empty())
    }
}
