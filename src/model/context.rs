//! Context records - what we know about the codebase, session and environment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

/// Where a piece of context came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContextSource {
    Codebase,
    Git,
    Session,
    Environment,
    UserInput,
    FileSystem,
}

impl ContextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextSource::Codebase => "codebase",
            ContextSource::Git => "git",
            ContextSource::Session => "session",
            ContextSource::Environment => "environment",
            ContextSource::UserInput => "user_input",
            ContextSource::FileSystem => "file_system",
        }
    }
}

impl std::fmt::Display for ContextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of project detected by the scanner
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    PythonPackage,
    RustCrate,
    NodePackage,
    GoModule,
    JavaProject,
    WebApplication,
    ApiService,
    CliTool,
    Library,
    Monorepo,
    #[default]
    Unknown,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::PythonPackage => "python_package",
            ProjectType::RustCrate => "rust_crate",
            ProjectType::NodePackage => "node_package",
            ProjectType::GoModule => "go_module",
            ProjectType::JavaProject => "java_project",
            ProjectType::WebApplication => "web_application",
            ProjectType::ApiService => "api_service",
            ProjectType::CliTool => "cli_tool",
            ProjectType::Library => "library",
            ProjectType::Monorepo => "monorepo",
            ProjectType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Architectural style of a codebase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArchitecturalStyle {
    Mvc,
    Layered,
    Microservices,
    Monolith,
    EventDriven,
    Hexagonal,
    Clean,
    #[default]
    Unknown,
}

impl ArchitecturalStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchitecturalStyle::Mvc => "mvc",
            ArchitecturalStyle::Layered => "layered",
            ArchitecturalStyle::Microservices => "microservices",
            ArchitecturalStyle::Monolith => "monolith",
            ArchitecturalStyle::EventDriven => "event_driven",
            ArchitecturalStyle::Hexagonal => "hexagonal",
            ArchitecturalStyle::Clean => "clean",
            ArchitecturalStyle::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ArchitecturalStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared project dependency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyInfo {
    pub name: String,
    pub version: String,
    pub is_dev: bool,
}

impl DependencyInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            is_dev: false,
        }
    }
}

/// Facts learned from scanning a codebase
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CodebaseContext {
    pub project_type: ProjectType,
    pub architecture: ArchitecturalStyle,
    pub frameworks: Vec<String>,
    pub dependencies: Vec<DependencyInfo>,
    /// Source roots / entry points
    pub entry_points: Vec<PathBuf>,
    /// Number of files seen by the scan
    pub file_count: usize,
}

impl CodebaseContext {
    pub fn new(project_type: ProjectType) -> Self {
        Self {
            project_type,
            ..Default::default()
        }
    }

    pub fn with_architecture(mut self, architecture: ArchitecturalStyle) -> Self {
        self.architecture = architecture;
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.frameworks.push(framework.into());
        self
    }
}

/// State of the current debugging session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionContext {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    /// Raw messages of errors analyzed so far, oldest first
    pub previous_errors: Vec<String>,
    pub user_inputs: Vec<String>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Start a new session with a fresh id
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            start_time: Utc::now(),
            previous_errors: Vec::new(),
            user_inputs: Vec::new(),
        }
    }
}

/// Facts about the runtime environment
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EnvironmentContext {
    /// Language runtime version ("Python 3.12.1", "rustc 1.82")
    pub runtime_version: String,
    pub os_info: String,
    pub installed_packages: BTreeMap<String, String>,
    pub environment_variables: BTreeMap<String, String>,
}

impl EnvironmentContext {
    pub fn new(runtime_version: impl Into<String>, os_info: impl Into<String>) -> Self {
        Self {
            runtime_version: runtime_version.into(),
            os_info: os_info.into(),
            ..Default::default()
        }
    }

    /// Describe the process this library runs in
    pub fn current() -> Self {
        Self {
            os_info: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
            ..Default::default()
        }
    }
}

/// A free-form piece of context from any source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Context {
    pub source: ContextSource,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// Snapshot of all context known at one point in time
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AggregatedContext {
    pub codebase: Option<CodebaseContext>,
    pub session: Option<SessionContext>,
    pub environment: Option<EnvironmentContext>,
    /// Updates that had no built-in slot, in arrival order
    pub custom_contexts: Vec<Context>,
    /// Relevance score per source name
    pub relevance_scores: BTreeMap<String, f64>,
}

impl AggregatedContext {
    pub fn has_codebase_context(&self) -> bool {
        self.codebase.is_some()
    }

    pub fn has_session_context(&self) -> bool {
        self.session.is_some()
    }

    /// Sources present in this snapshot
    pub fn sources(&self) -> Vec<ContextSource> {
        let mut sources = Vec::new();
        if self.codebase.is_some() {
            sources.push(ContextSource::Codebase);
        }
        if self.session.is_some() {
            sources.push(ContextSource::Session);
        }
        if self.environment.is_some() {
            sources.push(ContextSource::Environment);
        }
        sources.extend(self.custom_contexts.iter().map(|c| c.source));
        sources
    }
}
