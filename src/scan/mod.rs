//! Codebase scanner - project facts for the context aggregator
//!
//! Reads manifest files at the project root and walks the tree once to count
//! files. Unreadable files are skipped; the scan only fails if the root itself
//! is not a directory.

use crate::config::ScanSettings;
use crate::model::{CodebaseContext, DependencyInfo, ProjectType};
use crate::{Error, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Root files that identify a project type, checked in order
const PROJECT_INDICATORS: &[(&str, ProjectType)] = &[
    ("Cargo.toml", ProjectType::RustCrate),
    ("go.mod", ProjectType::GoModule),
    ("pom.xml", ProjectType::JavaProject),
    ("build.gradle", ProjectType::JavaProject),
    ("pyproject.toml", ProjectType::PythonPackage),
    ("setup.py", ProjectType::PythonPackage),
    ("setup.cfg", ProjectType::PythonPackage),
    ("package.json", ProjectType::NodePackage),
    ("requirements.txt", ProjectType::PythonPackage),
    ("Pipfile", ProjectType::PythonPackage),
];

/// Dependency name (lowercase) to the framework it indicates
const KNOWN_FRAMEWORKS: &[(&str, &str)] = &[
    ("django", "Django"),
    ("flask", "Flask"),
    ("fastapi", "FastAPI"),
    ("sqlalchemy", "SQLAlchemy"),
    ("pytest", "pytest"),
    ("react", "React"),
    ("vue", "Vue"),
    ("@angular/core", "Angular"),
    ("next", "Next.js"),
    ("express", "Express"),
    ("axum", "Axum"),
    ("actix-web", "Actix Web"),
    ("rocket", "Rocket"),
    ("tokio", "Tokio"),
];

/// Frameworks that make a Node package a web application
const WEB_FRAMEWORKS: &[&str] = &["React", "Vue", "Angular", "Next.js", "Express"];

const SOURCE_DIRS: &[&str] = &["src", "lib", "app"];

/// Scans one project root
#[derive(Debug, Clone)]
pub struct CodebaseScanner {
    root: PathBuf,
    max_depth: usize,
    excluded: Vec<String>,
}

impl CodebaseScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_settings(root, &ScanSettings::default())
    }

    pub fn with_settings(root: impl Into<PathBuf>, settings: &ScanSettings) -> Self {
        Self {
            root: root.into(),
            max_depth: settings.max_depth,
            excluded: settings.excluded.clone(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scan(&self) -> Result<CodebaseContext> {
        if !self.root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            )));
        }

        let dependencies = self.identify_dependencies();
        let frameworks = detect_frameworks(&dependencies);
        let mut project_type = self.detect_project_type();
        if project_type == ProjectType::NodePackage
            && frameworks.iter().any(|f| WEB_FRAMEWORKS.contains(&f.as_str()))
        {
            project_type = ProjectType::WebApplication;
        }

        let context = CodebaseContext {
            project_type,
            frameworks,
            dependencies,
            entry_points: self.source_dirs(),
            file_count: self.count_files(),
            ..Default::default()
        };

        info!(
            root = %self.root.display(),
            project_type = %context.project_type,
            files = context.file_count,
            "Scanned codebase"
        );
        Ok(context)
    }

    pub fn detect_project_type(&self) -> ProjectType {
        PROJECT_INDICATORS
            .iter()
            .find(|(file, _)| self.root.join(file).is_file())
            .map(|(_, project_type)| *project_type)
            .unwrap_or_default()
    }

    /// Dependencies from every manifest present at the root
    pub fn identify_dependencies(&self) -> Vec<DependencyInfo> {
        let mut dependencies = Vec::new();
        let manifests: [(&str, fn(&str) -> Vec<DependencyInfo>); 4] = [
            ("requirements.txt", parse_requirements),
            ("pyproject.toml", parse_poetry),
            ("Cargo.toml", parse_cargo),
            ("package.json", parse_package_json),
        ];

        for (file, parse) in manifests {
            let path = self.root.join(file);
            match std::fs::read_to_string(&path) {
                Ok(content) => dependencies.extend(parse(&content)),
                Err(e) if path.exists() => debug!(path = %path.display(), error = %e, "Skipping unreadable manifest"),
                Err(_) => {}
            }
        }
        dependencies
    }

    fn source_dirs(&self) -> Vec<PathBuf> {
        SOURCE_DIRS
            .iter()
            .map(|dir| self.root.join(dir))
            .filter(|path| path.is_dir())
            .collect()
    }

    fn count_files(&self) -> usize {
        WalkDir::new(&self.root)
            .follow_links(false)
            .max_depth(self.max_depth)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || !self.excluded.iter().any(|x| e.file_name().to_string_lossy() == x.as_str())
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .count()
    }
}

fn detect_frameworks(dependencies: &[DependencyInfo]) -> Vec<String> {
    let mut frameworks: Vec<String> = Vec::new();
    for dep in dependencies {
        let name = dep.name.to_lowercase();
        if let Some((_, framework)) = KNOWN_FRAMEWORKS.iter().find(|(known, _)| *known == name)
            && !frameworks.iter().any(|f| f == framework)
        {
            frameworks.push(framework.to_string());
        }
    }
    frameworks
}

/// `name==version` lines; comments, blanks and options are skipped
fn parse_requirements(content: &str) -> Vec<DependencyInfo> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .filter_map(|line| {
            let (name, version) = match line.split_once("==") {
                Some((name, version)) => (name, version.trim()),
                None => (line, ""),
            };
            let name = name
                .split(['>', '<', '~', '!', '=', '[', ';'])
                .next()
                .unwrap_or("")
                .trim();
            (!name.is_empty()).then(|| DependencyInfo::new(name, version))
        })
        .collect()
}

fn parse_toml(content: &str, file: &str) -> Option<toml::Value> {
    match content.parse::<toml::Value>() {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(file, error = %e, "Manifest is not valid TOML");
            None
        }
    }
}

/// Entries of a dependency table. A value is either a version string or a
/// table that may carry a `version` key (git and path dependencies do not).
fn dependency_table(table: Option<&toml::Value>, is_dev: bool) -> Vec<DependencyInfo> {
    let Some(toml::Value::Table(entries)) = table else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|(name, spec)| {
            let version = match spec {
                toml::Value::String(version) => version.as_str(),
                toml::Value::Table(fields) => {
                    fields.get("version").and_then(|v| v.as_str()).unwrap_or("")
                }
                _ => "",
            };
            DependencyInfo {
                is_dev,
                ..DependencyInfo::new(name.as_str(), version)
            }
        })
        .collect()
}

/// `[tool.poetry.dependencies]`, without the python constraint
fn parse_poetry(content: &str) -> Vec<DependencyInfo> {
    let Some(manifest) = parse_toml(content, "pyproject.toml") else {
        return Vec::new();
    };

    let table = manifest
        .get("tool")
        .and_then(|tool| tool.get("poetry"))
        .and_then(|poetry| poetry.get("dependencies"));
    dependency_table(table, false)
        .into_iter()
        .filter(|dep| dep.name != "python")
        .collect()
}

fn parse_cargo(content: &str) -> Vec<DependencyInfo> {
    let Some(manifest) = parse_toml(content, "Cargo.toml") else {
        return Vec::new();
    };

    let mut dependencies = dependency_table(manifest.get("dependencies"), false);
    dependencies.extend(dependency_table(manifest.get("dev-dependencies"), true));
    dependencies
}

fn parse_package_json(content: &str) -> Vec<DependencyInfo> {
    let Ok(manifest) = serde_json::from_str::<Value>(content) else {
        debug!("package.json is not valid JSON");
        return Vec::new();
    };

    let mut dependencies = Vec::new();
    for (key, is_dev) in [("dependencies", false), ("devDependencies", true)] {
        if let Some(Value::Object(deps)) = manifest.get(key) {
            for (name, version) in deps {
                dependencies.push(DependencyInfo {
                    is_dev,
                    ..DependencyInfo::new(name.as_str(), version.as_str().unwrap_or(""))
                });
            }
        }
    }
    dependencies
}
