//! Codebase scanner tests

use rootcause::config::ScanSettings;
use rootcause::model::{ArchitecturalStyle, ProjectType};
use rootcause::scan::CodebaseScanner;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_python_project() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("requirements.txt"),
        "# runtime\nDjango==4.2.1\npsycopg2>=2.9\n-e ./vendored\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("app")).unwrap();
    fs::write(dir.path().join("app/models.py"), "").unwrap();
    fs::write(dir.path().join("manage.py"), "").unwrap();

    let context = CodebaseScanner::new(dir.path()).scan().unwrap();

    assert_eq!(context.project_type, ProjectType::PythonPackage);
    assert_eq!(context.architecture, ArchitecturalStyle::Unknown);
    assert_eq!(context.frameworks, vec!["Django"]);
    assert_eq!(context.dependencies.len(), 2);
    assert_eq!(context.dependencies[0].name, "Django");
    assert_eq!(context.dependencies[0].version, "4.2.1");
    assert_eq!(context.entry_points, vec![dir.path().join("app")]);
    assert_eq!(context.file_count, 3);
}

#[test]
fn test_rust_crate_wins_over_package_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("Cargo.toml"),
        "[package]\nname = \"svc\"\n\n[dependencies]\naxum = \"0.7\"\ntokio = { version = \"1\", features = [\"full\"] }\n",
    )
    .unwrap();
    fs::write(dir.path().join("package.json"), r#"{"devDependencies": {"prettier": "^3.0.0"}}"#).unwrap();

    let scanner = CodebaseScanner::new(dir.path());
    assert_eq!(scanner.detect_project_type(), ProjectType::RustCrate);

    let context = scanner.scan().unwrap();
    assert_eq!(context.frameworks, vec!["Axum", "Tokio"]);
    let prettier = context
        .dependencies
        .iter()
        .find(|d| d.name == "prettier")
        .unwrap();
    assert!(prettier.is_dev);
    assert_eq!(prettier.version, "^3.0.0");
}

#[test]
fn test_node_web_application() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{"dependencies": {"react": "^18.2.0", "lodash": "^4.17.21"}}"#,
    )
    .unwrap();

    let context = CodebaseScanner::new(dir.path()).scan().unwrap();

    assert_eq!(context.project_type, ProjectType::WebApplication);
    assert_eq!(context.frameworks, vec!["React"]);
}

#[test]
fn test_plain_node_package() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), r#"{"dependencies": {"lodash": "^4"}}"#).unwrap();

    let context = CodebaseScanner::new(dir.path()).scan().unwrap();

    assert_eq!(context.project_type, ProjectType::NodePackage);
    assert!(context.frameworks.is_empty());
}

#[test]
fn test_poetry_dependencies() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("pyproject.toml"),
        "[tool.poetry.dependencies]\npython = \"^3.11\"\nfastapi = \"^0.110\"\npydantic = { version = \"^2\", extras = [\"email\"] }\n\n[tool.poetry.group.dev.dependencies]\npytest = \"^8\"\n",
    )
    .unwrap();

    let context = CodebaseScanner::new(dir.path()).scan().unwrap();

    assert_eq!(context.project_type, ProjectType::PythonPackage);
    let names: Vec<&str> = context.dependencies.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["fastapi", "pydantic"]);
    assert_eq!(context.dependencies[1].version, "^2");
    assert_eq!(context.frameworks, vec!["FastAPI"]);
}

#[test]
fn test_cargo_manifest_comments_and_dependency_tables() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("Cargo.toml"),
        r#"[package]
name = "svc"

[dependencies] # runtime
serde = "1" # serialization
axum = { git = "https://github.com/x/versioned" }

[dependencies.tokio]
version = "1.38"
features = ["full"]

[dev-dependencies]
tempfile = { version = "3" }
"#,
    )
    .unwrap();

    let context = CodebaseScanner::new(dir.path()).scan().unwrap();

    let deps: Vec<(&str, &str, bool)> = context
        .dependencies
        .iter()
        .map(|d| (d.name.as_str(), d.version.as_str(), d.is_dev))
        .collect();
    assert_eq!(
        deps,
        vec![
            ("serde", "1", false),
            ("axum", "", false),
            ("tokio", "1.38", false),
            ("tempfile", "3", true),
        ]
    );
    assert_eq!(context.frameworks, vec!["Axum", "Tokio"]);
}

#[test]
fn test_malformed_cargo_manifest_is_skipped() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("Cargo.toml"), "[dependencies\nserde = ").unwrap();

    let context = CodebaseScanner::new(dir.path()).scan().unwrap();

    assert_eq!(context.project_type, ProjectType::RustCrate);
    assert!(context.dependencies.is_empty());
}

#[test]
fn test_excluded_directories_not_counted() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("node_modules/left-pad")).unwrap();
    fs::write(dir.path().join("node_modules/left-pad/index.js"), "").unwrap();
    fs::create_dir(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("src/index.js"), "").unwrap();

    let context = CodebaseScanner::new(dir.path()).scan().unwrap();
    assert_eq!(context.file_count, 1);

    let settings = ScanSettings {
        excluded: Vec::new(),
        ..Default::default()
    };
    let context = CodebaseScanner::with_settings(dir.path(), &settings).scan().unwrap();
    assert_eq!(context.file_count, 2);
}

#[test]
fn test_unknown_project() {
    let dir = TempDir::new().unwrap();

    let context = CodebaseScanner::new(dir.path()).scan().unwrap();

    assert_eq!(context.project_type, ProjectType::Unknown);
    assert!(context.dependencies.is_empty());
    assert_eq!(context.file_count, 0);
}

#[test]
fn test_missing_root_fails() {
    let dir = TempDir::new().unwrap();

    let err = CodebaseScanner::new(dir.path().join("nope")).scan().unwrap_err();

    assert_eq!(err.code(), "IO_ERROR");
}
