//! Settings - provider credentials, generation parameters and budgets
//!
//! Loaded from YAML. Lookup order: an explicit path, then
//! `<config dir>/rootcause/config.yaml`, then built-in defaults. Every
//! section is optional in the file.

use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, GenerationConfig};
use crate::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONFIG_FILE: &str = "config.yaml";

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub context: ContextSettings,
    pub git: GitSettings,
    pub scan: ScanSettings,
    pub language: LanguageSettings,
}

/// Hosted model parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSettings {
    /// Never written back out
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: generation.max_tokens,
            temperature: generation.temperature,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 120,
        }
    }
}

impl LlmSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Generation parameters for one call
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig::default()
            .with_max_tokens(self.max_tokens)
            .with_temperature(self.temperature)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextSettings {
    /// Token budget for the context block of analysis prompts
    pub max_tokens: usize,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self { max_tokens: 4000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GitSettings {
    pub enabled: bool,
    /// Commits read when building history context
    pub history_limit: usize,
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            history_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScanSettings {
    pub max_depth: usize,
    /// Directory names skipped while walking
    pub excluded: Vec<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            max_depth: 10,
            excluded: [
                ".git",
                "node_modules",
                "target",
                "__pycache__",
                ".venv",
                "venv",
                "dist",
                "build",
                ".tox",
                ".mypy_cache",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LanguageSettings {
    /// Language code explanations are requested in
    pub default: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            default: "en".to_string(),
        }
    }
}

impl Settings {
    /// Default location of the settings file, if a config dir exists
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "rootcause").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Load from `path`, else the default location, else defaults
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let settings = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!("{} does not exist", path.display())));
                }
                Self::from_file(path)?
            }
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No settings file found, using defaults");
                    Self::default()
                }
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading settings");
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(Error::Config("llm.max_tokens must be positive".to_string()));
        }
        if self.context.max_tokens == 0 {
            return Err(Error::Config("context.max_tokens must be positive".to_string()));
        }
        Ok(())
    }

    /// Override the credential when one is given (flag or environment)
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if api_key.is_some() {
            self.llm.api_key = api_key;
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.llm.model = model;
        }
        self
    }
}
