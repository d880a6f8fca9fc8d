//! Explanation levels

use serde::{Deserialize, Serialize};

/// How deep an explanation goes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ExplanationLevel {
    /// Plain language for beginners
    #[default]
    Simple,
    /// Runtime and language details for experienced developers
    Technical,
    /// Mechanisms, history, prevention and related failure modes
    DeepDive,
}

impl ExplanationLevel {
    pub const ALL: [ExplanationLevel; 3] = [
        ExplanationLevel::Simple,
        ExplanationLevel::Technical,
        ExplanationLevel::DeepDive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExplanationLevel::Simple => "simple",
            ExplanationLevel::Technical => "technical",
            ExplanationLevel::DeepDive => "deep_dive",
        }
    }
}

impl std::fmt::Display for ExplanationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExplanationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "simple" => Ok(ExplanationLevel::Simple),
            "technical" => Ok(ExplanationLevel::Technical),
            "deep_dive" | "deepdive" => Ok(ExplanationLevel::DeepDive),
            _ => Err(format!("Unknown explanation level: {}", s)),
        }
    }
}

/// A generated explanation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub content: String,
    pub level: ExplanationLevel,
    /// Language code the explanation was requested in
    pub language: String,
}
