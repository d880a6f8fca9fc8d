//! Solution records and their ranked wrappers

use serde::{Deserialize, Serialize};

/// Implementation complexity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    #[default]
    Medium,
    High,
    VeryHigh,
}

impl ComplexityLevel {
    pub const ALL: [ComplexityLevel; 4] = [
        ComplexityLevel::Low,
        ComplexityLevel::Medium,
        ComplexityLevel::High,
        ComplexityLevel::VeryHigh,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityLevel::Low => "low",
            ComplexityLevel::Medium => "medium",
            ComplexityLevel::High => "high",
            ComplexityLevel::VeryHigh => "very_high",
        }
    }
}

impl std::fmt::Display for ComplexityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComplexityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ComplexityLevel::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("Unknown complexity: {}", s))
    }
}

/// Risk of applying a solution
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        RiskLevel::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| format!("Unknown risk level: {}", s))
    }
}

/// Time estimate for implementing a solution
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TimeEstimate {
    pub min_minutes: u32,
    pub max_minutes: u32,
    /// Human-readable description ("1-2 hours")
    pub description: String,
}

impl TimeEstimate {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn formatted(&self) -> String {
        if !self.description.is_empty() {
            return self.description.clone();
        }
        if self.min_minutes == self.max_minutes {
            return format!("{} minutes", self.min_minutes);
        }
        format!("{}-{} minutes", self.min_minutes, self.max_minutes)
    }
}

/// Code or step-by-step implementation of a solution
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CodeImplementation {
    pub language: String,
    pub code: String,
    pub file_path: Option<String>,
    pub instructions: Vec<String>,
}

/// Trade-off notes for a solution
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TradeOffAnalysis {
    pub performance_impact: String,
    pub maintainability_impact: String,
    pub notes: Vec<String>,
}

/// A candidate fix proposed by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Solution {
    pub title: String,
    /// Approach description
    pub approach: String,
    pub implementation: CodeImplementation,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub complexity: ComplexityLevel,
    pub risk_level: RiskLevel,
    pub time_estimate: TimeEstimate,
    /// Situations this solution suits best
    pub best_for: Vec<String>,
}

impl Solution {
    pub fn new(title: impl Into<String>, approach: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            approach: approach.into(),
            implementation: CodeImplementation::default(),
            pros: Vec::new(),
            cons: Vec::new(),
            complexity: ComplexityLevel::default(),
            risk_level: RiskLevel::default(),
            time_estimate: TimeEstimate::default(),
            best_for: Vec::new(),
        }
    }

    pub fn with_complexity(mut self, complexity: ComplexityLevel) -> Self {
        self.complexity = complexity;
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk_level = risk;
        self
    }

    pub fn pro(mut self, pro: impl Into<String>) -> Self {
        self.pros.push(pro.into());
        self
    }

    pub fn con(mut self, con: impl Into<String>) -> Self {
        self.cons.push(con.into());
        self
    }
}

/// A solution plus its position in one ranking pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedSolution {
    pub solution: Solution,
    /// Score in [0, 1]
    pub rank_score: f64,
    /// 1-based position after sorting
    pub rank_position: usize,
    pub ranking_factors: Vec<String>,
}
