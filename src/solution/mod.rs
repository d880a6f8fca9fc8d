//! Solution validation, ranking and trade-off notes
//!
//! Ranking is deterministic: the score depends only on complexity, risk and
//! the number of pros and cons, and ties keep their input order.

use crate::model::{ComplexityLevel, RankedSolution, RiskLevel, Solution, TradeOffAnalysis};
use tracing::debug;

const COMPLEXITY_SHARE: f64 = 0.3;
const RISK_SHARE: f64 = 0.4;
const PRO_BONUS: f64 = 0.1;
const MAX_PRO_BONUS: f64 = 0.3;
const CON_PENALTY: f64 = 0.05;
const MAX_CON_PENALTY: f64 = 0.2;

/// Drops solutions that cannot be presented
#[derive(Debug, Clone, Copy, Default)]
pub struct SolutionValidator;

impl SolutionValidator {
    pub fn new() -> Self {
        Self
    }

    /// A solution needs a title and an approach
    pub fn validate(&self, solution: &Solution) -> bool {
        !solution.title.is_empty() && !solution.approach.is_empty()
    }

    /// Valid solutions, in input order
    pub fn filter_valid(&self, solutions: Vec<Solution>) -> Vec<Solution> {
        let before = solutions.len();
        let valid: Vec<Solution> = solutions.into_iter().filter(|s| self.validate(s)).collect();
        if valid.len() != before {
            debug!(dropped = before - valid.len(), "Dropped invalid solutions");
        }
        valid
    }
}

/// Scores and orders solutions
#[derive(Debug, Clone, Copy, Default)]
pub struct SolutionRanker;

impl SolutionRanker {
    pub fn new() -> Self {
        Self
    }

    /// Highest score first; equal scores keep input order. Positions start at 1.
    pub fn rank_solutions(&self, solutions: &[Solution]) -> Vec<RankedSolution> {
        let mut ranked: Vec<RankedSolution> = solutions
            .iter()
            .map(|solution| RankedSolution {
                solution: solution.clone(),
                rank_score: self.score(solution),
                rank_position: 0,
                ranking_factors: ranking_factors(solution),
            })
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.rank_score.total_cmp(&a.rank_score));

        for (index, entry) in ranked.iter_mut().enumerate() {
            entry.rank_position = index + 1;
        }
        ranked
    }

    /// Score in [0, 1]
    pub fn score(&self, solution: &Solution) -> f64 {
        let pros = (solution.pros.len() as f64 * PRO_BONUS).min(MAX_PRO_BONUS);
        let cons = (solution.cons.len() as f64 * CON_PENALTY).min(MAX_CON_PENALTY);

        let score = COMPLEXITY_SHARE * complexity_weight(solution.complexity)
            + RISK_SHARE * risk_weight(solution.risk_level)
            + pros
            - cons;
        score.clamp(0.0, 1.0)
    }

    pub fn evaluate_trade_offs(&self, solution: &Solution) -> TradeOffAnalysis {
        let mut notes = Vec::new();

        match solution.complexity {
            ComplexityLevel::Low => notes.push("Quick to implement but may need iteration".to_string()),
            ComplexityLevel::High => {
                notes.push("Comprehensive solution but requires significant effort".to_string())
            }
            _ => {}
        }
        if solution.risk_level == RiskLevel::High {
            notes.push("Higher risk - recommend thorough testing".to_string());
        }

        let performance_impact = if solution.approach.to_lowercase().contains("performance") {
            "May affect performance - measure before and after"
        } else {
            "Minimal performance impact expected"
        };

        let maintainability_impact = match solution.complexity {
            ComplexityLevel::High | ComplexityLevel::VeryHigh => "Consider documenting the solution thoroughly",
            _ => "Should be easy to maintain",
        };

        TradeOffAnalysis {
            performance_impact: performance_impact.to_string(),
            maintainability_impact: maintainability_impact.to_string(),
            notes,
        }
    }
}

fn complexity_weight(complexity: ComplexityLevel) -> f64 {
    match complexity {
        ComplexityLevel::Low => 1.0,
        ComplexityLevel::Medium => 0.7,
        ComplexityLevel::High => 0.4,
        ComplexityLevel::VeryHigh => 0.2,
    }
}

fn risk_weight(risk: RiskLevel) -> f64 {
    match risk {
        RiskLevel::Low => 1.0,
        RiskLevel::Medium => 0.7,
        RiskLevel::High => 0.4,
        RiskLevel::Critical => 0.1,
    }
}

fn ranking_factors(solution: &Solution) -> Vec<String> {
    let mut factors = Vec::new();
    if solution.complexity == ComplexityLevel::Low {
        factors.push("Low implementation complexity".to_string());
    }
    if solution.risk_level == RiskLevel::Low {
        factors.push("Low risk level".to_string());
    }
    if solution.pros.len() > solution.cons.len() {
        factors.push("More advantages than disadvantages".to_string());
    }
    factors
}
