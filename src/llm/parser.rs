//! Response parsing - model text into typed records
//!
//! Decoding is strict first, then a light repair pass (trailing commas,
//! first balanced object). Shape problems never fail a parse: missing or
//! mistyped fields fall back to defaults and unknown enum values degrade to
//! `unknown` / `medium`.

use crate::model::{
    CodeImplementation, ComplexityLevel, ErrorAnalysis, Factor, RiskLevel, RootCause,
    SeverityLevel, Solution, TimeEstimate,
};
use crate::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_ROOT_CAUSE: &str = "Unknown root cause";
const DEFAULT_SOLUTION_TITLE: &str = "Solution";

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").expect("valid fence pattern")
});

static ANY_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[\s\S]*?```").expect("valid fence pattern"));

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma pattern"));

/// Turns raw model output into analysis and solution records
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser;

impl ResponseParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_analysis_response(&self, response: &str) -> Result<ErrorAnalysis> {
        let data = extract_json(response)?;
        let fields = as_object(&data);

        let confidence = fields
            .get("confidence")
            .map(confidence_of)
            .unwrap_or(DEFAULT_CONFIDENCE);

        let root_cause = match fields.get("root_cause") {
            Some(Value::Object(obj)) => RootCause {
                description: string_of(obj.get("description")).unwrap_or_else(|| DEFAULT_ROOT_CAUSE.to_string()),
                confidence: obj.get("confidence").map(confidence_of).unwrap_or(confidence),
                evidence: string_list(obj.get("evidence")),
            },
            other => RootCause::new(
                string_of(other).unwrap_or_else(|| DEFAULT_ROOT_CAUSE.to_string()),
                confidence,
            ),
        };

        let contributing_factors = match fields.get("contributing_factors") {
            Some(Value::Array(items)) => items.iter().filter_map(factor_of).collect(),
            other => string_list(other).into_iter().map(Factor::new).collect(),
        };

        Ok(ErrorAnalysis {
            error_type: enum_or_default(fields.get("error_type")),
            severity: enum_or_default::<SeverityLevel>(fields.get("severity")),
            root_cause,
            contributing_factors,
            affected_components: string_list(fields.get("affected_components")),
            confidence,
        })
    }

    /// Every entry of the `solutions` array becomes a [`Solution`]; validation is separate
    pub fn parse_solutions_response(&self, response: &str) -> Result<Vec<Solution>> {
        let data = extract_json(response)?;
        let entries = match data.get("solutions") {
            Some(Value::Array(entries)) => entries.as_slice(),
            _ => &[],
        };

        Ok(entries.iter().map(|entry| solution_of(as_object(entry))).collect())
    }

    /// Prose with fenced code blocks removed
    pub fn parse_explanation_response(&self, response: &str) -> String {
        ANY_FENCE.replace_all(response.trim(), "").trim().to_string()
    }
}

/// Fenced block contents (or the whole text), strict then repaired
fn extract_json(response: &str) -> Result<Value> {
    let candidate = FENCED_BLOCK
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map_or(response, |m| m.as_str());

    match serde_json::from_str(candidate) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!(error = %e, "Strict JSON decode failed, attempting repair");
            fuzzy_parse(candidate)
        }
    }
}

fn fuzzy_parse(text: &str) -> Result<Value> {
    let repaired = TRAILING_COMMA.replace_all(text, "$1");

    first_balanced_object(&repaired)
        .and_then(|span| serde_json::from_str(span).ok())
        .ok_or_else(|| Error::invalid_response("Failed to parse JSON from response", &repaired))
}

/// First `{...}` span whose braces balance, ignoring braces inside strings
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

static EMPTY: LazyLock<Map<String, Value>> = LazyLock::new(Map::new);

/// Non-object values are treated as an empty object
fn as_object(value: &Value) -> &Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => &*EMPTY,
    }
}

fn string_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Arrays keep their scalar elements; a bare string is a one-item list
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(|v| string_of(Some(v))).collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Numbers or numeric strings, clamped to [0, 1]
fn confidence_of(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok().map(|v| {
            if s.contains('%') { v / 100.0 } else { v }
        }),
        _ => None,
    };
    raw.filter(|v| v.is_finite())
        .map_or(DEFAULT_CONFIDENCE, |v| v.clamp(0.0, 1.0))
}

/// Case-insensitive exact match on the enum's string form, else its default
fn enum_or_default<T: FromStr + Default>(value: Option<&Value>) -> T {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default()
}

fn factor_of(value: &Value) -> Option<Factor> {
    match value {
        Value::Object(obj) => {
            let mut factor = Factor::new(string_of(obj.get("description"))?);
            if let Some(impact) = string_of(obj.get("impact")) {
                factor.impact = impact;
            }
            factor.is_primary = obj.get("is_primary").and_then(Value::as_bool).unwrap_or(false);
            Some(factor)
        }
        other => string_of(Some(other)).map(Factor::new),
    }
}

fn solution_of(data: &Map<String, Value>) -> Solution {
    let mut implementation = match data.get("implementation") {
        Some(Value::Object(obj)) => CodeImplementation {
            language: string_of(obj.get("language")).unwrap_or_default(),
            code: string_of(obj.get("code")).unwrap_or_default(),
            file_path: string_of(obj.get("file_path")),
            instructions: string_list(obj.get("instructions")),
        },
        other => CodeImplementation {
            code: string_of(other).unwrap_or_default(),
            ..Default::default()
        },
    };
    if implementation.instructions.is_empty() {
        implementation.instructions = string_list(data.get("instructions"));
    }

    let time_estimate = match data.get("time_estimate") {
        Some(Value::Object(obj)) => TimeEstimate {
            min_minutes: minutes_of(obj.get("min_minutes")),
            max_minutes: minutes_of(obj.get("max_minutes")),
            description: string_of(obj.get("description")).unwrap_or_default(),
        },
        other => TimeEstimate::described(string_of(other).unwrap_or_default()),
    };

    Solution {
        title: string_of(data.get("title")).unwrap_or_else(|| DEFAULT_SOLUTION_TITLE.to_string()),
        approach: string_of(data.get("approach")).unwrap_or_default(),
        implementation,
        pros: string_list(data.get("pros")),
        cons: string_list(data.get("cons")),
        complexity: enum_or_default::<ComplexityLevel>(data.get("complexity")),
        risk_level: enum_or_default::<RiskLevel>(data.get("risk_level")),
        time_estimate,
        best_for: string_list(data.get("best_for")),
    }
}

fn minutes_of(value: Option<&Value>) -> u32 {
    value
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0)
}

