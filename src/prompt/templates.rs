//! Static prompt templates
//!
//! Placeholders are written `{name}`; literal braces are doubled (`{{`, `}}`).
//! The JSON schemas embedded in [`ERROR_ANALYSIS`] and [`SOLUTION_GENERATION`]
//! are the contract the response parser reads against.

use crate::{Error, Result};
use std::collections::BTreeMap;

/// A named template with `{placeholder}` slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub name: &'static str,
    pub text: &'static str,
}

impl Template {
    /// Placeholder names in order of first appearance
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        for segment in Segments::new(self.text) {
            if let Segment::Placeholder(name) = segment
                && !names.contains(&name)
            {
                names.push(name);
            }
        }
        names
    }

    /// Whether the template declares `name`
    pub fn declares(&self, name: &str) -> bool {
        self.placeholders().contains(&name)
    }

    /// Substitute every placeholder. Fails on the first one without a value.
    pub fn render(&self, values: &BTreeMap<&str, String>) -> Result<String> {
        let mut out = String::with_capacity(self.text.len());
        for segment in Segments::new(self.text) {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Brace(c) => out.push(c),
                Segment::Placeholder(name) => {
                    let value = values.get(name).ok_or_else(|| Error::MissingTemplateVariable {
                        template: self.name.to_string(),
                        variable: name.to_string(),
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

/// Splits template text into literals, escaped braces and placeholders.
/// A lone `{` without a closing `}` is kept as literal text.
struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Segments<'a> {
    fn new(text: &'a str) -> Self {
        Self { rest: text }
    }
}

impl<'a> Iterator for Segments<'a> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.is_empty() {
            return None;
        }

        if let Some(after) = self.rest.strip_prefix("{{") {
            self.rest = after;
            return Some(Segment::Brace('{'));
        }
        if let Some(after) = self.rest.strip_prefix("}}") {
            self.rest = after;
            return Some(Segment::Brace('}'));
        }
        if let Some(after) = self.rest.strip_prefix('{')
            && let Some(end) = after.find('}')
        {
            let name = &after[..end];
            if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                self.rest = &after[end + 1..];
                return Some(Segment::Placeholder(name));
            }
        }

        // Literal run up to the next brace (at least one char)
        let first = self.rest.chars().next().map_or(1, char::len_utf8);
        let end = self.rest[first..]
            .find(['{', '}'])
            .map_or(self.rest.len(), |i| i + first);
        let (literal, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(Segment::Literal(literal))
    }
}

pub const SYSTEM_PROMPT: Template = Template {
    name: "system",
    text: "You are rootcause, a debugging assistant. You analyze errors, identify their root causes and propose fixes.

You are fluent in:
- The major programming languages and their runtimes
- System architecture and design patterns
- Debugging methodology
- Code quality and performance work

When analyzing an error:
1. Read the error message and stack trace carefully
2. Identify the error type and category
3. Determine the root cause and how sure you are of it
4. Consider contributing factors in the surrounding code and environment

When proposing solutions:
1. Offer more than one approach when there is a real choice
2. Spell out the trade-offs between approaches
3. Order them by effectiveness and implementation cost
4. Give concrete, actionable implementation steps

Be precise and thorough.",
};

pub const ERROR_ANALYSIS: Template = Template {
    name: "error_analysis",
    text: "Analyze the following error and provide a structured analysis:

ERROR:
{error_message}

STACK TRACE:
{stack_trace}

CONTEXT:
{context}

Provide your analysis in the following JSON format:
{{
    \"error_type\": \"the type/category of error\",
    \"severity\": \"critical|high|medium|low\",
    \"root_cause\": \"detailed explanation of the root cause\",
    \"contributing_factors\": [\"list\", \"of\", \"factors\"],
    \"affected_components\": [\"list\", \"of\", \"components\"],
    \"confidence\": 0.0 to 1.0
}}",
};

pub const SOLUTION_GENERATION: Template = Template {
    name: "solution_generation",
    text: "Based on the following error analysis, generate solution options:

ERROR ANALYSIS:
{analysis}

CODEBASE CONTEXT:
{codebase_context}

GIT CONTEXT:
{git_context}

Generate solutions in the following JSON format:
{{
    \"solutions\": [
        {{
            \"title\": \"solution title\",
            \"approach\": \"detailed approach description\",
            \"implementation\": \"code or step-by-step implementation\",
            \"pros\": [\"list\", \"of\", \"advantages\"],
            \"cons\": [\"list\", \"of\", \"disadvantages\"],
            \"complexity\": \"low|medium|high\",
            \"risk_level\": \"low|medium|high\",
            \"time_estimate\": \"estimated time\",
            \"best_for\": [\"list\", \"of\", \"use cases\"]
        }}
    ]
}}",
};

pub const SIMPLE_EXPLANATION: Template = Template {
    name: "simple_explanation",
    text: "Explain this error in plain terms a beginner programmer would understand:

ERROR: {error_message}

ROOT CAUSE: {root_cause}

Avoid jargon and use an analogy if it helps. Keep it to two or three short paragraphs.",
};

pub const TECHNICAL_EXPLANATION: Template = Template {
    name: "technical_explanation",
    text: "Give a technical explanation of this error for an experienced developer:

ERROR: {error_message}

ROOT CAUSE: {root_cause}

CONTEXT: {context}

Cover the relevant language or runtime behavior and the usual ways of handling this kind of error.",
};

pub const DEEP_DIVE_EXPLANATION: Template = Template {
    name: "deep_dive_explanation",
    text: "Give an in-depth technical deep dive on this error:

ERROR: {error_message}

ROOT CAUSE: {root_cause}

CONTEXT: {context}

STACK TRACE: {stack_trace}

Include:
1. The mechanism that produced the error
2. How the language or runtime handles this situation
3. Common patterns that lead to it
4. Prevention strategies and architectural considerations
5. Related errors and edge cases",
};

pub const TRANSLATION: Template = Template {
    name: "translation",
    text: "Translate the following technical content to {target_language}.

CONTENT:
{content}

INSTRUCTIONS:
- Keep code snippets, file paths and identifiers unchanged
- Translate explanations and descriptions
- Keep the original formatting and structure
- Use the established technical terms of the target language",
};
