//! Context optimizer - fitting aggregated context into a prompt budget

use crate::model::{AggregatedContext, CodebaseContext, EnvironmentContext};

/// Appended when the summary had to be cut
pub const TRUNCATION_MARKER: &str = "\n[Context truncated...]";

/// Rough characters-per-token ratio used for budgeting
pub const CHARS_PER_TOKEN: usize = 4;

/// Serializes context into a size-bounded text block
///
/// The budget is in tokens, approximated as `max_tokens * 4` characters.
/// Over-budget text is cut at exactly that many characters, not at a word
/// boundary.
#[derive(Debug, Clone, Copy)]
pub struct ContextOptimizer {
    max_tokens: usize,
}

impl Default for ContextOptimizer {
    fn default() -> Self {
        Self::new(4000)
    }
}

impl ContextOptimizer {
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Codebase summary, then environment summary, separated by a blank line
    pub fn optimize(&self, context: &AggregatedContext) -> String {
        let sections: Vec<String> = [
            context.codebase.as_ref().map(codebase_summary),
            context.environment.as_ref().map(format_environment),
        ]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();

        self.truncate(sections.join("\n\n"))
    }

    fn truncate(&self, text: String) -> String {
        let char_limit = self.max_tokens.saturating_mul(CHARS_PER_TOKEN);
        match text.char_indices().nth(char_limit) {
            None => text,
            Some((cut, _)) => {
                let mut out = text[..cut].to_string();
                out.push_str(TRUNCATION_MARKER);
                out
            }
        }
    }
}

/// Short multi-line description of a codebase
pub fn codebase_summary(codebase: &CodebaseContext) -> String {
    let mut lines = vec![
        format!("Project Type: {}", codebase.project_type),
        format!("Architecture: {}", codebase.architecture),
    ];
    if !codebase.frameworks.is_empty() {
        lines.push(format!("Frameworks: {}", codebase.frameworks.join(", ")));
    }
    lines.join("\n")
}

fn format_environment(env: &EnvironmentContext) -> String {
    let mut lines = Vec::new();
    if !env.runtime_version.is_empty() {
        lines.push(format!("Runtime: {}", env.runtime_version));
    }
    if !env.os_info.is_empty() {
        lines.push(format!("OS: {}", env.os_info));
    }
    lines.join("\n")
}
