//! Debugging engine - sequences the pipeline stages
//!
//! Each request runs classify, context, prompt, generate and parse in order,
//! then optionally rank and explain. Provider and parse failures propagate
//! unchanged; the engine never retries.

mod events;
mod explain;

pub use events::{EngineEvents, TracingEvents};
pub use explain::{Explanation, ExplanationLevel};

use crate::classify::ErrorClassifier;
use crate::config::Settings;
use crate::context::{ContextAggregator, codebase_summary};
use crate::git::HistoryAnalyzer;
use crate::llm::{AnthropicProvider, LlmProvider, ResponseParser};
use crate::model::{
    AggregatedContext, AnalysisResult, ClassifiedError, CodebaseContext, GitContext, RankedSolution,
    RawError, Solution,
};
use crate::prompt::PromptBuilder;
use crate::scan::CodebaseScanner;
use crate::solution::{SolutionRanker, SolutionValidator};
use crate::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Output of [`DebuggingEngine::debug`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugReport {
    pub analysis: AnalysisResult,
    /// Valid solutions, best first
    pub solutions: Vec<RankedSolution>,
    pub explanation: Explanation,
}

/// Orchestrates classification, context, prompting, generation and ranking
pub struct DebuggingEngine {
    provider: Arc<dyn LlmProvider>,
    events: Arc<dyn EngineEvents>,
    settings: Settings,
    classifier: ErrorClassifier,
    aggregator: ContextAggregator,
    prompts: PromptBuilder,
    parser: ResponseParser,
    validator: SolutionValidator,
    ranker: SolutionRanker,
    git_context: Option<GitContext>,
}

impl DebuggingEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: Settings) -> Self {
        Self {
            provider,
            events: Arc::new(TracingEvents),
            prompts: PromptBuilder::new(settings.context.max_tokens),
            settings,
            classifier: ErrorClassifier::new(),
            aggregator: ContextAggregator::new(),
            parser: ResponseParser::new(),
            validator: SolutionValidator::new(),
            ranker: SolutionRanker::new(),
            git_context: None,
        }
    }

    /// Engine backed by the hosted provider configured in `settings`
    pub fn from_settings(settings: Settings) -> Self {
        let provider = AnthropicProvider::new(settings.llm.api_key.clone(), settings.llm.model.clone())
            .with_base_url(settings.llm.base_url.clone())
            .with_timeout(settings.llm.request_timeout());
        Self::new(Arc::new(provider), settings)
    }

    pub fn with_events(mut self, events: Arc<dyn EngineEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn classifier(&self) -> &ErrorClassifier {
        &self.classifier
    }

    pub fn context(&self) -> &ContextAggregator {
        &self.aggregator
    }

    pub fn context_mut(&mut self) -> &mut ContextAggregator {
        &mut self.aggregator
    }

    pub fn git_context(&self) -> Option<&GitContext> {
        self.git_context.as_ref()
    }

    pub fn set_git_context(&mut self, context: GitContext) {
        self.git_context = Some(context);
    }

    /// Classify `error_text`, ask the model for an analysis and record the
    /// error in the session.
    ///
    /// Without an explicit `context` the aggregator's current snapshot is
    /// used, with relevance scores for this error filled in.
    pub async fn analyze_error(
        &mut self,
        error_text: &str,
        context: Option<AggregatedContext>,
    ) -> Result<AnalysisResult> {
        let started = Instant::now();
        self.events.analysis_started(error_text);

        let error = self.classifier.classify(&RawError::new(error_text));
        let context = context.unwrap_or_else(|| self.snapshot_for(&error));

        let prompt = self.prompts.build_analysis_prompt(&error, Some(&context))?;
        let response = self.generate(&prompt).await?;
        let analysis = self.parser.parse_analysis_response(&response)?;

        self.aggregator.add_error_to_session(&error);

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.events.analysis_completed(duration_ms, analysis.confidence);

        Ok(AnalysisResult {
            root_cause: analysis.root_cause.clone(),
            contributing_factors: analysis.contributing_factors.clone(),
            confidence: analysis.confidence,
            error,
            analysis,
            context: Some(context),
            timestamp: Utc::now(),
            analysis_duration_ms: duration_ms,
        })
    }

    /// Ask for candidate fixes; invalid candidates are dropped, order is kept
    pub async fn generate_solutions(&self, analysis: &AnalysisResult) -> Result<Vec<Solution>> {
        let codebase = analysis
            .context
            .as_ref()
            .and_then(|c| c.codebase.as_ref())
            .map(codebase_summary)
            .unwrap_or_default();
        let git = self
            .git_context
            .as_ref()
            .map(GitContext::to_prompt_block)
            .unwrap_or_default();

        let prompt = self.prompts.build_solution_prompt(&analysis.analysis, &codebase, &git)?;
        let response = self.generate(&prompt).await?;
        let solutions = self
            .validator
            .filter_valid(self.parser.parse_solutions_response(&response)?);

        self.events.solutions_generated(solutions.len());
        Ok(solutions)
    }

    pub fn rank_solutions(&self, solutions: &[Solution]) -> Vec<RankedSolution> {
        self.ranker.rank_solutions(solutions)
    }

    pub fn ranker(&self) -> &SolutionRanker {
        &self.ranker
    }

    /// One explanation at `level`. `language` defaults to the configured one.
    pub async fn explain_error(
        &self,
        error: &ClassifiedError,
        root_cause: &str,
        level: ExplanationLevel,
        language: Option<&str>,
    ) -> Result<Explanation> {
        let context = self.prompts.optimizer().optimize(&self.aggregator.build_context());
        let stack_trace = error
            .stack_trace
            .as_ref()
            .map(|t| t.raw_trace.as_str())
            .unwrap_or_default();

        let prompt = self
            .prompts
            .build_explanation_prompt(error, root_cause, level, &context, stack_trace)?;
        let response = self.generate(&prompt).await?;

        Ok(Explanation {
            content: self.parser.parse_explanation_response(&response),
            level,
            language: language.unwrap_or(&self.settings.language.default).to_string(),
        })
    }

    /// Analyze, generate and rank solutions, then explain at the simple level
    pub async fn debug(&mut self, error_text: &str) -> Result<DebugReport> {
        let analysis = self.analyze_error(error_text, None).await?;
        let solutions = self.generate_solutions(&analysis).await?;
        let ranked = self.rank_solutions(&solutions);
        let explanation = self
            .explain_error(
                &analysis.error,
                &analysis.root_cause.description,
                ExplanationLevel::Simple,
                None,
            )
            .await?;

        Ok(DebugReport {
            analysis,
            solutions: ranked,
            explanation,
        })
    }

    /// Scan `path` and install the result as codebase context
    pub fn learn_from_codebase(&mut self, path: &Path) -> Result<CodebaseContext> {
        let context = CodebaseScanner::with_settings(path, &self.settings.scan).scan()?;
        self.aggregator.set_codebase_context(context.clone());
        Ok(context)
    }

    /// Read history from the repository at `path` for solution prompts
    pub fn integrate_git_history(&mut self, path: &Path) -> Result<GitContext> {
        let context = HistoryAnalyzer::open(path, self.settings.git.history_limit)?.build_context()?;
        self.git_context = Some(context.clone());
        Ok(context)
    }

    fn snapshot_for(&self, error: &ClassifiedError) -> AggregatedContext {
        let mut snapshot = self.aggregator.build_context();
        snapshot.relevance_scores = self.aggregator.get_relevant_context(error).relevance_scores;
        snapshot
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let config = self
            .settings
            .llm
            .generation_config()
            .with_system_prompt(self.prompts.system_prompt());

        debug!(model = self.provider.model(), "Calling provider");
        let response = self.provider.generate(prompt, &config).await?;
        self.events
            .llm_call(self.provider.token_count(prompt), self.provider.token_count(&response));
        Ok(response)
    }
}
