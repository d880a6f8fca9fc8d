//! rootcause - LLM-backed debugging assistant
//!
//! CLI front end: reads an error, runs the pipeline and prints the result
//! as text or JSON.

use rootcause::{
    AnalysisResult, ClassifiedError, DebuggingEngine, Error, ErrorClassifier, RawError, Result,
    Settings,
    cli::{Cli, Commands, ContextArgs, ErrorInput},
    engine::{DebugReport, Explanation},
    git::HistoryAnalyzer,
    model::{CodebaseContext, EnvironmentContext, GitContext, RankedSolution},
    scan::CodebaseScanner,
};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Similar past fixes listed by `history --similar-to`
const SIMILAR_FIXES: usize = 5;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // Set up logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: could not install log subscriber");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?
        .with_api_key(cli.api_key)
        .with_model(cli.model);
    settings.validate()?;

    match cli.command {
        Commands::Classify { input, json } => cmd_classify(&input, json),
        Commands::Analyze { input, context } => cmd_analyze(settings, &input, &context).await,
        Commands::Solve { input, context } => cmd_solve(settings, &input, &context).await,
        Commands::Explain {
            input,
            level,
            language,
            context,
        } => cmd_explain(settings, &input, level.into(), language, &context).await,
        Commands::Debug { input, context } => cmd_debug(settings, &input, &context).await,
        Commands::Scan { path, json } => cmd_scan(&settings, &path, json),
        Commands::History {
            path,
            similar_to,
            json,
        } => cmd_history(&settings, &path, similar_to, json),
        Commands::Config => cmd_config(&settings, cli.config.as_deref()),
    }
}

fn cmd_classify(input: &ErrorInput, json: bool) -> Result<()> {
    let text = read_error(input)?;
    let error = ErrorClassifier::new().classify(&RawError::new(text));

    if json {
        return print_json(&error);
    }
    print_classified(&error);
    Ok(())
}

async fn cmd_analyze(settings: Settings, input: &ErrorInput, context: &ContextArgs) -> Result<()> {
    let text = read_error(input)?;
    let mut engine = prepare_engine(settings, context)?;
    let analysis = engine.analyze_error(&text, None).await?;

    if context.json {
        return print_json(&analysis);
    }
    print_analysis(&analysis);
    Ok(())
}

async fn cmd_solve(settings: Settings, input: &ErrorInput, context: &ContextArgs) -> Result<()> {
    let text = read_error(input)?;
    let mut engine = prepare_engine(settings, context)?;
    let analysis = engine.analyze_error(&text, None).await?;
    let solutions = engine.generate_solutions(&analysis).await?;
    let ranked = engine.rank_solutions(&solutions);

    if context.json {
        return print_json(&ranked);
    }
    print_analysis(&analysis);
    println!();
    print_solutions(&engine, &ranked);
    Ok(())
}

async fn cmd_explain(
    settings: Settings,
    input: &ErrorInput,
    level: rootcause::ExplanationLevel,
    language: Option<String>,
    context: &ContextArgs,
) -> Result<()> {
    let text = read_error(input)?;
    let mut engine = prepare_engine(settings, context)?;
    let analysis = engine.analyze_error(&text, None).await?;
    let explanation = engine
        .explain_error(
            &analysis.error,
            &analysis.root_cause.description,
            level,
            language.as_deref(),
        )
        .await?;

    if context.json {
        return print_json(&explanation);
    }
    print_explanation(&explanation);
    Ok(())
}

async fn cmd_debug(settings: Settings, input: &ErrorInput, context: &ContextArgs) -> Result<()> {
    let text = read_error(input)?;
    let mut engine = prepare_engine(settings, context)?;
    let report: DebugReport = engine.debug(&text).await?;

    if context.json {
        return print_json(&report);
    }
    print_analysis(&report.analysis);
    println!();
    print_solutions(&engine, &report.solutions);
    println!();
    print_explanation(&report.explanation);
    Ok(())
}

fn cmd_scan(settings: &Settings, path: &Path, json: bool) -> Result<()> {
    let context = CodebaseScanner::with_settings(path, &settings.scan).scan()?;

    if json {
        return print_json(&context);
    }
    print_codebase(&context);
    Ok(())
}

fn cmd_history(settings: &Settings, path: &Path, similar_to: Option<String>, json: bool) -> Result<()> {
    let analyzer = HistoryAnalyzer::open(path, settings.git.history_limit)?;
    let context = analyzer.build_context()?;

    let similar = match similar_to {
        Some(text) => {
            let error = ErrorClassifier::new().classify(&RawError::new(text));
            analyzer.find_similar_past_fixes(&error, SIMILAR_FIXES)?
        }
        None => Vec::new(),
    };

    if json {
        #[derive(Serialize)]
        struct HistoryOutput<'a> {
            context: &'a GitContext,
            similar_fixes: &'a [rootcause::model::Commit],
        }
        return print_json(&HistoryOutput {
            context: &context,
            similar_fixes: &similar,
        });
    }

    let block = context.to_prompt_block();
    if block.is_empty() {
        println!("No history found");
    } else {
        println!("{}", block);
    }
    if !similar.is_empty() {
        println!();
        println!("Similar past fixes:");
        for commit in &similar {
            println!("  {} {}", commit.short_sha(), commit.summary());
        }
    }
    Ok(())
}

fn cmd_config(settings: &Settings, explicit: Option<&Path>) -> Result<()> {
    match explicit.map(Path::to_path_buf).or_else(Settings::default_path) {
        Some(path) if path.exists() => println!("# Loaded from {}", path.display()),
        Some(path) => println!("# No settings file at {} (using defaults)", path.display()),
        None => println!("# No config directory (using defaults)"),
    }
    println!(
        "# API key: {}",
        if settings.llm.api_key.is_some() { "set" } else { "not set" }
    );
    print!("{}", settings.to_yaml()?);
    Ok(())
}

/// Engine with environment context plus optional codebase and git context
fn prepare_engine(settings: Settings, context: &ContextArgs) -> Result<DebuggingEngine> {
    let git_enabled = settings.git.enabled;
    let mut engine = DebuggingEngine::from_settings(settings);
    engine
        .context_mut()
        .set_environment_context(EnvironmentContext::current());

    if let Some(ref path) = context.codebase {
        engine.learn_from_codebase(path)?;
    }
    if let Some(ref path) = context.repo
        && git_enabled
    {
        engine.integrate_git_history(path)?;
    }
    Ok(engine)
}

/// Positional text, then --file, then stdin
fn read_error(input: &ErrorInput) -> Result<String> {
    let text = match (&input.error, &input.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    if text.trim().is_empty() {
        return Err(Error::InvalidInput("no error text provided".to_string()));
    }
    Ok(text)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_classified(error: &ClassifiedError) {
    println!("Type:     {}", error.error_type);
    println!("Severity: {}", error.severity);
    println!("Location: {}", error.location());
    if let Some(name) = error.metadata.get("exception_name").and_then(|v| v.as_str()) {
        println!("Exception: {}", name);
    }
    if let Some(ref trace) = error.stack_trace {
        println!("Frames:   {}", trace.frames.len());
        for frame in &trace.frames {
            println!(
                "  {}:{} in {}",
                frame
                    .file_path
                    .as_ref()
                    .map_or_else(|| "?".to_string(), |p| p.display().to_string()),
                frame.line_number.map_or_else(|| "?".to_string(), |n| n.to_string()),
                frame.function_name.as_deref().unwrap_or("?")
            );
        }
    }
}

fn print_analysis(result: &AnalysisResult) {
    println!("{}", result.summary());
    println!();
    println!("Root cause: {}", result.root_cause.description);
    if !result.contributing_factors.is_empty() {
        println!("Contributing factors:");
        for factor in &result.contributing_factors {
            println!("  - {}", factor.description);
        }
    }
    if !result.analysis.affected_components.is_empty() {
        println!(
            "Affected components: {}",
            result.analysis.affected_components.join(", ")
        );
    }
}

fn print_solutions(engine: &DebuggingEngine, solutions: &[RankedSolution]) {
    if solutions.is_empty() {
        println!("No solutions proposed");
        return;
    }

    for ranked in solutions {
        let solution = &ranked.solution;
        println!(
            "{}. {} (score {:.2}, complexity {}, risk {})",
            ranked.rank_position,
            solution.title,
            ranked.rank_score,
            solution.complexity,
            solution.risk_level
        );
        println!("   {}", solution.approach);
        let estimate = solution.time_estimate.formatted();
        if !estimate.is_empty() && estimate != "0 minutes" {
            println!("   Time: {}", estimate);
        }
        for pro in &solution.pros {
            println!("   + {}", pro);
        }
        for con in &solution.cons {
            println!("   - {}", con);
        }
        let trade_offs = engine.ranker().evaluate_trade_offs(solution);
        for note in &trade_offs.notes {
            println!("   * {}", note);
        }
        if !solution.implementation.code.is_empty() {
            println!();
            for line in solution.implementation.code.lines() {
                println!("     {}", line);
            }
        }
        println!();
    }
}

fn print_explanation(explanation: &Explanation) {
    println!("Explanation ({}):", explanation.level);
    println!();
    println!("{}", explanation.content);
}

fn print_codebase(context: &CodebaseContext) {
    println!("Project type: {}", context.project_type);
    println!("Architecture: {}", context.architecture);
    println!("Files:        {}", context.file_count);
    if !context.frameworks.is_empty() {
        println!("Frameworks:   {}", context.frameworks.join(", "));
    }
    if !context.entry_points.is_empty() {
        let dirs: Vec<String> = context
            .entry_points
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        println!("Source dirs:  {}", dirs.join(", "));
    }
    if !context.dependencies.is_empty() {
        println!("Dependencies:");
        for dep in &context.dependencies {
            let version = if dep.version.is_empty() { "*" } else { dep.version.as_str() };
            let dev = if dep.is_dev { " (dev)" } else { "" };
            println!("  {} {}{}", dep.name, version, dev);
        }
    }
}
