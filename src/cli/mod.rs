//! CLI commands and argument parsing

use crate::engine::ExplanationLevel;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// rootcause - classify errors, find root causes and rank fixes
#[derive(Parser, Debug)]
#[command(name = "rca")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (defaults to the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// API key for the hosted model
    #[arg(long, env = "ANTHROPIC_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model name override
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the error text comes from
#[derive(Args, Debug, Clone)]
pub struct ErrorInput {
    /// Error message or stack trace (read from --file or stdin when omitted)
    pub error: Option<String>,

    /// Read the error from a file
    #[arg(long, short = 'f', conflicts_with = "error")]
    pub file: Option<PathBuf>,
}

/// Extra context for commands that call the model
#[derive(Args, Debug, Clone)]
pub struct ContextArgs {
    /// Scan this codebase and include it as context
    #[arg(long)]
    pub codebase: Option<PathBuf>,

    /// Include git history from this repository
    #[arg(long)]
    pub repo: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify an error without calling the model
    Classify {
        #[command(flatten)]
        input: ErrorInput,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Root-cause analysis of an error
    Analyze {
        #[command(flatten)]
        input: ErrorInput,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Analyze an error and list ranked solutions
    Solve {
        #[command(flatten)]
        input: ErrorInput,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Analyze an error and explain it
    Explain {
        #[command(flatten)]
        input: ErrorInput,

        /// Level of detail
        #[arg(long, short, value_enum, default_value_t = LevelArg::Simple)]
        level: LevelArg,

        /// Language code recorded with the explanation
        #[arg(long)]
        language: Option<String>,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Full run: analysis, ranked solutions and a simple explanation
    Debug {
        #[command(flatten)]
        input: ErrorInput,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Scan a codebase and print what was learned
    Scan {
        /// Project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Summarize git history: recent commits, fragile files, past fixes
    History {
        /// Repository path
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Also list past fix commits similar to this error text
        #[arg(long)]
        similar_to: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the effective settings
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum LevelArg {
    Simple,
    Technical,
    #[value(name = "deep_dive", alias = "deep-dive")]
    DeepDive,
}

impl From<LevelArg> for ExplanationLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Simple => ExplanationLevel::Simple,
            LevelArg::Technical => ExplanationLevel::Technical,
            LevelArg::DeepDive => ExplanationLevel::DeepDive,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
