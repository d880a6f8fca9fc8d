//! Data model shared by every pipeline stage

pub mod analysis;
pub mod context;
pub mod error;
pub mod git;
pub mod solution;

pub use analysis::{AnalysisResult, ErrorAnalysis, Factor, RootCause};
pub use context::{
    AggregatedContext, ArchitecturalStyle, CodebaseContext, Context, ContextSource,
    DependencyInfo, EnvironmentContext, ProjectType, SessionContext,
};
pub use error::{ClassifiedError, ErrorType, RawError, SeverityLevel, StackFrame, StackTrace};
pub use git::{Author, ChangePatterns, Commit, FragileArea, GitContext};
pub use solution::{
    CodeImplementation, ComplexityLevel, RankedSolution, RiskLevel, Solution, TimeEstimate,
    TradeOffAnalysis,
};
