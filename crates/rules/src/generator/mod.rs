//! Rule generation: every enabled profile × every fragment.
//!
//! Each pair is substituted, parsed and validated independently (optionally
//! on a rayon pool), then the finished set goes through two sequential
//! reductions: the duplicate check, which can abort the run, and overlap
//! detection, which only warns.

mod core;
mod duplicates;
mod error;
mod identity;
mod report;
mod rule;
mod structure;

#[cfg(test)]
mod tests;

pub use self::core::{Generation, GeneratorOptions, PairResult, RuleGenerator};
pub use self::error::{
    ConflictKind, DuplicateRuleError, GenerateError, PairError, RuleConflict, SchemaError,
    UnresolvedPlaceholderError,
};
pub use self::report::{
    GenerationReport, LoadFailure, Overlap, PairOutcome, PairRecord, ReportSummary,
};
pub use self::rule::{GeneratedRule, RuleSource};
