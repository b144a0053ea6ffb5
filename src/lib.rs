//! BeSec Maturity Engine
//!
//! Scores a project's security maturity from its answers to a questionnaire:
//! - Practice definitions loaded from YAML, with deployment-local deltas
//! - Structural constraint checking at load time
//! - A small condition language deciding whether a practice applies
//! - Per-practice maturity levels and commit-readiness checks

pub mod condition;
pub mod config;
pub mod errors;
pub mod plan;
pub mod practice;
pub mod versioning;

// Re-exports for convenience
pub use config::EngineConfig;
pub use errors::{EngineError, Result};
pub use plan::{calculate_maturity, Answer, AnswerVal, Plan, PlanDetails, PlanResponses};
pub use practice::{Level, Practice, PracticeLoader};
