//! Engine Errors
//!
//! One variant per failure category. The `Display` text of every variant is
//! surfaced verbatim to users by the API layer, so keep the wording stable.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Expression(#[from] ExpressionError),
    #[error(transparent)]
    ResponseIncomplete(#[from] ResponseIncompleteError),
    #[error(transparent)]
    UnknownReference(#[from] UnknownReferenceError),
    /// A plan failed request-level validation (details or committed gate)
    #[error("{0}")]
    InvalidPlan(String),
    #[error("version {0} doesn't match the pattern 'YYYY-MM-DD[rNN]'")]
    InvalidVersion(String),
}

/// Load, merge, or constraint failure. Fatal to the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DefinitionError {
    #[error("failed to read {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },

    #[error("practice file {} must be camelCase - start with a-z and only contain alphanumeric characters", .path.display())]
    BadFileName { path: PathBuf },

    #[error("error parsing practice {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("practice at path {} must have ID {expected}, but got {found}", .path.display())]
    IdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("practice {id} is defined twice: {} and {}", .first.display(), .second.display())]
    DuplicatePractice {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("practice {practice}: no definition found for task {task} from the tasks list")]
    MissingTaskBody { practice: String, task: String },

    #[error("practice {practice}: delta adds task {task} without a level")]
    DeltaTaskWithoutLevel { practice: String, task: String },

    #[error("practice {practice} doesn't meet additional constraints: {message}")]
    Constraint { practice: String, message: String },
}

impl DefinitionError {
    pub(crate) fn constraint(practice: &str, message: impl Into<String>) -> Self {
        Self::Constraint {
            practice: practice.to_string(),
            message: message.into(),
        }
    }
}

/// A condition that does not parse or does not evaluate to a boolean.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("failed to parse condition '{source_text}': {message} (at {start}..{end})")]
    Parse {
        source_text: String,
        message: String,
        start: usize,
        end: usize,
    },

    #[error("no parameter '{0}' found")]
    UnknownVariable(String),

    #[error("operator {operator} cannot be applied to {found}")]
    TypeMismatch { operator: String, found: String },

    #[error("condition evaluation didn't result in a boolean: {0}")]
    NotBoolean(String),

    #[error("failed to evaluate condition for practice {practice}: {source}")]
    InPractice {
        practice: String,
        #[source]
        source: Box<ExpressionError>,
    },
}

/// The caller has not supplied enough answers. Recoverable by asking the user for more.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseIncompleteError {
    #[error("missing response for practice {0}")]
    MissingPractice(String),

    #[error("missing response for {practice}.{question}")]
    MissingAnswer { practice: String, question: String },

    #[error("{practice}.{question} does not allow N/A as an answer")]
    NotApplicableNotAllowed { practice: String, question: String },

    #[error("unanswered question in plan: {practice}.{question}")]
    Unanswered { practice: String, question: String },

    #[error("no response for task {practice}.{task}")]
    NoTaskResponse { practice: String, task: String },

    #[error("can't compute practice level if it has unanswered questions: {practice}.{task}")]
    UnansweredTask { practice: String, task: String },

    #[error("missing answers for practices: [{}]", .0.join(", "))]
    MissingPracticeAnswers(Vec<String>),

    #[error("missing answers for tasks: [{}]", .0.join(", "))]
    MissingTaskAnswers(Vec<String>),
}

/// A response references something the practice set does not define.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("task in plan not found in practices: {practice}.{task}")]
pub struct UnknownReferenceError {
    pub practice: String,
    pub task: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_stable() {
        let err: EngineError = ResponseIncompleteError::NotApplicableNotAllowed {
            practice: "p".to_string(),
            question: "q1".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "p.q1 does not allow N/A as an answer");

        let err: EngineError = UnknownReferenceError {
            practice: "p".to_string(),
            task: "ghost".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "task in plan not found in practices: p.ghost");
    }

    #[test]
    fn test_list_messages() {
        let err = ResponseIncompleteError::MissingTaskAnswers(vec!["p.t1".into(), "p.t2".into()]);
        assert_eq!(err.to_string(), "missing answers for tasks: [p.t1, p.t2]");
    }
}
