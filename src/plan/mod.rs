//! Response Model
//!
//! A plan records a project's answers to every practice in one practices
//! version, plus the maturity derived from them. The practice set is never
//! stored on the responses; every operation that needs it takes it as a
//! parameter.

mod applicability;
mod maturity;
mod readiness;

pub use maturity::calculate_maturity;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::{EngineError, Result};
use crate::practice::Practice;

/// The 'hard' part of an answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AnswerVal {
    Yes,
    No,
    NA,
    /// Missing is a normal state, not an error
    #[default]
    Unanswered,
}

impl AnswerVal {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerVal::Yes => "Yes",
            AnswerVal::No => "No",
            AnswerVal::NA => "N/A",
            AnswerVal::Unanswered => "Unanswered",
        }
    }
}

impl FromStr for AnswerVal {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" => Ok(AnswerVal::Yes),
            "no" => Ok(AnswerVal::No),
            "na" | "n/a" => Ok(AnswerVal::NA),
            "unanswered" => Ok(AnswerVal::Unanswered),
            _ => Err(format!("invalid answer '{}'", s)),
        }
    }
}

impl TryFrom<String> for AnswerVal {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AnswerVal> for String {
    fn from(value: AnswerVal) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for AnswerVal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An answer and any notes the user attached to it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    #[serde(rename = "answer")]
    pub value: AnswerVal,
    #[serde(default)]
    pub notes: String,
}

impl Answer {
    pub fn new(value: AnswerVal) -> Self {
        Self {
            value,
            notes: String::new(),
        }
    }
}

/// Answers to a task's questions and optional implementation details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponse {
    /// Keyed on question ID
    pub answers: BTreeMap<String, Answer>,
    #[serde(default)]
    pub priority: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub references: String,
}

/// Answers to one practice's qualifying questions and tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeResponse {
    /// Qualifying answers, keyed on question ID
    #[serde(default)]
    pub practice: BTreeMap<String, Answer>,
    /// Keyed on task ID
    #[serde(default)]
    pub tasks: BTreeMap<String, TaskResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponses {
    #[serde(default)]
    pub practices_version: String,
    /// Keyed on practice ID
    #[serde(default)]
    pub practice_responses: BTreeMap<String, PracticeResponse>,
}

/// The high level parts of a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDetails {
    pub projects: Vec<String>,
    /// YYYY-MM-DD
    pub date: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub committed: bool,
    /// Keyed on practice ID. Only practices that apply and have a computable
    /// level are present; absence means "not applicable or not computable".
    #[serde(default)]
    pub maturity: BTreeMap<String, u8>,
}

impl PlanDetails {
    /// The date must be YYYY-MM-DD and at least one project must be named
    pub fn validate(&self) -> Result<()> {
        if NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").is_err() {
            return Err(EngineError::InvalidPlan(format!(
                "invalid date format, must be YYYY-MM-DD: {}",
                self.date
            )));
        }
        if self.projects.is_empty() {
            return Err(EngineError::InvalidPlan(
                "at least one project ID must be provided".to_string(),
            ));
        }
        Ok(())
    }
}

/// The results of a questionnaire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub details: PlanDetails,
    pub responses: PlanResponses,
}

impl Plan {
    /// Builds a plan and derives its maturity from `practices`
    pub fn new(details: PlanDetails, responses: PlanResponses, practices: &[Practice]) -> Self {
        let mut plan = Self { details, responses };
        plan.calculate_maturity(practices);
        plan
    }

    /// Recomputes `details.maturity` from scratch
    pub fn calculate_maturity(&mut self, practices: &[Practice]) {
        self.details.maturity = calculate_maturity(&self.responses, practices);
    }

    /// Builds a plan from user-submitted parts, rejecting invalid details,
    /// incomplete responses, and commits that aren't ready.
    pub fn from_request(
        details: PlanDetails,
        responses: PlanResponses,
        practices: &[Practice],
    ) -> Result<Self> {
        details.validate()?;

        if details.committed {
            let (ready, issues) = responses.ready_to_commit(practices);
            if !ready {
                return Err(EngineError::InvalidPlan(format!(
                    "cannot commit plan: [{}]",
                    issues.join(", ")
                )));
            }
        }

        responses.validate(practices)?;
        Ok(Self::new(details, responses, practices))
    }
}
