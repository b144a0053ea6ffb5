use std::collections::BTreeMap;
use tracing::debug;

use super::{AnswerVal, PlanResponses};
use crate::errors::{ResponseIncompleteError, Result, UnknownReferenceError};
use crate::practice::{Level, Practice};

impl PlanResponses {
    /// Folds a task's answers into one result.
    ///
    /// `No` dominates `Unanswered`, which dominates "all N/A", which dominates `Yes`.
    pub fn task_result(
        &self,
        practice_id: &str,
        task_id: &str,
    ) -> std::result::Result<AnswerVal, ResponseIncompleteError> {
        let answers = self
            .practice_responses
            .get(practice_id)
            .and_then(|p| p.tasks.get(task_id))
            .map(|t| &t.answers)
            .filter(|answers| !answers.is_empty())
            .ok_or_else(|| ResponseIncompleteError::NoTaskResponse {
                practice: practice_id.to_string(),
                task: task_id.to_string(),
            })?;

        let values = || answers.values().map(|a| a.value);
        if values().any(|v| v == AnswerVal::No) {
            Ok(AnswerVal::No)
        } else if values().any(|v| v == AnswerVal::Unanswered) {
            Ok(AnswerVal::Unanswered)
        } else if values().all(|v| v == AnswerVal::NA) {
            Ok(AnswerVal::NA)
        } else {
            Ok(AnswerVal::Yes)
        }
    }

    /// The highest level marked yes-like that sits strictly below the lowest failed level.
    ///
    /// Only tasks present in the response contribute; a practice with no task
    /// responses is level 0.
    pub fn practice_level(&self, practice: &Practice) -> Result<u8> {
        let Some(response) = self.practice_responses.get(&practice.id) else {
            return Ok(0);
        };

        let mut no = [false; Level::ALL.len()];
        let mut yes = [false; Level::ALL.len()];

        for task_id in response.tasks.keys() {
            let task = practice.task(task_id).ok_or_else(|| UnknownReferenceError {
                practice: practice.id.clone(),
                task: task_id.clone(),
            })?;

            match self.task_result(&practice.id, task_id)? {
                AnswerVal::No => no[task.level.index()] = true,
                AnswerVal::Unanswered => {
                    return Err(ResponseIncompleteError::UnansweredTask {
                        practice: practice.id.clone(),
                        task: task_id.clone(),
                    }
                    .into())
                }
                AnswerVal::Yes | AnswerVal::NA => yes[task.level.index()] = true,
            }
        }

        let lowest_no = Level::ALL
            .iter()
            .position(|l| no[l.index()])
            .unwrap_or(Level::ALL.len());

        let level = Level::ALL[..lowest_no]
            .iter()
            .rev()
            .find(|l| yes[l.index()])
            .map_or(0, |l| l.as_u8());
        Ok(level)
    }
}

/// Levels for every practice that applies and whose level can be computed.
///
/// Inapplicable practices, and those whose applicability or level errors, are
/// left out of the map.
pub fn calculate_maturity(responses: &PlanResponses, practices: &[Practice]) -> BTreeMap<String, u8> {
    let mut maturity = BTreeMap::new();
    for practice in practices {
        match responses.practice_applies(practice) {
            Ok(true) => match responses.practice_level(practice) {
                Ok(level) => {
                    maturity.insert(practice.id.clone(), level);
                }
                Err(e) => debug!("No maturity for practice {}: {}", practice.id, e),
            },
            Ok(false) => debug!("Practice {} does not apply", practice.id),
            Err(e) => debug!("Can't tell if practice {} applies: {}", practice.id, e),
        }
    }
    maturity
}
