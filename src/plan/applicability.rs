use std::collections::BTreeMap;
use tracing::debug;

use super::{AnswerVal, PlanResponses};
use crate::condition;
use crate::errors::{ExpressionError, ResponseIncompleteError, Result};
use crate::practice::Practice;

impl PlanResponses {
    /// Whether `practice` applies to the project, according to its qualifying answers.
    ///
    /// A practice without qualifying questions always applies. Any qualifying
    /// question answered N/A (where allowed) makes the practice not applicable,
    /// without evaluating the condition.
    pub fn practice_applies(&self, practice: &Practice) -> Result<bool> {
        if !practice.has_qualifying_questions() {
            return Ok(true);
        }

        let response = self
            .practice_responses
            .get(&practice.id)
            .ok_or_else(|| ResponseIncompleteError::MissingPractice(practice.id.clone()))?;

        let mut answers = Vec::with_capacity(practice.questions.len());
        for q in &practice.questions {
            let answer = response.practice.get(&q.id).ok_or_else(|| {
                ResponseIncompleteError::MissingAnswer {
                    practice: practice.id.clone(),
                    question: q.id.clone(),
                }
            })?;
            if answer.value == AnswerVal::NA && !q.allows_na {
                return Err(ResponseIncompleteError::NotApplicableNotAllowed {
                    practice: practice.id.clone(),
                    question: q.id.clone(),
                }
                .into());
            }
            answers.push((q.id.as_str(), answer.value));
        }

        if let Some((question, _)) = answers.iter().find(|(_, v)| *v == AnswerVal::NA) {
            debug!(
                "{}.{} answered N/A, practice does not apply",
                practice.id, question
            );
            return Ok(false);
        }

        let mut params = BTreeMap::new();
        for (question, value) in answers {
            match value {
                AnswerVal::Yes => params.insert(question.to_string(), true),
                AnswerVal::No => params.insert(question.to_string(), false),
                _ => {
                    return Err(ResponseIncompleteError::Unanswered {
                        practice: practice.id.clone(),
                        question: question.to_string(),
                    }
                    .into())
                }
            };
        }

        condition::evaluate(&practice.condition, &params).map_err(|e| {
            ExpressionError::InPractice {
                practice: practice.id.clone(),
                source: Box::new(e),
            }
            .into()
        })
    }
}
