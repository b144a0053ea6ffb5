//! Constraints a practice must meet beyond what its file syntax can express.
//!
//! Runs once at assembly time with a human in the loop, so it stops at the
//! first violation. It also makes implicit question IDs explicit.

use std::collections::HashSet;

use super::{Level, Practice, Question};
use crate::condition::Condition;
use crate::errors::DefinitionError;

const LEVEL_ORDER_HINT: &str = "the order levels must be populated is 4,1,2,3";

/// Checks `practice` and fills in the ID of any solo, unnamed question.
pub fn check_constraints(practice: &mut Practice) -> Result<(), DefinitionError> {
    let practice_id = practice.id.clone();

    adopt_owner_id(&mut practice.questions, &practice_id);
    check_question_ids(&practice_id, "the practice's qualifying questions", &practice.questions)?;

    if practice.has_qualifying_questions() {
        check_condition(practice)?;
    }

    let mut task_ids = HashSet::new();
    for task in &mut practice.tasks {
        if !task_ids.insert(task.id.clone()) {
            return Err(DefinitionError::constraint(
                &practice_id,
                format!("task ID {} is repeated", task.id),
            ));
        }
        if task.questions.is_empty() {
            return Err(DefinitionError::constraint(
                &practice_id,
                format!("task {} has no questions", task.id),
            ));
        }
        adopt_owner_id(&mut task.questions, &task.id);
        check_question_ids(&practice_id, &format!("task {}", task.id), &task.questions)?;
    }

    check_level_order(practice)
}

fn adopt_owner_id(questions: &mut [Question], owner_id: &str) {
    if let [solo] = questions {
        if solo.id.is_empty() {
            solo.id = owner_id.to_string();
        }
    }
}

fn check_question_ids(
    practice_id: &str,
    scope: &str,
    questions: &[Question],
) -> Result<(), DefinitionError> {
    let mut seen = HashSet::new();
    for q in questions {
        if q.id.is_empty() {
            return Err(DefinitionError::constraint(
                practice_id,
                format!("question is missing ID, but isn't a solo question in {}: {}", scope, q.text),
            ));
        }
        if !seen.insert(q.id.as_str()) {
            return Err(DefinitionError::constraint(
                practice_id,
                format!("question ID {} is not unique within {}", q.id, scope),
            ));
        }
    }
    Ok(())
}

fn check_condition(practice: &Practice) -> Result<(), DefinitionError> {
    let condition = Condition::parse(&practice.condition).map_err(|_| {
        DefinitionError::constraint(
            &practice.id,
            format!("failed to parse condition '{}'", practice.condition),
        )
    })?;

    let known: HashSet<&str> = practice.questions.iter().map(|q| q.id.as_str()).collect();
    if let Some(unknown) = condition.variables().into_iter().find(|v| !known.contains(v)) {
        return Err(DefinitionError::constraint(
            &practice.id,
            format!(
                "condition '{}' refers to {}, which is not a qualifying question",
                practice.condition, unknown
            ),
        ));
    }
    Ok(())
}

fn check_level_order(practice: &Practice) -> Result<(), DefinitionError> {
    let levels = practice.levels_present();
    let violation = if !levels.contains(&Level::L4) {
        Some("doesn't have a level 4 task")
    } else if levels.contains(&Level::L2) && !levels.contains(&Level::L1) {
        Some("has a level 2 task but no level 1 task")
    } else if levels.contains(&Level::L3) && !levels.contains(&Level::L2) {
        Some("has a level 3 task but no level 2 task")
    } else {
        None
    };

    match violation {
        Some(what) => Err(DefinitionError::constraint(
            &practice.id,
            format!("practice {} {} - {}", practice.id, what, LEVEL_ORDER_HINT),
        )),
        None => Ok(()),
    }
}
