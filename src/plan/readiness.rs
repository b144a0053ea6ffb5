use super::{AnswerVal, PlanResponses};
use crate::errors::ResponseIncompleteError;
use crate::practice::Practice;

impl PlanResponses {
    /// IDs of practices with qualifying questions that lack a response to any of them
    pub fn missing_practice_answers(&self, practices: &[Practice]) -> Vec<String> {
        practices
            .iter()
            .filter(|p| p.has_qualifying_questions())
            .filter(|p| match self.practice_responses.get(&p.id) {
                Some(response) => p.questions.iter().any(|q| !response.practice.contains_key(&q.id)),
                None => true,
            })
            .map(|p| p.id.clone())
            .collect()
    }

    /// `practice.task` IDs whose questions are not all answered.
    ///
    /// With `ignore_unanswered`, an explicit `Unanswered` counts as present and
    /// only absent answers are reported.
    pub fn missing_answers_for_practice(&self, practice: &Practice, ignore_unanswered: bool) -> Vec<String> {
        let tasks = self.practice_responses.get(&practice.id).map(|r| &r.tasks);

        practice
            .tasks
            .iter()
            .filter(|t| match tasks.and_then(|ts| ts.get(&t.id)) {
                Some(response) => t.questions.iter().any(|q| match response.answers.get(&q.id) {
                    Some(answer) => !ignore_unanswered && answer.value == AnswerVal::Unanswered,
                    None => true,
                }),
                None => true,
            })
            .map(|t| format!("{}.{}", practice.id, t.id))
            .collect()
    }

    pub fn missing_answers(&self, practices: &[Practice], ignore_unanswered: bool) -> Vec<String> {
        practices
            .iter()
            .flat_map(|p| self.missing_answers_for_practice(p, ignore_unanswered))
            .collect()
    }

    /// Whether the plan may be committed, and if not, every reason why.
    ///
    /// Applicability must be decidable for every practice, and applicable
    /// practices need a definite answer to every task question.
    pub fn ready_to_commit(&self, practices: &[Practice]) -> (bool, Vec<String>) {
        let mut issues = Vec::new();
        for practice in practices {
            match self.practice_applies(practice) {
                Err(e) => issues.push(format!("Can't tell if practice {} applies: {}", practice.id, e)),
                Ok(true) => {
                    let missing = self.missing_answers_for_practice(practice, false);
                    if !missing.is_empty() {
                        issues.push(format!(
                            "Missing or unanswered answers for applicable practice {}: [{}]",
                            practice.id,
                            missing.join(", ")
                        ));
                    }
                }
                Ok(false) => {}
            }
        }
        (issues.is_empty(), issues)
    }

    /// Every question of every practice must have a response, though it may be
    /// `Unanswered`. Applicability is not considered.
    pub fn validate(&self, practices: &[Practice]) -> Result<(), ResponseIncompleteError> {
        let missing = self.missing_practice_answers(practices);
        if !missing.is_empty() {
            return Err(ResponseIncompleteError::MissingPracticeAnswers(missing));
        }

        let missing = self.missing_answers(practices, true);
        if !missing.is_empty() {
            return Err(ResponseIncompleteError::MissingTaskAnswers(missing));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Answer, PracticeResponse, TaskResponse};
    use crate::practice::{Level, Level0, Question, Task};
    use std::collections::BTreeMap;

    fn question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            text: format!("{}?", id),
            allows_na: true,
            allows_other: false,
        }
    }

    fn practice(id: &str, qualifying: &[&str]) -> Practice {
        Practice {
            id: id.to_string(),
            name: id.to_string(),
            questions: qualifying.iter().map(|q| question(q)).collect(),
            tasks: vec![
                Task {
                    id: "t4".to_string(),
                    title: "T4".to_string(),
                    description: String::new(),
                    level: Level::L4,
                    questions: vec![question("a"), question("b")],
                },
                Task {
                    id: "t1".to_string(),
                    title: "T1".to_string(),
                    description: String::new(),
                    level: Level::L1,
                    questions: vec![question("t1")],
                },
            ],
            level0: Level0::default(),
            page: String::new(),
            condition: qualifying.join(" || "),
            notes: String::new(),
        }
    }

    fn answers(pairs: &[(&str, AnswerVal)]) -> BTreeMap<String, Answer> {
        pairs.iter().map(|(q, v)| (q.to_string(), Answer::new(*v))).collect()
    }

    fn complete(value: AnswerVal) -> PracticeResponse {
        PracticeResponse {
            practice: answers(&[("web", AnswerVal::Yes)]),
            tasks: BTreeMap::from([
                (
                    "t4".to_string(),
                    TaskResponse {
                        answers: answers(&[("a", value), ("b", AnswerVal::Yes)]),
                        ..Default::default()
                    },
                ),
                (
                    "t1".to_string(),
                    TaskResponse {
                        answers: answers(&[("t1", AnswerVal::No)]),
                        ..Default::default()
                    },
                ),
            ]),
        }
    }

    fn plan(entries: Vec<(&str, PracticeResponse)>) -> PlanResponses {
        PlanResponses {
            practices_version: "2024-01-01".to_string(),
            practice_responses: entries.into_iter().map(|(id, r)| (id.to_string(), r)).collect(),
        }
    }

    #[test]
    fn test_missing_practice_answers() {
        let practices = [practice("p", &["web"]), practice("open", &[]), practice("q", &["web", "api"])];
        let r = plan(vec![("p", complete(AnswerVal::Yes)), ("q", complete(AnswerVal::Yes))]);
        assert_eq!(r.missing_practice_answers(&practices), vec!["q".to_string()]);

        let r = plan(vec![]);
        assert_eq!(r.missing_practice_answers(&practices), vec!["p".to_string(), "q".to_string()]);
    }

    #[test]
    fn test_missing_answers_modes() {
        let practices = [practice("p", &["web"])];
        let r = plan(vec![("p", complete(AnswerVal::Unanswered))]);
        assert!(r.missing_answers(&practices, true).is_empty());
        assert_eq!(r.missing_answers(&practices, false), vec!["p.t4".to_string()]);

        let mut partial = complete(AnswerVal::Yes);
        partial.tasks.get_mut("t4").unwrap().answers.remove("b");
        partial.tasks.remove("t1");
        let r = plan(vec![("p", partial)]);
        assert_eq!(
            r.missing_answers(&practices, true),
            vec!["p.t4".to_string(), "p.t1".to_string()]
        );
    }

    #[test]
    fn test_ready_to_commit() {
        let practices = [practice("p", &["web"])];
        let r = plan(vec![("p", complete(AnswerVal::Yes))]);
        assert_eq!(r.ready_to_commit(&practices), (true, vec![]));

        let r = plan(vec![("p", complete(AnswerVal::Unanswered))]);
        let (ready, issues) = r.ready_to_commit(&practices);
        assert!(!ready);
        assert_eq!(
            issues,
            vec!["Missing or unanswered answers for applicable practice p: [p.t4]".to_string()]
        );

        let (ready, issues) = plan(vec![]).ready_to_commit(&practices);
        assert!(!ready);
        assert_eq!(
            issues,
            vec!["Can't tell if practice p applies: missing response for practice p".to_string()]
        );
    }

    #[test]
    fn test_inapplicable_practice_needs_no_task_answers() {
        let practices = [practice("p", &["web"])];
        let r = plan(vec![(
            "p",
            PracticeResponse {
                practice: answers(&[("web", AnswerVal::NA)]),
                tasks: BTreeMap::new(),
            },
        )]);
        assert_eq!(r.ready_to_commit(&practices), (true, vec![]));
    }

    #[test]
    fn test_validate() {
        let practices = [practice("p", &["web"])];
        assert!(plan(vec![("p", complete(AnswerVal::Unanswered))])
            .validate(&practices)
            .is_ok());

        assert_eq!(
            plan(vec![]).validate(&practices),
            Err(ResponseIncompleteError::MissingPracticeAnswers(vec!["p".to_string()]))
        );

        let mut partial = complete(AnswerVal::Yes);
        partial.tasks.remove("t1");
        assert_eq!(
            plan(vec![("p", partial)]).validate(&practices).unwrap_err().to_string(),
            "missing answers for tasks: [p.t1]"
        );
    }

    #[test]
    fn test_unanswered_task_without_questions_blocks_commit() {
        let mut p = practice("p", &[]);
        p.tasks[1].questions.clear();
        let practices = [p];

        let r = plan(vec![]);
        assert_eq!(r.missing_answers(&practices, true), vec!["p.t4".to_string(), "p.t1".to_string()]);
        let (ready, issues) = r.ready_to_commit(&practices);
        assert!(!ready);
        assert_eq!(
            issues,
            vec!["Missing or unanswered answers for applicable practice p: [p.t4, p.t1]".to_string()]
        );
    }
}
