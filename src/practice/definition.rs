//! Practice definition files and deltas.
//!
//! A definition file lists task IDs in order and keeps task bodies in a
//! separate map so authors don't repeat IDs. A delta is an optional second
//! file for the same practice: every field it carries replaces the base
//! field, every field it leaves out is inherited. Task bodies merge per task.

use serde::Deserialize;
use std::collections::BTreeMap;

use super::{Level, Level0, Practice, Question, Task};
use crate::errors::DefinitionError;

/// A base definition, as written in a practice file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PracticeDefinition {
    #[serde(default)]
    pub remove: bool,
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    pub tasks: Vec<String>,
    pub task_definitions: BTreeMap<String, TaskDefinition>,
    #[serde(default)]
    pub level0: Level0,
    #[serde(default)]
    pub page: String,
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub notes: String,
}

/// A task body. The ID is the key it is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDefinition {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub level: Level,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// An override file. Absent fields inherit from the base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PracticeDelta {
    pub remove: Option<bool>,
    /// Deltas commonly omit the ID; a mismatch is tolerated
    pub id: Option<String>,
    pub name: Option<String>,
    pub questions: Option<Vec<Question>>,
    pub tasks: Option<Vec<String>>,
    pub task_definitions: Option<BTreeMap<String, TaskDelta>>,
    pub level0: Option<Level0Delta>,
    pub page: Option<String>,
    pub condition: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskDelta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub level: Option<Level>,
    pub questions: Option<Vec<Question>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Level0Delta {
    pub short: Option<String>,
    pub long: Option<String>,
}

impl PracticeDefinition {
    /// Applies `delta` on top of this definition, field by field.
    pub fn merge(mut self, practice_id: &str, delta: PracticeDelta) -> Result<Self, DefinitionError> {
        if let Some(remove) = delta.remove {
            self.remove = remove;
        }
        if let Some(name) = delta.name {
            self.name = name;
        }
        if let Some(questions) = delta.questions {
            self.questions = questions;
        }
        if let Some(tasks) = delta.tasks {
            self.tasks = tasks;
        }
        if let Some(level0) = delta.level0 {
            if let Some(short) = level0.short {
                self.level0.short = short;
            }
            if let Some(long) = level0.long {
                self.level0.long = long;
            }
        }
        if let Some(page) = delta.page {
            self.page = page;
        }
        if let Some(condition) = delta.condition {
            self.condition = condition;
        }
        if let Some(notes) = delta.notes {
            self.notes = notes;
        }

        for (task_id, task_delta) in delta.task_definitions.unwrap_or_default() {
            match self.task_definitions.remove(&task_id) {
                Some(base) => {
                    self.task_definitions.insert(task_id, base.merge(task_delta));
                }
                None => {
                    let added = TaskDefinition::from_delta(practice_id, &task_id, task_delta)?;
                    self.task_definitions.insert(task_id, added);
                }
            }
        }

        Ok(self)
    }

    /// Expands the ordered task list against the task bodies.
    ///
    /// `id` is the file-derived practice ID, which wins over the embedded one.
    pub fn into_practice(self, id: &str) -> Result<Practice, DefinitionError> {
        let mut tasks = Vec::with_capacity(self.tasks.len());
        for task_id in &self.tasks {
            let body = self.task_definitions.get(task_id).ok_or_else(|| {
                DefinitionError::MissingTaskBody {
                    practice: id.to_string(),
                    task: task_id.clone(),
                }
            })?;
            tasks.push(Task {
                id: task_id.clone(),
                title: body.title.clone(),
                description: body.description.clone(),
                level: body.level,
                questions: body.questions.clone(),
            });
        }

        Ok(Practice {
            id: id.to_string(),
            name: self.name,
            questions: self.questions,
            tasks,
            level0: self.level0,
            page: self.page,
            condition: self.condition,
            notes: self.notes,
        })
    }
}

impl TaskDefinition {
    fn merge(mut self, delta: TaskDelta) -> Self {
        if let Some(title) = delta.title {
            self.title = title;
        }
        if let Some(description) = delta.description {
            self.description = description;
        }
        if let Some(level) = delta.level {
            self.level = level;
        }
        if let Some(questions) = delta.questions {
            self.questions = questions;
        }
        self
    }

    fn from_delta(practice_id: &str, task_id: &str, delta: TaskDelta) -> Result<Self, DefinitionError> {
        let level = delta.level.ok_or_else(|| DefinitionError::DeltaTaskWithoutLevel {
            practice: practice_id.to_string(),
            task: task_id.to_string(),
        })?;
        Ok(Self {
            title: delta.title.unwrap_or_default(),
            description: delta.description.unwrap_or_default(),
            level,
            questions: delta.questions.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
id: demo
name: Demo
questions:
  - id: web
    text: Is it a web app?
    na: true
condition: web
tasks: [triage, review]
taskDefinitions:
  triage:
    title: Triage
    description: A little lacking
    level: 4
    questions:
      - text: Do you triage?
  review:
    title: Review
    level: 1
    questions:
      - text: Do you review?
level0:
  short: Nothing
  long: Nothing at all
notes: upstream notes
"#;

    fn base() -> PracticeDefinition {
        serde_yaml::from_str(BASE).unwrap()
    }

    #[test]
    fn test_empty_delta_is_identity() {
        let merged = base().merge("demo", PracticeDelta::default()).unwrap();
        assert_eq!(merged, base());
    }

    #[test]
    fn test_delta_overrides_fields() {
        let delta: PracticeDelta = serde_yaml::from_str(
            r#"
notes: local modifications
level0:
  short: Local nothing
taskDefinitions:
  triage:
    description: Now complete
"#,
        )
        .unwrap();
        let merged = base().merge("demo", delta).unwrap();
        assert_eq!(merged.notes, "local modifications");
        assert_eq!(merged.level0.short, "Local nothing");
        assert_eq!(merged.level0.long, "Nothing at all");

        let triage = &merged.task_definitions["triage"];
        assert_eq!(triage.description, "Now complete");
        assert_eq!(triage.level, Level::L4);
        assert_eq!(triage.questions.len(), 1);
        assert_eq!(merged.name, "Demo");
    }

    #[test]
    fn test_explicit_empty_string_replaces() {
        let delta: PracticeDelta = serde_yaml::from_str("notes: \"\"\n").unwrap();
        let merged = base().merge("demo", delta).unwrap();
        assert_eq!(merged.notes, "");
    }

    #[test]
    fn test_delta_adds_and_drops_tasks() {
        let delta: PracticeDelta = serde_yaml::from_str(
            r#"
tasks: [triage, extra]
taskDefinitions:
  extra:
    title: Extra
    level: 1
    questions:
      - text: Extra?
"#,
        )
        .unwrap();
        let practice = base()
            .merge("demo", delta)
            .unwrap()
            .into_practice("demo")
            .unwrap();
        let ids: Vec<_> = practice.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["triage", "extra"]);
    }

    #[test]
    fn test_new_delta_task_needs_level() {
        let delta: PracticeDelta = serde_yaml::from_str(
            r#"
taskDefinitions:
  extra:
    title: Extra
"#,
        )
        .unwrap();
        let err = base().merge("demo", delta).unwrap_err();
        assert_eq!(
            err,
            DefinitionError::DeltaTaskWithoutLevel {
                practice: "demo".to_string(),
                task: "extra".to_string()
            }
        );
    }

    #[test]
    fn test_remove_flag() {
        let delta: PracticeDelta = serde_yaml::from_str("remove: true\n").unwrap();
        assert!(base().merge("demo", delta).unwrap().remove);
    }

    #[test]
    fn test_missing_task_body() {
        let mut def = base();
        def.tasks.push("ghost".to_string());
        let err = def.into_practice("demo").unwrap_err();
        assert!(matches!(err, DefinitionError::MissingTaskBody { ref task, .. } if task == "ghost"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let with_typo = BASE.replace("notes:", "nots:");
        assert!(serde_yaml::from_str::<PracticeDefinition>(&with_typo).is_err());
        assert!(serde_yaml::from_str::<PracticeDelta>("nots: x\n").is_err());
    }

    #[test]
    fn test_bad_level_rejected() {
        let bad = BASE.replace("level: 4", "level: 5");
        assert!(serde_yaml::from_str::<PracticeDefinition>(&bad).is_err());
    }
}
