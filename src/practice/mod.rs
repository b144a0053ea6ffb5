//! Practice Definition Model
//!
//! A practice is a named security capability. It is broken into tasks pinned
//! to maturity levels 1-4, and optionally gated by qualifying questions whose
//! answers feed the practice's `condition`.
//!
//! Practices are assembled once by the [`PracticeLoader`] and are immutable
//! afterwards; a published version is always a complete new set.

pub mod constraints;
pub mod definition;
pub mod loader;

pub use constraints::check_constraints;
pub use definition::{Level0Delta, PracticeDefinition, PracticeDelta, TaskDefinition, TaskDelta};
pub use loader::{assemble_practice, load, PracticeLoader, PracticeSource};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Maturity level a task is pinned to.
///
/// Levels are populated in the order 4, 1, 2, 3: level 4 is the foundation
/// every practice has, and levels 1-3 must be contiguous from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Level {
    L1 = 1,
    L2 = 2,
    L3 = 3,
    L4 = 4,
}

impl Level {
    /// Ascending order
    pub const ALL: [Level; 4] = [Level::L1, Level::L2, Level::L3, Level::L4];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Zero-based slot for fixed-size per-level tables
    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Level::L1),
            2 => Ok(Level::L2),
            3 => Ok(Level::L3),
            4 => Ok(Level::L4),
            other => Err(format!("task level must be between 1 and 4, got {}", other)),
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.as_u8()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// A yes/no/N-A prompt. Used both for qualifying questions and task questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Question {
    /// Unique within its scope. May be omitted on a solo question, in which
    /// case it adopts the owner's ID during constraint checking.
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default, rename = "na")]
    pub allows_na: bool,
    /// Informational only
    #[serde(default, rename = "other")]
    pub allows_other: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub level: Level,
    pub questions: Vec<Question>,
}

/// Describes a project that has not met level 1 for the practice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Level0 {
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub long: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Practice {
    pub id: String,
    pub name: String,
    /// Qualifying questions; they decide whether the practice applies
    pub questions: Vec<Question>,
    pub tasks: Vec<Task>,
    pub level0: Level0,
    /// Practice page URL
    #[serde(default)]
    pub page: String,
    /// How to interpret the qualifying questions, see [`crate::condition`]
    #[serde(default)]
    pub condition: String,
    #[serde(default)]
    pub notes: String,
}

impl Practice {
    pub fn has_qualifying_questions(&self) -> bool {
        !self.questions.is_empty()
    }

    /// The task with the given ID
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks grouped by level, keeping definition order within a level
    pub fn tasks_by_level(&self) -> BTreeMap<Level, Vec<&Task>> {
        let mut levels: BTreeMap<Level, Vec<&Task>> = BTreeMap::new();
        for task in &self.tasks {
            levels.entry(task.level).or_default().push(task);
        }
        levels
    }

    pub fn levels_present(&self) -> BTreeSet<Level> {
        self.tasks.iter().map(|t| t.level).collect()
    }
}
