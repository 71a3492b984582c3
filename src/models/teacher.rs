//! Teacher model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Level, SubjectId};

/// Dense teacher identifier (index into the catalog's teacher list).
pub type TeacherId = usize;

/// A teacher with qualifications and the levels they serve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Catalog identifier.
    pub id: TeacherId,
    /// Name as supplied by the caller.
    pub name: String,
    /// Subjects this teacher may teach.
    pub subjects: BTreeSet<SubjectId>,
    /// Levels this teacher serves. Empty = every level.
    pub levels: Vec<Level>,
}

impl Teacher {
    /// Creates a teacher with no qualifications.
    pub fn new(id: TeacherId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            subjects: BTreeSet::new(),
            levels: Vec::new(),
        }
    }

    /// Adds a qualification.
    pub fn with_subject(mut self, subject: SubjectId) -> Self {
        self.subjects.insert(subject);
        self
    }

    /// Restricts the teacher to a level.
    pub fn with_level(mut self, level: Level) -> Self {
        if !self.levels.contains(&level) {
            self.levels.push(level);
        }
        self
    }

    #[inline]
    pub fn is_qualified(&self, subject: SubjectId) -> bool {
        self.subjects.contains(&subject)
    }

    /// Whether the teacher belongs to the pool of `level`.
    #[inline]
    pub fn serves(&self, level: Level) -> bool {
        self.levels.is_empty() || self.levels.contains(&level)
    }
}
