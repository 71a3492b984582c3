//! Raw catalog payload.
//!
//! Mirrors what a caller (typically a web layer) hands over: sections
//! grouped by level and year, a teacher pool and a room list. Field names
//! accept both the short legacy spelling (`coef`, `subjects`) and the
//! descriptive one (`weeklyCount`, `qualifiedSubjects`).

use serde::{Deserialize, Serialize};

use crate::models::Level;

/// Everything needed to build a [`Catalog`](super::Catalog).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_school: Option<LevelInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_school: Option<LevelInput>,
    #[serde(default)]
    pub teachers: Vec<TeacherInput>,
    #[serde(default)]
    pub rooms: Vec<RoomInput>,
}

/// Sections of one level, by year.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelInput {
    #[serde(default)]
    pub years: Vec<YearInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearInput {
    pub year: u32,
    #[serde(default)]
    pub sections: Vec<SectionInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionInput {
    #[serde(alias = "name")]
    pub section: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    #[serde(default)]
    pub subjects: Vec<SubjectInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectInput {
    pub name: String,
    #[serde(alias = "coef", alias = "weekly_count")]
    pub weekly_count: u32,
    /// Explicit block flag; falls back to the configured block subjects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_block: Option<bool>,
    /// Room type for the pooled policy; defaults to `general`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherInput {
    pub name: String,
    #[serde(default, alias = "subjects")]
    pub qualified_subjects: Vec<SubjectRef>,
    /// Explicit level pool; falls back to the configured name prefixes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levels: Option<Vec<Level>>,
}

/// A qualification, either `"Math"` or `{"name": "Math"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubjectRef {
    Name(String),
    Named { name: String },
}

impl SubjectRef {
    pub fn name(&self) -> &str {
        match self {
            SubjectRef::Name(name) | SubjectRef::Named { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInput {
    pub name: String,
    #[serde(rename = "type", default = "default_room_type")]
    pub room_type: String,
}

fn default_room_type() -> String {
    "general".to_string()
}

impl CatalogInput {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a section under `level` / `year`, creating the year if needed.
    pub fn with_section(mut self, level: Level, year: u32, section: SectionInput) -> Self {
        let level_input = match level {
            Level::Middle => self.middle_school.get_or_insert_with(LevelInput::default),
            Level::High => self.high_school.get_or_insert_with(LevelInput::default),
        };
        match level_input.years.iter_mut().find(|y| y.year == year) {
            Some(y) => y.sections.push(section),
            None => level_input.years.push(YearInput {
                year,
                sections: vec![section],
            }),
        }
        self
    }

    pub fn with_teacher(mut self, teacher: TeacherInput) -> Self {
        self.teachers.push(teacher);
        self
    }

    pub fn with_room(mut self, room: RoomInput) -> Self {
        self.rooms.push(room);
        self
    }

    /// Level payloads in output order.
    pub fn levels(&self) -> impl Iterator<Item = (Level, &LevelInput)> {
        [
            (Level::Middle, self.middle_school.as_ref()),
            (Level::High, self.high_school.as_ref()),
        ]
        .into_iter()
        .filter_map(|(level, input)| input.map(|i| (level, i)))
    }
}

impl SectionInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            section: name.into(),
            stream: None,
            subjects: Vec::new(),
        }
    }

    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// Adds a subject taught `weekly_count` times.
    pub fn with_subject(mut self, name: impl Into<String>, weekly_count: u32) -> Self {
        self.subjects.push(SubjectInput::new(name, weekly_count));
        self
    }

    pub fn with_subject_input(mut self, subject: SubjectInput) -> Self {
        self.subjects.push(subject);
        self
    }
}

impl SubjectInput {
    pub fn new(name: impl Into<String>, weekly_count: u32) -> Self {
        Self {
            name: name.into(),
            weekly_count,
            is_block: None,
            room_type: None,
        }
    }

    pub fn with_block(mut self, is_block: bool) -> Self {
        self.is_block = Some(is_block);
        self
    }

    pub fn with_room_type(mut self, room_type: impl Into<String>) -> Self {
        self.room_type = Some(room_type.into());
        self
    }
}

impl TeacherInput {
    pub fn new<S: AsRef<str>>(name: impl Into<String>, subjects: &[S]) -> Self {
        Self {
            name: name.into(),
            qualified_subjects: subjects
                .iter()
                .map(|s| SubjectRef::Name(s.as_ref().to_string()))
                .collect(),
            levels: None,
        }
    }

    pub fn with_levels(mut self, levels: Vec<Level>) -> Self {
        self.levels = Some(levels);
        self
    }
}

impl RoomInput {
    pub fn new(name: impl Into<String>, room_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            room_type: room_type.into(),
        }
    }
}
