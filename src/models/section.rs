//! Section (class group) model.
//!
//! A section belongs to a level and a year, optionally to a stream, and
//! lists the subjects it takes each week.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{RoomId, RoomType, SubjectId};

/// Dense section identifier (index into the catalog's section list).
pub type SectionId = usize;

/// School level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[serde(alias = "middle_school")]
    Middle,
    #[serde(alias = "high_school")]
    High,
}

impl Level {
    /// Both levels, in output order.
    pub const ALL: [Level; 2] = [Level::Middle, Level::High];

    /// Key used in the caller's payload (`middle_school` / `high_school`).
    pub fn payload_key(&self) -> &'static str {
        match self {
            Level::Middle => "middle_school",
            Level::High => "high_school",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.payload_key())
    }
}

/// One subject as taken by a specific section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSubject {
    /// Interned subject.
    pub subject: SubjectId,
    /// Weekly session count.
    pub coefficient: u32,
    /// Whether each session occupies a legal two-slot block.
    pub is_block: bool,
    /// Room type requested under the pooled policy.
    pub room_type: RoomType,
}

impl SectionSubject {
    /// Creates a single-slot subject requirement in a general room.
    pub fn new(subject: SubjectId, coefficient: u32) -> Self {
        Self {
            subject,
            coefficient,
            is_block: false,
            room_type: RoomType::General,
        }
    }

    /// Marks the subject as a block subject.
    pub fn as_block(mut self) -> Self {
        self.is_block = true;
        self
    }

    /// Sets the requested room type.
    pub fn with_room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = room_type;
        self
    }

    /// Slots occupied by one session.
    #[inline]
    pub fn span(&self) -> u8 {
        if self.is_block {
            2
        } else {
            1
        }
    }
}

/// A section with its weekly subject list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Catalog identifier.
    pub id: SectionId,
    /// Section name, e.g. `"1M2"`.
    pub name: String,
    pub level: Level,
    pub year: u32,
    /// Stream tag (high school only in practice).
    pub stream: Option<String>,
    /// Subjects in caller order.
    pub subjects: Vec<SectionSubject>,
    /// Dedicated room, resolved under the dedicated policy.
    pub room: Option<RoomId>,
}

impl Section {
    /// Creates a section with no subjects.
    pub fn new(id: SectionId, name: impl Into<String>, level: Level, year: u32) -> Self {
        Self {
            id,
            name: name.into(),
            level,
            year,
            stream: None,
            subjects: Vec::new(),
            room: None,
        }
    }

    /// Sets the stream tag.
    pub fn with_stream(mut self, stream: impl Into<String>) -> Self {
        self.stream = Some(stream.into());
        self
    }

    /// Adds a subject requirement.
    pub fn with_subject(mut self, subject: SectionSubject) -> Self {
        self.subjects.push(subject);
        self
    }

    /// Total sessions per week.
    pub fn session_count(&self) -> u32 {
        self.subjects.iter().map(|s| s.coefficient).sum()
    }

    /// Block sessions per week.
    pub fn block_count(&self) -> u32 {
        self.subjects
            .iter()
            .filter(|s| s.is_block)
            .map(|s| s.coefficient)
            .sum()
    }

    /// Slots occupied per week.
    pub fn required_cells(&self) -> u32 {
        self.subjects
            .iter()
            .map(|s| s.coefficient * u32::from(s.span()))
            .sum()
    }

    /// The requirement for `subject`, if the section takes it.
    pub fn requirement(&self, subject: SubjectId) -> Option<&SectionSubject> {
        self.subjects.iter().find(|s| s.subject == subject)
    }
}
