//! Catalog: the validated, interned view of one scheduling request.
//!
//! Built once per request from a [`CatalogInput`]. Subject names are
//! normalized and interned, teachers are assigned to level pools, rooms
//! are resolved for the dedicated policy, and every condition that would
//! make search pointless is rejected up front. Subjects taught zero times
//! a week are dropped, and a subject listed twice for one section takes
//! the sum of both counts.
//!
//! # Fail-fast checks
//! 1. Structural validation (duplicate and empty names)
//! 2. Week grid and block pairs
//! 3. Dedicated room resolvable (`prefix + section name`)
//! 4. Every subject has a qualified teacher in the section's pool
//! 5. Pooled policy: a room of every requested type exists
//! 6. Every section fits into one week

mod input;

pub use input::{
    CatalogInput, LevelInput, RoomInput, SectionInput, SubjectInput, SubjectRef, TeacherInput,
    YearInput,
};

use std::collections::HashMap;

use tracing::debug;

use crate::config::EngineConfig;
use crate::error::ConfigurationError;
use crate::models::{
    normalize_name, Level, Room, RoomId, RoomPolicy, RoomType, Section, SectionId, SectionSubject,
    Subject, SubjectId, Teacher, TeacherId, WeekGrid,
};
use crate::validation::validate_input;

/// Read-only view of sections, subjects, teachers, rooms and the grid.
#[derive(Debug, Clone)]
pub struct Catalog {
    grid: WeekGrid,
    policy: RoomPolicy,
    subjects: Vec<Subject>,
    subject_index: HashMap<String, SubjectId>,
    teachers: Vec<Teacher>,
    rooms: Vec<Room>,
    sections: Vec<Section>,
}

impl Catalog {
    /// Builds and validates a catalog.
    ///
    /// # Errors
    /// Any [`ConfigurationError`]; the first problem found aborts the build.
    pub fn build(input: &CatalogInput, config: &EngineConfig) -> Result<Self, ConfigurationError> {
        validate_input(input).map_err(ConfigurationError::Invalid)?;
        let grid = config.grid.to_grid()?;

        let mut catalog = Self {
            grid,
            policy: config.room_policy,
            subjects: Vec::new(),
            subject_index: HashMap::new(),
            teachers: Vec::new(),
            rooms: Vec::new(),
            sections: Vec::new(),
        };

        for (_, level_input) in input.levels() {
            for year in &level_input.years {
                for section in &year.sections {
                    for subject in &section.subjects {
                        catalog.intern(&subject.name);
                    }
                }
            }
        }

        for (id, t) in input.teachers.iter().enumerate() {
            let mut teacher = Teacher::new(id, t.name.trim());
            for subject in &t.qualified_subjects {
                let sid = catalog.intern(subject.name());
                teacher = teacher.with_subject(sid);
            }
            for level in teacher_levels(t, config) {
                teacher = teacher.with_level(level);
            }
            catalog.teachers.push(teacher);
        }

        catalog.rooms = input
            .rooms
            .iter()
            .enumerate()
            .map(|(id, r)| Room::new(id, r.name.trim(), RoomType::parse(&r.room_type)))
            .collect();

        let block_keys: Vec<String> = config.block_subjects.iter().map(|s| normalize_name(s)).collect();
        for (level, level_input) in input.levels() {
            for year in &level_input.years {
                for s in &year.sections {
                    let id = catalog.sections.len();
                    let mut section = Section::new(id, s.section.trim(), level, year.year);
                    if let Some(stream) = &s.stream {
                        section = section.with_stream(stream.trim());
                    }
                    for subject in &s.subjects {
                        if subject.weekly_count == 0 {
                            continue;
                        }
                        let sid = catalog.intern(&subject.name);
                        // A repeated subject adds to the first entry's count.
                        if let Some(existing) = section.subjects.iter_mut().find(|r| r.subject == sid) {
                            existing.coefficient += subject.weekly_count;
                            continue;
                        }
                        let is_block = subject
                            .is_block
                            .unwrap_or_else(|| block_keys.contains(&catalog.subjects[sid].key));
                        let mut requirement = SectionSubject::new(sid, subject.weekly_count)
                            .with_room_type(RoomType::parse(
                                subject.room_type.as_deref().unwrap_or("general"),
                            ));
                        if is_block {
                            requirement = requirement.as_block();
                        }
                        section = section.with_subject(requirement);
                    }
                    catalog.sections.push(section);
                }
            }
        }

        if catalog.policy == RoomPolicy::Dedicated {
            catalog.resolve_dedicated_rooms(config)?;
        }
        catalog.check_qualifications()?;
        if catalog.policy == RoomPolicy::Pooled {
            catalog.check_room_types()?;
        }
        catalog.check_capacity()?;

        debug!(
            sections = catalog.sections.len(),
            teachers = catalog.teachers.len(),
            rooms = catalog.rooms.len(),
            subjects = catalog.subjects.len(),
            "catalog built"
        );
        Ok(catalog)
    }

    fn intern(&mut self, name: &str) -> SubjectId {
        let key = normalize_name(name);
        if let Some(&id) = self.subject_index.get(&key) {
            return id;
        }
        let id = self.subjects.len();
        self.subjects.push(Subject::new(id, name));
        self.subject_index.insert(key, id);
        id
    }

    fn resolve_dedicated_rooms(&mut self, config: &EngineConfig) -> Result<(), ConfigurationError> {
        let by_name: HashMap<&str, RoomId> =
            self.rooms.iter().map(|r| (r.name.as_str(), r.id)).collect();
        for section in &mut self.sections {
            let prefix = match section.level {
                Level::Middle => &config.naming.middle_room_prefix,
                Level::High => &config.naming.high_room_prefix,
            };
            let expected = format!("{prefix}{}", section.name);
            match by_name.get(expected.as_str()) {
                Some(&room) => section.room = Some(room),
                None => {
                    return Err(ConfigurationError::UnresolvedRoom {
                        section: section.name.clone(),
                        expected,
                    })
                }
            }
        }
        Ok(())
    }

    fn check_qualifications(&self) -> Result<(), ConfigurationError> {
        for section in &self.sections {
            for req in &section.subjects {
                if self.teachers_for(req.subject, section.level).is_empty() {
                    return Err(ConfigurationError::UnqualifiedSubject {
                        section: section.name.clone(),
                        subject: self.subjects[req.subject].name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_room_types(&self) -> Result<(), ConfigurationError> {
        for section in &self.sections {
            for req in &section.subjects {
                if !self.rooms.iter().any(|r| r.is_of_type(&req.room_type)) {
                    return Err(ConfigurationError::MissingRoomType {
                        section: section.name.clone(),
                        subject: self.subjects[req.subject].name.clone(),
                        room_type: req.room_type.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// A section fits if its blocks fit the legal pairs and all its slots
    /// fit the week. Pairs are disjoint, so these two bounds suffice.
    fn check_capacity(&self) -> Result<(), ConfigurationError> {
        let days = self.grid.day_count() as u32;
        let cells = self.grid.cell_count() as u32;
        let pair_starts = days * self.grid.block_pairs().len() as u32;
        for section in &self.sections {
            let blocks = section.block_count();
            if blocks > pair_starts {
                return Err(ConfigurationError::CapacityExceeded {
                    section: section.name.clone(),
                    required: blocks * 2,
                    available: pair_starts * 2,
                });
            }
            let required = section.required_cells();
            if required > cells {
                return Err(ConfigurationError::CapacityExceeded {
                    section: section.name.clone(),
                    required,
                    available: cells,
                });
            }
        }
        Ok(())
    }

    pub fn grid(&self) -> &WeekGrid {
        &self.grid
    }

    pub fn room_policy(&self) -> RoomPolicy {
        self.policy
    }

    pub fn subjects(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn subject(&self, id: SubjectId) -> &Subject {
        &self.subjects[id]
    }

    pub fn teacher(&self, id: TeacherId) -> &Teacher {
        &self.teachers[id]
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id]
    }

    pub fn section(&self, id: SectionId) -> &Section {
        &self.sections[id]
    }

    /// Looks up a subject by name (case-insensitive, trimmed).
    pub fn subject_id(&self, name: &str) -> Option<SubjectId> {
        self.subject_index.get(&normalize_name(name)).copied()
    }

    /// Looks up a section by exact name.
    pub fn section_by_name(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name.trim())
    }

    /// Teachers of the `level` pool qualified for `subject`.
    pub fn teachers_for(&self, subject: SubjectId, level: Level) -> Vec<TeacherId> {
        self.teachers
            .iter()
            .filter(|t| t.serves(level) && t.is_qualified(subject))
            .map(|t| t.id)
            .collect()
    }

    /// Candidate rooms for a session of `section` requesting `room_type`.
    ///
    /// Dedicated policy: the section's own room. Pooled: every room of the
    /// requested type.
    pub fn rooms_for(&self, section: SectionId, room_type: &RoomType) -> Vec<RoomId> {
        match self.policy {
            RoomPolicy::Dedicated => self.sections[section].room.into_iter().collect(),
            RoomPolicy::Pooled => self
                .rooms
                .iter()
                .filter(|r| r.is_of_type(room_type))
                .map(|r| r.id)
                .collect(),
        }
    }
}

/// Explicit levels win; otherwise the name prefix decides; otherwise the
/// teacher serves every level.
fn teacher_levels(teacher: &TeacherInput, config: &EngineConfig) -> Vec<Level> {
    if let Some(levels) = &teacher.levels {
        return levels.clone();
    }
    let name = teacher.name.trim();
    let naming = &config.naming;
    if !naming.middle_teacher_prefix.is_empty() && name.starts_with(&naming.middle_teacher_prefix) {
        vec![Level::Middle]
    } else if !naming.high_teacher_prefix.is_empty() && name.starts_with(&naming.high_teacher_prefix) {
        vec![Level::High]
    } else {
        Vec::new()
    }
}
