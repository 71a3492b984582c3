//! Input validation and schedule verification.
//!
//! [`validate_input`] checks the structural integrity of a catalog payload
//! before anything is interned. Detects:
//! - Duplicate section, teacher and room names
//! - Empty names
//!
//! [`verify_schedule`] checks a produced schedule against the timetable
//! invariants: one placement per session, no teacher/room/section double
//! booking, legal block pairs, qualified teachers, and session counts
//! matching the weekly coefficients.

use std::collections::{HashMap, HashSet};

use crate::catalog::{Catalog, CatalogInput};
use crate::models::{
    normalize_name, Cell, RoomPolicy, Schedule, SectionId, Session, SubjectId, TeacherRef,
    Violation, ViolationType,
};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two sections, teachers or rooms share a name.
    DuplicateName,
    /// A section, subject, teacher or room has a blank name.
    EmptyName,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a catalog payload.
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(input: &CatalogInput) -> ValidationResult {
    let mut errors = Vec::new();

    let mut section_names = HashSet::new();
    for (level, level_input) in input.levels() {
        for year in &level_input.years {
            for section in &year.sections {
                let name = section.section.trim();
                if name.is_empty() {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::EmptyName,
                        format!("Section with empty name in {level} year {}", year.year),
                    ));
                } else if !section_names.insert(name) {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::DuplicateName,
                        format!("Duplicate section name: {name}"),
                    ));
                }

                for subject in &section.subjects {
                    if normalize_name(&subject.name).is_empty() {
                        errors.push(ValidationError::new(
                            ValidationErrorKind::EmptyName,
                            format!("Section '{name}' has a subject with empty name"),
                        ));
                    }
                }
            }
        }
    }

    let mut teacher_names = HashSet::new();
    for t in &input.teachers {
        let name = t.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyName,
                "Teacher with empty name",
            ));
        } else if !teacher_names.insert(name) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate teacher name: {name}"),
            ));
        }
    }

    let mut room_names = HashSet::new();
    for r in &input.rooms {
        let name = r.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyName,
                "Room with empty name",
            ));
        } else if !room_names.insert(name) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateName,
                format!("Duplicate room name: {name}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Checks a schedule against the timetable invariants.
///
/// Sentinel placements are exempt from teacher exclusivity but still
/// occupy their section and room.
pub fn verify_schedule(catalog: &Catalog, sessions: &[Session], schedule: &Schedule) -> Vec<Violation> {
    let mut violations = Vec::new();
    let grid = catalog.grid();

    let mut placed: HashMap<usize, usize> = HashMap::new();
    for a in &schedule.assignments {
        *placed.entry(a.session).or_insert(0) += 1;
    }
    for session in sessions {
        match placed.get(&session.id).copied().unwrap_or(0) {
            1 => {}
            n => violations.push(Violation::new(
                ViolationType::Unassigned,
                session.id,
                format!("session {} has {n} assignments", session.id),
            )),
        }
    }

    let by_id: HashMap<usize, &Session> = sessions.iter().map(|s| (s.id, s)).collect();
    let mut section_cells: HashMap<(SectionId, Cell), usize> = HashMap::new();
    let mut teacher_cells: HashMap<(usize, Cell), usize> = HashMap::new();
    let mut room_cells: HashMap<(usize, Cell), usize> = HashMap::new();
    let mut counts: HashMap<(SectionId, SubjectId), u32> = HashMap::new();

    for a in &schedule.assignments {
        let Some(session) = by_id.get(&a.session) else {
            continue;
        };
        let p = &a.placement;
        *counts.entry((session.section, session.subject)).or_insert(0) += 1;

        if p.span != session.span() {
            violations.push(Violation::new(
                ViolationType::IllegalSlot,
                session.id,
                format!("session {} spans {} slots, expected {}", session.id, p.span, session.span()),
            ));
        }
        let legal = if session.is_block {
            grid.pair_starting_at(p.start.slot).is_some()
        } else {
            grid.slot(p.start.slot).is_some()
        };
        if !legal || p.start.day >= grid.day_count() {
            violations.push(Violation::new(
                ViolationType::IllegalSlot,
                session.id,
                format!(
                    "session {} placed at day {} slot {}",
                    session.id, p.start.day, p.start.slot
                ),
            ));
        }

        if let TeacherRef::Assigned(t) = p.teacher {
            if !catalog.teacher(t).is_qualified(session.subject) {
                violations.push(Violation::new(
                    ViolationType::Unqualified,
                    session.id,
                    format!(
                        "{} is not qualified for {}",
                        catalog.teacher(t).name,
                        catalog.subject(session.subject).name
                    ),
                ));
            }
        }

        for cell in p.cells() {
            if let Some(other) = section_cells.insert((session.section, cell), session.id) {
                violations.push(Violation::section_clash(
                    session.id,
                    format!("section {} double-booked with session {other}", catalog.section(session.section).name),
                ));
            }
            if let TeacherRef::Assigned(t) = p.teacher {
                if let Some(other) = teacher_cells.insert((t, cell), session.id) {
                    violations.push(Violation::teacher_clash(
                        session.id,
                        format!("{} double-booked with session {other}", catalog.teacher(t).name),
                    ));
                }
            }
            if catalog.room_policy() == RoomPolicy::Pooled {
                if let Some(other) = room_cells.insert((p.room, cell), session.id) {
                    violations.push(Violation::room_clash(
                        session.id,
                        format!("{} double-booked with session {other}", catalog.room(p.room).name),
                    ));
                }
            }
        }
    }

    let sections: HashSet<SectionId> = sessions.iter().map(|s| s.section).collect();
    for &sid in &sections {
        let section = catalog.section(sid);
        for req in &section.subjects {
            let got = counts.get(&(sid, req.subject)).copied().unwrap_or(0);
            if got != req.coefficient {
                let session = sessions
                    .iter()
                    .find(|s| s.section == sid && s.subject == req.subject)
                    .map_or(0, |s| s.id);
                violations.push(Violation::new(
                    ViolationType::CoefficientMismatch,
                    session,
                    format!(
                        "section {} has {got} sessions of {}, expected {}",
                        section.name,
                        catalog.subject(req.subject).name,
                        req.coefficient
                    ),
                ));
            }
        }
    }

    violations
}
