//! Schedule (solution) model.
//!
//! A schedule maps every session of a scope to a placement: a start cell,
//! a span, a teacher (or the sentinel) and a room. It may carry invariant
//! violations when it was produced under an exhausted search budget.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Cell, RoomId, SessionId, TeacherId};

/// Display value of the sentinel teacher.
pub const SENTINEL_TEACHER: &str = "No teacher available";

/// The teacher resolved for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeacherRef {
    /// A qualified teacher from the catalog.
    Assigned(TeacherId),
    /// No teacher could be placed; always a legal value.
    Unassigned,
}

impl TeacherRef {
    #[inline]
    pub fn id(&self) -> Option<TeacherId> {
        match self {
            TeacherRef::Assigned(id) => Some(*id),
            TeacherRef::Unassigned => None,
        }
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, TeacherRef::Unassigned)
    }
}

/// Where, when and by whom a session is taught.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// First occupied cell.
    pub start: Cell,
    /// Number of consecutive slots (2 for blocks).
    pub span: u8,
    pub teacher: TeacherRef,
    pub room: RoomId,
}

impl Placement {
    /// Creates a new placement.
    pub fn new(start: Cell, span: u8, teacher: TeacherRef, room: RoomId) -> Self {
        Self {
            start,
            span,
            teacher,
            room,
        }
    }

    /// Occupied cells; for a block the second is the dependent half-slot.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.span).map(move |offset| self.start.shifted(offset))
    }

    /// Whether two placements share at least one cell.
    pub fn overlaps(&self, other: &Placement) -> bool {
        self.start.day == other.start.day
            && self.start.slot < other.start.slot + other.span
            && other.start.slot < self.start.slot + self.span
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.teacher.is_sentinel()
    }
}

/// A session-placement pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub session: SessionId,
    pub placement: Placement,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(session: SessionId, placement: Placement) -> Self {
        Self { session, placement }
    }
}

/// A complete schedule for one scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// One entry per session.
    pub assignments: Vec<Assignment>,
    /// Invariant violations found by verification.
    pub violations: Vec<Violation>,
}

/// An invariant violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub violation_type: ViolationType,
    /// Offending session.
    pub session: SessionId,
    /// Human-readable description.
    pub message: String,
}

/// Classification of invariant violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Session has no assignment, or more than one.
    Unassigned,
    /// Teacher double-booked.
    TeacherClash,
    /// Room double-booked.
    RoomClash,
    /// Section double-booked.
    SectionClash,
    /// Block not on a legal pair, or single session off the grid.
    IllegalSlot,
    /// Teacher not qualified for the subject.
    Unqualified,
    /// Session count per (section, subject) differs from the coefficient.
    CoefficientMismatch,
}

impl Violation {
    /// Creates a violation.
    pub fn new(violation_type: ViolationType, session: SessionId, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            session,
            message: message.into(),
        }
    }

    pub fn teacher_clash(session: SessionId, message: impl Into<String>) -> Self {
        Self::new(ViolationType::TeacherClash, session, message)
    }

    pub fn room_clash(session: SessionId, message: impl Into<String>) -> Self {
        Self::new(ViolationType::RoomClash, session, message)
    }

    pub fn section_clash(session: SessionId, message: impl Into<String>) -> Self {
        Self::new(ViolationType::SectionClash, session, message)
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the schedule has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Finds the assignment for a session.
    pub fn assignment_for_session(&self, session: SessionId) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.session == session)
    }

    /// Returns all assignments hosted by a room.
    pub fn assignments_for_room(&self, room: RoomId) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.placement.room == room)
            .collect()
    }

    /// Number of sessions resolved to the sentinel teacher.
    pub fn sentinel_count(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| a.placement.is_sentinel())
            .count()
    }

    /// Occupied slots per teacher.
    pub fn teacher_loads(&self) -> HashMap<TeacherId, u32> {
        let mut loads: HashMap<TeacherId, u32> = HashMap::new();
        for a in &self.assignments {
            if let Some(t) = a.placement.teacher.id() {
                *loads.entry(t).or_insert(0) += u32::from(a.placement.span);
            }
        }
        loads
    }

    /// Fraction of `cells_per_week` a room is occupied.
    ///
    /// Returns `None` if `cells_per_week` is zero.
    pub fn room_utilization(&self, room: RoomId, cells_per_week: usize) -> Option<f64> {
        if cells_per_week == 0 {
            return None;
        }
        let busy: u32 = self
            .assignments_for_room(room)
            .iter()
            .map(|a| u32::from(a.placement.span))
            .sum();
        Some(f64::from(busy) / cells_per_week as f64)
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(Assignment::new(
            0,
            Placement::new(Cell::new(0, 1), 2, TeacherRef::Assigned(0), 0),
        ));
        s.add_assignment(Assignment::new(
            1,
            Placement::new(Cell::new(0, 3), 1, TeacherRef::Assigned(0), 0),
        ));
        s.add_assignment(Assignment::new(
            2,
            Placement::new(Cell::new(1, 1), 1, TeacherRef::Unassigned, 1),
        ));
        s
    }

    #[test]
    fn test_placement_cells() {
        let p = Placement::new(Cell::new(2, 5), 2, TeacherRef::Unassigned, 0);
        let cells: Vec<Cell> = p.cells().collect();
        assert_eq!(cells, vec![Cell::new(2, 5), Cell::new(2, 6)]);
    }

    #[test]
    fn test_placement_overlap() {
        let block = Placement::new(Cell::new(0, 1), 2, TeacherRef::Assigned(0), 0);
        let second_half = Placement::new(Cell::new(0, 2), 1, TeacherRef::Assigned(1), 1);
        let after = Placement::new(Cell::new(0, 3), 1, TeacherRef::Assigned(1), 1);
        let other_day = Placement::new(Cell::new(1, 1), 1, TeacherRef::Assigned(1), 1);
        assert!(block.overlaps(&second_half));
        assert!(second_half.overlaps(&block));
        assert!(!block.overlaps(&after));
        assert!(!block.overlaps(&other_day));
    }

    #[test]
    fn test_sentinel_count() {
        let s = sample_schedule();
        assert_eq!(s.sentinel_count(), 1);
        assert_eq!(s.assignment_count(), 3);
    }

    #[test]
    fn test_lookups() {
        let s = sample_schedule();
        assert_eq!(s.assignment_for_session(1).map(|a| a.placement.start.slot), Some(3));
        assert!(s.assignment_for_session(9).is_none());
        assert_eq!(s.assignments_for_room(1).len(), 1);
    }

    #[test]
    fn test_teacher_loads_count_block_slots() {
        let s = sample_schedule();
        assert_eq!(s.teacher_loads().get(&0), Some(&3));
    }

    #[test]
    fn test_room_utilization() {
        let s = sample_schedule();
        let util = s.room_utilization(0, 10).unwrap();
        assert!((util - 0.3).abs() < 1e-10);
        assert!(s.room_utilization(0, 0).is_none());
    }

    #[test]
    fn test_validity() {
        let mut s = sample_schedule();
        assert!(s.is_valid());
        s.add_violation(Violation::section_clash(2, "overlaps session 0"));
        assert!(!s.is_valid());
        assert_eq!(s.violations[0].violation_type, ViolationType::SectionClash);
    }
}
