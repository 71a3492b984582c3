//! Occupancy grids: teacher, room and section × day × slot.

use crate::catalog::Catalog;
use crate::models::{Cell, Placement, RoomId, RoomPolicy, SectionId, TeacherId, TeacherRef};

/// Sizes of the grids, fixed per catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OccupancyShape {
    pub(crate) slots: usize,
    pub(crate) cells: usize,
    pub(crate) sections: usize,
    pub(crate) teachers: usize,
    pub(crate) rooms: usize,
    pub(crate) pooled: bool,
}

impl OccupancyShape {
    pub(crate) fn of(catalog: &Catalog) -> Self {
        let grid = catalog.grid();
        Self {
            slots: grid.slot_count(),
            cells: grid.cell_count(),
            sections: catalog.sections().len(),
            teachers: catalog.teachers().len(),
            rooms: catalog.rooms().len(),
            pooled: catalog.room_policy() == RoomPolicy::Pooled,
        }
    }
}

/// Busy cells of every teacher, room and section.
///
/// Rooms are only tracked under the pooled policy; a dedicated room is
/// already covered by its section.
#[derive(Debug, Clone)]
pub(crate) struct Occupancy {
    slots: usize,
    cells: usize,
    pooled: bool,
    section: Vec<bool>,
    teacher: Vec<bool>,
    room: Vec<bool>,
    load: Vec<u32>,
}

impl Occupancy {
    pub(crate) fn new(shape: &OccupancyShape) -> Self {
        let cells = shape.cells;
        let rooms = if shape.pooled { shape.rooms } else { 0 };
        Self {
            slots: shape.slots,
            cells,
            pooled: shape.pooled,
            section: vec![false; shape.sections * cells],
            teacher: vec![false; shape.teachers * cells],
            room: vec![false; rooms * cells],
            load: vec![0; shape.teachers],
        }
    }

    #[cfg(test)]
    pub(crate) fn for_catalog(catalog: &Catalog) -> Self {
        Self::new(&OccupancyShape::of(catalog))
    }

    #[inline]
    fn offset(&self, start: Cell, step: u8) -> usize {
        start.day * self.slots + usize::from(start.slot + step) - 1
    }

    pub(crate) fn section_free(&self, section: SectionId, start: Cell, span: u8) -> bool {
        let base = section * self.cells;
        (0..span).all(|k| !self.section[base + self.offset(start, k)])
    }

    pub(crate) fn teacher_free(&self, teacher: TeacherId, start: Cell, span: u8) -> bool {
        let base = teacher * self.cells;
        (0..span).all(|k| !self.teacher[base + self.offset(start, k)])
    }

    pub(crate) fn room_free(&self, room: RoomId, start: Cell, span: u8) -> bool {
        if !self.pooled {
            return true;
        }
        let base = room * self.cells;
        (0..span).all(|k| !self.room[base + self.offset(start, k)])
    }

    #[cfg(test)]
    pub(crate) fn can_place(&self, section: SectionId, p: &Placement) -> bool {
        self.section_free(section, p.start, p.span)
            && self.room_free(p.room, p.start, p.span)
            && match p.teacher {
                TeacherRef::Assigned(t) => self.teacher_free(t, p.start, p.span),
                TeacherRef::Unassigned => true,
            }
    }

    pub(crate) fn occupy(&mut self, section: SectionId, p: &Placement) {
        self.mark(section, p, true);
    }

    pub(crate) fn release(&mut self, section: SectionId, p: &Placement) {
        self.mark(section, p, false);
    }

    fn mark(&mut self, section: SectionId, p: &Placement, busy: bool) {
        for k in 0..p.span {
            let cell = self.offset(p.start, k);
            self.section[section * self.cells + cell] = busy;
            if let TeacherRef::Assigned(t) = p.teacher {
                self.teacher[t * self.cells + cell] = busy;
            }
            if self.pooled {
                self.room[p.room * self.cells + cell] = busy;
            }
        }
        if let TeacherRef::Assigned(t) = p.teacher {
            let span = u32::from(p.span);
            self.load[t] = if busy {
                self.load[t] + span
            } else {
                self.load[t].saturating_sub(span)
            };
        }
    }

    /// Slots currently taught by a teacher.
    pub(crate) fn load(&self, teacher: TeacherId) -> u32 {
        self.load[teacher]
    }

    pub(crate) fn clear(&mut self) {
        self.section.fill(false);
        self.teacher.fill(false);
        self.room.fill(false);
        self.load.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogInput, RoomInput, SectionInput, TeacherInput};
    use crate::config::EngineConfig;
    use crate::models::Level;

    fn catalog(policy: RoomPolicy) -> Catalog {
        let input = CatalogInput::new()
            .with_section(Level::Middle, 1, SectionInput::new("1M1").with_subject("Math", 2))
            .with_section(Level::Middle, 1, SectionInput::new("1M2").with_subject("Math", 2))
            .with_teacher(TeacherInput::new("T", &["Math"]))
            .with_room(RoomInput::new("MS_Room_1M1", "general"))
            .with_room(RoomInput::new("MS_Room_1M2", "general"));
        Catalog::build(&input, &EngineConfig::default().with_room_policy(policy)).unwrap()
    }

    #[test]
    fn test_block_occupies_both_cells() {
        let mut occ = Occupancy::for_catalog(&catalog(RoomPolicy::Dedicated));
        let block = Placement::new(Cell::new(0, 1), 2, TeacherRef::Assigned(0), 0);
        occ.occupy(0, &block);
        assert!(!occ.section_free(0, Cell::new(0, 2), 1));
        assert!(!occ.teacher_free(0, Cell::new(0, 2), 1));
        assert!(occ.section_free(1, Cell::new(0, 2), 1));
        assert!(occ.section_free(0, Cell::new(0, 3), 1));
        assert_eq!(occ.load(0), 2);

        occ.release(0, &block);
        assert!(occ.section_free(0, Cell::new(0, 1), 2));
        assert_eq!(occ.load(0), 0);
    }

    #[test]
    fn test_sentinel_leaves_teacher_free() {
        let mut occ = Occupancy::for_catalog(&catalog(RoomPolicy::Dedicated));
        occ.occupy(0, &Placement::new(Cell::new(1, 3), 1, TeacherRef::Unassigned, 0));
        assert!(occ.teacher_free(0, Cell::new(1, 3), 1));
        assert!(!occ.section_free(0, Cell::new(1, 3), 1));
    }

    #[test]
    fn test_rooms_tracked_only_when_pooled() {
        let p = Placement::new(Cell::new(0, 1), 1, TeacherRef::Unassigned, 0);
        let mut dedicated = Occupancy::for_catalog(&catalog(RoomPolicy::Dedicated));
        dedicated.occupy(0, &p);
        assert!(dedicated.room_free(0, Cell::new(0, 1), 1));

        let mut pooled = Occupancy::for_catalog(&catalog(RoomPolicy::Pooled));
        pooled.occupy(0, &p);
        assert!(!pooled.room_free(0, Cell::new(0, 1), 1));
        assert!(!pooled.can_place(1, &p));
        pooled.clear();
        assert!(pooled.can_place(1, &p));
    }
}
