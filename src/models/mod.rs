//! Timetabling domain models.
//!
//! Provides the core data types for a weekly school timetable: the week
//! grid, rooms, teachers, subjects, sections, the sessions expanded from
//! them, and the schedule that places every session.
//!
//! # Domain Mappings
//!
//! | u-timetable | Meaning |
//! |-------------|---------|
//! | Cell | A (day, slot) position in the week |
//! | Session | One weekly occurrence of a subject for a section |
//! | Placement | Start cell × span × teacher × room |
//! | Schedule | One placement per session of a scope |

mod grid;
mod room;
mod schedule;
mod section;
mod session;
mod subject;
mod teacher;

pub use grid::{Cell, SlotPair, TimeSlot, WeekGrid};
pub use room::{Room, RoomId, RoomPolicy, RoomType};
pub use schedule::{
    Assignment, Placement, Schedule, TeacherRef, Violation, ViolationType, SENTINEL_TEACHER,
};
pub use section::{Level, Section, SectionId, SectionSubject};
pub use session::{Session, SessionId};
pub use subject::{normalize_name, Subject, SubjectId};
pub use teacher::{Teacher, TeacherId};
