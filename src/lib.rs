//! School timetabling engine.
//!
//! Places every weekly session of every class section on a day × slot
//! grid, with a qualified teacher and a room, so that no teacher, room or
//! section is booked twice at once. Sessions no teacher can take are
//! assigned the sentinel teacher `"No teacher available"` instead of
//! failing the request, and the search minimizes how many such sessions
//! remain.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `WeekGrid`, `Section`, `Teacher`, `Room`,
//!   `Session`, `Placement`, `Schedule`
//! - **`catalog`**: Input payload and the validated, interned `Catalog`
//! - **`validation`**: Input integrity checks and schedule verification
//! - **`ordering`**: Rule chain deciding the order sessions are tried in
//! - **`expander`**: Sections → sessions
//! - **`cp`**: Constraint model and the propagating branch-and-bound search
//! - **`scheduler`**: Request pipeline, greedy strategy, KPIs
//! - **`report`**: Level → year → section display rows
//! - **`config`**: TOML-loadable engine configuration
//!
//! # Example
//!
//! ```
//! use u_timetable::prelude::*;
//!
//! let input = CatalogInput::new()
//!     .with_section(
//!         Level::High,
//!         1,
//!         SectionInput::new("1S1").with_subject("Math", 4).with_subject("Sport", 1),
//!     )
//!     .with_teacher(TeacherInput::new("HS_Teacher_1", &["Math", "Sport"]))
//!     .with_room(RoomInput::new("HS_Room_1S1", "general"));
//!
//! let result = Timetabler::new(EngineConfig::default())
//!     .run(&input, &ScopeSelector::All)
//!     .unwrap();
//! assert_eq!(result.report.row_count(), 5);
//! assert_eq!(result.sentinel_count(), 0);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//!   Constraint Satisfaction Problems"

pub mod catalog;
pub mod config;
pub mod cp;
pub mod error;
pub mod expander;
pub mod models;
pub mod ordering;
pub mod report;
pub mod scheduler;
pub mod validation;

pub use error::{ConfigError, ConfigurationError, TimetableError};

/// Common imports.
pub mod prelude {
    pub use crate::catalog::{
        Catalog, CatalogInput, RoomInput, SectionInput, SubjectInput, TeacherInput,
    };
    pub use crate::config::{EngineConfig, GridConfig, SlotConfig, Strategy};
    pub use crate::cp::{SearchBudget, SearchStatus};
    pub use crate::error::{ConfigurationError, TimetableError};
    pub use crate::models::{Level, RoomPolicy, SENTINEL_TEACHER};
    pub use crate::report::{ScheduleEntry, TimetableReport};
    pub use crate::scheduler::{ScopeSelector, TimetableResult, Timetabler};
}
