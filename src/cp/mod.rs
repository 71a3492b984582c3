//! CP-based timetabling formulation.
//!
//! [`TimetableModelBuilder`] turns the sessions of one scope into a
//! [`TimetableModel`]: one variable per session over start × teacher ×
//! room, and pairwise exclusivity constraints between sessions that could
//! collide. [`SearchEngine`] solves it by propagation, backtracking and
//! branch-and-bound on the number of sessions left to the sentinel
//! teacher.
//!
//! # Reference
//! - Haralick & Elliott (1980), "Increasing Tree Search Efficiency for
//!   Constraint Satisfaction Problems"
//! - Schaerf (1999), "A Survey of Automated Timetabling"

mod model;
pub(crate) mod occupancy;
mod search;

pub use model::{Exclusivity, SessionVar, TimetableModel, TimetableModelBuilder};
pub use search::{
    SearchBudget, SearchEngine, SearchPhase, SearchResult, SearchStats, SearchStatus,
};
