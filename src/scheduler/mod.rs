//! Request pipeline, greedy strategy and KPI evaluation.
//!
//! [`Timetabler`] is the entry point: it builds the catalog, partitions
//! the selected sections into independent scopes, solves each scope with
//! the configured strategy and assembles the report.
//!
//! # Strategies
//!
//! - `Systematic`: [`SearchEngine`](crate::cp::SearchEngine), propagation
//!   with branch-and-bound on sentinel count.
//! - `Greedy`: [`GreedyScheduler`], randomized first-fit. Fast, no
//!   guarantee.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - de Werra (1985), "An introduction to timetabling"

mod greedy;
mod kpi;
mod timetabler;

pub use greedy::GreedyScheduler;
pub use kpi::ScheduleKpi;
pub use timetabler::{partition, ScopeOutcome, ScopeSelector, TimetableResult, Timetabler};
