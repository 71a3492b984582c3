//! Ordering rules and rule engine for session expansion.
//!
//! Decides the order in which expanded sessions are handed to the model
//! builder. The order only shapes how quickly the search reaches good
//! assignments; it never changes which schedules are valid.
//!
//! # Usage
//!
//! ```
//! use u_timetable::ordering::{rules, RuleEngine, TieBreaker};
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::BlockFirst)
//!     .with_rule(rules::ScarceQualification)
//!     .with_tie_breaker(rules::HeavySubject)
//!     .with_final_tie_breaker(TieBreaker::ById);
//! ```

mod context;
mod engine;
pub mod rules;

pub use context::OrderingContext;
pub use engine::{EvaluationMode, RuleEngine, TieBreaker};

use crate::models::Session;
use std::fmt::Debug;

/// Score returned by an ordering rule.
///
/// Lower scores are emitted first.
pub type RuleScore = f64;

/// A rule that ranks sessions for expansion.
///
/// # Score Convention
/// **Lower score = emitted earlier.**
pub trait OrderingRule: Send + Sync + Debug {
    /// Rule name (e.g., "BLOCK_FIRST").
    fn name(&self) -> &'static str;

    /// Scores a session. Lower scores come first.
    fn evaluate(&self, session: &Session, context: &OrderingContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}
