//! Built-in ordering rules.
//!
//! All rules return lower scores for sessions that should be emitted
//! first. Hard-to-place sessions go early so the search meets their
//! conflicts near the root.

use super::{OrderingContext, OrderingRule, RuleScore};
use crate::models::Session;

/// Block sessions before single sessions.
///
/// Blocks only fit the legal pairs, so they have far fewer starts.
#[derive(Debug, Clone, Copy)]
pub struct BlockFirst;

impl OrderingRule for BlockFirst {
    fn name(&self) -> &'static str {
        "BLOCK_FIRST"
    }

    fn evaluate(&self, session: &Session, _context: &OrderingContext) -> RuleScore {
        if session.is_block {
            0.0
        } else {
            1.0
        }
    }

    fn description(&self) -> &'static str {
        "Block Sessions First"
    }
}

/// Fewest qualified teachers first.
///
/// Sessions missing from the context rank last.
#[derive(Debug, Clone, Copy)]
pub struct ScarceQualification;

impl OrderingRule for ScarceQualification {
    fn name(&self) -> &'static str {
        "SCARCE_QUALIFICATION"
    }

    fn evaluate(&self, session: &Session, context: &OrderingContext) -> RuleScore {
        context
            .qualified_count(session.section, session.subject)
            .map(|n| n as f64)
            .unwrap_or(f64::MAX)
    }

    fn description(&self) -> &'static str {
        "Scarcest Qualification First"
    }
}

/// Larger weekly coefficient first.
#[derive(Debug, Clone, Copy)]
pub struct HeavySubject;

impl OrderingRule for HeavySubject {
    fn name(&self) -> &'static str {
        "HEAVY_SUBJECT"
    }

    fn evaluate(&self, session: &Session, _context: &OrderingContext) -> RuleScore {
        -f64::from(session.coefficient)
    }

    fn description(&self) -> &'static str {
        "Heaviest Subject First"
    }
}
