//! Rule engine for multi-criteria session ordering.
//!
//! Composes ordering rules with configurable evaluation modes and
//! tie-breaking strategies.

use std::cmp::Ordering;
use std::sync::Arc;

use super::{rules, OrderingContext, OrderingRule, RuleScore};
use crate::models::Session;

/// How multiple rules are combined.
#[derive(Debug, Clone, Default)]
pub enum EvaluationMode {
    /// Apply rules in sequence; use next rule only on ties.
    #[default]
    Sequential,
    /// Compute weighted sum of all rule scores.
    Weighted,
}

/// How ties are broken after all rules are exhausted.
#[derive(Debug, Clone, Default)]
pub enum TieBreaker {
    /// Keep input order (the sort is stable).
    NextRule,
    /// Deterministic by (section, subject, index).
    #[default]
    ById,
}

#[derive(Clone)]
struct WeightedRule {
    rule: Arc<dyn OrderingRule>,
    weight: f64,
}

/// A composable rule engine for session ordering.
///
/// # Example
/// ```
/// use u_timetable::ordering::{rules, RuleEngine};
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::BlockFirst)
///     .with_tie_breaker(rules::HeavySubject);
/// assert_eq!(engine.rule_names(), vec!["BLOCK_FIRST", "HEAVY_SUBJECT"]);
/// ```
#[derive(Clone)]
pub struct RuleEngine {
    rules: Vec<WeightedRule>,
    mode: EvaluationMode,
    tie_breaker: TieBreaker,
    epsilon: f64,
}

impl RuleEngine {
    /// Creates an empty rule engine.
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            mode: EvaluationMode::Sequential,
            tie_breaker: TieBreaker::ById,
            epsilon: 1e-9,
        }
    }

    /// The default chain: BlockFirst → ScarceQualification → HeavySubject.
    pub fn standard() -> Self {
        Self::new()
            .with_rule(rules::BlockFirst)
            .with_rule(rules::ScarceQualification)
            .with_rule(rules::HeavySubject)
    }

    /// Adds a primary rule (weight 1.0).
    pub fn with_rule<R: OrderingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 1.0,
        });
        self
    }

    /// Adds a weighted rule.
    pub fn with_weighted_rule<R: OrderingRule + 'static>(mut self, rule: R, weight: f64) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight,
        });
        self
    }

    /// Adds a tie-breaking rule (weight 0.0, used only in Sequential mode).
    pub fn with_tie_breaker<R: OrderingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(WeightedRule {
            rule: Arc::new(rule),
            weight: 0.0,
        });
        self
    }

    /// Sets the evaluation mode.
    pub fn with_mode(mut self, mode: EvaluationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the final tie-breaking strategy.
    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|wr| wr.rule.name()).collect()
    }

    /// Sorts sessions, first-emitted first.
    ///
    /// Returns indices into the original slice.
    pub fn sort_indices(&self, sessions: &[Session], context: &OrderingContext) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..sessions.len()).collect();

        match &self.mode {
            EvaluationMode::Sequential => {
                indices.sort_by(|&a, &b| self.compare_sequential(&sessions[a], &sessions[b], context));
            }
            EvaluationMode::Weighted => {
                let scores: Vec<f64> = sessions
                    .iter()
                    .map(|s| self.weighted_score(s, context))
                    .collect();
                indices.sort_by(|&a, &b| {
                    scores[a]
                        .partial_cmp(&scores[b])
                        .unwrap_or(Ordering::Equal)
                        .then_with(|| self.final_tie(&sessions[a], &sessions[b]))
                });
            }
        }

        indices
    }

    /// Evaluates a single session and returns scores from each rule.
    pub fn evaluate(&self, session: &Session, context: &OrderingContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(session, context) * wr.weight)
            .collect()
    }

    fn compare_sequential(&self, a: &Session, b: &Session, context: &OrderingContext) -> Ordering {
        for wr in &self.rules {
            let score_a = wr.rule.evaluate(a, context);
            let score_b = wr.rule.evaluate(b, context);

            if (score_a - score_b).abs() > self.epsilon {
                return score_a.partial_cmp(&score_b).unwrap_or(Ordering::Equal);
            }
        }
        self.final_tie(a, b)
    }

    fn final_tie(&self, a: &Session, b: &Session) -> Ordering {
        match &self.tie_breaker {
            TieBreaker::NextRule => Ordering::Equal,
            TieBreaker::ById => (a.section, a.subject, a.index).cmp(&(b.section, b.subject, b.index)),
        }
    }

    fn weighted_score(&self, session: &Session, context: &OrderingContext) -> f64 {
        self.rules
            .iter()
            .map(|wr| wr.rule.evaluate(session, context) * wr.weight)
            .sum()
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| format!("{}(w={})", r.rule.name(), r.weight))
                    .collect::<Vec<_>>(),
            )
            .field("mode", &self.mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomType;

    fn session(section: usize, subject: usize, index: u32, coefficient: u32, is_block: bool) -> Session {
        Session {
            id: 0,
            section,
            subject,
            index,
            coefficient,
            is_block,
            room_type: RoomType::General,
        }
    }

    fn sample() -> (Vec<Session>, OrderingContext) {
        let sessions = vec![
            session(0, 0, 0, 4, false), // math, 3 teachers
            session(0, 1, 0, 1, true),  // sport, 2 teachers
            session(0, 2, 0, 2, false), // chemistry, 1 teacher
            session(0, 2, 1, 2, false),
        ];
        let ctx = OrderingContext::new()
            .with_qualified(0, 0, 3)
            .with_qualified(0, 1, 2)
            .with_qualified(0, 2, 1);
        (sessions, ctx)
    }

    #[test]
    fn test_standard_chain() {
        let (sessions, ctx) = sample();
        let order = RuleEngine::standard().sort_indices(&sessions, &ctx);
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_heavy_only() {
        let (sessions, ctx) = sample();
        let order = RuleEngine::new()
            .with_rule(rules::HeavySubject)
            .sort_indices(&sessions, &ctx);
        assert_eq!(order, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_final_tie_by_id() {
        let sessions = vec![session(1, 0, 1, 2, false), session(0, 3, 0, 2, false), session(1, 0, 0, 2, false)];
        let ctx = OrderingContext::new();
        let order = RuleEngine::new().sort_indices(&sessions, &ctx);
        assert_eq!(order, vec![1, 2, 0]);

        let stable = RuleEngine::new()
            .with_final_tie_breaker(TieBreaker::NextRule)
            .sort_indices(&sessions, &ctx);
        assert_eq!(stable, vec![0, 1, 2]);
    }

    #[test]
    fn test_weighted_mode() {
        let (sessions, ctx) = sample();
        // Heavy subjects dominate the block bonus.
        let engine = RuleEngine::new()
            .with_weighted_rule(rules::BlockFirst, 1.0)
            .with_weighted_rule(rules::HeavySubject, 10.0)
            .with_mode(EvaluationMode::Weighted);
        let order = engine.sort_indices(&sessions, &ctx);
        assert_eq!(order[0], 0);
        assert_eq!(engine.evaluate(&sessions[0], &ctx), vec![1.0, -40.0]);
    }

    #[test]
    fn test_empty() {
        let order = RuleEngine::standard().sort_indices(&[], &OrderingContext::new());
        assert!(order.is_empty());
    }

    #[test]
    fn test_debug_lists_rules() {
        let text = format!("{:?}", RuleEngine::standard());
        assert!(text.contains("BLOCK_FIRST(w=1)"));
    }
}
