//! Randomized greedy placement.
//!
//! # Algorithm
//!
//! 1. Take sessions in expansion order.
//! 2. Draw a random legal start; skip it if the section is busy there.
//! 3. Shuffle the qualified teachers and take the first free one, with the
//!    first free candidate room.
//! 4. After `max_attempts` failed draws, give up on the session: it gets
//!    the sentinel teacher in the first free section cell.
//!
//! No backtracking, no optimality or completeness guarantee.
//!
//! # Complexity
//! O(n * a * (t + r)) where n=sessions, a=max attempts, t=teachers, r=rooms.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::cp::occupancy::Occupancy;
use crate::cp::{SearchPhase, SearchResult, SearchStats, SearchStatus, SessionVar, TimetableModel};
use crate::models::{Placement, TeacherRef};

/// Randomized greedy scheduler.
///
/// # Example
///
/// ```
/// use u_timetable::scheduler::GreedyScheduler;
///
/// let greedy = GreedyScheduler::new().with_max_attempts(20).with_seed(3);
/// assert_eq!(greedy.max_attempts(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyScheduler {
    max_attempts: u32,
    seed: u64,
}

impl GreedyScheduler {
    /// Creates a scheduler with 50 attempts per session.
    pub fn new() -> Self {
        Self {
            max_attempts: 50,
            seed: 42,
        }
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Places every variable of the model once.
    ///
    /// The status is `Feasible` when every placement (sentinels included)
    /// fits its cells, `BudgetExhausted` when some session found no free
    /// section cell at all and was dropped at its fallback position.
    pub fn solve(&self, model: &TimetableModel) -> SearchResult {
        let started = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut occ = Occupancy::new(model.shape());
        let mut stats = SearchStats {
            rounds: 1,
            ..SearchStats::default()
        };
        let mut overlapping = 0usize;
        let mut placements = Vec::with_capacity(model.len());

        for var in model.vars() {
            let placement = match self.draw(var, &occ, &mut rng, &mut stats.steps) {
                Some(p) => Some(p),
                None => give_up(var, &occ),
            };
            let placement = match placement {
                Some(p) => {
                    occ.occupy(var.section, &p);
                    p
                }
                None => {
                    overlapping += 1;
                    var.fallback()
                }
            };
            placements.push(placement);
        }

        stats.elapsed = started.elapsed();
        let cost = model.objective(&placements);
        let (status, phase) = if overlapping == 0 {
            stats.solutions = 1;
            (SearchStatus::Feasible, SearchPhase::SolutionFound)
        } else {
            (SearchStatus::BudgetExhausted, SearchPhase::BudgetExhausted)
        };
        debug!(
            scope = model.name(),
            cost,
            overlapping,
            attempts = stats.steps,
            "greedy placement done"
        );

        SearchResult {
            placements,
            status,
            cost,
            phase,
            stats,
            worker: 0,
        }
    }

    fn draw(
        &self,
        var: &SessionVar,
        occ: &Occupancy,
        rng: &mut ChaCha8Rng,
        attempts: &mut u64,
    ) -> Option<Placement> {
        if var.starts.is_empty() {
            return None;
        }
        let mut teachers = var.teachers.clone();
        for _ in 0..self.max_attempts {
            *attempts += 1;
            let start = var.starts[rng.random_range(0..var.starts.len())];
            if !occ.section_free(var.section, start, var.span) {
                continue;
            }
            let Some(room) = var
                .rooms
                .iter()
                .copied()
                .find(|&r| occ.room_free(r, start, var.span))
            else {
                continue;
            };
            teachers.shuffle(rng);
            if let Some(&t) = teachers.iter().find(|&&t| occ.teacher_free(t, start, var.span)) {
                return Some(Placement::new(start, var.span, TeacherRef::Assigned(t), room));
            }
        }
        None
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// The sentinel in the first cell where the section and a room are free.
fn give_up(var: &SessionVar, occ: &Occupancy) -> Option<Placement> {
    var.starts
        .iter()
        .filter(|&&start| occ.section_free(var.section, start, var.span))
        .find_map(|&start| {
            var.rooms
                .iter()
                .find(|&&r| occ.room_free(r, start, var.span))
                .map(|&room| Placement::new(start, var.span, TeacherRef::Unassigned, room))
        })
}
