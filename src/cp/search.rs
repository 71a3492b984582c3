//! Systematic search over a [`TimetableModel`].
//!
//! Depth-first backtracking with forward checking. Placing a value marks
//! its cells in the occupancy grids, then recounts the remaining values of
//! every unassigned neighbor. A neighbor left with no value at all (not
//! even the sentinel) is a wipeout and triggers an immediate backtrack.
//!
//! Branch-and-bound runs as a sequence of rounds. Each round restarts from
//! the root and only accepts assignments with strictly fewer sentinels
//! than the incumbent. The search stops when a solution reaches the root
//! lower bound, when a round exhausts its tree, or when the budget runs
//! out.
//!
//! # Heuristics
//! - Variable: fewest real-teacher values, then fewest values, then fewest
//!   legal starts, then fewest qualified teachers.
//! - Value: real teachers before the sentinel, lighter-loaded teachers
//!   first, remaining ties drawn from a seeded `ChaCha8Rng`.

use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::model::TimetableModel;
use super::occupancy::Occupancy;
use crate::models::{Placement, TeacherRef};

/// How often the wall clock is consulted, in steps.
const CLOCK_INTERVAL: u64 = 64;

/// Step and wall-clock limits of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudget {
    /// Maximum search nodes.
    pub step_limit: u64,
    pub time_limit: Duration,
}

impl SearchBudget {
    pub fn new(step_limit: u64, time_limit: Duration) -> Self {
        Self {
            step_limit,
            time_limit,
        }
    }

    /// A step limit without a practical time limit.
    pub fn steps(step_limit: u64) -> Self {
        Self::new(step_limit, Duration::from_secs(3600))
    }
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self::new(200_000, Duration::from_secs(10))
    }
}

/// Search phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchPhase {
    Init,
    Propagating,
    Branching,
    SolutionFound,
    BudgetExhausted,
}

/// Final status of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStatus {
    /// No assignment with fewer sentinels exists.
    Optimal,
    /// A complete assignment, not proven optimal.
    Feasible,
    /// No complete assignment found; placements are a padded partial one.
    BudgetExhausted,
}

impl SearchStatus {
    /// Whether the placements form a complete assignment.
    pub fn is_complete(&self) -> bool {
        !matches!(self, SearchStatus::BudgetExhausted)
    }
}

/// Search statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub steps: u64,
    pub backtracks: u64,
    /// Branch-and-bound rounds started.
    pub rounds: u32,
    /// Improving solutions found.
    pub solutions: u32,
    pub elapsed: Duration,
}

/// Outcome of a search: one placement per model variable.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub placements: Vec<Placement>,
    pub status: SearchStatus,
    /// Sentinel count of `placements`.
    pub cost: usize,
    pub phase: SearchPhase,
    pub stats: SearchStats,
    /// Portfolio worker that produced the result.
    pub worker: usize,
}

/// Search engine.
///
/// # Example
/// ```no_run
/// use u_timetable::cp::{SearchBudget, SearchEngine};
///
/// let engine = SearchEngine::new(SearchBudget::steps(10_000))
///     .with_seed(7)
///     .with_workers(4);
/// // let result = engine.solve(&model);
/// ```
#[derive(Debug, Clone)]
pub struct SearchEngine {
    budget: SearchBudget,
    seed: u64,
    workers: usize,
}

impl SearchEngine {
    pub fn new(budget: SearchBudget) -> Self {
        Self {
            budget,
            seed: 42,
            workers: 1,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Independent searches with seeds `seed..seed + workers`.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn budget(&self) -> SearchBudget {
        self.budget
    }

    /// Solves a model.
    ///
    /// With several workers, the best result wins: complete before
    /// partial, then fewest sentinels, then lowest worker index.
    pub fn solve(&self, model: &TimetableModel) -> SearchResult {
        if self.workers <= 1 {
            return Searcher::new(model, self.budget, self.seed).run(0);
        }
        let results: Vec<SearchResult> = (0..self.workers)
            .into_par_iter()
            .map(|w| Searcher::new(model, self.budget, self.seed.wrapping_add(w as u64)).run(w))
            .collect();
        let best = results
            .into_iter()
            .min_by_key(|r| (!r.status.is_complete(), r.cost, r.worker));
        match best {
            Some(result) => {
                debug!(scope = model.name(), worker = result.worker, cost = result.cost, "portfolio winner");
                result
            }
            None => Searcher::new(model, self.budget, self.seed).run(0),
        }
    }
}

/// Counts step and wall-clock consumption.
#[derive(Debug)]
struct BudgetMeter {
    budget: SearchBudget,
    started: Instant,
    steps: u64,
    out: bool,
}

impl BudgetMeter {
    fn new(budget: SearchBudget) -> Self {
        Self {
            budget,
            started: Instant::now(),
            steps: 0,
            out: false,
        }
    }

    /// Consumes one step. Returns `false` once the budget is spent.
    fn tick(&mut self) -> bool {
        if self.out {
            return false;
        }
        self.steps += 1;
        if self.steps > self.budget.step_limit
            || (self.steps % CLOCK_INTERVAL == 0 && self.started.elapsed() >= self.budget.time_limit)
        {
            self.out = true;
        }
        !self.out
    }
}

/// Remaining values of an unassigned variable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Support {
    /// All values, sentinel included.
    any: u32,
    /// Values with a real teacher.
    real: u32,
}

enum Descent {
    Solved,
    Exhausted,
    OutOfBudget,
}

struct Searcher<'m> {
    model: &'m TimetableModel,
    occ: Occupancy,
    assigned: Vec<Option<Placement>>,
    support: Vec<Support>,
    trail: Vec<(usize, Support)>,
    depth: usize,
    sentinels: usize,
    bound: usize,
    incumbent: Option<(Vec<Placement>, usize)>,
    deepest: Vec<Option<Placement>>,
    deepest_depth: usize,
    rng: ChaCha8Rng,
    meter: BudgetMeter,
    phase: SearchPhase,
    stats: SearchStats,
}

impl<'m> Searcher<'m> {
    fn new(model: &'m TimetableModel, budget: SearchBudget, seed: u64) -> Self {
        let n = model.len();
        Self {
            model,
            occ: Occupancy::new(model.shape()),
            assigned: vec![None; n],
            support: vec![Support::default(); n],
            trail: Vec::new(),
            depth: 0,
            sentinels: 0,
            bound: n + 1,
            incumbent: None,
            deepest: vec![None; n],
            deepest_depth: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
            meter: BudgetMeter::new(budget),
            phase: SearchPhase::Init,
            stats: SearchStats::default(),
        }
    }

    fn run(mut self, worker: usize) -> SearchResult {
        let root_bound = self.model.lower_bound();
        let status = loop {
            self.stats.rounds += 1;
            self.reset();
            self.bound = self.incumbent.as_ref().map_or(self.model.len() + 1, |(_, cost)| *cost);

            let outcome = if self.support.iter().any(|s| s.any == 0) {
                Descent::Exhausted
            } else {
                self.descend()
            };

            match outcome {
                Descent::Solved => {
                    let cost = self.incumbent.as_ref().map_or(0, |(_, cost)| *cost);
                    debug!(
                        scope = self.model.name(),
                        worker,
                        round = self.stats.rounds,
                        cost,
                        steps = self.meter.steps,
                        "solution found"
                    );
                    if cost <= root_bound {
                        break SearchStatus::Optimal;
                    }
                }
                Descent::Exhausted => {
                    break if self.incumbent.is_some() {
                        SearchStatus::Optimal
                    } else {
                        SearchStatus::BudgetExhausted
                    };
                }
                Descent::OutOfBudget => {
                    break if self.incumbent.is_some() {
                        SearchStatus::Feasible
                    } else {
                        SearchStatus::BudgetExhausted
                    };
                }
            }
        };

        self.stats.steps = self.meter.steps;
        self.stats.elapsed = self.meter.started.elapsed();

        let placements = match self.incumbent.take() {
            Some((placements, _)) => {
                self.set_phase(SearchPhase::SolutionFound);
                placements
            }
            None => {
                self.set_phase(SearchPhase::BudgetExhausted);
                warn!(
                    scope = self.model.name(),
                    worker,
                    depth = self.deepest_depth,
                    vars = self.model.len(),
                    "no complete assignment, padding the deepest partial one"
                );
                self.model
                    .vars()
                    .iter()
                    .zip(&self.deepest)
                    .map(|(var, p)| p.unwrap_or_else(|| var.fallback()))
                    .collect()
            }
        };

        SearchResult {
            cost: self.model.objective(&placements),
            placements,
            status,
            phase: self.phase,
            stats: self.stats,
            worker,
        }
    }

    fn set_phase(&mut self, phase: SearchPhase) {
        if self.phase != phase {
            trace!(from = ?self.phase, to = ?phase, "phase");
            self.phase = phase;
        }
    }

    fn reset(&mut self) {
        self.set_phase(SearchPhase::Propagating);
        self.occ.clear();
        self.assigned.fill(None);
        self.trail.clear();
        self.depth = 0;
        self.sentinels = 0;
        for v in 0..self.model.len() {
            self.support[v] = self.count_support(v);
        }
    }

    fn descend(&mut self) -> Descent {
        if self.depth > self.deepest_depth {
            self.deepest_depth = self.depth;
            self.deepest.clone_from(&self.assigned);
        }
        if !self.meter.tick() {
            return Descent::OutOfBudget;
        }

        let Some(var) = self.select_var() else {
            self.record_solution();
            return Descent::Solved;
        };

        self.set_phase(SearchPhase::Branching);
        for value in self.ordered_values(var) {
            let mark = self.trail.len();
            if self.assign(var, value) && self.forced_cost() < self.bound {
                match self.descend() {
                    Descent::Exhausted => {}
                    done => {
                        self.unassign(var, &value, mark);
                        return done;
                    }
                }
            }
            self.unassign(var, &value, mark);
            self.stats.backtracks += 1;
        }
        Descent::Exhausted
    }

    /// Places a value and propagates it to the unassigned neighbors.
    ///
    /// Returns `false` on a wipeout.
    fn assign(&mut self, var: usize, value: Placement) -> bool {
        let model = self.model;
        self.occ.occupy(model.var(var).section, &value);
        self.assigned[var] = Some(value);
        self.depth += 1;
        if value.is_sentinel() {
            self.sentinels += 1;
        }

        self.set_phase(SearchPhase::Propagating);
        for &u in model.neighbors(var) {
            if self.assigned[u].is_some() {
                continue;
            }
            let support = self.count_support(u);
            if support != self.support[u] {
                self.trail.push((u, self.support[u]));
                self.support[u] = support;
            }
            if support.any == 0 {
                return false;
            }
        }
        true
    }

    fn unassign(&mut self, var: usize, value: &Placement, mark: usize) {
        self.occ.release(self.model.var(var).section, value);
        self.assigned[var] = None;
        self.depth -= 1;
        if value.is_sentinel() {
            self.sentinels -= 1;
        }
        while self.trail.len() > mark {
            if let Some((u, support)) = self.trail.pop() {
                self.support[u] = support;
            }
        }
    }

    /// Sentinels placed plus variables left without a real teacher.
    fn forced_cost(&self) -> usize {
        let forced = self
            .assigned
            .iter()
            .zip(&self.support)
            .filter(|(a, s)| a.is_none() && s.real == 0)
            .count();
        self.sentinels + forced
    }

    fn count_support(&self, v: usize) -> Support {
        let var = self.model.var(v);
        let mut support = Support::default();
        for &start in &var.starts {
            if !self.occ.section_free(var.section, start, var.span) {
                continue;
            }
            for &room in &var.rooms {
                if !self.occ.room_free(room, start, var.span) {
                    continue;
                }
                support.any += 1;
                for &t in &var.teachers {
                    if self.occ.teacher_free(t, start, var.span) {
                        support.any += 1;
                        support.real += 1;
                    }
                }
            }
        }
        support
    }

    fn select_var(&self) -> Option<usize> {
        (0..self.model.len())
            .filter(|&v| self.assigned[v].is_none())
            .min_by_key(|&v| {
                let var = self.model.var(v);
                let s = self.support[v];
                (s.real, s.any, var.starts.len(), var.teachers.len(), v)
            })
    }

    fn ordered_values(&mut self, v: usize) -> Vec<Placement> {
        let var = self.model.var(v);
        let mut keyed: Vec<((bool, u32, u32), Placement)> = Vec::new();
        for &start in &var.starts {
            if !self.occ.section_free(var.section, start, var.span) {
                continue;
            }
            for &room in &var.rooms {
                if !self.occ.room_free(room, start, var.span) {
                    continue;
                }
                for &t in &var.teachers {
                    if self.occ.teacher_free(t, start, var.span) {
                        let key = (false, self.occ.load(t), self.rng.random::<u32>());
                        keyed.push((key, Placement::new(start, var.span, TeacherRef::Assigned(t), room)));
                    }
                }
                let key = (true, 0, self.rng.random::<u32>());
                keyed.push((key, Placement::new(start, var.span, TeacherRef::Unassigned, room)));
            }
        }
        keyed.sort_by_key(|(key, _)| *key);
        keyed.into_iter().map(|(_, p)| p).collect()
    }

    fn record_solution(&mut self) {
        let Some(placements) = self.assigned.iter().copied().collect::<Option<Vec<_>>>() else {
            return;
        };
        self.set_phase(SearchPhase::SolutionFound);
        self.stats.solutions += 1;
        self.incumbent = Some((placements, self.sentinels));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, CatalogInput, RoomInput, SectionInput, TeacherInput};
    use crate::config::{EngineConfig, GridConfig, SlotConfig};
    use crate::cp::TimetableModelBuilder;
    use crate::expander::SessionExpander;
    use crate::models::{Level, RoomPolicy};

    fn model_for(input: &CatalogInput, config: &EngineConfig) -> TimetableModel {
        let catalog = Catalog::build(input, config).unwrap();
        let ids: Vec<usize> = catalog.sections().iter().map(|s| s.id).collect();
        let sessions = SessionExpander::new().expand(&catalog, &ids);
        TimetableModelBuilder::new(&catalog, &sessions).build("test").unwrap()
    }

    fn small_school() -> CatalogInput {
        CatalogInput::new()
            .with_section(
                Level::Middle,
                1,
                SectionInput::new("1M1")
                    .with_subject("Math", 4)
                    .with_subject("Arabic", 3)
                    .with_subject("Sport", 2),
            )
            .with_section(
                Level::Middle,
                1,
                SectionInput::new("1M2")
                    .with_subject("Math", 4)
                    .with_subject("Arabic", 3)
                    .with_subject("Sport", 1),
            )
            .with_teacher(TeacherInput::new("MS_Teacher_1", &["Math"]))
            .with_teacher(TeacherInput::new("MS_Teacher_2", &["Arabic", "Sport"]))
            .with_room(RoomInput::new("MS_Room_1M1", "general"))
            .with_room(RoomInput::new("MS_Room_1M2", "general"))
    }

    fn assert_no_conflicts(model: &TimetableModel, placements: &[Placement]) {
        for c in model.constraints() {
            assert!(
                !model.conflicts(c.a, &placements[c.a], c.b, &placements[c.b]),
                "vars {} and {} conflict",
                c.a,
                c.b
            );
        }
    }

    #[test]
    fn test_empty_model() {
        let model = model_for(&CatalogInput::new(), &EngineConfig::default());
        let result = SearchEngine::new(SearchBudget::default()).solve(&model);
        assert_eq!(result.status, SearchStatus::Optimal);
        assert_eq!(result.cost, 0);
        assert!(result.placements.is_empty());
    }

    #[test]
    fn test_feasible_school_is_optimal() {
        let model = model_for(&small_school(), &EngineConfig::default());
        let result = SearchEngine::new(SearchBudget::default()).solve(&model);
        assert_eq!(result.status, SearchStatus::Optimal);
        assert_eq!(result.cost, 0);
        assert_eq!(result.placements.len(), model.len());
        assert_eq!(result.phase, SearchPhase::SolutionFound);
        assert_no_conflicts(&model, &result.placements);
        for (var, p) in model.vars().iter().zip(&result.placements) {
            assert!(var.starts.contains(&p.start));
            assert_eq!(p.span, var.span);
        }
    }

    #[test]
    fn test_deterministic_for_seed() {
        let model = model_for(&small_school(), &EngineConfig::default());
        let engine = SearchEngine::new(SearchBudget::default()).with_seed(5);
        let a = engine.solve(&model);
        let b = engine.solve(&model);
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn test_overloaded_teacher_reaches_lower_bound() {
        let input = CatalogInput::new()
            .with_section(Level::Middle, 1, SectionInput::new("1M1").with_subject("Math", 30))
            .with_section(Level::Middle, 1, SectionInput::new("1M2").with_subject("Math", 12))
            .with_teacher(TeacherInput::new("T", &["Math"]))
            .with_room(RoomInput::new("MS_Room_1M1", "general"))
            .with_room(RoomInput::new("MS_Room_1M2", "general"));
        let model = model_for(&input, &EngineConfig::default());
        let result = SearchEngine::new(SearchBudget::default()).solve(&model);
        assert_eq!(result.status, SearchStatus::Optimal);
        assert_eq!(result.cost, 2);
        assert_no_conflicts(&model, &result.placements);
    }

    #[test]
    fn test_tiny_budget_pads_partial() {
        let model = model_for(&small_school(), &EngineConfig::default());
        let result = SearchEngine::new(SearchBudget::steps(1)).solve(&model);
        assert_eq!(result.status, SearchStatus::BudgetExhausted);
        assert_eq!(result.phase, SearchPhase::BudgetExhausted);
        assert_eq!(result.placements.len(), model.len());
        // One real placement was reached before the budget ran out.
        assert_eq!(result.cost, model.len() - 1);
        assert_eq!(result.stats.steps, 2);
    }

    #[test]
    fn test_pooled_room_scarcity_is_not_an_error() {
        let grid = GridConfig {
            days: vec!["lundi".to_string()],
            block_pairs: Vec::new(),
            slots: vec![SlotConfig::new("8:00", "9:00"), SlotConfig::new("9:00", "10:00")],
        };
        let config = EngineConfig::default()
            .with_room_policy(RoomPolicy::Pooled)
            .with_grid(grid);
        let input = CatalogInput::new()
            .with_section(Level::Middle, 1, SectionInput::new("A").with_subject("Math", 2))
            .with_section(Level::Middle, 1, SectionInput::new("B").with_subject("Math", 1))
            .with_teacher(TeacherInput::new("T1", &["Math"]))
            .with_teacher(TeacherInput::new("T2", &["Math"]))
            .with_room(RoomInput::new("Room_1", "general"));
        let model = model_for(&input, &config);
        let result = SearchEngine::new(SearchBudget::default()).solve(&model);
        assert_eq!(result.status, SearchStatus::BudgetExhausted);
        assert!(!result.status.is_complete());
        assert_eq!(result.placements.len(), 3);
    }

    #[test]
    fn test_portfolio_is_deterministic() {
        let model = model_for(&small_school(), &EngineConfig::default());
        let engine = SearchEngine::new(SearchBudget::default()).with_workers(3);
        let a = engine.solve(&model);
        let b = engine.solve(&model);
        assert_eq!(a.status, SearchStatus::Optimal);
        assert_eq!(a.worker, 0);
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn test_lighter_teacher_preferred() {
        let input = CatalogInput::new()
            .with_section(Level::Middle, 1, SectionInput::new("1M1").with_subject("Math", 2))
            .with_teacher(TeacherInput::new("T1", &["Math"]))
            .with_teacher(TeacherInput::new("T2", &["Math"]))
            .with_room(RoomInput::new("MS_Room_1M1", "general"));
        let model = model_for(&input, &EngineConfig::default());
        let result = SearchEngine::new(SearchBudget::default()).solve(&model);
        let teachers: Vec<TeacherRef> = result.placements.iter().map(|p| p.teacher).collect();
        assert_ne!(teachers[0], teachers[1]);
    }

    #[test]
    fn test_budget_meter() {
        let mut meter = BudgetMeter::new(SearchBudget::steps(2));
        assert!(meter.tick());
        assert!(meter.tick());
        assert!(!meter.tick());
        assert!(!meter.tick());
        assert_eq!(meter.steps, 3);
    }
}
