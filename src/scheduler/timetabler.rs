//! Request pipeline: catalog → sessions → model → search → report.
//!
//! The selected sections are partitioned into independent scopes: two
//! sections land in the same scope whenever they could compete for a
//! teacher (or, under the pooled policy, a room). Scopes share no state
//! and are solved in parallel with `rayon`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use super::{GreedyScheduler, ScheduleKpi};
use crate::catalog::{Catalog, CatalogInput};
use crate::config::{EngineConfig, Strategy};
use crate::cp::{SearchEngine, SearchStats, SearchStatus, TimetableModelBuilder};
use crate::error::{ConfigurationError, TimetableError};
use crate::expander::SessionExpander;
use crate::models::{Level, RoomPolicy, Schedule, SectionId, Session, Violation};
use crate::report::{ReportBuilder, TimetableReport};
use crate::validation::verify_schedule;

/// Which sections a request schedules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScopeSelector {
    #[default]
    All,
    Level(Level),
    /// Sections by name.
    Sections(Vec<String>),
}

impl ScopeSelector {
    /// Resolves the selector to section ids, in catalog order.
    ///
    /// # Errors
    /// `UnknownSection` for a name absent from the catalog.
    pub fn resolve(&self, catalog: &Catalog) -> Result<Vec<SectionId>, ConfigurationError> {
        match self {
            ScopeSelector::All => Ok(catalog.sections().iter().map(|s| s.id).collect()),
            ScopeSelector::Level(level) => Ok(catalog
                .sections()
                .iter()
                .filter(|s| s.level == *level)
                .map(|s| s.id)
                .collect()),
            ScopeSelector::Sections(names) => {
                let mut ids = Vec::with_capacity(names.len());
                for name in names {
                    let section = catalog
                        .section_by_name(name)
                        .ok_or_else(|| ConfigurationError::UnknownSection(name.clone()))?;
                    ids.push(section.id);
                }
                ids.sort_unstable();
                ids.dedup();
                Ok(ids)
            }
        }
    }
}

/// Summary of one solved scope.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeOutcome {
    pub name: String,
    pub sections: Vec<String>,
    pub sessions: usize,
    pub status: SearchStatus,
    /// Sessions left to the sentinel teacher.
    pub cost: usize,
    pub stats: SearchStats,
    /// Invariant violations found by verification.
    pub violations: Vec<Violation>,
    pub kpi: ScheduleKpi,
}

/// Result of a timetabling request.
#[derive(Debug, Clone)]
pub struct TimetableResult {
    pub report: TimetableReport,
    pub outcomes: Vec<ScopeOutcome>,
}

impl TimetableResult {
    /// Whether every scope found a complete assignment.
    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(|o| o.status.is_complete())
    }

    pub fn sentinel_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.cost).sum()
    }

    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.outcomes.iter().flat_map(|o| o.violations.iter())
    }
}

struct SolvedScope {
    sessions: Vec<Session>,
    schedule: Schedule,
    outcome: ScopeOutcome,
}

/// Runs timetabling requests.
///
/// # Example
/// ```
/// use u_timetable::catalog::{CatalogInput, RoomInput, SectionInput, TeacherInput};
/// use u_timetable::config::EngineConfig;
/// use u_timetable::models::Level;
/// use u_timetable::scheduler::{ScopeSelector, Timetabler};
///
/// let input = CatalogInput::new()
///     .with_section(Level::Middle, 1, SectionInput::new("1M1").with_subject("Math", 3))
///     .with_teacher(TeacherInput::new("MS_Teacher_1", &["Math"]))
///     .with_room(RoomInput::new("MS_Room_1M1", "general"));
///
/// let result = Timetabler::new(EngineConfig::default())
///     .run(&input, &ScopeSelector::All)
///     .unwrap();
/// assert_eq!(result.report.row_count(), 3);
/// assert!(result.is_complete());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Timetabler {
    config: EngineConfig,
    expander: SessionExpander,
}

impl Timetabler {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            expander: SessionExpander::new(),
        }
    }

    /// Replaces the session expander (and with it the ordering rules).
    pub fn with_expander(mut self, expander: SessionExpander) -> Self {
        self.expander = expander;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the catalog and schedules the selected sections.
    ///
    /// # Errors
    /// Any [`ConfigurationError`] of the catalog or the selector. An
    /// exhausted budget is not an error.
    pub fn run(&self, input: &CatalogInput, selector: &ScopeSelector) -> Result<TimetableResult, TimetableError> {
        let catalog = Catalog::build(input, &self.config)?;
        self.schedule(&catalog, selector)
    }

    /// Schedules the selected sections of a built catalog.
    pub fn schedule(&self, catalog: &Catalog, selector: &ScopeSelector) -> Result<TimetableResult, TimetableError> {
        let selected = selector.resolve(catalog)?;
        let scopes = partition(catalog, &selected, self.config.joint_scope);
        info!(
            sections = selected.len(),
            scopes = scopes.len(),
            strategy = ?self.config.strategy,
            policy = ?catalog.room_policy(),
            "scheduling"
        );

        let solved = scopes
            .par_iter()
            .enumerate()
            .map(|(index, sections)| self.solve_scope(catalog, index, sections))
            .collect::<Result<Vec<_>, _>>()?;

        let mut builder = ReportBuilder::new(catalog);
        let mut outcomes = Vec::with_capacity(solved.len());
        for scope in solved {
            builder.add_scope(&scope.sessions, &scope.schedule);
            outcomes.push(scope.outcome);
        }

        Ok(TimetableResult {
            report: builder.finish(&selected),
            outcomes,
        })
    }

    fn solve_scope(
        &self,
        catalog: &Catalog,
        index: usize,
        sections: &[SectionId],
    ) -> Result<SolvedScope, ConfigurationError> {
        let name = format!("scope-{index}");
        let sessions = self.expander.expand(catalog, sections);
        let model = TimetableModelBuilder::new(catalog, &sessions).build(name.clone())?;
        let seed = self.config.seed.wrapping_add(index as u64);

        let result = match self.config.strategy {
            Strategy::Systematic => SearchEngine::new(self.config.budget())
                .with_seed(seed)
                .with_workers(self.config.workers)
                .solve(&model),
            Strategy::Greedy => GreedyScheduler::new()
                .with_max_attempts(self.config.max_attempts)
                .with_seed(seed)
                .solve(&model),
        };

        let mut schedule = model.to_schedule(&result.placements);
        if self.config.verify {
            for violation in verify_schedule(catalog, &sessions, &schedule) {
                schedule.add_violation(violation);
            }
        }

        if result.status.is_complete() {
            info!(
                scope = %name,
                sessions = sessions.len(),
                cost = result.cost,
                steps = result.stats.steps,
                status = ?result.status,
                "scope solved"
            );
        } else {
            warn!(
                scope = %name,
                sessions = sessions.len(),
                cost = result.cost,
                steps = result.stats.steps,
                "budget exhausted, returning degraded schedule"
            );
        }
        if !schedule.is_valid() {
            warn!(scope = %name, violations = schedule.violations.len(), "schedule violates invariants");
        }

        let outcome = ScopeOutcome {
            name,
            sections: sections.iter().map(|&s| catalog.section(s).name.clone()).collect(),
            sessions: sessions.len(),
            status: result.status,
            cost: result.cost,
            stats: result.stats,
            violations: schedule.violations.clone(),
            kpi: ScheduleKpi::calculate(&schedule, catalog.grid().cell_count()),
        };
        Ok(SolvedScope {
            sessions,
            schedule,
            outcome,
        })
    }
}

/// Groups sections that could collide into the same scope.
///
/// Scopes come out in order of their first section.
pub fn partition(catalog: &Catalog, selected: &[SectionId], joint: bool) -> Vec<Vec<SectionId>> {
    if selected.is_empty() {
        return Vec::new();
    }
    if joint {
        return vec![selected.to_vec()];
    }

    let pooled = catalog.room_policy() == RoomPolicy::Pooled;
    let mut sets = DisjointSets::new(selected.len());
    let mut teacher_owner = HashMap::new();
    let mut room_owner = HashMap::new();

    for (pos, &sid) in selected.iter().enumerate() {
        let section = catalog.section(sid);
        for req in &section.subjects {
            for t in catalog.teachers_for(req.subject, section.level) {
                claim(&mut teacher_owner, t, pos, &mut sets);
            }
            if pooled {
                for r in catalog.rooms_for(sid, &req.room_type) {
                    claim(&mut room_owner, r, pos, &mut sets);
                }
            }
        }
    }

    let mut groups: Vec<Vec<SectionId>> = Vec::new();
    let mut group_of_root: HashMap<usize, usize> = HashMap::new();
    for (pos, &sid) in selected.iter().enumerate() {
        let root = sets.find(pos);
        let group = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group].push(sid);
    }
    groups
}

fn claim(owners: &mut HashMap<usize, usize>, resource: usize, pos: usize, sets: &mut DisjointSets) {
    match owners.entry(resource) {
        Entry::Occupied(e) => sets.union(*e.get(), pos),
        Entry::Vacant(e) => {
            e.insert(pos);
        }
    }
}

/// Union-find with path halving.
struct DisjointSets {
    parent: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            self.parent[ra.max(rb)] = ra.min(rb);
        }
    }
}
