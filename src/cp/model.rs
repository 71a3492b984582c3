//! Constraint model of one scheduling scope.
//!
//! One decision variable per session, with a factored domain: legal start
//! cells × qualified teachers (plus the sentinel) × candidate rooms. A
//! block variable only starts on the first slot of a legal pair; its
//! second half-slot is implied by the span and shares teacher and room.
//!
//! Exclusivity constraints are declared pairwise, and only between
//! variables that could actually collide:
//! - teacher: both real-teacher domains intersect
//! - room (pooled policy): both room domains intersect
//! - section: both sessions belong to the same section
//!
//! The objective counts sessions resolved to the sentinel teacher.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::occupancy::OccupancyShape;
use crate::catalog::Catalog;
use crate::error::ConfigurationError;
use crate::models::{
    Assignment, Cell, Placement, RoomId, RoomPolicy, Schedule, SectionId, Session, SessionId,
    TeacherId, TeacherRef,
};

/// Decision variable of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionVar {
    pub session: SessionId,
    pub section: SectionId,
    /// Slots occupied (2 for blocks).
    pub span: u8,
    /// Legal start cells, day-major.
    pub starts: Vec<Cell>,
    /// Qualified teachers of the section's pool. The sentinel is implicit.
    pub teachers: Vec<TeacherId>,
    pub rooms: Vec<RoomId>,
}

impl SessionVar {
    /// Domain size, sentinel included.
    pub fn domain_size(&self) -> usize {
        self.starts.len() * (self.teachers.len() + 1) * self.rooms.len()
    }

    /// Value for a variable the search never reached: the sentinel at the
    /// first legal start, in the first candidate room.
    pub fn fallback(&self) -> Placement {
        let start = self.starts.first().copied().unwrap_or(Cell::new(0, 1));
        let room = self.rooms.first().copied().unwrap_or_default();
        Placement::new(start, self.span, TeacherRef::Unassigned, room)
    }
}

/// A pairwise exclusivity constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusivity {
    pub a: usize,
    pub b: usize,
    /// Real teacher domains intersect.
    pub teacher: bool,
    /// Room domains intersect (pooled policy only).
    pub room: bool,
    /// Same section.
    pub section: bool,
}

/// Constraint model of one scope.
#[derive(Debug, Clone)]
pub struct TimetableModel {
    name: String,
    policy: RoomPolicy,
    vars: Vec<SessionVar>,
    constraints: Vec<Exclusivity>,
    neighbors: Vec<Vec<usize>>,
    lower_bound: usize,
    shape: OccupancyShape,
}

impl TimetableModel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn room_policy(&self) -> RoomPolicy {
        self.policy
    }

    pub fn vars(&self) -> &[SessionVar] {
        &self.vars
    }

    pub fn var(&self, index: usize) -> &SessionVar {
        &self.vars[index]
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn constraints(&self) -> &[Exclusivity] {
        &self.constraints
    }

    /// Variables sharing a constraint with `index`.
    pub fn neighbors(&self, index: usize) -> &[usize] {
        &self.neighbors[index]
    }

    /// Sentinel count no assignment can go below.
    pub fn lower_bound(&self) -> usize {
        self.lower_bound
    }

    pub(crate) fn shape(&self) -> &OccupancyShape {
        &self.shape
    }

    /// Whether two concrete values violate a declared constraint.
    ///
    /// Returns `false` for pairs without a constraint.
    pub fn conflicts(&self, a: usize, va: &Placement, b: usize, vb: &Placement) -> bool {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let Some(c) = self.constraint_between(lo, hi) else {
            return false;
        };
        if !va.overlaps(vb) {
            return false;
        }
        let teacher_clash = match (va.teacher, vb.teacher) {
            (TeacherRef::Assigned(x), TeacherRef::Assigned(y)) => x == y,
            _ => false,
        };
        c.section || (c.teacher && teacher_clash) || (c.room && va.room == vb.room)
    }

    fn constraint_between(&self, a: usize, b: usize) -> Option<&Exclusivity> {
        self.constraints.iter().find(|c| c.a == a && c.b == b)
    }

    /// Number of sentinel placements.
    pub fn objective(&self, placements: &[Placement]) -> usize {
        placements.iter().filter(|p| p.is_sentinel()).count()
    }

    /// Turns one placement per variable into a schedule.
    pub fn to_schedule(&self, placements: &[Placement]) -> Schedule {
        let mut schedule = Schedule::new();
        for (var, placement) in self.vars.iter().zip(placements) {
            schedule.add_assignment(Assignment::new(var.session, *placement));
        }
        schedule
    }
}

/// Builds a [`TimetableModel`] from the sessions of one scope.
///
/// # Example
/// ```no_run
/// use u_timetable::catalog::{Catalog, CatalogInput};
/// use u_timetable::config::EngineConfig;
/// use u_timetable::cp::TimetableModelBuilder;
/// use u_timetable::expander::SessionExpander;
///
/// let catalog = Catalog::build(&CatalogInput::new(), &EngineConfig::default()).unwrap();
/// let sessions = SessionExpander::new().expand(&catalog, &[]);
/// let model = TimetableModelBuilder::new(&catalog, &sessions).build("scope-0").unwrap();
/// assert!(model.is_empty());
/// ```
pub struct TimetableModelBuilder<'a> {
    catalog: &'a Catalog,
    sessions: &'a [Session],
}

impl<'a> TimetableModelBuilder<'a> {
    pub fn new(catalog: &'a Catalog, sessions: &'a [Session]) -> Self {
        Self { catalog, sessions }
    }

    /// Declares variables, constraints and the root lower bound.
    ///
    /// # Errors
    /// `UnqualifiedSubject` or `MissingRoomType` if a session has no
    /// teacher or room candidate. A catalog that passed its own checks
    /// never triggers these.
    pub fn build(&self, name: impl Into<String>) -> Result<TimetableModel, ConfigurationError> {
        let catalog = self.catalog;
        let grid = catalog.grid();
        let policy = catalog.room_policy();

        let mut vars = Vec::with_capacity(self.sessions.len());
        for session in self.sessions {
            let section = catalog.section(session.section);
            let teachers = catalog.teachers_for(session.subject, section.level);
            if teachers.is_empty() {
                return Err(ConfigurationError::UnqualifiedSubject {
                    section: section.name.clone(),
                    subject: catalog.subject(session.subject).name.clone(),
                });
            }
            let rooms = catalog.rooms_for(session.section, &session.room_type);
            if rooms.is_empty() {
                return Err(ConfigurationError::MissingRoomType {
                    section: section.name.clone(),
                    subject: catalog.subject(session.subject).name.clone(),
                    room_type: session.room_type.to_string(),
                });
            }
            vars.push(SessionVar {
                session: session.id,
                section: session.section,
                span: session.span(),
                starts: grid.starts(session.span()),
                teachers,
                rooms,
            });
        }

        let mut constraints = Vec::new();
        let mut neighbors = vec![Vec::new(); vars.len()];
        for a in 0..vars.len() {
            for b in (a + 1)..vars.len() {
                let (va, vb) = (&vars[a], &vars[b]);
                let section = va.section == vb.section;
                let teacher = va.teachers.iter().any(|t| vb.teachers.contains(t));
                let room = policy == RoomPolicy::Pooled && va.rooms.iter().any(|r| vb.rooms.contains(r));
                if section || teacher || room {
                    constraints.push(Exclusivity {
                        a,
                        b,
                        teacher,
                        room,
                        section,
                    });
                    neighbors[a].push(b);
                    neighbors[b].push(a);
                }
            }
        }

        let lower_bound = sentinel_lower_bound(&vars, grid.cell_count(), grid.day_count() * grid.block_pairs().len());

        let model = TimetableModel {
            name: name.into(),
            policy,
            vars,
            constraints,
            neighbors,
            lower_bound,
            shape: OccupancyShape::of(catalog),
        };
        debug!(
            scope = model.name(),
            vars = model.len(),
            constraints = model.constraints.len(),
            lower_bound = model.lower_bound,
            "model built"
        );
        Ok(model)
    }
}

/// Sessions that go to the sentinel in any schedule.
///
/// Teachers linked through shared candidates form pools with disjoint
/// teachers. In every cell a pool runs at most `min(teachers, sections)`
/// real sessions; whatever exceeds that capacity over the week goes to the
/// sentinel. Sessions with a single qualified teacher are also bounded per
/// teacher, and each pool keeps the larger of the two bounds.
fn sentinel_lower_bound(vars: &[SessionVar], cells: usize, pair_starts: usize) -> usize {
    let n = vars
        .iter()
        .flat_map(|v| v.teachers.iter())
        .max()
        .map_or(0, |&t| t + 1);
    let mut parent: Vec<TeacherId> = (0..n).collect();
    for var in vars {
        if let [first, rest @ ..] = var.teachers.as_slice() {
            for &t in rest {
                let (a, b) = (find(&mut parent, *first), find(&mut parent, t));
                if a != b {
                    parent[a.max(b)] = a.min(b);
                }
            }
        }
    }

    let mut bound = 0;
    let mut pools: HashMap<TeacherId, Pool> = HashMap::new();
    for var in vars {
        let Some(&first) = var.teachers.first() else {
            bound += 1;
            continue;
        };
        let pool = pools.entry(find(&mut parent, first)).or_default();
        pool.spans.push(var.span);
        pool.sections.insert(var.section);
        if let [only] = var.teachers.as_slice() {
            pool.sole.entry(*only).or_default().push(var.span);
        }
    }
    for var in vars {
        for &t in &var.teachers {
            let root = find(&mut parent, t);
            if let Some(pool) = pools.get_mut(&root) {
                pool.teachers.insert(t);
            }
        }
    }

    for pool in pools.into_values() {
        let width = pool.teachers.len().min(pool.sections.len());
        let shared = overflow(pool.spans, width * cells, width * pair_starts);
        let sole: usize = pool
            .sole
            .into_values()
            .map(|spans| overflow(spans, cells, pair_starts))
            .sum();
        bound += shared.max(sole);
    }
    bound
}

#[derive(Debug, Default)]
struct Pool {
    spans: Vec<u8>,
    sections: HashSet<SectionId>,
    teachers: HashSet<TeacherId>,
    sole: HashMap<TeacherId, Vec<u8>>,
}

fn find(parent: &mut [TeacherId], mut x: TeacherId) -> TeacherId {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}

/// Fewest sessions to drop so that `spans` fit `cells` slot units and the
/// blocks fit `pair_starts` pair starts.
fn overflow(mut spans: Vec<u8>, cells: usize, pair_starts: usize) -> usize {
    let blocks = spans.iter().filter(|&&s| s >= 2).count();
    let by_pairs = blocks.saturating_sub(pair_starts);

    let total: usize = spans.iter().map(|&s| usize::from(s)).sum();
    let mut excess = total.saturating_sub(cells);
    let mut by_cells = 0;
    spans.sort_unstable_by(|a, b| b.cmp(a));
    for span in spans {
        if excess == 0 {
            break;
        }
        excess = excess.saturating_sub(usize::from(span));
        by_cells += 1;
    }

    by_pairs.max(by_cells)
}
