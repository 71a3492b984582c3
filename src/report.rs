//! Display report of a timetable.
//!
//! Projects assignments into display rows grouped back into the
//! level → year → section hierarchy of the input. Pure projection: the
//! builder never re-validates and produces byte-identical JSON for the
//! same schedules. Every session yields exactly one row, sentinel
//! assignments included.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::models::{Level, Schedule, SectionId, Session, TeacherRef, SENTINEL_TEACHER};

/// One display row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub day: String,
    pub room: String,
    pub subject: String,
    /// Teacher name, or `"No teacher available"`.
    pub teacher: String,
    /// Clock range, e.g. `"8:00 - 10:00"`.
    pub time: String,
    /// `"3"` for a single slot, `"1-2"` for a block.
    pub slot_label: String,
    pub section: String,
    /// Always serialized, `null` when the section has no stream.
    #[serde(default)]
    pub stream: Option<String>,
}

impl ScheduleEntry {
    pub fn is_sentinel(&self) -> bool {
        self.teacher == SENTINEL_TEACHER
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub section: String,
    #[serde(default)]
    pub stream: Option<String>,
    pub schedule: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearReport {
    pub year: u32,
    pub sections: Vec<SectionReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelReport {
    pub years: Vec<YearReport>,
}

/// The full timetable, keyed like the input payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimetableReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_school: Option<LevelReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_school: Option<LevelReport>,
}

impl TimetableReport {
    /// Serializes the report as pretty JSON.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn level(&self, level: Level) -> Option<&LevelReport> {
        match level {
            Level::Middle => self.middle_school.as_ref(),
            Level::High => self.high_school.as_ref(),
        }
    }

    /// All section reports, in output order.
    pub fn sections(&self) -> impl Iterator<Item = &SectionReport> {
        Level::ALL
            .into_iter()
            .filter_map(move |l| self.level(l))
            .flat_map(|l| l.years.iter())
            .flat_map(|y| y.sections.iter())
    }

    pub fn section(&self, name: &str) -> Option<&SectionReport> {
        self.sections().find(|s| s.section == name)
    }

    /// All rows, in output order.
    pub fn entries(&self) -> impl Iterator<Item = &ScheduleEntry> {
        self.sections().flat_map(|s| s.schedule.iter())
    }

    pub fn row_count(&self) -> usize {
        self.entries().count()
    }

    pub fn sentinel_count(&self) -> usize {
        self.entries().filter(|e| e.is_sentinel()).count()
    }
}

/// Accumulates the schedules of one or more scopes into a report.
///
/// # Example
/// ```
/// use u_timetable::catalog::{Catalog, CatalogInput};
/// use u_timetable::config::EngineConfig;
/// use u_timetable::report::ReportBuilder;
///
/// let catalog = Catalog::build(&CatalogInput::new(), &EngineConfig::default()).unwrap();
/// let report = ReportBuilder::new(&catalog).finish(&[]);
/// assert_eq!(report.row_count(), 0);
/// ```
#[derive(Debug)]
pub struct ReportBuilder<'a> {
    catalog: &'a Catalog,
    rows: HashMap<SectionId, Vec<((usize, u32), ScheduleEntry)>>,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            rows: HashMap::new(),
        }
    }

    /// Adds the rows of one scope. `schedule` refers to `sessions` by id.
    pub fn add_scope(&mut self, sessions: &[Session], schedule: &Schedule) {
        let catalog = self.catalog;
        let grid = catalog.grid();
        let by_id: HashMap<usize, &Session> = sessions.iter().map(|s| (s.id, s)).collect();

        for a in &schedule.assignments {
            let Some(session) = by_id.get(&a.session) else {
                continue;
            };
            let section = catalog.section(session.section);
            let p = &a.placement;
            let teacher = match p.teacher {
                TeacherRef::Assigned(t) => catalog.teacher(t).name.clone(),
                TeacherRef::Unassigned => SENTINEL_TEACHER.to_string(),
            };
            let entry = ScheduleEntry {
                day: grid.day_name(p.start.day).unwrap_or("Unknown").to_string(),
                room: catalog.room(p.room).name.clone(),
                subject: catalog.subject(session.subject).name.clone(),
                teacher,
                time: grid.time_range(p.start.slot, p.span),
                slot_label: grid.slot_label(p.start.slot, p.span),
                section: section.name.clone(),
                stream: section.stream.clone(),
            };
            let subject_pos = section
                .subjects
                .iter()
                .position(|r| r.subject == session.subject)
                .unwrap_or(usize::MAX);
            self.rows
                .entry(session.section)
                .or_default()
                .push(((subject_pos, session.index), entry));
        }
    }

    /// Groups the rows of the `selected` sections by level and year.
    ///
    /// Levels and years without a selected section are omitted.
    pub fn finish(mut self, selected: &[SectionId]) -> TimetableReport {
        let mut report = TimetableReport::default();

        for section in self.catalog.sections() {
            if !selected.contains(&section.id) {
                continue;
            }
            let mut rows = self.rows.remove(&section.id).unwrap_or_default();
            rows.sort_by_key(|(key, _)| *key);

            let level = match section.level {
                Level::Middle => report.middle_school.get_or_insert_with(LevelReport::default),
                Level::High => report.high_school.get_or_insert_with(LevelReport::default),
            };
            let year = match level.years.iter().position(|y| y.year == section.year) {
                Some(pos) => &mut level.years[pos],
                None => {
                    level.years.push(YearReport {
                        year: section.year,
                        sections: Vec::new(),
                    });
                    let last = level.years.len() - 1;
                    &mut level.years[last]
                }
            };
            year.sections.push(SectionReport {
                section: section.name.clone(),
                stream: section.stream.clone(),
                schedule: rows.into_iter().map(|(_, e)| e).collect(),
            });
        }

        report
    }
}
