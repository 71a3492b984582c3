//! Catalog facts consulted by ordering rules.

use std::collections::HashMap;

use crate::catalog::Catalog;
use crate::models::{SectionId, SubjectId};

/// Read-only facts about the sessions being ordered.
#[derive(Debug, Clone, Default)]
pub struct OrderingContext {
    /// Qualified teachers per (section, subject), within the section's pool.
    pub qualified_teachers: HashMap<(SectionId, SubjectId), usize>,
}

impl OrderingContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects qualification counts for the given sections.
    pub fn from_catalog(catalog: &Catalog, sections: &[SectionId]) -> Self {
        let mut context = Self::new();
        for &sid in sections {
            let section = catalog.section(sid);
            for req in &section.subjects {
                let count = catalog.teachers_for(req.subject, section.level).len();
                context.qualified_teachers.insert((sid, req.subject), count);
            }
        }
        context
    }

    /// Sets the qualified teacher count of a (section, subject).
    pub fn with_qualified(mut self, section: SectionId, subject: SubjectId, count: usize) -> Self {
        self.qualified_teachers.insert((section, subject), count);
        self
    }

    pub fn qualified_count(&self, section: SectionId, subject: SubjectId) -> Option<usize> {
        self.qualified_teachers.get(&(section, subject)).copied()
    }
}
