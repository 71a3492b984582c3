//! Session expansion.
//!
//! Turns each (section, subject, weekly count) into `count` unplaced
//! sessions with a stable occurrence index, then orders them with a
//! [`RuleEngine`]. Session ids are positions in the emitted list.

use tracing::debug;

use crate::catalog::Catalog;
use crate::models::{SectionId, Session};
use crate::ordering::{OrderingContext, RuleEngine};

/// Expands sections into sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionExpander {
    engine: RuleEngine,
}

impl SessionExpander {
    /// Creates an expander with the standard ordering chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the ordering engine.
    pub fn with_engine(mut self, engine: RuleEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Expands the given sections.
    pub fn expand(&self, catalog: &Catalog, sections: &[SectionId]) -> Vec<Session> {
        let mut raw = Vec::new();
        for &sid in sections {
            let section = catalog.section(sid);
            for req in &section.subjects {
                for index in 0..req.coefficient {
                    raw.push(Session {
                        id: raw.len(),
                        section: sid,
                        subject: req.subject,
                        index,
                        coefficient: req.coefficient,
                        is_block: req.is_block,
                        room_type: req.room_type.clone(),
                    });
                }
            }
        }

        let context = OrderingContext::from_catalog(catalog, sections);
        let order = self.engine.sort_indices(&raw, &context);
        let sessions: Vec<Session> = order
            .into_iter()
            .enumerate()
            .map(|(id, i)| Session {
                id,
                ..raw[i].clone()
            })
            .collect();

        debug!(
            sections = sections.len(),
            sessions = sessions.len(),
            blocks = sessions.iter().filter(|s| s.is_block).count(),
            "sessions expanded"
        );
        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogInput, RoomInput, SectionInput, TeacherInput};
    use crate::config::EngineConfig;
    use crate::models::Level;
    use crate::ordering::{rules, TieBreaker};
    use std::collections::HashMap;

    fn catalog() -> Catalog {
        let input = CatalogInput::new()
            .with_section(
                Level::Middle,
                1,
                SectionInput::new("1M1")
                    .with_subject("Math", 4)
                    .with_subject("Chemistry", 2)
                    .with_subject("Sport", 1),
            )
            .with_section(Level::Middle, 1, SectionInput::new("1M2").with_subject("Math", 3))
            .with_teacher(TeacherInput::new("MS_Teacher_1", &["Math", "Sport"]))
            .with_teacher(TeacherInput::new("MS_Teacher_2", &["Math", "Chemistry"]))
            .with_room(RoomInput::new("MS_Room_1M1", "general"))
            .with_room(RoomInput::new("MS_Room_1M2", "general"));
        Catalog::build(&input, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_counts_match_coefficients() {
        let c = catalog();
        let sessions = SessionExpander::new().expand(&c, &[0, 1]);
        assert_eq!(sessions.len(), 10);

        let mut counts: HashMap<(usize, usize), Vec<u32>> = HashMap::new();
        for s in &sessions {
            counts.entry((s.section, s.subject)).or_default().push(s.index);
        }
        let math = c.subject_id("math").unwrap();
        let mut indices = counts[&(0, math)].clone();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(counts[&(1, math)].len(), 3);
    }

    #[test]
    fn test_ids_are_positions() {
        let sessions = SessionExpander::new().expand(&catalog(), &[0, 1]);
        for (pos, s) in sessions.iter().enumerate() {
            assert_eq!(s.id, pos);
        }
    }

    #[test]
    fn test_standard_order() {
        let c = catalog();
        let sessions = SessionExpander::new().expand(&c, &[0, 1]);
        assert!(sessions[0].is_block);
        // Chemistry has one qualified teacher, math has two.
        assert_eq!(sessions[1].subject, c.subject_id("chemistry").unwrap());
        assert_eq!(sessions[2].subject, c.subject_id("chemistry").unwrap());
        assert_eq!(sessions[3].subject, c.subject_id("math").unwrap());
        assert_eq!(sessions[3].coefficient, 4);
    }

    #[test]
    fn test_section_subset() {
        let sessions = SessionExpander::new().expand(&catalog(), &[1]);
        assert_eq!(sessions.len(), 3);
        assert!(sessions.iter().all(|s| s.section == 1));
    }

    #[test]
    fn test_custom_engine() {
        let engine = RuleEngine::new()
            .with_rule(rules::HeavySubject)
            .with_final_tie_breaker(TieBreaker::ById);
        let sessions = SessionExpander::new().with_engine(engine).expand(&catalog(), &[0]);
        assert_eq!(sessions[0].coefficient, 4);
        assert!(sessions.last().unwrap().is_block);
    }
}
