//! Subject identity.
//!
//! Subject names are matched case-insensitively after trimming. The
//! catalog interns each normalized name once into a [`SubjectId`], so the
//! search loop compares integers, never strings.

use serde::{Deserialize, Serialize};

/// Dense subject identifier (index into the catalog's subject table).
pub type SubjectId = usize;

/// An interned subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    /// Catalog identifier.
    pub id: SubjectId,
    /// Normalized key (trimmed, lowercase).
    pub key: String,
    /// Display name as first written by the caller.
    pub name: String,
}

impl Subject {
    /// Creates a subject from a caller-supplied name.
    pub fn new(id: SubjectId, name: &str) -> Self {
        Self {
            id,
            key: normalize_name(name),
            name: name.trim().to_string(),
        }
    }
}

/// Normalizes a subject name for matching.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
