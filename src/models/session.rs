//! Session model.
//!
//! A session is one required weekly occurrence of a subject for a
//! section. Sessions are produced by the expander and live only for the
//! duration of one scheduling request.

use serde::{Deserialize, Serialize};

use super::{RoomType, SectionId, SubjectId};

/// Position of a session in the expanded list of its scope.
pub type SessionId = usize;

/// One unplaced weekly occurrence of (section, subject).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Position in the expanded list.
    pub id: SessionId,
    pub section: SectionId,
    pub subject: SubjectId,
    /// Occurrence index within the week (`0..coefficient`).
    pub index: u32,
    /// Weekly count of the parent subject.
    pub coefficient: u32,
    /// Occupies a two-slot block.
    pub is_block: bool,
    /// Room type requested under the pooled policy.
    pub room_type: RoomType,
}

impl Session {
    /// Slots occupied.
    #[inline]
    pub fn span(&self) -> u8 {
        if self.is_block {
            2
        } else {
            1
        }
    }
}
