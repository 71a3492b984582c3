//! Room model.
//!
//! Rooms host sessions. Under the dedicated policy each section owns one
//! room for the whole week; under the pooled policy rooms of the requested
//! type are contended for at each slot.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense room identifier (index into the catalog's room list).
pub type RoomId = usize;

/// A physical room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Catalog identifier.
    pub id: RoomId,
    /// Room name as supplied by the caller.
    pub name: String,
    /// Room classification.
    pub room_type: RoomType,
}

/// Room classification.
///
/// Compared after normalization, so `"Science"` and `" science"` are the
/// same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RoomType {
    /// Ordinary classroom.
    #[default]
    General,
    /// Laboratory.
    Science,
    /// Gym or field.
    Sport,
    /// Deployment-specific type (normalized lowercase).
    Custom(String),
}

impl RoomType {
    /// Parses a caller-supplied type name.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "" | "general" => Self::General,
            "science" => Self::Science,
            "sport" => Self::Sport,
            other => Self::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str("general"),
            Self::Science => f.write_str("science"),
            Self::Sport => f.write_str("sport"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// How rooms are assigned to sessions.
///
/// One policy applies to a whole run; policies are never mixed within a
/// scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomPolicy {
    /// One room per section, resolved by `level prefix + section name`.
    #[default]
    Dedicated,
    /// Rooms of the subject's requested type are shared at each slot.
    Pooled,
}

impl Room {
    /// Creates a new room.
    pub fn new(id: RoomId, name: impl Into<String>, room_type: RoomType) -> Self {
        Self {
            id,
            name: name.into(),
            room_type,
        }
    }

    /// Whether this room can host sessions requesting `room_type`.
    #[inline]
    pub fn is_of_type(&self, room_type: &RoomType) -> bool {
        &self.room_type == room_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_type_parse() {
        assert_eq!(RoomType::parse("general"), RoomType::General);
        assert_eq!(RoomType::parse(""), RoomType::General);
        assert_eq!(RoomType::parse(" Science "), RoomType::Science);
        assert_eq!(RoomType::parse("SPORT"), RoomType::Sport);
        assert_eq!(RoomType::parse("Music"), RoomType::Custom("music".into()));
    }

    #[test]
    fn test_room_type_display_round_trip() {
        for name in ["general", "science", "sport", "workshop"] {
            assert_eq!(RoomType::parse(name).to_string(), name);
        }
    }

    #[test]
    fn test_room_is_of_type() {
        let r = Room::new(0, "Lab_1", RoomType::Science);
        assert!(r.is_of_type(&RoomType::Science));
        assert!(!r.is_of_type(&RoomType::General));
    }

    #[test]
    fn test_policy_default_is_dedicated() {
        assert_eq!(RoomPolicy::default(), RoomPolicy::Dedicated);
    }
}
