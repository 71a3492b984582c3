//! Engine configuration.
//!
//! Controls the search budget, room policy, strategy and the week grid
//! without code changes. Every field has a default, so a partial TOML
//! file (or none at all) is valid.
//!
//! # Examples
//!
//! ```
//! use u_timetable::config::{EngineConfig, Strategy};
//! use u_timetable::models::RoomPolicy;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     seed = 7
//!     step_limit = 5000
//!     room_policy = "pooled"
//!
//!     [grid]
//!     days = ["lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi"]
//! "#).unwrap();
//!
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.room_policy, RoomPolicy::Pooled);
//! assert_eq!(config.strategy, Strategy::Systematic);
//! assert_eq!(config.grid.days.len(), 6);
//! assert_eq!(config.grid.slots.len(), 8);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cp::SearchBudget;
use crate::error::{ConfigError, ConfigurationError};
use crate::models::{RoomPolicy, SlotPair, TimeSlot, WeekGrid};

/// Placement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Propagation + backtracking + branch-and-bound.
    #[default]
    Systematic,
    /// Randomized greedy with a per-session attempt cap.
    Greedy,
}

/// Main engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    /// Seed for value tie-breaking and the greedy strategy.
    pub seed: u64,
    /// Maximum search nodes per scope (and per portfolio worker).
    pub step_limit: u64,
    /// Wall-clock limit per scope in milliseconds.
    pub time_limit_ms: u64,
    pub room_policy: RoomPolicy,
    pub strategy: Strategy,
    /// Portfolio workers per scope (1 = plain search).
    pub workers: usize,
    /// Solve every selected section in one model.
    pub joint_scope: bool,
    /// Greedy strategy: random draws per session before giving up.
    pub max_attempts: u32,
    /// Check invariants of every produced schedule.
    pub verify: bool,
    /// Subjects treated as blocks when the input does not say.
    pub block_subjects: Vec<String>,
    pub naming: NamingConfig,
    pub grid: GridConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            step_limit: 200_000,
            time_limit_ms: 10_000,
            room_policy: RoomPolicy::Dedicated,
            strategy: Strategy::Systematic,
            workers: 1,
            joint_scope: false,
            max_attempts: 50,
            verify: true,
            block_subjects: vec!["sport".to_string()],
            naming: NamingConfig::default(),
            grid: GridConfig::default(),
        }
    }
}

/// Naming conventions of the caller's data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct NamingConfig {
    pub middle_room_prefix: String,
    pub high_room_prefix: String,
    /// Teachers named with this prefix serve only the middle school.
    pub middle_teacher_prefix: String,
    /// Teachers named with this prefix serve only the high school.
    pub high_teacher_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            middle_room_prefix: "MS_Room_".to_string(),
            high_room_prefix: "HS_Room_".to_string(),
            middle_teacher_prefix: "MS_Teacher_".to_string(),
            high_teacher_prefix: "HS_Teacher_".to_string(),
        }
    }
}

/// Week grid definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct GridConfig {
    pub days: Vec<String>,
    /// Legal block pairs as `[first, second]`.
    pub block_pairs: Vec<(u8, u8)>,
    /// Slots in order; index = position + 1.
    pub slots: Vec<SlotConfig>,
}

/// Clock times of one slot, as `"H:MM"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotConfig {
    pub start: String,
    pub end: String,
}

impl SlotConfig {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        let days = ["dimanche", "lundi", "mardi", "mercredi", "jeudi"];
        let slots = [
            ("8:00", "9:00"),
            ("9:00", "10:00"),
            ("10:00", "11:00"),
            ("11:00", "12:00"),
            ("13:30", "14:30"),
            ("14:30", "15:30"),
            ("15:30", "16:30"),
            ("16:30", "17:30"),
        ];
        Self {
            days: days.iter().map(|d| d.to_string()).collect(),
            block_pairs: vec![(1, 2), (3, 4), (5, 6), (7, 8)],
            slots: slots.iter().map(|(s, e)| SlotConfig::new(*s, *e)).collect(),
        }
    }
}

impl GridConfig {
    /// Builds and validates the week grid.
    pub fn to_grid(&self) -> Result<WeekGrid, ConfigurationError> {
        let mut slots = Vec::with_capacity(self.slots.len());
        for (pos, slot) in self.slots.iter().enumerate() {
            let index = u8::try_from(pos + 1)
                .map_err(|_| ConfigurationError::InvalidGrid("too many slots".into()))?;
            slots.push(TimeSlot::parse(index, &slot.start, &slot.end)?);
        }
        let pairs = self
            .block_pairs
            .iter()
            .map(|&(first, second)| SlotPair::new(first, second))
            .collect();
        WeekGrid::new(self.days.clone(), slots, pairs)
    }
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.step_limit == 0 {
            return Err(ConfigError::Invalid("step_limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_step_limit(mut self, steps: u64) -> Self {
        self.step_limit = steps.max(1);
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_room_policy(mut self, policy: RoomPolicy) -> Self {
        self.room_policy = policy;
        self
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_joint_scope(mut self, joint: bool) -> Self {
        self.joint_scope = joint;
        self
    }

    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    /// Wall-clock limit per scope.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    /// Search budget derived from the limits.
    pub fn budget(&self) -> SearchBudget {
        SearchBudget::new(self.step_limit, self.time_limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_school_week() {
        let c = EngineConfig::default();
        assert_eq!(c.grid.days.len(), 5);
        assert_eq!(c.grid.slots.len(), 8);
        assert_eq!(c.grid.block_pairs, vec![(1, 2), (3, 4), (5, 6), (7, 8)]);
        assert_eq!(c.block_subjects, vec!["sport".to_string()]);
        assert_eq!(c.room_policy, RoomPolicy::Dedicated);
        let grid = c.grid.to_grid().unwrap();
        assert!(grid.is_break_after(4));
    }

    #[test]
    fn test_empty_toml_is_default() {
        let c = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(c, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let c = EngineConfig::from_toml_str(
            r#"
            strategy = "greedy"
            max_attempts = 10
            joint_scope = true

            [naming]
            middle_room_prefix = "C_"

            [grid]
            block_pairs = [[1, 2], [5, 6]]
            "#,
        )
        .unwrap();
        assert_eq!(c.strategy, Strategy::Greedy);
        assert_eq!(c.max_attempts, 10);
        assert!(c.joint_scope);
        assert_eq!(c.naming.middle_room_prefix, "C_");
        assert_eq!(c.naming.high_room_prefix, "HS_Room_");
        assert_eq!(c.grid.block_pairs, vec![(1, 2), (5, 6)]);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            EngineConfig::from_toml_str("seed = \"abc\""),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("workers = 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let c = EngineConfig::default()
            .with_seed(9)
            .with_workers(3)
            .with_room_policy(RoomPolicy::Pooled);
        let text = toml::to_string(&c).unwrap();
        let back = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            EngineConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_budget() {
        let c = EngineConfig::default()
            .with_step_limit(0)
            .with_time_limit(Duration::from_millis(250));
        let b = c.budget();
        assert_eq!(b.step_limit, 1);
        assert_eq!(b.time_limit, Duration::from_millis(250));
    }
}
