//! Week grid model.
//!
//! The school week is a fixed grid of days × slots. Slots carry clock
//! times; a gap between one slot's end and the next slot's start is a
//! break (typically the midday break). Block subjects may only start at
//! the first slot of a legal pair, and a legal pair never spans a break.
//!
//! # Indexing
//! Days are 0-based positions in the configured day list. Slot indices are
//! 1-based and never renumbered. A `(day, slot)` position is a [`Cell`].

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// A teaching slot with clock times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// Slot index (1-based).
    pub index: u8,
    /// Clock start (inclusive).
    pub start: NaiveTime,
    /// Clock end (exclusive).
    pub end: NaiveTime,
}

impl TimeSlot {
    /// Creates a new slot.
    pub fn new(index: u8, start: NaiveTime, end: NaiveTime) -> Self {
        Self { index, start, end }
    }

    /// Parses `"H:MM"` clock strings into a slot.
    pub fn parse(index: u8, start: &str, end: &str) -> Result<Self, ConfigurationError> {
        Ok(Self::new(index, parse_clock(start)?, parse_clock(end)?))
    }

    /// Whether the next slot starts exactly when this one ends.
    #[inline]
    pub fn is_contiguous_with(&self, next: &TimeSlot) -> bool {
        self.end == next.start
    }
}

/// A (day, slot) position in the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Day position (0-based).
    pub day: usize,
    /// Slot index (1-based).
    pub slot: u8,
}

impl Cell {
    /// Creates a new cell.
    pub fn new(day: usize, slot: u8) -> Self {
        Self { day, slot }
    }

    /// The cell `offset` slots later on the same day.
    #[inline]
    pub fn shifted(&self, offset: u8) -> Self {
        Self {
            day: self.day,
            slot: self.slot.saturating_add(offset),
        }
    }
}

/// Two adjacent slots a block subject may occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPair {
    pub first: u8,
    pub second: u8,
}

impl SlotPair {
    /// Creates a new pair.
    pub fn new(first: u8, second: u8) -> Self {
        Self { first, second }
    }

    /// Display label, e.g. `"1-2"`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.first, self.second)
    }
}

/// The fixed days × slots grid of one scheduling run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekGrid {
    days: Vec<String>,
    slots: Vec<TimeSlot>,
    block_pairs: Vec<SlotPair>,
}

impl WeekGrid {
    /// Creates a validated grid.
    ///
    /// # Errors
    /// `InvalidGrid` if there are no days or slots, slot indices are not
    /// `1..=K` in order, a slot ends before it starts, or a block pair is
    /// not two adjacent contiguous slots, or overlaps another pair.
    pub fn new(
        days: Vec<String>,
        slots: Vec<TimeSlot>,
        block_pairs: Vec<SlotPair>,
    ) -> Result<Self, ConfigurationError> {
        if days.is_empty() {
            return Err(ConfigurationError::InvalidGrid("no days configured".into()));
        }
        if slots.is_empty() {
            return Err(ConfigurationError::InvalidGrid("no slots configured".into()));
        }
        for (pos, slot) in slots.iter().enumerate() {
            if usize::from(slot.index) != pos + 1 {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "slot at position {} has index {}",
                    pos + 1,
                    slot.index
                )));
            }
            if slot.end <= slot.start {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "slot {} ends before it starts",
                    slot.index
                )));
            }
        }

        let grid = Self {
            days,
            slots,
            block_pairs,
        };

        let mut used = Vec::new();
        for pair in &grid.block_pairs {
            if pair.first.checked_add(1) != Some(pair.second) {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "block pair {} is not two adjacent slots",
                    pair.label()
                )));
            }
            let (Some(a), Some(b)) = (grid.slot(pair.first), grid.slot(pair.second)) else {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "block pair {} references an unknown slot",
                    pair.label()
                )));
            };
            if !a.is_contiguous_with(b) {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "block pair {} crosses a break",
                    pair.label()
                )));
            }
            if used.contains(&pair.first) || used.contains(&pair.second) {
                return Err(ConfigurationError::InvalidGrid(format!(
                    "block pair {} overlaps another pair",
                    pair.label()
                )));
            }
            used.extend([pair.first, pair.second]);
        }

        Ok(grid)
    }

    /// Ordered day names.
    pub fn days(&self) -> &[String] {
        &self.days
    }

    /// Slots in index order.
    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    /// Legal block pairs.
    pub fn block_pairs(&self) -> &[SlotPair] {
        &self.block_pairs
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Total cells in the week.
    pub fn cell_count(&self) -> usize {
        self.days.len() * self.slots.len()
    }

    /// Dense index of a cell (day-major).
    #[inline]
    pub fn cell_index(&self, cell: Cell) -> usize {
        cell.day * self.slots.len() + usize::from(cell.slot) - 1
    }

    /// Looks up a slot by its 1-based index.
    pub fn slot(&self, index: u8) -> Option<&TimeSlot> {
        usize::from(index)
            .checked_sub(1)
            .and_then(|pos| self.slots.get(pos))
    }

    pub fn day_name(&self, day: usize) -> Option<&str> {
        self.days.get(day).map(String::as_str)
    }

    /// Whether a break separates `slot` from the following slot.
    pub fn is_break_after(&self, slot: u8) -> bool {
        match (self.slot(slot), slot.checked_add(1).and_then(|next| self.slot(next))) {
            (Some(a), Some(b)) => !a.is_contiguous_with(b),
            _ => false,
        }
    }

    /// The legal pair starting at `slot`, if any.
    pub fn pair_starting_at(&self, slot: u8) -> Option<SlotPair> {
        self.block_pairs.iter().copied().find(|p| p.first == slot)
    }

    /// Legal start cells for a session spanning `span` slots, day-major.
    ///
    /// Single sessions may start anywhere; blocks only at the first slot
    /// of a legal pair.
    pub fn starts(&self, span: u8) -> Vec<Cell> {
        let mut starts = Vec::new();
        for day in 0..self.days.len() {
            if span >= 2 {
                starts.extend(self.block_pairs.iter().map(|p| Cell::new(day, p.first)));
            } else {
                starts.extend(self.slots.iter().map(|s| Cell::new(day, s.index)));
            }
        }
        starts
    }

    /// Human time range for a session starting at `slot`, e.g. `"8:00 - 10:00"`.
    pub fn time_range(&self, slot: u8, span: u8) -> String {
        let last = slot.saturating_add(span.saturating_sub(1));
        match (self.slot(slot), self.slot(last)) {
            (Some(a), Some(b)) => format!("{} - {}", format_clock(a.start), format_clock(b.end)),
            _ => "Unknown - Unknown".to_string(),
        }
    }

    /// Slot label: `"3"` for singles, `"3-4"` for blocks.
    pub fn slot_label(&self, slot: u8, span: u8) -> String {
        if span >= 2 {
            SlotPair::new(slot, slot.saturating_add(span - 1)).label()
        } else {
            slot.to_string()
        }
    }
}

/// Parses an `"H:MM"` clock string.
pub(crate) fn parse_clock(s: &str) -> Result<NaiveTime, ConfigurationError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|e| ConfigurationError::InvalidGrid(format!("bad clock time `{s}`: {e}")))
}

/// Formats a clock time without a leading zero, e.g. `8:00`, `13:30`.
pub(crate) fn format_clock(t: NaiveTime) -> String {
    t.format("%-H:%M").to_string()
}
